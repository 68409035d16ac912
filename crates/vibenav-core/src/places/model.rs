//! Place and review records produced by the scrapers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GPS coordinates as reported by the maps search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single scraped Google Maps review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GoogleReview {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// A Reddit comment with its reply tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RedditComment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<RedditComment>,
}

/// A Reddit thread found for a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RedditThread {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_comments: Vec<RedditComment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filtered_comments: Vec<RedditComment>,
}

impl RedditThread {
    /// Top-level comments, preferring the unfiltered scrape
    pub fn comments(&self) -> &[RedditComment] {
        if self.all_comments.is_empty() {
            &self.filtered_comments
        } else {
            &self.all_comments
        }
    }
}

/// Where a review came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    Google,
    Reddit,
}

impl ReviewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Reddit => "reddit",
        }
    }
}

/// Flattened review text with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
    pub author: String,
    pub source: ReviewSource,
    pub url: String,
}

const ANONYMOUS: &str = "Anonymous";

/// A place as collected by the scraping phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Place {
    /// Synthetic identifier assigned at ingestion
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "reviews_count", alias = "review_count")]
    pub reviews_count: Option<u64>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Google place id used to build the maps URL
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reddit_comments: Vec<RedditThread>,
    #[serde(default)]
    pub google_reviews: Vec<GoogleReview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe_profile: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
    /// Fields this crate does not model, kept verbatim on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Place {
    /// Google Maps URL for this place
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/place/?q=place_id:{}",
            self.source_url.as_deref().unwrap_or_default()
        )
    }

    pub fn city_or_unknown(&self) -> &str {
        self.city.as_deref().unwrap_or("unknown city")
    }

    /// Every review, google first, then reddit comments flattened depth-first
    pub fn reviews(&self) -> Vec<Review> {
        let maps_url = self.maps_url();
        let mut reviews: Vec<Review> = self
            .google_reviews
            .iter()
            .map(|r| Review {
                text: r.text.clone(),
                author: r.author.clone().unwrap_or_else(|| ANONYMOUS.to_string()),
                source: ReviewSource::Google,
                url: maps_url.clone(),
            })
            .collect();

        for thread in &self.reddit_comments {
            for comment in thread.comments() {
                flatten_comment(comment, &thread.url, &mut reviews);
            }
        }

        reviews
    }

    /// First few reddit thread URLs
    pub fn reddit_thread_urls(&self, limit: usize) -> Vec<String> {
        self.reddit_comments
            .iter()
            .map(|t| t.url.clone())
            .filter(|u| !u.is_empty())
            .take(limit)
            .collect()
    }

    /// All review text joined by newlines (classifier input)
    pub fn combined_review_text(&self) -> String {
        self.reviews()
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn flatten_comment(comment: &RedditComment, thread_url: &str, out: &mut Vec<Review>) {
    if !comment.text.trim().is_empty() {
        out.push(Review {
            text: comment.text.clone(),
            author: comment
                .author
                .clone()
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            source: ReviewSource::Reddit,
            url: comment
                .permalink
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| thread_url.to_string()),
        });
    }
    for reply in &comment.replies {
        flatten_comment(reply, thread_url, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Place {
        serde_json::from_value(serde_json::json!({
            "name": "Iron Temple",
            "address": "12 FC Road, Pune",
            "rating": 4.6,
            "reviews_count": 812,
            "coordinates": {"latitude": 18.52, "longitude": 73.84},
            "category": "gym",
            "city": "pune",
            "source_url": "ChIJabc",
            "thumbnail": "https://example.com/t.jpg",
            "google_reviews": [
                {"author": "Asha", "time": "a week ago", "text": "Great yoga classes"},
                {"text": "Crowded in the evenings"}
            ],
            "reddit_comments": [{
                "title": "Best gyms in Pune?",
                "url": "https://www.reddit.com/r/pune/comments/abc/best_gyms/",
                "all_comments": [{
                    "text": "Iron Temple has a zumba batch",
                    "permalink": "https://www.reddit.com/r/pune/comments/abc/best_gyms/c1/",
                    "replies": [{"text": "Agreed, trainers are good"}]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_reviews_flatten_order_and_urls() {
        let place = sample();
        let reviews = place.reviews();
        assert_eq!(reviews.len(), 4);
        assert_eq!(reviews[0].source, ReviewSource::Google);
        assert_eq!(reviews[0].url, "https://www.google.com/maps/place/?q=place_id:ChIJabc");
        assert_eq!(reviews[1].author, "Anonymous");
        assert_eq!(reviews[2].source, ReviewSource::Reddit);
        assert!(reviews[2].url.ends_with("/c1/"));
        // reply without permalink falls back to the thread
        assert_eq!(reviews[3].text, "Agreed, trainers are good");
        assert_eq!(
            reviews[3].url,
            "https://www.reddit.com/r/pune/comments/abc/best_gyms/"
        );
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let place = sample();
        let value = serde_json::to_value(&place).unwrap();
        assert_eq!(value["thumbnail"], "https://example.com/t.jpg");
        assert_eq!(value["reviews_count"], 812);
        assert!(value.get("vibe_profile").is_none());
    }

    #[test]
    fn test_review_count_alias() {
        let place: Place =
            serde_json::from_str(r#"{"name": "Brew Lab", "review_count": 42}"#).unwrap();
        assert_eq!(place.reviews_count, Some(42));
        assert!(place.reviews().is_empty());
    }

    #[test]
    fn test_filtered_comments_fallback() {
        let thread: RedditThread = serde_json::from_str(
            r#"{"title": "t", "url": "u", "filtered_comments": [{"text": "nice"}]}"#,
        )
        .unwrap();
        assert_eq!(thread.comments().len(), 1);
    }
}
