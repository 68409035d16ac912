//! Narrative vibe profiles and their heuristic quality score

use super::json::extract_json_object;
use super::{Attempt, LLMClient, RetryPolicy};
use crate::error::Result;
use crate::places::{Coordinates, Place, ReviewSource};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_GOOGLE_REVIEWS: usize = 8;
const MAX_REDDIT_COMMENTS: usize = 5;
const NO_REDDIT: &str = "No Reddit discussions found";
const PARSE_FAILURE: &str = "Could not parse vibe profile";

const CARD_GOOGLE_CITATIONS: usize = 2;
const CAFE_MOOD: &str = "☕🌿🎶🔥";
const DEFAULT_MOOD: &str = "🌳🧘📷";

const SYSTEM_PROMPT: &str = r#"You're a vibe sommelier. Create a rich profile including:
- 3-paragraph narrative summary with emoji highlights
- 5-7 vibe tags (ranked by relevance)
- Ideal visitor persona
- "Pro Tip" based on reviews
Format as JSON with keys: summary, tags, persona, pro_tip"#;

/// Percentage (0, 33.3, 66.7 or 100) of summary checks passed: at least ten
/// words, at least two `[` citation markers, and a "but"/"however" contrast.
///
/// The contrast check ignores case, so a sentence opening with "However"
/// counts. Scores are therefore not comparable with case-sensitive scoring.
pub fn quality_score(summary: &str) -> f64 {
    let lower = summary.to_lowercase();
    let checks = [
        summary.split_whitespace().count() >= 10,
        summary.matches('[').count() >= 2,
        lower.contains("but") || lower.contains("however"),
    ];
    let passed = checks.iter().filter(|c| **c).count();
    passed as f64 / checks.len() as f64 * 100.0
}

/// Summary text of a profile; paragraph lists are joined
fn summary_text(profile: &Value) -> Option<String> {
    match profile.get("summary")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        ),
        _ => None,
    }
}

/// Generates vibe profiles for places
pub struct VibeProfiler {
    client: Arc<dyn LLMClient>,
    retry: RetryPolicy,
}

impl VibeProfiler {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build_prompt(place: &Place) -> String {
        let reviews = place
            .google_reviews
            .iter()
            .take(MAX_GOOGLE_REVIEWS)
            .map(|r| format!("* {}", r.text))
            .collect::<Vec<_>>()
            .join("\n");

        let comments: Vec<String> = place
            .reddit_comments
            .iter()
            .flat_map(|t| t.comments())
            .filter(|c| !c.text.trim().is_empty())
            .take(MAX_REDDIT_COMMENTS)
            .map(|c| format!("> {}", c.text))
            .collect();
        let reddit = if comments.is_empty() {
            NO_REDDIT.to_string()
        } else {
            comments.join("\n")
        };

        format!(
            r#"**Location**: {name} | **Type**: {category}

**Recent Reviews**:
{reviews}

**Reddit Discussions**:
{reddit}

Analyze this location's vibe considering:
1. Atmosphere descriptors (cozy, lively, etc.)
2. Typical visitor demographics
3. Unique selling points
4. Best time to visit
5. Potential drawbacks
"#,
            name = place.name,
            category = place.category.as_deref().unwrap_or("place"),
        )
    }

    /// Ask for a profile. Output that is not a JSON object yields the
    /// `{"error": ...}` placeholder profile.
    pub async fn profile(&self, place: &Place) -> Result<Value> {
        let prompt = Self::build_prompt(place);
        let label = format!("vibe profile '{}'", place.name);
        let client = &self.client;
        let prompt = &prompt;

        let raw = self
            .retry
            .run(&label, |_| async move {
                Ok(Attempt::Done(client.complete(SYSTEM_PROMPT, prompt).await?))
            })
            .await?
            .unwrap_or_default();

        Ok(extract_json_object(&raw).unwrap_or_else(|| {
            tracing::warn!("Could not parse vibe profile for '{}'", place.name);
            json!({ "error": PARSE_FAILURE })
        }))
    }

    /// Profile a place in place, setting `vibe_profile` and `quality_score`
    pub async fn annotate(&self, place: &mut Place) -> Result<()> {
        let profile = self.profile(place).await?;
        apply_profile(place, profile);
        Ok(())
    }
}

/// Store a profile on the place and score its summary
pub fn apply_profile(place: &mut Place, profile: Value) {
    place.quality_score = summary_text(&profile).map(|s| quality_score(&s));
    place.vibe_profile = Some(profile);
}

/// Review excerpt shown on a vibe card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub source: ReviewSource,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// Display summary of a profiled place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibeCard {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub tags: Vec<String>,
    pub summary: String,
    pub persona: String,
    pub pro_tip: String,
    pub mood_emoji: String,
    pub citations: Vec<Citation>,
    pub quality_score: Option<f64>,
}

impl VibeCard {
    /// Card for a place whose profile has a summary
    pub fn from_place(place: &Place) -> Option<Self> {
        let profile = place.vibe_profile.as_ref()?;
        let summary = summary_text(profile)?;
        let text_field = |key: &str| {
            profile
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let tags = profile
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let is_cafe = place
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains("cafe"));

        Some(Self {
            name: place.name.clone(),
            address: place.address.clone(),
            rating: place.rating,
            coordinates: place.coordinates,
            tags,
            summary,
            persona: text_field("persona"),
            pro_tip: text_field("pro_tip"),
            mood_emoji: if is_cafe { CAFE_MOOD } else { DEFAULT_MOOD }.to_string(),
            citations: citations(place),
            quality_score: place
                .quality_score
                .or_else(|| profile.get("quality_score").and_then(Value::as_f64)),
        })
    }
}

/// First two google reviews, then the first comment of the first reddit
/// thread (filtered comments preferred)
pub fn citations(place: &Place) -> Vec<Citation> {
    let mut citations: Vec<Citation> = place
        .google_reviews
        .iter()
        .take(CARD_GOOGLE_CITATIONS)
        .map(|r| Citation {
            source: ReviewSource::Google,
            text: r.text.clone(),
            author: r.author.clone(),
            time: r.time.clone(),
        })
        .collect();

    let comment = place.reddit_comments.first().and_then(|thread| {
        thread
            .filtered_comments
            .first()
            .or_else(|| thread.all_comments.first())
    });
    if let Some(comment) = comment {
        citations.push(Citation {
            source: ReviewSource::Reddit,
            text: comment.text.clone(),
            author: None,
            time: None,
        });
    }
    citations
}

/// Cards for every profiled place, in file order
pub fn vibe_cards(places: &[Place]) -> Vec<VibeCard> {
    places.iter().filter_map(VibeCard::from_place).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;
    use crate::places::{GoogleReview, RedditComment, RedditThread};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMClient for Fixed {
        async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[1].content.clone());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn fixed(reply: &str) -> Arc<Fixed> {
        Arc::new(Fixed {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn cafe() -> Place {
        Place {
            name: "Pagdandi".to_string(),
            category: Some("cafe".to_string()),
            google_reviews: (0..10)
                .map(|i| GoogleReview {
                    text: format!("review {}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_quality_score() {
        assert_eq!(quality_score(""), 0.0);
        let full = "Cozy corners and books everywhere [1], great chai [2], however weekends get crowded fast.";
        assert_eq!(quality_score(full), 100.0);
        let two = "Cozy corners and books everywhere, great chai, but weekends get crowded fast.";
        assert!((quality_score(two) - 200.0 / 3.0).abs() < 1e-9);
        let opening = "Great chai [1] and books [2]. However, weekends get crowded and loud.";
        assert_eq!(quality_score(opening), 100.0);
    }

    #[test]
    fn test_prompt_limits_and_fallback() {
        let prompt = VibeProfiler::build_prompt(&cafe());
        assert!(prompt.contains("**Location**: Pagdandi | **Type**: cafe"));
        assert!(prompt.contains("review 7"));
        assert!(!prompt.contains("review 8"));
        assert!(prompt.contains(NO_REDDIT));

        let mut place = cafe();
        place.reddit_comments = vec![RedditThread {
            filtered_comments: vec![RedditComment {
                text: "best cold coffee".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }];
        let prompt = VibeProfiler::build_prompt(&place);
        assert!(prompt.contains("best cold coffee"));
        assert!(!prompt.contains(NO_REDDIT));
    }

    #[tokio::test]
    async fn test_annotate_sets_profile_and_score() {
        let llm = fixed(
            r#"```json
{"summary": "A calm reading cafe loved for its books [1] and chai [2] but seating is limited.",
 "tags": ["cozy"], "persona": "students", "pro_tip": "go early"}
```"#,
        );
        let mut place = cafe();
        VibeProfiler::new(llm).annotate(&mut place).await.unwrap();

        assert_eq!(place.vibe_profile.as_ref().unwrap()["persona"], "students");
        assert_eq!(place.quality_score, Some(100.0));
    }

    #[tokio::test]
    async fn test_unparseable_profile() {
        let mut place = cafe();
        VibeProfiler::new(fixed("It's a nice place."))
            .annotate(&mut place)
            .await
            .unwrap();
        assert_eq!(
            place.vibe_profile,
            Some(json!({ "error": "Could not parse vibe profile" }))
        );
        assert_eq!(place.quality_score, None);
    }

    fn profiled(mut place: Place, profile: Value) -> Place {
        apply_profile(&mut place, profile);
        place
    }

    #[test]
    fn test_citations_take_two_google_and_one_reddit() {
        let mut place = cafe();
        place.google_reviews[0].author = Some("Asha".to_string());
        place.reddit_comments = vec![
            RedditThread {
                all_comments: vec![RedditComment {
                    text: "unfiltered".to_string(),
                    ..Default::default()
                }],
                filtered_comments: vec![
                    RedditComment {
                        text: "filtered first".to_string(),
                        ..Default::default()
                    },
                    RedditComment {
                        text: "filtered second".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            RedditThread {
                filtered_comments: vec![RedditComment {
                    text: "other thread".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ];

        let cited = citations(&place);
        let texts: Vec<&str> = cited.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["review 0", "review 1", "filtered first"]);
        assert_eq!(cited[0].author.as_deref(), Some("Asha"));
        assert_eq!(cited[2].source, ReviewSource::Reddit);

        place.reddit_comments[0].filtered_comments.clear();
        assert_eq!(citations(&place)[2].text, "unfiltered");
    }

    #[test]
    fn test_cards_skip_places_without_summary() {
        let good = profiled(
            cafe(),
            json!({
                "summary": ["Books everywhere [1].", "Chai [2] but cramped."],
                "tags": ["cozy", 3, "bookish"],
                "persona": "students",
            }),
        );
        let broken = profiled(
            Place {
                name: "Broken".to_string(),
                ..cafe()
            },
            json!({ "error": "Could not parse vibe profile" }),
        );
        let unprofiled = Place {
            name: "Plain".to_string(),
            ..Default::default()
        };

        let cards = vibe_cards(&[broken, good, unprofiled]);
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.name, "Pagdandi");
        assert_eq!(card.summary, "Books everywhere [1].\n\nChai [2] but cramped.");
        assert_eq!(card.tags, vec!["cozy", "bookish"]);
        assert_eq!(card.persona, "students");
        assert_eq!(card.pro_tip, "");
        assert_eq!(card.mood_emoji, CAFE_MOOD);
        assert_eq!(card.citations.len(), 2);
        assert!(card.quality_score.is_some());
    }
}
