//! Routing a question to the single best-matching place

use super::{filter_by_tags, normalize_tags, PlaceSelection};
use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::index::{SearchHit, VectorIndex};
use crate::llm::Embedder;
use crate::places::{Place, PlaceCatalog};

/// Retrieved chunks belonging to one place
#[derive(Debug, Clone)]
pub struct PlaceGroup {
    pub place_id: String,
    /// Place name as recorded on the chunks
    pub source: String,
    pub hits: Vec<SearchHit>,
}

impl PlaceGroup {
    pub fn max_score(&self) -> f32 {
        self.hits
            .iter()
            .map(|h| h.score)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn sum_score(&self) -> f32 {
        self.hits.iter().map(|h| h.score).sum()
    }
}

/// Result of routing a query
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Routed { place: Place, chunks: Vec<SearchHit> },
    /// Nothing survived retrieval and the tag filter
    NoRelevantPlaces,
    /// A place was selected but is missing from the catalog
    DetailsNotFound(String),
}

/// Group hits by place id, groups in order of first appearance
pub fn group_by_place(hits: Vec<SearchHit>) -> Vec<PlaceGroup> {
    let mut groups: Vec<PlaceGroup> = Vec::new();
    for hit in hits {
        match groups
            .iter_mut()
            .find(|g| g.place_id == hit.document.metadata.place_id)
        {
            Some(group) => group.hits.push(hit),
            None => groups.push(PlaceGroup {
                place_id: hit.document.metadata.place_id.clone(),
                source: hit.document.metadata.source.clone(),
                hits: vec![hit],
            }),
        }
    }
    groups
}

/// Pick one group. Ties go to the group retrieved first.
pub fn select_group(groups: Vec<PlaceGroup>, selection: PlaceSelection) -> Option<PlaceGroup> {
    let score = |g: &PlaceGroup| match selection {
        PlaceSelection::RetrievalOrder => 0.0,
        PlaceSelection::MaxScore => g.max_score(),
        PlaceSelection::SumScore => g.sum_score(),
    };

    let mut best: Option<(f32, PlaceGroup)> = None;
    for group in groups {
        let s = score(&group);
        match best {
            Some((best_score, _)) if s <= best_score => {}
            _ => best = Some((s, group)),
        }
    }
    best.map(|(_, g)| g)
}

/// Retrieves, filters, groups and selects
#[derive(Debug, Clone, Copy)]
pub struct QueryRouter {
    top_k: usize,
    selection: PlaceSelection,
}

impl QueryRouter {
    pub fn new(top_k: usize, selection: PlaceSelection) -> Self {
        Self { top_k, selection }
    }

    pub fn from_config(retrieval: &RetrievalConfig) -> Self {
        Self::new(retrieval.top_k, retrieval.selection)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Route already-retrieved hits
    pub fn route_hits(
        &self,
        hits: Vec<SearchHit>,
        required_tags: &[String],
        catalog: &PlaceCatalog,
    ) -> RouteOutcome {
        let hits = filter_by_tags(hits, required_tags);
        if hits.is_empty() {
            tracing::info!(
                "No chunks matched tags {:?}",
                normalize_tags(required_tags)
            );
            return RouteOutcome::NoRelevantPlaces;
        }

        let groups = group_by_place(hits);
        tracing::debug!("{} candidate places", groups.len());

        let Some(group) = select_group(groups, self.selection) else {
            return RouteOutcome::NoRelevantPlaces;
        };

        match catalog.get(&group.place_id) {
            Some(place) => RouteOutcome::Routed {
                place: place.clone(),
                chunks: group.hits,
            },
            None => {
                tracing::warn!("Place '{}' ({}) not in catalog", group.source, group.place_id);
                RouteOutcome::DetailsNotFound(group.source)
            }
        }
    }

    /// Retrieve the top-k chunks for `query` and route them
    pub async fn route(
        &self,
        index: &VectorIndex,
        catalog: &PlaceCatalog,
        embedder: &dyn Embedder,
        query: &str,
        required_tags: &[String],
    ) -> Result<RouteOutcome> {
        let hits = index.similarity_search(embedder, query, self.top_k).await?;
        Ok(self.route_hits(hits, required_tags, catalog))
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}
