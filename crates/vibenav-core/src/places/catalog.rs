//! Place file loading, id assignment and lookup

use super::Place;
use crate::error::{Result, VibeError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Length of the hex place id
const PLACE_ID_LEN: usize = 16;

/// Stable synthetic id for a place, derived from name, address and place id
pub fn place_id_for(place: &Place) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(place.name.trim().to_lowercase().as_bytes());
    hasher.update(b"\0");
    hasher.update(place.address.as_deref().unwrap_or_default().as_bytes());
    hasher.update(b"\0");
    hasher.update(place.source_url.as_deref().unwrap_or_default().as_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..PLACE_ID_LEN].to_string()
}

/// Give every place without an id a synthetic one.
///
/// Identical (name, address, source_url) triples get a numeric suffix so ids
/// stay unique within one file.
pub fn assign_ids(places: &mut [Place]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for place in places.iter_mut() {
        if place.id.is_empty() {
            place.id = place_id_for(place);
        }
        let count = seen.entry(place.id.clone()).or_insert(0);
        if *count > 0 {
            tracing::warn!(
                "Duplicate place '{}' (id {}), disambiguating",
                place.name,
                place.id
            );
            place.id = format!("{}-{}", place.id, count);
        }
        *count += 1;
    }
}

/// Read a JSON array of places and assign ids
pub fn load_places(path: &Path) -> Result<Vec<Place>> {
    if !path.exists() {
        return Err(VibeError::DataNotFound(format!(
            "{} (run the scraper first)",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let mut places: Vec<Place> = serde_json::from_str(&content)?;
    assign_ids(&mut places);
    tracing::info!("Loaded {} places from {}", places.len(), path.display());
    Ok(places)
}

/// Write places as pretty JSON
pub fn save_places(path: &Path, places: &[Place]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(places)?;
    std::fs::write(path, content)?;
    Ok(())
}

const TAGGED_SUFFIX: &str = "_tagged";

/// `foo/gym_pune_combined.json` -> `foo/gym_pune_combined_tagged.json`.
/// A file that is already tagged maps to itself.
pub fn tagged_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "places".to_string());
    let stem = stem.strip_suffix(TAGGED_SUFFIX).unwrap_or(&stem);
    input.with_file_name(format!("{}{}.json", stem, TAGGED_SUFFIX))
}

/// In-memory id -> place mapping used to resolve routed chunks
#[derive(Debug, Clone, Default)]
pub struct PlaceCatalog {
    places: Vec<Place>,
    by_id: HashMap<String, usize>,
}

impl PlaceCatalog {
    pub fn new(mut places: Vec<Place>) -> Self {
        assign_ids(&mut places);
        let by_id = places
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        Self { places, by_id }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(load_places(path)?))
    }

    pub fn get(&self, id: &str) -> Option<&Place> {
        self.by_id.get(id).map(|&i| &self.places[i])
    }

    /// Case-insensitive lookup by display name (first match)
    pub fn find_by_name(&self, name: &str) -> Option<&Place> {
        let wanted = name.trim().to_lowercase();
        self.places
            .iter()
            .find(|p| p.name.trim().to_lowercase() == wanted)
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, address: &str) -> Place {
        Place {
            name: name.to_string(),
            address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_ids_are_stable() {
        let a = place("Cafe Goodluck", "FC Road");
        assert_eq!(place_id_for(&a), place_id_for(&a.clone()));
        assert_eq!(place_id_for(&a).len(), PLACE_ID_LEN);
        assert_ne!(place_id_for(&a), place_id_for(&place("Cafe Goodluck", "JM Road")));
    }

    #[test]
    fn test_duplicate_names_get_distinct_ids() {
        let mut places = vec![
            place("Starbucks", "Baner"),
            place("Starbucks", "Baner"),
            place("Starbucks", "Aundh"),
        ];
        assign_ids(&mut places);
        assert_ne!(places[0].id, places[1].id);
        assert_ne!(places[0].id, places[2].id);
        assert!(places[1].id.ends_with("-1"));
    }

    #[test]
    fn test_existing_id_kept() {
        let mut places = vec![Place {
            id: "custom".to_string(),
            ..place("X", "Y")
        }];
        assign_ids(&mut places);
        assert_eq!(places[0].id, "custom");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = PlaceCatalog::new(vec![place("Blue Tokai", "Koregaon Park")]);
        let id = catalog.places()[0].id.clone();
        assert_eq!(catalog.get(&id).unwrap().name, "Blue Tokai");
        assert!(catalog.find_by_name("  blue tokai ").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_places(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, VibeError::DataNotFound(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cafe_pune_combined.json");
        save_places(&path, &[place("Vohuman", "Sassoon Road")]).unwrap();
        let loaded = load_places(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].id.is_empty());
    }

    #[test]
    fn test_tagged_path() {
        assert_eq!(
            tagged_path(Path::new("data/gym_pune_combined.json")),
            PathBuf::from("data/gym_pune_combined_tagged.json")
        );
        assert_eq!(
            tagged_path(Path::new("data/gym_pune_combined_tagged.json")),
            PathBuf::from("data/gym_pune_combined_tagged.json")
        );
    }
}
