//! Previously confirmed film to scene pairings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneSyncError};

/// A confirmed pairing for one film photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub scene_photo: String,
    pub prior_score: f64,
}

/// Read-only lookup of confirmed pairings, keyed by film photo.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: BTreeMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a confirmed pairing.
    ///
    /// Re-adding the same pairing is a no-op; a different scene photo for a
    /// film photo already present is an error.
    pub fn insert(
        &mut self,
        film_photo: impl Into<String>,
        scene_photo: impl Into<String>,
        prior_score: f64,
    ) -> Result<()> {
        let film_photo = film_photo.into();
        let scene_photo = scene_photo.into();

        if !(0.0..=1.0).contains(&prior_score) {
            return Err(SceneSyncError::Store(format!(
                "reference score for {film_photo} must be in [0, 1], got {prior_score}"
            )));
        }

        if let Some(existing) = self.entries.get(&film_photo) {
            if existing.scene_photo != scene_photo {
                return Err(SceneSyncError::Store(format!(
                    "conflicting reference entries for {film_photo}: {} and {scene_photo}",
                    existing.scene_photo
                )));
            }
            return Ok(());
        }

        self.entries.insert(
            film_photo,
            ReferenceEntry {
                scene_photo,
                prior_score,
            },
        );
        Ok(())
    }

    pub fn get(&self, film_photo: &str) -> Option<&ReferenceEntry> {
        self.entries.get(film_photo)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by film photo.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = ReferenceTable::new();
        table.insert("f1.jpg", "s1.jpg", 0.9).unwrap();
        let entry = table.get("f1.jpg").unwrap();
        assert_eq!(entry.scene_photo, "s1.jpg");
        assert_eq!(entry.prior_score, 0.9);
        assert!(table.get("f2.jpg").is_none());
    }

    #[test]
    fn test_duplicate_same_pairing_is_noop() {
        let mut table = ReferenceTable::new();
        table.insert("f1.jpg", "s1.jpg", 0.9).unwrap();
        table.insert("f1.jpg", "s1.jpg", 0.8).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("f1.jpg").unwrap().prior_score, 0.9);
    }

    #[test]
    fn test_conflicting_pairing_rejected() {
        let mut table = ReferenceTable::new();
        table.insert("f1.jpg", "s1.jpg", 0.9).unwrap();
        let err = table.insert("f1.jpg", "s2.jpg", 0.9).unwrap_err();
        assert!(err.to_string().contains("conflicting"));
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let mut table = ReferenceTable::new();
        assert!(table.insert("f1.jpg", "s1.jpg", 1.5).is_err());
        assert!(table.insert("f1.jpg", "s1.jpg", f64::NAN).is_err());
        assert!(table.is_empty());
    }
}
