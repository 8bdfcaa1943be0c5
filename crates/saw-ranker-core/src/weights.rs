use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// Allowed deviation of a weight map's total from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Criterion key to non-negative weight. Keys that match no criterion still
/// count toward the total but contribute nothing to a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap {
    weights: BTreeMap<String, f64>,
}

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.insert(key, weight);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, weight: f64) {
        self.weights.insert(key.into(), weight);
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.weights.remove(key)
    }

    /// Weight for `key`; a key that is not in the map weighs 0.
    pub fn get(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Rejects negative weights, then checks the total against 1.0 within
    /// [`WEIGHT_TOLERANCE`]. Never rescales.
    pub fn validate(&self) -> Result<(), RankError> {
        if let Some((key, weight)) = self.iter().find(|(_, w)| *w < 0.0) {
            return Err(RankError::NegativeWeight {
                key: key.to_string(),
                weight,
            });
        }
        let total = self.total();
        if !total.is_finite() || (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RankError::InvalidWeights { total });
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for WeightMap {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_within_tolerance_is_valid() {
        let weights = WeightMap::new().with("a", 0.5).with("b", 0.495);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn total_outside_tolerance_reports_the_sum() {
        let weights = WeightMap::new().with("a", 0.6).with("b", 0.6);
        match weights.validate() {
            Err(RankError::InvalidWeights { total }) => assert!((total - 1.2).abs() < 1e-9),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn nan_total_is_invalid() {
        let weights = WeightMap::new().with("a", f64::NAN);
        assert!(weights.validate().is_err());
    }

    #[test]
    fn empty_map_is_invalid() {
        assert!(matches!(
            WeightMap::new().validate(),
            Err(RankError::InvalidWeights { total }) if total == 0.0
        ));
    }

    #[test]
    fn negative_weight_is_rejected_even_when_total_is_one() {
        let weights = WeightMap::new()
            .with("github_stars", 1.2)
            .with("has_ci", -0.2);
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert_eq!(
            weights.validate(),
            Err(RankError::NegativeWeight {
                key: "has_ci".to_string(),
                weight: -0.2
            })
        );
    }

    #[test]
    fn zero_weights_are_allowed() {
        let weights = WeightMap::new().with("github_stars", 1.0).with("has_ci", 0.0);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn missing_key_weighs_zero() {
        let weights = WeightMap::new().with("a", 1.0);
        assert_eq!(weights.get("b"), 0.0);
        assert!(!weights.contains("b"));
    }

    #[test]
    fn deserializes_from_plain_json_object() {
        let weights: WeightMap =
            serde_json::from_str(r#"{"github_stars":0.4,"has_ci":0.6}"#).expect("parse");
        assert!((weights.get("has_ci") - 0.6).abs() < f64::EPSILON);
        assert!(weights.validate().is_ok());
    }
}
