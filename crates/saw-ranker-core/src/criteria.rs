use std::collections::HashSet;

use serde::Serialize;

use crate::error::RankError;
use crate::weights::WeightMap;

/// Direction in which a criterion's raw value improves the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Higher raw value is better.
    Benefit,
    /// Lower raw value is better.
    Cost,
}

/// How a criterion's raw value is read before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Numeric value, min-max normalized over the candidate set.
    Continuous,
    /// Capability flag, mapped straight to 1.0 / 0.0.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub key: &'static str,
    pub display_name: &'static str,
    pub polarity: Polarity,
    pub kind: ValueKind,
    pub default_weight: f64,
}

impl Criterion {
    pub const fn benefit(key: &'static str, display_name: &'static str, weight: f64) -> Self {
        Self {
            key,
            display_name,
            polarity: Polarity::Benefit,
            kind: ValueKind::Continuous,
            default_weight: weight,
        }
    }

    pub const fn cost(key: &'static str, display_name: &'static str, weight: f64) -> Self {
        Self {
            key,
            display_name,
            polarity: Polarity::Cost,
            kind: ValueKind::Continuous,
            default_weight: weight,
        }
    }

    pub const fn flag(key: &'static str, display_name: &'static str, weight: f64) -> Self {
        Self {
            key,
            display_name,
            polarity: Polarity::Benefit,
            kind: ValueKind::Flag,
            default_weight: weight,
        }
    }
}

static STANDARD_CRITERIA: [Criterion; 8] = [
    Criterion::benefit("downloads_last_month", "Monthly downloads", 0.20),
    Criterion::benefit("github_stars", "GitHub stars", 0.15),
    Criterion::benefit("github_forks", "GitHub forks", 0.15),
    Criterion::benefit("documentation_score", "Documentation score", 0.15),
    Criterion::benefit("activity_score", "Activity score", 0.15),
    Criterion::benefit("releases_per_year", "Releases per year", 0.10),
    Criterion::flag("has_tests", "Has tests", 0.05),
    Criterion::flag("has_ci", "Has CI", 0.05),
];

/// Ordered, immutable set of criteria. Built once and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaRegistry {
    criteria: Vec<Criterion>,
}

impl CriteriaRegistry {
    pub fn new(criteria: Vec<Criterion>) -> Result<Self, RankError> {
        let mut seen = HashSet::with_capacity(criteria.len());
        for criterion in &criteria {
            if !seen.insert(criterion.key) {
                return Err(RankError::DuplicateCriterion(criterion.key.to_string()));
            }
        }
        Ok(Self { criteria })
    }

    /// The eight package-quality criteria whose default weights sum to 1.0.
    pub fn standard() -> Self {
        Self {
            criteria: STANDARD_CRITERIA.to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.criteria.iter().map(|c| c.key)
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn default_weights(&self) -> WeightMap {
        self.criteria
            .iter()
            .map(|c| (c.key, c.default_weight))
            .collect()
    }
}

impl Default for CriteriaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_eight_ordered_criteria() {
        let registry = CriteriaRegistry::standard();
        let keys = registry.keys().collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "downloads_last_month",
                "github_stars",
                "github_forks",
                "documentation_score",
                "activity_score",
                "releases_per_year",
                "has_tests",
                "has_ci",
            ]
        );
        assert!(registry.iter().all(|c| c.polarity == Polarity::Benefit));
    }

    #[test]
    fn only_capability_keys_are_flags() {
        let registry = CriteriaRegistry::standard();
        let flags = registry
            .iter()
            .filter(|c| c.kind == ValueKind::Flag)
            .map(|c| c.key)
            .collect::<Vec<_>>();
        assert_eq!(flags, vec!["has_tests", "has_ci"]);
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = CriteriaRegistry::standard().default_weights();
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!((weights.get("downloads_last_month") - 0.20).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = CriteriaRegistry::new(vec![
            Criterion::benefit("stars", "Stars", 0.5),
            Criterion::cost("stars", "Stars again", 0.5),
        ])
        .expect_err("duplicate key");
        assert_eq!(err, RankError::DuplicateCriterion("stars".to_string()));
    }

    #[test]
    fn criterion_serializes_for_clients() {
        let registry = CriteriaRegistry::standard();
        let json = serde_json::to_value(registry.get("has_ci")).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "key": "has_ci",
                "displayName": "Has CI",
                "polarity": "benefit",
                "kind": "flag",
                "defaultWeight": 0.05
            })
        );
    }
}
