use serde::Serialize;
use tracing::debug;

use crate::coerce::{to_boolean, to_numeric};
use crate::criteria::{CriteriaRegistry, ValueKind};
use crate::error::RankError;
use crate::item::{Item, RawValue};
use crate::normalize::Normalizer;
use crate::weights::WeightMap;

/// Weighted contribution of one criterion to an item's score.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionScore {
    pub key: &'static str,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// A ranked item: the source fields, with criterion fields coerced to
/// numbers and flags, plus its score and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub score: f64,
    pub rank: usize,
    #[serde(skip)]
    pub breakdown: Vec<CriterionScore>,
}

impl ScoredItem {
    pub fn name(&self) -> &str {
        self.item.name().unwrap_or_default()
    }

    pub fn contribution(&self, key: &str) -> Option<&CriterionScore> {
        self.breakdown.iter().find(|c| c.key == key)
    }
}

/// Simple Additive Weighting over a fixed criteria registry.
#[derive(Debug, Clone, Default)]
pub struct SawRanker {
    registry: CriteriaRegistry,
}

impl SawRanker {
    pub fn new(registry: CriteriaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CriteriaRegistry {
        &self.registry
    }

    pub fn default_weights(&self) -> WeightMap {
        self.registry.default_weights()
    }

    /// Scores and ranks `items`.
    ///
    /// Weights are validated before any work is done. Items without a
    /// non-blank `name` are dropped. Criteria missing from `weights` weigh 0.
    /// Equal scores keep their input order and still get distinct ranks.
    pub fn rank(&self, items: &[Item], weights: &WeightMap) -> Result<Vec<ScoredItem>, RankError> {
        weights.validate()?;

        let candidates = items
            .iter()
            .filter(|item| item.name().is_some())
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            debug!(input = items.len(), "no rankable candidates");
            return Ok(Vec::new());
        }

        let normalizer = Normalizer::fit(&self.registry, &candidates);
        let mut results = candidates
            .iter()
            .map(|item| self.score_item(item, weights, &normalizer))
            .collect::<Vec<_>>();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        for (position, scored) in results.iter_mut().enumerate() {
            scored.rank = position + 1;
        }

        debug!(
            input = items.len(),
            ranked = results.len(),
            top_score = results.first().map(|r| r.score),
            "ranked candidate set"
        );
        Ok(results)
    }

    fn score_item(&self, item: &Item, weights: &WeightMap, normalizer: &Normalizer) -> ScoredItem {
        let mut breakdown = Vec::with_capacity(self.registry.len());
        let mut score = 0.0;
        for criterion in self.registry.iter() {
            let normalized = normalizer.normalized(criterion, item);
            let weight = weights.get(criterion.key);
            let contribution = normalized * weight;
            score += contribution;
            breakdown.push(CriterionScore {
                key: criterion.key,
                normalized,
                weight,
                contribution,
            });
        }

        ScoredItem {
            item: self.coerce_fields(item),
            score,
            rank: 0,
            breakdown,
        }
    }

    fn coerce_fields(&self, item: &Item) -> Item {
        let mut out = item.clone();
        out.remove("score");
        out.remove("rank");
        for criterion in self.registry.iter() {
            let raw = item.get(criterion.key);
            let typed = match criterion.kind {
                ValueKind::Continuous => RawValue::Number(to_numeric(raw)),
                ValueKind::Flag => RawValue::Bool(to_boolean(raw)),
            };
            out.insert(criterion.key, typed);
        }
        out
    }
}
