use thiserror::Error;

use crate::weights::WEIGHT_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("total weight must equal 1.0 (±{tol}); current total: {total}", tol = WEIGHT_TOLERANCE)]
    InvalidWeights { total: f64 },

    #[error("weight for {key} must not be negative; got {weight}")]
    NegativeWeight { key: String, weight: f64 },

    #[error("duplicate criterion key: {0}")]
    DuplicateCriterion(String),
}
