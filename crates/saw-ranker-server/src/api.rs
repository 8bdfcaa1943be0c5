//! JSON request and envelope types for the `/api` routes.

use saw_ranker_core::{CriteriaRegistry, Criterion, ScoredItem, WeightMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `POST /api/calculate`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub weights: Option<WeightMap>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CalculateRequest {
    /// An empty body counts as `{}`.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse<'a> {
    pub success: bool,
    pub results: &'a [ScoredItem],
    pub total: usize,
}

impl<'a> CalculateResponse<'a> {
    pub fn new(results: &'a [ScoredItem]) -> Self {
        Self {
            success: true,
            results,
            total: results.len(),
        }
    }
}

pub fn criteria_body(registry: &CriteriaRegistry) -> Value {
    let criteria = registry.iter().collect::<Vec<&Criterion>>();
    json!({ "success": true, "criteria": criteria })
}

pub fn success(field: &str, value: Value) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(field.to_string(), value);
    Value::Object(body)
}

pub fn failure(message: impl Into<String>) -> Value {
    json!({ "success": false, "error": message.into() })
}
