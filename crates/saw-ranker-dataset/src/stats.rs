//! Descriptive aggregates over the whole dataset.

use std::collections::HashMap;

use saw_ranker_core::{to_boolean, to_numeric, Item, NAME_FIELD};
use serde::Serialize;

use crate::query::category_entries;

const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub downloads: f64,
    pub stars: f64,
    pub forks: f64,
    pub doc_score: f64,
    pub activity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    pub with_tests: usize,
    #[serde(rename = "withCI")]
    pub with_ci: usize,
    pub with_vulnerabilities: usize,
    pub without_vulnerabilities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_packages: usize,
    pub averages: Averages,
    pub quality: Quality,
    pub top_categories: Vec<NamedCount>,
    pub top_licenses: Vec<NamedCount>,
    pub top_languages: Vec<NamedCount>,
    pub top_downloads: Vec<NamedValue>,
    pub top_stars: Vec<NamedValue>,
    pub top_activity: Vec<NamedValue>,
}

impl Statistics {
    pub fn compute(items: &[Item]) -> Self {
        let total_packages = items.len();
        let flag_count = |key: &str| items.iter().filter(|i| to_boolean(i.get(key))).count();
        let with_vulnerabilities = flag_count("has_vulnerabilities");

        Self {
            total_packages,
            averages: Averages {
                downloads: average(items, "downloads_last_month"),
                stars: average(items, "github_stars"),
                forks: average(items, "github_forks"),
                doc_score: average(items, "documentation_score"),
                activity_score: average(items, "activity_score"),
            },
            quality: Quality {
                with_tests: flag_count("has_tests"),
                with_ci: flag_count("has_ci"),
                with_vulnerabilities,
                without_vulnerabilities: total_packages - with_vulnerabilities,
            },
            top_categories: top_counts(items.iter().flat_map(category_entries)),
            top_licenses: top_counts(single_values(items, "license")),
            top_languages: top_counts(single_values(items, "github_language")),
            top_downloads: top_values(items, "downloads_last_month"),
            top_stars: top_values(items, "github_stars"),
            top_activity: top_values(items, "activity_score"),
        }
    }
}

/// Mean of a numeric field; 0 for an empty dataset.
#[allow(clippy::cast_precision_loss)]
fn average(items: &[Item], key: &str) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let sum: f64 = items.iter().map(|i| to_numeric(i.get(key))).sum();
    sum / items.len() as f64
}

fn single_values<'a>(items: &'a [Item], key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    items
        .iter()
        .map(move |i| i.text(key).trim())
        .filter(|v| !v.is_empty())
}

/// Ten most frequent values, most frequent first; equal counts by name.
fn top_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut pairs = counts.into_iter().collect::<Vec<_>>();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
        .into_iter()
        .take(TOP_N)
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

/// Ten packages with the highest value of `key`; ties keep dataset order.
fn top_values(items: &[Item], key: &str) -> Vec<NamedValue> {
    let mut values = items
        .iter()
        .map(|i| NamedValue {
            name: i.text(NAME_FIELD).to_string(),
            value: to_numeric(i.get(key)),
        })
        .collect::<Vec<_>>();
    values.sort_by(|a, b| b.value.total_cmp(&a.value));
    values.truncate(TOP_N);
    values
}
