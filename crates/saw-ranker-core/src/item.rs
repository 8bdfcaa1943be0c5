use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field holding the identifying package name.
pub const NAME_FIELD: &str = "name";

/// A single cell of a package record, as it came out of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One package record: field name to raw value. Missing fields read as
/// [`RawValue::Absent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    fields: BTreeMap<String, RawValue>,
}

static ABSENT: RawValue = RawValue::Absent;

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<RawValue> {
        self.fields.remove(field)
    }

    pub fn get(&self, field: &str) -> &RawValue {
        self.fields.get(field).unwrap_or(&ABSENT)
    }

    /// Text value of a field, or `""` when the field is absent or not text.
    pub fn text(&self, field: &str) -> &str {
        self.get(field).as_text().unwrap_or("")
    }

    pub fn name(&self) -> Option<&str> {
        match self.get(NAME_FIELD) {
            RawValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for Item {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
