use std::collections::HashMap;

use crate::coerce::{to_boolean, to_numeric};
use crate::criteria::{CriteriaRegistry, Criterion, Polarity, ValueKind};
use crate::item::Item;

/// Observed range of one continuous criterion over a candidate set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Range of `values`, or `None` when there are none.
    pub fn scan(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(r) => Some(Self {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Min-max normalization of a continuous value.
///
/// A degenerate range (`max == min`) maps every value to `1.0`: when the
/// candidate set does not vary on a criterion, all items are equally maximal.
/// Ranges wider than `f64::MAX` are measured on halved operands.
pub fn normalize(value: f64, polarity: Polarity, range: MinMax) -> f64 {
    if range.is_degenerate() {
        return 1.0;
    }
    let scale = if (range.max - range.min).is_finite() {
        1.0
    } else {
        0.5
    };
    let (value, min, max) = (value * scale, range.min * scale, range.max * scale);
    let offset = match polarity {
        Polarity::Benefit => value - min,
        Polarity::Cost => max - value,
    };
    (offset / (max - min)).clamp(0.0, 1.0)
}

pub fn normalize_flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Per-criterion ranges fitted once over a candidate set. Scoped to one
/// ranking call.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    ranges: HashMap<&'static str, MinMax>,
}

impl Normalizer {
    pub fn fit(registry: &CriteriaRegistry, items: &[&Item]) -> Self {
        let ranges = registry
            .iter()
            .filter(|c| c.kind == ValueKind::Continuous)
            .filter_map(|c| {
                MinMax::scan(items.iter().map(|item| to_numeric(item.get(c.key))))
                    .map(|range| (c.key, range))
            })
            .collect();
        Self { ranges }
    }

    pub fn range(&self, key: &str) -> Option<MinMax> {
        self.ranges.get(key).copied()
    }

    /// Normalized value of `item` on `criterion`, in `[0, 1]`.
    pub fn normalized(&self, criterion: &Criterion, item: &Item) -> f64 {
        let raw = item.get(criterion.key);
        match criterion.kind {
            ValueKind::Flag => normalize_flag(to_boolean(raw)),
            ValueKind::Continuous => {
                let value = to_numeric(raw);
                let range = self.range(criterion.key).unwrap_or(MinMax {
                    min: value,
                    max: value,
                });
                normalize(value, criterion.polarity, range)
            }
        }
    }
}
