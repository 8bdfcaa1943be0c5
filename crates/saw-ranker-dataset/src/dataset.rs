use std::fs::File;
use std::io::Read;
use std::path::Path;

use saw_ranker_core::{Item, RawValue, NAME_FIELD};

use crate::error::DatasetError;
use crate::query::{in_category, matches_search, BrowseQuery, Page, Pagination};
use crate::stats::Statistics;

/// The package records of one CSV file, in file order. Never written to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    items: Vec<Item>,
}

impl Dataset {
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut columns = Vec::new();
        for item in &items {
            for (field, _) in item.fields() {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.to_string());
                }
            }
        }
        Self { columns, items }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parses CSV with a header row. Blank lines are skipped and short rows
    /// leave their trailing fields absent. Every cell is kept as text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect::<Vec<_>>();
        if !columns.iter().any(|c| c == NAME_FIELD) {
            return Err(DatasetError::InvalidInput(format!(
                "header row has no `{NAME_FIELD}` column"
            )));
        }

        let mut items = Vec::new();
        for record in reader.records() {
            let record = record?;
            let item = columns
                .iter()
                .zip(record.iter())
                .filter(|(column, _)| !column.is_empty())
                .map(|(column, cell)| (column.clone(), RawValue::Text(cell.to_string())))
                .collect::<Item>();
            items.push(item);
        }

        Ok(Self { columns, items })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.text(NAME_FIELD) == name)
    }

    /// Items tagged with `category`; `None`, blank or `"all"` keeps everything.
    pub fn in_category(&self, category: Option<&str>) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| in_category(item, category))
            .cloned()
            .collect()
    }

    /// Sorted, de-duplicated category names across the dataset.
    pub fn categories(&self) -> Vec<String> {
        let mut out = self
            .items
            .iter()
            .flat_map(crate::query::category_entries)
            .map(str::to_string)
            .collect::<Vec<_>>();
        out.sort();
        out.dedup();
        out
    }

    /// Category filter, then text search, then name order, then one page.
    /// Names compare lowercased by code point, not by locale collation.
    pub fn browse(&self, query: &BrowseQuery) -> Page<Item> {
        let mut matched = self
            .items
            .iter()
            .filter(|item| in_category(item, query.category.as_deref()))
            .filter(|item| matches_search(item, query.search.as_deref()))
            .collect::<Vec<_>>();
        matched.sort_by_cached_key(|item| item.text(NAME_FIELD).to_lowercase());

        let pagination = Pagination::new(query.page, query.limit, matched.len());
        let data = matched
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit)
            .cloned()
            .collect();
        Page { data, pagination }
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(&self.items)
    }
}
