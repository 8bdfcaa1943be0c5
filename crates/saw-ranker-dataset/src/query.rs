use saw_ranker_core::Item;
use serde::Serialize;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

const CATEGORIES_FIELD: &str = "categories";
const SEARCH_FIELDS: [&str; 3] = ["name", "description", "author"];

/// Trimmed, non-empty entries of an item's comma-separated `categories`.
pub fn category_entries(item: &Item) -> impl Iterator<Item = &str> + '_ {
    item.text(CATEGORIES_FIELD)
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// The requested category is trimmed; matching is exact and case-sensitive.
pub fn in_category(item: &Item, category: Option<&str>) -> bool {
    match category.map(str::trim) {
        None | Some("" | ALL_CATEGORIES) => true,
        Some(wanted) => category_entries(item).any(|c| c == wanted),
    }
}

/// Case-insensitive substring match on name, description and author. The
/// term is trimmed first; inner whitespace is kept.
pub fn matches_search(item: &Item, term: Option<&str>) -> bool {
    let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
        return true;
    };
    let needle = term.to_lowercase();
    SEARCH_FIELDS
        .iter()
        .any(|field| item.text(field).to_lowercase().contains(&needle))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseQuery {
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Default for BrowseQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            category: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// `page` and `limit` below 1 are raised to 1.
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, categories: &str) -> Item {
        Item::new()
            .with("name", name)
            .with("categories", categories)
            .with("description", "Fast JSON parser")
            .with("author", "Jane Doe")
    }

    #[test]
    fn category_match_is_exact_per_entry() {
        let item = pkg("a", "web-framework, http ,cli");
        assert!(in_category(&item, Some("http")));
        assert!(in_category(&item, Some("cli")));
        assert!(!in_category(&item, Some("web")));
        assert!(!in_category(&pkg("b", ""), Some("web")));
    }

    #[test]
    fn all_and_blank_categories_do_not_filter() {
        let item = pkg("a", "");
        assert!(in_category(&item, None));
        assert!(in_category(&item, Some("all")));
        assert!(in_category(&item, Some("  ")));
    }

    #[test]
    fn requested_category_and_search_are_trimmed() {
        let item = pkg("serde-lite", "web-framework, http");
        assert!(in_category(&item, Some("  http ")));
        assert!(!in_category(&item, Some("HTTP")));
        assert!(matches_search(&item, Some("  json parser\t")));
        assert!(!matches_search(&item, Some(" json  parser ")));
    }

    #[test]
    fn search_covers_name_description_and_author() {
        let item = pkg("serde-lite", "");
        assert!(matches_search(&item, Some("SERDE")));
        assert!(matches_search(&item, Some("json")));
        assert!(matches_search(&item, Some("jane")));
        assert!(!matches_search(&item, Some("yaml")));
        assert!(matches_search(&item, Some("")));
        assert!(matches_search(&item, None));
    }

    #[test]
    fn pagination_metadata() {
        let p = Pagination::new(2, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.offset(), 10);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_next);

        let empty = Pagination::new(0, 0, 0);
        assert_eq!((empty.page, empty.limit, empty.total_pages), (1, 1, 0));
        assert!(!empty.has_next && !empty.has_prev);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(1, 50, 120)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "page": 1, "limit": 50, "total": 120,
                "totalPages": 3, "hasNext": true, "hasPrev": false
            })
        );
    }
}
