//! Public model catalog types and browse filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A shared catalog asset, distinct from a user-owned upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicModelMetadata {
    pub id: String,
    pub filename: String,
    pub storage_path: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
    /// Size in bytes
    #[serde(default, rename = "size")]
    pub size_bytes: u64,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Fields an admin can edit on a catalog entry
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicModelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Category and tag vocabulary, fetched once and cached
///
/// Categories may be extended locally when a user types a new value in a
/// form; the extension is not persisted until the containing entity is
/// saved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryIndex {
    /// Category name -> sub-category names
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Grouping key -> tag strings
    #[serde(default)]
    pub tag_groups: BTreeMap<String, Vec<String>>,
}

impl CategoryIndex {
    /// Add a category (and optionally a sub-category) typed into a form
    pub fn extend_category(&mut self, category: &str, sub_category: Option<&str>) {
        let subs = self.categories.entry(category.to_string()).or_default();
        if let Some(sub) = sub_category {
            if !subs.iter().any(|s| s == sub) {
                subs.push(sub.to_string());
                subs.sort();
            }
        }
    }

    pub fn sub_categories_of(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .tag_groups
            .values()
            .flat_map(|v| v.iter().map(|s| s.as_str()))
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Browse state for the public catalog list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            category: None,
            sub_category: None,
            tag: None,
            search: None,
            page: 1,
            page_size: 24,
        }
    }
}

impl CatalogFilter {
    /// Select a category. Clears any sub-category and rewinds to page 1.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
        self.sub_category = None;
        self.page = 1;
    }

    pub fn set_sub_category(&mut self, sub_category: Option<String>) {
        self.sub_category = sub_category;
        self.page = 1;
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: String) {
        self.search = if search.is_empty() { None } else { Some(search) };
        self.page = 1;
    }

    /// Query parameters for the list endpoint
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(ref c) = self.category {
            params.push(("category", c.clone()));
        }
        if let Some(ref s) = self.sub_category {
            params.push(("subCategory", s.clone()));
        }
        if let Some(ref t) = self.tag {
            params.push(("tag", t.clone()));
        }
        if let Some(ref q) = self.search {
            params.push(("q", q.clone()));
        }
        params
    }
}

/// Paged list response from the catalog endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicModelPage {
    #[serde(default)]
    pub items: Vec<PublicModelMetadata>,
    #[serde(default)]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_change_resets_sub_and_page() {
        let mut filter = CatalogFilter::default();
        filter.set_category(Some("buildings".to_string()));
        filter.set_sub_category(Some("residential".to_string()));
        filter.page = 4;

        filter.set_category(Some("vegetation".to_string()));
        assert_eq!(filter.category.as_deref(), Some("vegetation"));
        assert_eq!(filter.sub_category, None);
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn test_query_params_include_active_filters() {
        let mut filter = CatalogFilter::default();
        filter.set_category(Some("buildings".to_string()));
        filter.set_search("tower".to_string());
        let params = filter.to_query();
        assert!(params.contains(&("category", "buildings".to_string())));
        assert!(params.contains(&("q", "tower".to_string())));
        assert!(params.contains(&("page", "1".to_string())));
    }

    #[test]
    fn test_extend_category_is_idempotent() {
        let mut index = CategoryIndex::default();
        index.extend_category("props", Some("street"));
        index.extend_category("props", Some("street"));
        index.extend_category("props", Some("park"));
        assert_eq!(index.sub_categories_of("props"), ["park", "street"]);
    }
}
