/// Reusable utilities for MongoDB pagination and sorting
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

impl PaginationParams {
    /// Get the page number (defaults to 1, minimum 1)
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get items per page (defaults to 10, min 1, max 100)
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    /// Calculate skip value for MongoDB, saturating for absurd page numbers
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Get sort order (1 for asc, -1 for desc)
    pub fn sort_direction(&self) -> i32 {
        match self.sort_type.as_deref() {
            Some("asc") => 1,
            _ => -1, // Default to descending
        }
    }

    /// Build MongoDB sort document
    ///
    /// # Arguments
    /// * `default_field` - Field used when `sortBy` is absent or not allowed
    /// * `allowed` - Fields clients may sort on
    pub fn build_sort_doc(&self, default_field: &str, allowed: &[&str]) -> Document {
        let requested = self.sort_by.as_deref().unwrap_or(default_field);
        let field = if allowed.contains(&requested) {
            requested
        } else {
            default_field
        };

        // Tie-break on _id so pages stay stable
        doc! { field: self.sort_direction(), "_id": self.sort_direction() }
    }

    /// Calculate total pages from total count
    pub fn calculate_total_pages(&self, total: u64) -> i64 {
        ((total as f64) / (self.limit() as f64)).ceil() as i64
    }
}

/// Response wrapper for paginated results
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, params: &PaginationParams) -> Self {
        Self {
            docs,
            total_docs,
            page: params.page(),
            limit: params.limit(),
            total_pages: params.calculate_total_pages(total_docs),
        }
    }
}
