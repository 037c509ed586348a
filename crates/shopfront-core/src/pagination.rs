//! Page-based pagination for search endpoints.
//!
//! Uses `page` and `limit` query parameters:
//! - `page`: Page number (1-indexed, default: 1)
//! - `limit`: Items per page (1-100, default: 10)
//!
//! The number of skipped rows is `(page - 1) * limit`.
//!
//! # Example
//!
//! ```ignore
//! // GET /api/products/search?name=phone&page=2&limit=5
//! let params = PageParams { page: Some(2), limit: Some(5) };
//!
//! assert_eq!(params.page(), 2);
//! assert_eq!(params.limit(), 5);
//! assert_eq!(params.skip(), 5);
//! ```

use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Deserializes an optional string into an optional i64.
///
/// Query parameters may arrive as empty strings (`?page=`), which are
/// treated as `None`.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Query parameters for page-based pagination.
///
/// - `page` is clamped to a minimum of 1
/// - `limit` is clamped to the range [1, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ToSchema)]
pub struct PageParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: Some(DEFAULT_PAGE),
            limit: Some(DEFAULT_LIMIT),
        }
    }
}

impl PageParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Returns the effective page, never below 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Returns the effective limit, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of rows to skip before the requested page. Saturates at
    /// `i64::MAX` for absurdly large pages.
    #[must_use]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_default() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.skip(), 0);
    }

    #[test]
    fn test_page_params_none_values() {
        let params = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_skip_for_second_page() {
        let params = PageParams::new(2, 5);
        assert_eq!(params.skip(), 5);
    }

    #[test]
    fn test_skip_saturates_for_huge_page() {
        assert_eq!(PageParams::new(i64::MAX, 100).skip(), i64::MAX);
        assert_eq!(PageParams::new(i64::MAX, 1).skip(), i64::MAX - 1);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(PageParams::new(1, 0).limit(), 1);
        assert_eq!(PageParams::new(1, -3).limit(), 1);
        assert_eq!(PageParams::new(1, 500).limit(), 100);
        assert_eq!(PageParams::new(1, 100).limit(), 100);
    }

    #[test]
    fn test_page_clamped() {
        let params = PageParams::new(0, 10);
        assert_eq!(params.page(), 1);
        assert_eq!(params.skip(), 0);

        let params = PageParams::new(-4, 10);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn test_deserialize_empty_strings_as_defaults() {
        let params: PageParams = serde_json::from_str(r#"{"page":"","limit":""}"#).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_deserialize_numeric_strings() {
        let params: PageParams = serde_json::from_str(r#"{"page":"3","limit":"20"}"#).unwrap();
        assert_eq!(params.page(), 3);
        assert_eq!(params.limit(), 20);
        assert_eq!(params.skip(), 40);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result: Result<PageParams, _> = serde_json::from_str(r#"{"page":"two"}"#);
        assert!(result.is_err());
    }
}
