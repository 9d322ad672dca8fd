use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{AppError, AppResult};

/// Raw `page`/`limit` query parameters as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated page window. `limit` is already clamped to the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn from_query(query: &PageQuery, config: &PaginationConfig) -> AppResult<Self> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(config.default_limit as i64);
        if page < 1 {
            return Err(AppError::Validation("page must be a positive integer".to_string()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must be a positive integer".to_string()));
        }
        let limit = limit.min(config.max_limit.max(1) as i64);
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::Validation("page is out of range".to_string()));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn info(&self, total: i64) -> PageInfo {
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_limit: 10,
            max_limit: 50,
        }
    }

    #[test]
    fn test_defaults_and_clamp() {
        let page = Page::from_query(&PageQuery::default(), &config()).unwrap();
        assert_eq!(page, Page::new(1, 10));

        let query = PageQuery {
            page: Some(3),
            limit: Some(10_000),
        };
        let page = Page::from_query(&query, &config()).unwrap();
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset(), 100);
    }

    #[test]
    fn test_rejects_non_positive() {
        let query = PageQuery {
            page: Some(0),
            limit: None,
        };
        assert!(Page::from_query(&query, &config()).is_err());

        let query = PageQuery {
            page: None,
            limit: Some(-5),
        };
        assert!(Page::from_query(&query, &config()).is_err());
    }

    #[test]
    fn test_rejects_page_past_offset_range() {
        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(2),
        };
        let err = Page::from_query(&query, &config()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(1),
        };
        let page = Page::from_query(&query, &config()).unwrap();
        assert_eq!(page.offset(), i64::MAX - 1);
    }

    #[test]
    fn test_zero_max_limit_still_yields_one_row_pages() {
        let config = PaginationConfig {
            default_limit: 10,
            max_limit: 0,
        };
        let page = Page::from_query(&PageQuery::default(), &config).unwrap();
        assert_eq!(page.limit, 1);
        assert_eq!(page.info(3).pages, 3);
    }

    #[test]
    fn test_page_count() {
        let page = Page::new(1, 10);
        assert_eq!(page.info(0).pages, 0);
        assert_eq!(page.info(10).pages, 1);
        assert_eq!(page.info(11).pages, 2);
    }
}
