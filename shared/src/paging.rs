//! Paging request and response types
//!
//! List endpoints never reject a bad paging request: anything out of range
//! falls back to the first page with the default page size.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_QUERY_LEN: usize = 255;
/// Query length kept when the request falls back to defaults
pub const FALLBACK_QUERY_LEN: usize = 199;

/// Validated paging parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Page number (starting at 1)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Free-text filter (name substring)
    #[serde(default)]
    pub query: String,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            query: String::new(),
        }
    }
}

impl Paging {
    /// Build paging from raw numbers, falling back to defaults when any
    /// field is out of range.
    pub fn new(page: i64, limit: i64, query: impl Into<String>) -> Self {
        let query = query.into();
        let page = u32::try_from(page).ok().filter(|p| *p >= 1);
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| (1..=MAX_LIMIT).contains(l));

        match (page, limit) {
            (Some(page), Some(limit)) if query.chars().count() <= MAX_QUERY_LEN => Self {
                page,
                limit,
                query,
            },
            _ => Self {
                query: query.chars().take(FALLBACK_QUERY_LEN).collect(),
                ..Self::default()
            },
        }
    }

    /// Build paging from query-string values; unparsable numbers count as
    /// missing and take their defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, query: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE as i64);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT as i64);
        Self::new(page, limit, query.unwrap_or_default())
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        (self.page as u64)
            .saturating_sub(1)
            .saturating_mul(self.limit as u64)
    }

    pub fn info(&self, total: u64) -> PagingInfo {
        PagingInfo {
            page: self.page,
            limit: self.limit,
            total,
        }
    }
}

/// Paging metadata returned with every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub page: u32,
    pub limit: u32,
    /// Total matching rows across all pages
    pub total: u64,
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(flatten)]
    pub paging: PagingInfo,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, paging: PagingInfo) -> Self {
        Self { data, paging }
    }
}
