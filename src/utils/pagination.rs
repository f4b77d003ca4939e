use crate::validation::{parse_field, ValidateContentError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit_wide - 1) / limit_wide,
        }
    }
}

/// Requested page, 1-based. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Parses raw `page`/`limit` query values, falling back to page 1 and `default_limit`.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u32,
    ) -> Result<Self, ValidateContentError> {
        let page = parse_field::<u32>("page", page)?.unwrap_or(1);
        let limit = parse_field::<u32>("limit", limit)?.unwrap_or(default_limit);
        if page == 0 {
            return Err(ValidateContentError::new("page", "must be at least 1"));
        }
        if limit == 0 {
            return Err(ValidateContentError::new("limit", "must be at least 1"));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub events: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            events: self.events.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Slices an already ranked list. Pages past the end come back empty.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let events = items
        .into_iter()
        .skip(offset)
        .take(request.limit as usize)
        .collect();
    Page {
        events,
        pagination: Pagination::new(request.page, request.limit, total),
    }
}
