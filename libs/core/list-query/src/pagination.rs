use serde_json::Value;

use crate::error::{ListQueryError, ListQueryResult};
use crate::query::PaginationInput;

/// A validated page: `limit = page_size`, `skip = page_size * current_page`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_size: u64,
    current_page: u64,
    skip: u64,
}

impl PageWindow {
    /// Fails when `page_size` is zero or the skip does not fit a signed
    /// 64-bit integer, the widest `$skip` the server accepts.
    pub fn new(page_size: u64, current_page: u64) -> ListQueryResult<Self> {
        if page_size == 0 {
            return Err(ListQueryError::invalid("pageSize must be a positive integer"));
        }
        let skip = page_size
            .checked_mul(current_page)
            .filter(|skip| i64::try_from(*skip).is_ok() && i64::try_from(page_size).is_ok())
            .ok_or_else(|| ListQueryError::invalid("page window is out of range"))?;

        Ok(Self {
            page_size,
            current_page,
            skip,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl TryFrom<&PaginationInput> for PageWindow {
    type Error = ListQueryError;

    fn try_from(input: &PaginationInput) -> ListQueryResult<Self> {
        let page_size = whole_number("pageSize", input.page_size.as_ref())?;
        let current_page = whole_number("currentPage", input.current_page.as_ref())?;
        Self::new(page_size, current_page)
    }
}

/// Accepts JSON integers, integral floats and integer strings
fn whole_number(name: &str, value: Option<&Value>) -> ListQueryResult<u64> {
    let value = value.ok_or_else(|| ListQueryError::invalid(format!("{name} is required")))?;

    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ListQueryError::invalid(format!("{name} must be a non-negative integer, got {value}"))
    })
}
