//! Offset/limit pagination for listing operations.

use validator::Validate;

use crate::error::AppResult;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct Pagination {
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    pub offset: i64,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i64,
}

impl Pagination {
    /// Validated pagination.
    pub fn new(offset: i64, limit: i64) -> AppResult<Self> {
        let page = Self { offset, limit };
        page.validate()?;
        Ok(page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::new(0, 1).is_ok());
        assert!(Pagination::new(40, MAX_PAGE_SIZE).is_ok());
        assert!(matches!(
            Pagination::new(-1, 10),
            Err(AppError::Validation { ref field, .. }) if field == "offset"
        ));
        assert!(matches!(
            Pagination::new(0, MAX_PAGE_SIZE + 1),
            Err(AppError::Validation { ref field, .. }) if field == "limit"
        ));
    }
}
