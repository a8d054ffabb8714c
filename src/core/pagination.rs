//! Offset pagination shared by all list operations.

use serde::Deserialize;

/// Default number of rows returned by list operations
pub const DEFAULT_LIMIT: u64 = 100;
/// Hard cap on rows returned by list operations
pub const MAX_LIMIT: u64 = 1000;

/// `skip`/`limit` window over an ordered result set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// Rows to skip
    #[serde(default)]
    pub skip: u64,
    /// Rows to return, clamped to `1..=MAX_LIMIT`
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Builds a window from optional query values.
    #[must_use]
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Effective limit after clamping.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        if self.limit == 0 {
            1
        } else if self.limit > MAX_LIMIT {
            MAX_LIMIT
        } else {
            self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = Pagination::new(None, None);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(Pagination::new(None, Some(5000)).limit(), MAX_LIMIT);
        assert_eq!(Pagination::new(None, Some(0)).limit(), 1);
        assert_eq!(Pagination::new(Some(20), Some(50)).limit(), 50);
    }
}
