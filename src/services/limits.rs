use crate::error::{AppError, AppResult};

/// `top_n` used when the request does not send one
pub const DEFAULT_TOP_N: u32 = 5;

/// Bounds for result-size query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl RecommendationLimits {
    /// Resolves `limit`, falling back to the configured default
    pub fn resolve_limit(&self, requested: Option<u32>) -> AppResult<u32> {
        self.check("limit", requested.unwrap_or(self.default_limit))
    }

    /// Resolves `top_n`, falling back to `DEFAULT_TOP_N`
    pub fn resolve_top_n(&self, requested: Option<u32>) -> AppResult<u32> {
        self.check("top_n", requested.unwrap_or(DEFAULT_TOP_N.min(self.max_limit)))
    }

    fn check(&self, name: &str, value: u32) -> AppResult<u32> {
        if value == 0 || value > self.max_limit {
            return Err(AppError::InvalidInput(format!(
                "{} must be between 1 and {}, got {}",
                name, self.max_limit, value
            )));
        }
        Ok(value)
    }
}
