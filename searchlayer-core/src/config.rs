//! Tunables of the CRUD orchestrator.

use serde::{Deserialize, Serialize};

/// Default number of partial updates in flight during an update batch.
pub const DEFAULT_UPDATE_CONCURRENCY: usize = 16;

/// Default number of hits resolved by the search behind an update or destroy.
pub const DEFAULT_MATCH_LIMIT: u64 = 10_000;

/// Per-collection orchestration settings.
///
/// Deserializes from a partial map, every missing key taking its default:
///
/// ```ignore
/// use searchlayer_core::config::CollectionOptions;
///
/// let options: CollectionOptions = serde_json::from_str(r#"{ "updateConcurrency": 4 }"#)?;
/// assert_eq!(options.match_limit, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionOptions {
    /// Maximum number of partial updates issued concurrently. `0` is treated as `1`.
    pub update_concurrency: usize,
    /// Window of the search resolving the targets of an update or destroy when the criteria
    /// carry no limit.
    pub match_limit: u64,
}

impl CollectionOptions {
    pub fn with_update_concurrency(mut self, update_concurrency: usize) -> Self {
        self.update_concurrency = update_concurrency;
        self
    }

    pub fn with_match_limit(mut self, match_limit: u64) -> Self {
        self.match_limit = match_limit;
        self
    }
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            update_concurrency: DEFAULT_UPDATE_CONCURRENCY,
            match_limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_take_defaults() {
        let options: CollectionOptions = serde_json::from_str(r#"{ "updateConcurrency": 4 }"#).unwrap();

        assert_eq!(options.update_concurrency, 4);
        assert_eq!(options.match_limit, DEFAULT_MATCH_LIMIT);
    }
}
