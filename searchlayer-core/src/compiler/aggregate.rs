//! Aggregation buckets for `sum`, `average`, `min` and `max` criteria.

use crate::{
    criteria::AggregateOptions,
    error::{SearchLayerError, SearchLayerResult},
};

/// A single-value metric computed over a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sum,
    Avg,
    Min,
    Max,
}

impl Metric {
    /// The metric name in the store DSL, also used as the bucket name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sum => "sum",
            Metric::Avg => "avg",
            Metric::Min => "min",
            Metric::Max => "max",
        }
    }
}

/// A named aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// The bucket name, `<metric>_<field>`.
    pub name: String,
    pub metric: Metric,
    pub field: String,
}

impl Aggregation {
    pub fn new(metric: Metric, field: impl Into<String>) -> Self {
        let field = field.into();

        Self { name: format!("{}_{}", metric.as_str(), field), metric, field }
    }
}

/// Builds one bucket per requested field.
///
/// # Errors
///
/// Returns [`SearchLayerError::InvalidGroupBy`] when none of the four statistics was given as a
/// list of fields.
pub fn build(options: &AggregateOptions) -> SearchLayerResult<Vec<Aggregation>> {
    let requested = [
        (Metric::Sum, &options.sum),
        (Metric::Avg, &options.average),
        (Metric::Min, &options.min),
        (Metric::Max, &options.max),
    ];

    if requested.iter().all(|(_, fields)| fields.is_none()) {
        return Err(SearchLayerError::InvalidGroupBy);
    }

    Ok(requested
        .into_iter()
        .filter_map(|(metric, fields)| fields.as_ref().map(|fields| (metric, fields)))
        .flat_map(|(metric, fields)| fields.iter().map(move |field| Aggregation::new(metric, field.as_str())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_naming() {
        let options = AggregateOptions {
            sum: Some(vec!["amount".to_string(), "tax".to_string()]),
            average: Some(vec!["amount".to_string()]),
            ..Default::default()
        };

        let names: Vec<_> = build(&options)
            .unwrap()
            .into_iter()
            .map(|aggregation| aggregation.name)
            .collect();

        assert_eq!(names, vec!["sum_amount", "sum_tax", "avg_amount"]);
    }

    #[test]
    fn test_missing_statistics_is_invalid_group_by() {
        assert!(matches!(build(&AggregateOptions::default()), Err(SearchLayerError::InvalidGroupBy)));
    }

    #[test]
    fn test_empty_list_is_accepted() {
        let options = AggregateOptions { max: Some(vec![]), ..Default::default() };
        assert_eq!(build(&options).unwrap(), vec![]);
    }
}
