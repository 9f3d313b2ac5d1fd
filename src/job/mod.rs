//! Search jobs.
//!
//! A job is the runnable form of a query. Running jobs belongs to the
//! search backend; this module only fixes what the expander needs from it:
//!
//! - [`JobBuilder`] turns one Basic query into a job and sequences jobs
//!   into a composite.
//! - [`DescribeBuilder`] is a builder whose jobs describe what would run,
//!   used by the CLI and tests.
//! - [`lucky`] expands a plan into a feeling-lucky sequential job.

pub mod describe;
pub mod lucky;

pub use describe::DescribeBuilder;
pub use lucky::{ExpandError, feeling_lucky_job, try_feeling_lucky_job};

use crate::query::{Basic, Field, SearchType};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_LIMIT: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Search-wide parameters shared by every job of one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchInputs {
    pub original_query: String,
    pub search_type: SearchType,
    pub limit: usize,
    pub timeout_secs: u64,
}

impl SearchInputs {
    pub fn new(original_query: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            original_query: original_query.into(),
            search_type,
            limit: DEFAULT_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Builds jobs from Basic queries
pub trait JobBuilder {
    type Job;
    type Error: std::error::Error + 'static;

    /// Build the job that runs one Basic query
    fn basic(&self, inputs: &SearchInputs, basic: &Basic) -> Result<Self::Job, Self::Error>;

    /// Sequence `children` in order.
    ///
    /// With `run_past_first_success`, later children run even when earlier
    /// ones already produced results.
    fn sequential(&self, run_past_first_success: bool, children: Vec<Self::Job>) -> Self::Job;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("query has no pattern and no parameters")]
    EmptyQuery,

    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: Field,
        value: String,
        reason: String,
    },

    #[error("{0}: cannot be negated")]
    NotNegatable(Field),

    #[error("invalid regular expression /{pattern}/: {message}")]
    InvalidRegexp { pattern: String, message: String },
}

/// Job for one Basic query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicJob {
    /// Rendered query text
    pub query: String,
    pub basic: Basic,
    pub limit: usize,
    pub timeout_secs: u64,
}

/// Children run one after the other
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequentialJob {
    pub run_past_first_success: bool,
    pub children: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    Basic(BasicJob),
    Sequential(SequentialJob),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Basic(_) => "BasicJob",
            Job::Sequential(_) => "SequentialJob",
        }
    }

    pub fn children(&self) -> &[Job] {
        match self {
            Job::Basic(_) => &[],
            Job::Sequential(seq) => &seq.children,
        }
    }

    /// Every basic job, in execution order
    pub fn basic_jobs(&self) -> Vec<&BasicJob> {
        match self {
            Job::Basic(job) => vec![job],
            Job::Sequential(seq) => seq.children.iter().flat_map(Job::basic_jobs).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::pipeline;

    #[test]
    fn test_search_inputs_defaults() {
        let inputs = SearchInputs::new("foo", SearchType::Literal);
        assert_eq!(inputs.limit, DEFAULT_LIMIT);
        assert_eq!(inputs.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let inputs = inputs.with_limit(10).with_timeout_secs(3);
        assert_eq!((inputs.limit, inputs.timeout_secs), (10, 3));
    }

    #[test]
    fn test_basic_jobs_flattens_in_order() {
        let leaf = |q: &str| {
            let basic = pipeline(q, SearchType::Literal).unwrap().basics()[0].clone();
            Job::Basic(BasicJob {
                query: basic.to_string(),
                basic,
                limit: 1,
                timeout_secs: 1,
            })
        };
        let job = Job::Sequential(SequentialJob {
            run_past_first_success: true,
            children: vec![
                leaf("a"),
                Job::Sequential(SequentialJob {
                    run_past_first_success: false,
                    children: vec![leaf("b"), leaf("c")],
                }),
            ],
        });

        let queries: Vec<_> = job.basic_jobs().iter().map(|j| j.query.as_str()).collect();
        assert_eq!(queries, vec!["a", "b", "c"]);
        assert_eq!(job.children().len(), 2);
        assert_eq!(job.name(), "SequentialJob");
    }
}
