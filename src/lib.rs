//! # lucky - feeling-lucky query expansion
//!
//! Takes one search query and expands it into an ordered sequence of
//! alternative interpretations, composed into a single search job. The
//! original interpretation always runs first; rule-generated alternatives
//! (for example searching a quoted pattern unquoted) run afterwards and
//! contribute supplementary results.
//!
//! ## Architecture
//!
//! - [`query`] - Query AST, parser, Basic queries and plans, rewrite rules
//! - [`job`] - Job building and the feeling-lucky expander
//! - [`config`] - User configuration (limits, enabled rule chains)
//! - [`output`] - Human-readable printing of plans and jobs
//!
//! ## Quick Start
//!
//! ```
//! use lucky::job::{DescribeBuilder, SearchInputs, feeling_lucky_job};
//! use lucky::query::{RuleSet, SearchType, pipeline};
//!
//! let query = "repo:sourcegraph \"foo\"";
//! let plan = pipeline(query, SearchType::Literal).unwrap();
//! let inputs = SearchInputs::new(query, SearchType::Literal);
//! let job = feeling_lucky_job(&DescribeBuilder, &inputs, &plan, &RuleSet::default());
//!
//! let queries: Vec<_> = job.basic_jobs().iter().map(|j| j.query.clone()).collect();
//! assert_eq!(queries, vec!["repo:sourcegraph \"foo\"", "repo:sourcegraph foo"]);
//! ```

pub mod config;
pub mod job;
pub mod output;
pub mod query;
