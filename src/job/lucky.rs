use crate::job::{JobBuilder, SearchInputs};
use crate::query::{Plan, RuleSet, apply_rules_list};
use thiserror::Error;
use tracing::debug;

/// A Basic query that could not be turned into a job
#[derive(Debug, Error)]
pub enum ExpandError<E: std::error::Error + 'static> {
    #[error("original plan query #{index} `{query}` could not be built into a job: {source}")]
    Original {
        index: usize,
        query: String,
        #[source]
        source: E,
    },

    #[error("generated query `{query}` (from plan query #{index}) could not be built into a job: {source}")]
    Generated {
        index: usize,
        query: String,
        #[source]
        source: E,
    },
}

impl<E: std::error::Error + 'static> ExpandError<E> {
    /// Whether the failing query was produced by a rule
    pub fn is_generated(&self) -> bool {
        matches!(self, ExpandError::Generated { .. })
    }
}

/// Expand `plan` into a feeling-lucky job.
///
/// Every Basic query of the plan runs first, in plan order, so the most
/// precise interpretation of the input ranks first. Then, for each Basic in
/// plan order, every rule chain of `rules` that applies contributes an
/// alternative query, in chain order. All of them are sequenced into one job
/// whose later children run even after earlier ones produced results.
///
/// Rules are deterministic, so the same plan and rules always produce the
/// same job.
///
/// A Basic that fails to build is an invariant violation: queries from a
/// valid parse, and queries generated by rules, must always be executable.
/// This function panics in that case; see [`try_feeling_lucky_job`].
pub fn feeling_lucky_job<B: JobBuilder>(
    builder: &B,
    inputs: &SearchInputs,
    plan: &Plan,
    rules: &RuleSet,
) -> B::Job {
    match try_feeling_lucky_job(builder, inputs, plan, rules) {
        Ok(job) => job,
        Err(e) => panic!("feeling-lucky expansion produced an invalid query: {}", e),
    }
}

/// Like [`feeling_lucky_job`], but reports an unbuildable query as an error
pub fn try_feeling_lucky_job<B: JobBuilder>(
    builder: &B,
    inputs: &SearchInputs,
    plan: &Plan,
    rules: &RuleSet,
) -> Result<B::Job, ExpandError<B::Error>> {
    let mut children = Vec::with_capacity(plan.len() * (1 + rules.len()));

    for (index, basic) in plan.iter().enumerate() {
        let child = builder
            .basic(inputs, basic)
            .map_err(|source| ExpandError::Original {
                index,
                query: basic.to_string(),
                source,
            })?;
        debug!(index, query = %basic, "sequenced plan query");
        children.push(child);
    }

    let originals = children.len();
    for (index, basic) in plan.iter().enumerate() {
        for generated in apply_rules_list(basic, rules) {
            let child = builder
                .basic(inputs, &generated)
                .map_err(|source| ExpandError::Generated {
                    index,
                    query: generated.to_string(),
                    source,
                })?;
            debug!(from = index, query = %generated, "sequenced generated query");
            children.push(child);
        }
    }

    debug!(
        originals,
        generated = children.len() - originals,
        "expanded feeling-lucky plan"
    );
    Ok(builder.sequential(true, children))
}
