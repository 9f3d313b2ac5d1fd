use crate::job::{BasicJob, Job, JobBuilder, JobError, SearchInputs, SequentialJob};
use crate::query::{Basic, Field, Label, Parameter, ast::patterns};
use regex::Regex;

/// Builds [`Job`] values describing what would run.
///
/// Construction checks that each Basic query is executable: it has
/// something to search for, its parameter values are well formed and its
/// regexps compile.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeBuilder;

impl JobBuilder for DescribeBuilder {
    type Job = Job;
    type Error = JobError;

    fn basic(&self, inputs: &SearchInputs, basic: &Basic) -> Result<Job, JobError> {
        if basic.is_empty() {
            return Err(JobError::EmptyQuery);
        }

        let mut limit = inputs.limit;
        let mut timeout_secs = inputs.timeout_secs;

        for param in &basic.parameters {
            if param.negated && !param.field.is_negatable() {
                return Err(JobError::NotNegatable(param.field));
            }

            match param.field {
                Field::Count => limit = positive(param)? as usize,
                Field::Timeout => timeout_secs = positive(param)?,
                Field::Case => one_of(param, &["yes", "no"])?,
                Field::Archived | Field::Fork => one_of(param, &["yes", "no", "only"])?,
                Field::Repo | Field::File => compiles(&param.value)?,
                _ => {}
            }
        }

        let tree = basic.to_parse_tree();
        for pattern in patterns(&tree) {
            if pattern.is(Label::Regexp) {
                compiles(&pattern.value)?;
            }
        }

        Ok(Job::Basic(BasicJob {
            query: basic.to_string(),
            basic: basic.clone(),
            limit,
            timeout_secs,
        }))
    }

    fn sequential(&self, run_past_first_success: bool, children: Vec<Job>) -> Job {
        Job::Sequential(SequentialJob {
            run_past_first_success,
            children,
        })
    }
}

fn positive(param: &Parameter) -> Result<u64, JobError> {
    match param.value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(JobError::InvalidValue {
            field: param.field,
            value: param.value.clone(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}

fn one_of(param: &Parameter, allowed: &[&str]) -> Result<(), JobError> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&param.value)) {
        Ok(())
    } else {
        Err(JobError::InvalidValue {
            field: param.field,
            value: param.value.clone(),
            reason: format!("expected one of {}", allowed.join(", ")),
        })
    }
}

fn compiles(pattern: &str) -> Result<(), JobError> {
    Regex::new(pattern).map(|_| ()).map_err(|e| JobError::InvalidRegexp {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
