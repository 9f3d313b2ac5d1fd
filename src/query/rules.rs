//! Query rewrite rules and their composition.
//!
//! A [`Rule`] maps a Basic query to an alternative interpretation, or
//! returns `None` when it does not apply. Rules are pure: the same input
//! always produces the same output, which keeps expansion deterministic.
//!
//! Rules compose two ways:
//!
//! - A [`RuleChain`] applies its rules in sequence. If any rule does not
//!   apply, the whole chain does not apply.
//! - A [`RuleSet`] holds independent chains. Each chain that applies
//!   contributes one query, in chain order.
//!
//! For a set `[[R1, R2], [R2]]` and input `B0`: if both chains apply the
//! output is `[B1, B2]`, where `B1` is `R2(R1(B0))` and `B2` is `R2(B0)`;
//! if only one applies, only its query is produced.

use crate::query::ast::{Label, Node, map_patterns, patterns};
use crate::query::basic::Basic;
use crate::query::parser::{SearchType, has_metacharacters, normalize, parse, render, to_basic};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

type RuleFn = dyn Fn(&Basic) -> Option<Basic> + Send + Sync;

/// Named transformation on a Basic query
#[derive(Clone)]
pub struct Rule {
    name: String,
    apply: Arc<RuleFn>,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Basic) -> Option<Basic> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the rule; `None` means it does not apply to `basic`
    pub fn apply(&self, basic: &Basic) -> Option<Basic> {
        (self.apply)(basic)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

pub type RuleChain = Vec<Rule>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("rule chain {0} is empty")]
    EmptyChain(usize),
}

/// Ordered collection of independent rule chains
#[derive(Debug, Clone)]
pub struct RuleSet {
    chains: Vec<RuleChain>,
}

impl RuleSet {
    pub fn new(chains: Vec<RuleChain>) -> Self {
        Self { chains }
    }

    /// A set with no chains; expansion then only runs the original plan
    pub fn empty() -> Self {
        Self { chains: Vec::new() }
    }

    /// Resolve chains of built-in rule names
    pub fn from_names<S: AsRef<str>>(chains: &[Vec<S>]) -> Result<Self, RuleError> {
        let chains = chains
            .iter()
            .enumerate()
            .map(|(i, names)| {
                if names.is_empty() {
                    return Err(RuleError::EmptyChain(i));
                }
                names
                    .iter()
                    .map(|name| {
                        lookup_rule(name.as_ref())
                            .ok_or_else(|| RuleError::UnknownRule(name.as_ref().to_string()))
                    })
                    .collect::<Result<RuleChain, RuleError>>()
            })
            .collect::<Result<Vec<RuleChain>, _>>()?;

        Ok(Self { chains })
    }

    pub fn chains(&self) -> &[RuleChain] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(vec![vec![Rule::new("unquote_patterns", unquote_patterns)]])
    }
}

/// Apply every rule of `chain` in sequence.
///
/// An empty chain returns the input unchanged. If any rule does not apply,
/// the result is `None`; no partially rewritten query escapes.
pub fn apply_rules(basic: &Basic, chain: &[Rule]) -> Option<Basic> {
    chain.iter().try_fold(basic.clone(), |current, rule| {
        let next = rule.apply(&current);
        trace!(rule = rule.name(), applied = next.is_some(), "applied rule");
        next
    })
}

/// Apply each chain of `rules` to `basic`, keeping the chains that applied
pub fn apply_rules_list(basic: &Basic, rules: &RuleSet) -> Vec<Basic> {
    rules
        .chains()
        .iter()
        .filter_map(|chain| apply_rules(basic, chain))
        .collect()
}

/// Built-in rules: (name, description)
pub const BUILTIN_RULES: &[(&str, &str)] = &[
    (
        "unquote_patterns",
        "search quoted patterns as unquoted literals",
    ),
    (
        "regexp_patterns",
        "search literal patterns that look like regular expressions as regexps",
    ),
];

/// Look up a built-in rule by name
pub fn lookup_rule(name: &str) -> Option<Rule> {
    match name {
        "unquote_patterns" => Some(Rule::new(name, unquote_patterns)),
        "regexp_patterns" => Some(Rule::new(name, regexp_patterns)),
        _ => None,
    }
}

/// Search every quoted pattern as an unquoted literal.
///
/// The Basic form does not remember quoting, so the query is rendered and
/// re-parsed as a regex query, which labels quoted patterns. Patterns that
/// were not quoted keep their original form. Applies only when at least
/// one pattern was quoted and the result differs from `basic`.
pub fn unquote_patterns(basic: &Basic) -> Option<Basic> {
    let tree = basic.to_parse_tree();
    let before: Vec<_> = patterns(&tree).into_iter().cloned().collect();

    let raw = parse(&render(&tree), SearchType::Regex).ok()?;
    if patterns(&raw).len() != before.len() {
        return None;
    }

    let mut changed = false;
    let mut index = 0;
    let rewritten = map_patterns(&raw, &mut |p| {
        let original = &before[index];
        index += 1;

        if p.is(Label::Quoted) {
            changed = true;
            let mut p = p.clone();
            p.annotation.labels.unset(Label::Quoted);
            p.annotation.labels.set(Label::Literal);
            Node::Pattern(p)
        } else {
            Node::Pattern(original.clone())
        }
    });

    if !changed {
        return None;
    }

    let nodes = normalize(&rewritten, SearchType::Literal).ok()?;
    to_basic(&nodes).ok().filter(|out| out != basic)
}

/// Search literal patterns that look like regular expressions as regexps.
///
/// Applies only when at least one literal has regex metacharacters and
/// compiles.
pub fn regexp_patterns(basic: &Basic) -> Option<Basic> {
    let mut changed = false;
    let rewritten = map_patterns(&basic.to_parse_tree(), &mut |p| {
        let mut p = p.clone();
        if p.is(Label::Literal) && has_metacharacters(&p.value) && Regex::new(&p.value).is_ok() {
            changed = true;
            p.annotation.labels.set(Label::Regexp);
        }
        Node::Pattern(p)
    });

    if !changed {
        return None;
    }

    let nodes = normalize(&rewritten, SearchType::Regex).ok()?;
    to_basic(&nodes).ok()
}
