pub mod ast;
pub mod basic;
pub mod parser;
pub mod rules;

pub use ast::{Annotation, Field, Label, Labels, Node, Operator, OperatorKind, Parameter, Pattern};
pub use basic::{Basic, Plan, PlanError};
pub use parser::{ParseError, SearchType, normalize, parse, pipeline, render, to_basic, to_plan};
pub use rules::{
    Rule, RuleChain, RuleError, RuleSet, apply_rules, apply_rules_list, lookup_rule,
    regexp_patterns, unquote_patterns,
};
