use crate::query::ast::{Field, Node, Parameter};
use crate::query::parser::render;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One concrete interpretation of a query: its parameters plus a pattern
/// tree.
///
/// Parameters keep the order they were written in, so iterating them is
/// deterministic; a field may appear more than once (`repo:a repo:b`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Basic {
    pub parameters: Vec<Parameter>,
    pub pattern: Option<Node>,
}

impl Basic {
    pub fn new(parameters: Vec<Parameter>, pattern: Option<Node>) -> Self {
        Self { parameters, pattern }
    }

    /// All parameters for `field`, in query order
    pub fn parameters_for(&self, field: Field) -> impl Iterator<Item = &Parameter> + '_ {
        self.parameters.iter().filter(move |p| p.field == field)
    }

    /// Value of the first non-negated parameter for `field`
    pub fn find_value(&self, field: Field) -> Option<&str> {
        self.parameters_for(field)
            .find(|p| !p.negated)
            .map(|p| p.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.pattern.is_none()
    }

    /// Rebuild the node tree: parameters first, then the pattern
    pub fn to_parse_tree(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.parameters.iter().cloned().map(Node::Parameter).collect();
        nodes.extend(self.pattern.iter().cloned());
        nodes
    }
}

impl fmt::Display for Basic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.to_parse_tree()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("a plan needs at least one basic query")]
    Empty,
}

/// Ordered, non-empty sequence of Basic queries, most precise first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan(Vec<Basic>);

impl Plan {
    pub fn new(basics: Vec<Basic>) -> Result<Self, PlanError> {
        if basics.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(Self(basics))
    }

    pub fn basics(&self) -> &[Basic] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Basic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Basic;
    type IntoIter = std::slice::Iter<'a, Basic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::Pattern;

    #[test]
    fn test_plan_rejects_empty() {
        assert_eq!(Plan::new(Vec::new()), Err(PlanError::Empty));
    }

    #[test]
    fn test_plan_keeps_order() {
        let a = Basic::new(Vec::new(), Some(Pattern::literal("a").into()));
        let b = Basic::new(Vec::new(), Some(Pattern::literal("b").into()));
        let plan = Plan::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec![&a, &b]);
    }

    #[test]
    fn test_find_value_skips_negated() {
        let basic = Basic::new(
            vec![
                Parameter::new(Field::Repo, "skip").negate(),
                Parameter::new(Field::Repo, "keep"),
            ],
            None,
        );
        assert_eq!(basic.find_value(Field::Repo), Some("keep"));
        assert_eq!(basic.parameters_for(Field::Repo).count(), 2);
        assert_eq!(basic.find_value(Field::File), None);
    }

    #[test]
    fn test_display_renders_parameters_first() {
        let basic = Basic::new(
            vec![Parameter::new(Field::Lang, "go")],
            Some(Pattern::quoted("foo").into()),
        );
        assert_eq!(basic.to_string(), "lang:go \"foo\"");
    }

    #[test]
    fn test_is_empty() {
        assert!(Basic::new(Vec::new(), None).is_empty());
    }
}
