use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Interpretation label attached to a pattern or parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Match the value as a literal string
    Literal,
    /// Match the value as a regular expression
    Regexp,
    /// The value was written between double quotes
    Quoted,
}

impl Label {
    const ALL: [Label; 3] = [Label::Literal, Label::Regexp, Label::Quoted];

    const fn bit(self) -> u8 {
        match self {
            Label::Literal => 1 << 0,
            Label::Regexp => 1 << 1,
            Label::Quoted => 1 << 2,
        }
    }
}

/// Small label set.
///
/// The literal/regexp/quoted labels are mutually exclusive: setting one of
/// them clears the others.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Labels(u8);

impl Labels {
    const INTERPRETATION: u8 = Label::Literal.bit() | Label::Regexp.bit() | Label::Quoted.bit();

    pub fn of(label: Label) -> Self {
        let mut labels = Self::default();
        labels.set(label);
        labels
    }

    pub fn set(&mut self, label: Label) {
        self.0 &= !Self::INTERPRETATION;
        self.0 |= label.bit();
    }

    pub fn unset(&mut self, label: Label) {
        self.0 &= !label.bit();
    }

    pub fn is_set(&self, label: Label) -> bool {
        self.0 & label.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        Label::ALL.into_iter().filter(|l| self.is_set(*l))
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for Labels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Metadata carried alongside a node's value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Annotation {
    pub labels: Labels,
}

impl Annotation {
    pub fn labeled(label: Label) -> Self {
        Self {
            labels: Labels::of(label),
        }
    }
}

/// Search pattern leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pattern {
    pub value: String,
    pub negated: bool,
    pub annotation: Annotation,
}

impl Pattern {
    pub fn new(value: impl Into<String>, label: Label) -> Self {
        Self {
            value: value.into(),
            negated: false,
            annotation: Annotation::labeled(label),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(value, Label::Literal)
    }

    pub fn regexp(value: impl Into<String>) -> Self {
        Self::new(value, Label::Regexp)
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self::new(value, Label::Quoted)
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is(&self, label: Label) -> bool {
        self.annotation.labels.is_set(label)
    }
}

/// Boolean operator kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    And,
    Or,
}

impl OperatorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
        }
    }
}

/// Boolean combination of nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Operator {
    pub kind: OperatorKind,
    pub operands: Vec<Node>,
}

/// Recognised parameter fields (`repo:`, `file:`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Repo,
    File,
    Lang,
    Case,
    Type,
    Count,
    Timeout,
    Rev,
    Archived,
    Fork,
    Select,
    Context,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Repo,
        Field::File,
        Field::Lang,
        Field::Case,
        Field::Type,
        Field::Count,
        Field::Timeout,
        Field::Rev,
        Field::Archived,
        Field::Fork,
        Field::Select,
        Field::Context,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Repo => "repo",
            Field::File => "file",
            Field::Lang => "lang",
            Field::Case => "case",
            Field::Type => "type",
            Field::Count => "count",
            Field::Timeout => "timeout",
            Field::Rev => "rev",
            Field::Archived => "archived",
            Field::Fork => "fork",
            Field::Select => "select",
            Field::Context => "context",
        }
    }

    /// Whether `-field:value` is meaningful
    pub fn is_negatable(self) -> bool {
        matches!(self, Field::Repo | Field::File | Field::Lang)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repo" | "r" => Ok(Field::Repo),
            "file" | "f" => Ok(Field::File),
            "lang" | "l" | "language" => Ok(Field::Lang),
            "case" => Ok(Field::Case),
            "type" => Ok(Field::Type),
            "count" => Ok(Field::Count),
            "timeout" => Ok(Field::Timeout),
            "rev" | "revision" => Ok(Field::Rev),
            "archived" => Ok(Field::Archived),
            "fork" => Ok(Field::Fork),
            "select" => Ok(Field::Select),
            "context" => Ok(Field::Context),
            _ => Err(()),
        }
    }
}

/// Key/value filter (`repo:sourcegraph`, `-file:test`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    pub field: Field,
    pub value: String,
    pub negated: bool,
    pub annotation: Annotation,
}

impl Parameter {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            negated: false,
            annotation: Annotation::default(),
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Pattern(Pattern),
    Operator(Operator),
    Parameter(Parameter),
}

impl Node {
    pub fn and(operands: Vec<Node>) -> Self {
        Node::Operator(Operator {
            kind: OperatorKind::And,
            operands,
        })
    }

    pub fn or(operands: Vec<Node>) -> Self {
        Node::Operator(Operator {
            kind: OperatorKind::Or,
            operands,
        })
    }

    /// First parameter found under this node, depth first
    pub fn find_parameter(&self) -> Option<&Parameter> {
        match self {
            Node::Parameter(p) => Some(p),
            Node::Pattern(_) => None,
            Node::Operator(op) => op.operands.iter().find_map(Node::find_parameter),
        }
    }

    pub fn contains_parameter(&self) -> bool {
        self.find_parameter().is_some()
    }
}

impl From<Pattern> for Node {
    fn from(p: Pattern) -> Self {
        Node::Pattern(p)
    }
}

impl From<Parameter> for Node {
    fn from(p: Parameter) -> Self {
        Node::Parameter(p)
    }
}

/// Rebuild `nodes`, replacing every pattern with the node `f` returns.
///
/// Operators and parameters are copied; the input is left untouched.
pub fn map_patterns<F>(nodes: &[Node], f: &mut F) -> Vec<Node>
where
    F: FnMut(&Pattern) -> Node,
{
    nodes.iter().map(|node| map_node(node, f)).collect()
}

fn map_node<F>(node: &Node, f: &mut F) -> Node
where
    F: FnMut(&Pattern) -> Node,
{
    match node {
        Node::Pattern(p) => f(p),
        Node::Parameter(p) => Node::Parameter(p.clone()),
        Node::Operator(op) => Node::Operator(Operator {
            kind: op.kind,
            operands: map_patterns(&op.operands, f),
        }),
    }
}

/// Collect references to every pattern, left to right
pub fn patterns(nodes: &[Node]) -> Vec<&Pattern> {
    fn walk<'a>(node: &'a Node, out: &mut Vec<&'a Pattern>) {
        match node {
            Node::Pattern(p) => out.push(p),
            Node::Parameter(_) => {}
            Node::Operator(op) => op.operands.iter().for_each(|n| walk(n, out)),
        }
    }

    let mut out = Vec::new();
    nodes.iter().for_each(|n| walk(n, &mut out));
    out
}
