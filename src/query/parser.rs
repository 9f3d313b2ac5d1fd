use crate::query::ast::{Field, Label, Node, Operator, OperatorKind, Parameter, Pattern};
use crate::query::basic::{Basic, Plan};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How bare pattern text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Bare and quoted text match literally; quotes are part of the pattern
    #[default]
    Literal,
    /// Bare text is a regular expression; `"..."` marks a quoted literal
    Regex,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::Literal => f.write_str("literal"),
            SearchType::Regex => f.write_str("regex"),
        }
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "literal" | "standard" => Ok(SearchType::Literal),
            "regex" | "regexp" => Ok(SearchType::Regex),
            other => Err(format!("unknown search type '{}' (expected literal or regex)", other)),
        }
    }
}

/// Errors produced while parsing or reshaping a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("unterminated quoted string starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("group opened at offset {0} is never closed")]
    UnclosedGroup(usize),

    #[error("empty group at offset {0}")]
    EmptyGroup(usize),

    #[error("operator '{keyword}' at offset {pos} is missing an operand")]
    MissingOperand { keyword: &'static str, pos: usize },

    #[error("negating a group is not supported (offset {0})")]
    NegatedGroup(usize),

    #[error("parameter '{0}:' has an empty value")]
    EmptyParameterValue(Field),

    #[error("invalid regular expression /{pattern}/: {message}")]
    InvalidRegexp { pattern: String, message: String },

    #[error("parameter '{0}:' must appear at the top level of the query")]
    NestedParameter(Field),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse a query string into a node tree.
///
/// The returned sequence is the implicit top-level conjunction; an empty
/// input yields an empty sequence.
pub fn parse(input: &str, search_type: SearchType) -> Result<Vec<Node>> {
    let mut parser = QueryParser::new(input, search_type);
    parser.parse()
}

/// Parse, normalize and split a query into its plan
pub fn pipeline(input: &str, search_type: SearchType) -> Result<Plan> {
    let nodes = parse(input, search_type)?;
    let nodes = normalize(&nodes, search_type)?;
    to_plan(&nodes)
}

/// Query parser
struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    search_type: SearchType,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str, search_type: SearchType) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            search_type,
        }
    }

    fn parse(&mut self) -> Result<Vec<Node>> {
        self.skip_whitespace();
        if self.is_eof() {
            return Ok(Vec::new());
        }

        let root = self.parse_or()?;
        Ok(match root {
            Node::Operator(Operator {
                kind: OperatorKind::And,
                operands,
            }) => operands,
            other => vec![other],
        })
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut nodes = vec![self.parse_and()?];

        loop {
            self.skip_whitespace();
            let pos = self.pos;
            if !self.consume_keyword("or") {
                break;
            }
            self.skip_whitespace();
            if self.at_operand_end() || self.peek_keyword("and") {
                return Err(ParseError::MissingOperand { keyword: "or", pos });
            }
            nodes.push(self.parse_and()?);
        }

        if nodes.len() == 1 {
            Ok(nodes.remove(0))
        } else {
            Ok(Node::or(nodes))
        }
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut nodes = Vec::new();

        loop {
            self.skip_whitespace();
            if self.at_operand_end() {
                break;
            }

            if self.peek_keyword("and") {
                let pos = self.pos;
                self.consume_keyword("and");
                self.skip_whitespace();
                if nodes.is_empty() || self.at_operand_end() || self.peek_keyword("and") {
                    return Err(ParseError::MissingOperand { keyword: "and", pos });
                }
                continue;
            }

            nodes.push(self.parse_unary()?);
        }

        match nodes.len() {
            // Only reachable on a leading or doubled `or`
            0 => Err(ParseError::MissingOperand {
                keyword: "or",
                pos: self.pos,
            }),
            1 => Ok(nodes.remove(0)),
            _ => Ok(Node::and(nodes)),
        }
    }

    fn parse_unary(&mut self) -> Result<Node> {
        let pos = self.pos;

        if self.peek_keyword("not") {
            self.consume_keyword("not");
            self.skip_whitespace();
            if self.at_operand_end() || self.peek_keyword("and") {
                return Err(ParseError::MissingOperand { keyword: "not", pos });
            }
            if self.peek_char() == Some('(') {
                return Err(ParseError::NegatedGroup(pos));
            }
            let inner = self.parse_unary()?;
            return negate(inner, pos);
        }

        // `-term` negates; a lone `-` is ordinary text
        if self.peek_char() == Some('-') {
            match self.remaining()[1..].chars().next() {
                Some('(') => return Err(ParseError::NegatedGroup(pos)),
                Some(c) if !c.is_whitespace() => {
                    self.advance();
                    let inner = self.parse_term()?;
                    return negate(inner, pos);
                }
                _ => {}
            }
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node> {
        let open = self.pos;

        // Parenthesized expression
        if self.consume_char('(') {
            self.skip_whitespace();
            if self.peek_char() == Some(')') {
                return Err(ParseError::EmptyGroup(open));
            }

            self.depth += 1;
            let node = self.parse_or()?;
            self.skip_whitespace();
            if !self.consume_char(')') {
                return Err(ParseError::UnclosedGroup(open));
            }
            self.depth -= 1;
            return Ok(node);
        }

        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Node> {
        let start = self.pos;

        match self.peek_char() {
            Some('"') => {
                if let Some(node) = self.parse_quoted_pattern(start)? {
                    return Ok(node);
                }
            }
            Some('/') => {
                if let Some(node) = self.parse_delimited_regex(start) {
                    return Ok(node);
                }
            }
            _ => {}
        }

        // Field filter or bare word
        if let Some((name, _)) = self.remaining().split_once(':') {
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()) {
                if let Ok(field) = name.parse::<Field>() {
                    self.pos += name.len() + 1;
                    return self.parse_parameter(field);
                }
            }
        }

        let word = self.scan_word();
        Ok(Node::Pattern(self.bare_pattern(word)))
    }

    fn bare_pattern(&self, word: &str) -> Pattern {
        match self.search_type {
            SearchType::Literal => Pattern::literal(word),
            SearchType::Regex => Pattern::regexp(word),
        }
    }

    /// `"..."`: a quoted literal in regex mode, verbatim text in literal mode.
    ///
    /// Returns `None` when literal mode finds no closing quote; the caller
    /// then reads the text as a bare word.
    fn parse_quoted_pattern(&mut self, start: usize) -> Result<Option<Node>> {
        let Some(end) = find_closing(self.input, start, '"') else {
            return match self.search_type {
                SearchType::Regex => Err(ParseError::UnterminatedQuote(start)),
                SearchType::Literal => Ok(None),
            };
        };

        let node = match self.search_type {
            SearchType::Regex => Pattern::quoted(unescape(&self.input[start + 1..end])),
            SearchType::Literal => Pattern::literal(&self.input[start..=end]),
        };
        self.pos = end + 1;
        Ok(Some(Node::Pattern(node)))
    }

    /// `/.../` is a regex in every mode when the closing slash ends the term
    fn parse_delimited_regex(&mut self, start: usize) -> Option<Node> {
        let end = find_closing(self.input, start, '/')?;
        if end == start + 1 {
            return None;
        }

        let after = self.input[end + 1..].chars().next();
        let at_boundary = match after {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(')') => self.depth > 0,
            Some(_) => false,
        };
        if !at_boundary {
            return None;
        }

        let value = self.input[start + 1..end].replace("\\/", "/");
        self.pos = end + 1;
        Some(Node::Pattern(Pattern::regexp(value)))
    }

    fn parse_parameter(&mut self, field: Field) -> Result<Node> {
        let start = self.pos;

        if self.peek_char() == Some('"') {
            let end = find_closing(self.input, start, '"')
                .ok_or(ParseError::UnterminatedQuote(start))?;
            let mut param = Parameter::new(field, unescape(&self.input[start + 1..end]));
            param.annotation.labels.set(Label::Quoted);
            self.pos = end + 1;
            return Ok(Node::Parameter(param));
        }

        let value = if self.is_eof() || self.peek_char().is_some_and(char::is_whitespace) {
            ""
        } else {
            self.scan_word()
        };
        if value.is_empty() {
            return Err(ParseError::EmptyParameterValue(field));
        }
        Ok(Node::Parameter(Parameter::new(field, value)))
    }

    /// Read up to the next whitespace, leaving behind trailing `)` that
    /// close an open group rather than belong to the word.
    fn scan_word(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        let end = input[start..]
            .find(char::is_whitespace)
            .map(|i| start + i)
            .unwrap_or(input.len());
        let word = &input[start..end];

        let opens = word.matches('(').count();
        let closes = word.matches(')').count();
        let trailing = word.len() - word.trim_end_matches(')').len();
        let peel = trailing.min(self.depth).min(closes.saturating_sub(opens));

        let word = &word[..word.len() - peel];
        self.pos = start + word.len();
        word
    }

    fn at_operand_end(&self) -> bool {
        self.is_eof() || (self.depth > 0 && self.peek_char() == Some(')')) || self.peek_keyword("or")
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let rest = self.remaining();
        if rest.len() < keyword.len() || !rest.is_char_boundary(keyword.len()) {
            return false;
        }
        let (head, tail) = rest.split_at(keyword.len());
        head.eq_ignore_ascii_case(keyword)
            && match tail.chars().next() {
                None => true,
                Some(c) => c.is_whitespace() || c == '(' || c == ')',
            }
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

fn negate(node: Node, pos: usize) -> Result<Node> {
    match node {
        Node::Pattern(p) => Ok(Node::Pattern(p.negate())),
        Node::Parameter(p) => Ok(Node::Parameter(p.negate())),
        Node::Operator(_) => Err(ParseError::NegatedGroup(pos)),
    }
}

/// Byte offset of the unescaped `delim` closing the one at `start`
fn find_closing(input: &str, start: usize, delim: char) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in input[start + delim.len_utf8()..].char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            return Some(start + delim.len_utf8() + i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a node tree back to literal-mode query text.
///
/// Quoted patterns are re-quoted and regexp patterns are written between
/// slashes. Literal patterns are written verbatim when that parses back to
/// the same literal, otherwise as an escaped `/.../` that [`normalize`]
/// turns back into the literal.
pub fn render(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Operator(op) if op.kind == OperatorKind::Or && nodes.len() > 1 => {
                format!("({})", render_node(node))
            }
            _ => render_node(node),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_node(node: &Node) -> String {
    match node {
        Node::Pattern(p) => render_pattern(p),
        Node::Parameter(p) => render_parameter(p),
        Node::Operator(op) => {
            let separator = format!(" {} ", op.kind.keyword());
            op.operands
                .iter()
                .map(|operand| match operand {
                    Node::Operator(_) => format!("({})", render_node(operand)),
                    other => render_node(other),
                })
                .collect::<Vec<_>>()
                .join(separator.as_str())
        }
    }
}

fn render_pattern(p: &Pattern) -> String {
    let text = if p.is(Label::Quoted) {
        quote(&p.value)
    } else if p.is(Label::Regexp) {
        format!("/{}/", p.value.replace('/', "\\/"))
    } else if reads_back_as_literal(&p.value) {
        p.value.clone()
    } else {
        format!("/{}/", regex::escape(&p.value).replace('/', "\\/"))
    };

    if p.negated {
        format!("-{}", text)
    } else {
        text
    }
}

/// Whether `value` written verbatim parses back to the same literal
fn reads_back_as_literal(value: &str) -> bool {
    // Unbalanced trailing `)` would close an enclosing group
    if value.ends_with(')') && value.matches(')').count() > value.matches('(').count() {
        return false;
    }

    match parse(value, SearchType::Literal).as_deref() {
        Ok([Node::Pattern(p)]) => !p.negated && p.is(Label::Literal) && p.value == value,
        _ => false,
    }
}

fn render_parameter(p: &Parameter) -> String {
    let needs_quotes = p.annotation.labels.is_set(Label::Quoted)
        || p.value.is_empty()
        || p.value.chars().any(|c| c.is_whitespace() || c == '"' || c == '(' || c == ')');
    let value = if needs_quotes {
        quote(&p.value)
    } else {
        p.value.clone()
    };

    format!("{}{}:{}", if p.negated { "-" } else { "" }, p.field, value)
}

/// Normalize a parsed tree for `search_type`.
///
/// Nested operators of the same kind are flattened, empty operators dropped
/// and single-operand operators collapsed. Regexp patterns must compile; in
/// literal mode a regexp whose metacharacters are all escaped becomes the
/// literal it matches.
pub fn normalize(nodes: &[Node], search_type: SearchType) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match normalize_node(node, search_type)? {
            Some(Node::Operator(Operator {
                kind: OperatorKind::And,
                operands,
            })) => out.extend(operands),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn normalize_node(node: &Node, search_type: SearchType) -> Result<Option<Node>> {
    match node {
        Node::Parameter(p) => Ok(Some(Node::Parameter(p.clone()))),
        Node::Pattern(p) => normalize_pattern(p, search_type).map(|p| Some(Node::Pattern(p))),
        Node::Operator(op) => {
            let mut operands = Vec::with_capacity(op.operands.len());
            for operand in &op.operands {
                match normalize_node(operand, search_type)? {
                    Some(Node::Operator(inner)) if inner.kind == op.kind => {
                        operands.extend(inner.operands)
                    }
                    Some(other) => operands.push(other),
                    None => {}
                }
            }

            Ok(match operands.len() {
                0 => None,
                1 => operands.pop(),
                _ => Some(Node::Operator(Operator {
                    kind: op.kind,
                    operands,
                })),
            })
        }
    }
}

fn normalize_pattern(p: &Pattern, search_type: SearchType) -> Result<Pattern> {
    let mut p = p.clone();
    if p.is(Label::Regexp) {
        Regex::new(&p.value).map_err(|e| ParseError::InvalidRegexp {
            pattern: p.value.clone(),
            message: e.to_string(),
        })?;

        if search_type == SearchType::Literal {
            if let Some(literal) = escaped_literal(&p.value) {
                p.value = literal;
                p.annotation.labels.set(Label::Literal);
            }
        }
    }
    Ok(p)
}

pub(crate) fn has_metacharacters(value: &str) -> bool {
    regex::escape(value) != value
}

fn is_metacharacter(c: char) -> bool {
    has_metacharacters(c.encode_utf8(&mut [0; 4]))
}

/// The text `value` matches, if it has no unescaped metacharacters
fn escaped_literal(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(c) if is_metacharacter(c) => out.push(c),
                _ => return None,
            },
            c if is_metacharacter(c) => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Flatten a node tree into a Basic query.
///
/// The top level is an implicit conjunction: parameters are lifted out and
/// the remaining nodes become the pattern. Parameters nested under an
/// operator are rejected.
pub fn to_basic(nodes: &[Node]) -> Result<Basic> {
    let mut parameters = Vec::new();
    let mut patterns = Vec::new();

    let mut stack: Vec<&Node> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Parameter(p) => parameters.push(p.clone()),
            Node::Operator(op) if op.kind == OperatorKind::And => {
                stack.extend(op.operands.iter().rev());
            }
            other => {
                if let Some(p) = other.find_parameter() {
                    return Err(ParseError::NestedParameter(p.field));
                }
                patterns.push(other.clone());
            }
        }
    }

    let pattern = match patterns.len() {
        0 => None,
        1 => patterns.pop(),
        _ => Some(Node::and(patterns)),
    };

    Ok(Basic::new(parameters, pattern))
}

/// Split a normalized tree into a plan.
///
/// A single top-level `or` whose branches carry parameters becomes one
/// Basic per branch, in order; anything else is a single Basic.
pub fn to_plan(nodes: &[Node]) -> Result<Plan> {
    if nodes.is_empty() {
        return Err(ParseError::EmptyQuery);
    }

    let basics = match nodes {
        [Node::Operator(op)]
            if op.kind == OperatorKind::Or && op.operands.iter().any(Node::contains_parameter) =>
        {
            op.operands
                .iter()
                .map(|branch| to_basic(std::slice::from_ref(branch)))
                .collect::<Result<Vec<_>>>()?
        }
        _ => vec![to_basic(nodes)?],
    };

    Plan::new(basics).map_err(|_| ParseError::EmptyQuery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::patterns;

    fn single_pattern(input: &str, search_type: SearchType) -> Pattern {
        match parse(input, search_type).unwrap().as_slice() {
            [Node::Pattern(p)] => p.clone(),
            other => panic!("expected a single pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_query() {
        let p = single_pattern("hello", SearchType::Literal);
        assert_eq!(p.value, "hello");
        assert!(p.is(Label::Literal));
    }

    #[test]
    fn test_empty_query() {
        assert!(parse("   ", SearchType::Literal).unwrap().is_empty());
    }

    #[test]
    fn test_quoted_regex_mode() {
        let p = single_pattern(r#""foo \"bar\"""#, SearchType::Regex);
        assert_eq!(p.value, r#"foo "bar""#);
        assert!(p.is(Label::Quoted));
        assert!(!p.is(Label::Literal));
    }

    #[test]
    fn test_quoted_literal_mode_keeps_quotes() {
        let p = single_pattern("\"hello world\"", SearchType::Literal);
        assert_eq!(p.value, "\"hello world\"");
        assert!(p.is(Label::Literal));
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            parse("\"foo", SearchType::Regex),
            Err(ParseError::UnterminatedQuote(0))
        );
        let p = single_pattern("\"foo", SearchType::Literal);
        assert_eq!(p.value, "\"foo");
    }

    #[test]
    fn test_bare_regex_mode() {
        let p = single_pattern("foo.*bar", SearchType::Regex);
        assert!(p.is(Label::Regexp));
    }

    #[test]
    fn test_delimited_regex() {
        let p = single_pattern("/a\\/b+/", SearchType::Literal);
        assert_eq!(p.value, "a/b+");
        assert!(p.is(Label::Regexp));

        // Closing slash not at a term boundary
        let p = single_pattern("/usr/bin", SearchType::Literal);
        assert_eq!(p.value, "/usr/bin");
        assert!(p.is(Label::Literal));
    }

    #[test]
    fn test_implicit_and() {
        let nodes = parse("foo bar", SearchType::Literal).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_explicit_and_matches_implicit() {
        assert_eq!(
            parse("foo and bar", SearchType::Literal).unwrap(),
            parse("foo bar", SearchType::Literal).unwrap()
        );
    }

    #[test]
    fn test_or_query() {
        let nodes = parse("foo or bar baz", SearchType::Literal).unwrap();
        match nodes.as_slice() {
            [Node::Operator(op)] => {
                assert_eq!(op.kind, OperatorKind::Or);
                assert_eq!(op.operands.len(), 2);
                assert!(matches!(&op.operands[1], Node::Operator(inner) if inner.kind == OperatorKind::And));
            }
            other => panic!("expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let nodes = parse("foo OR bar", SearchType::Literal).unwrap();
        assert!(matches!(nodes.as_slice(), [Node::Operator(op)] if op.kind == OperatorKind::Or));
    }

    #[test]
    fn test_keyword_prefix_is_text() {
        let nodes = parse("order notion", SearchType::Literal).unwrap();
        let values: Vec<_> = patterns(&nodes).iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec!["order", "notion"]);
    }

    #[test]
    fn test_missing_operand() {
        assert!(matches!(
            parse("foo or", SearchType::Literal),
            Err(ParseError::MissingOperand { keyword: "or", .. })
        ));
        assert!(matches!(
            parse("and foo", SearchType::Literal),
            Err(ParseError::MissingOperand { keyword: "and", .. })
        ));
        assert!(matches!(
            parse("foo not", SearchType::Literal),
            Err(ParseError::MissingOperand { keyword: "not", .. })
        ));
        assert!(matches!(
            parse("or foo", SearchType::Literal),
            Err(ParseError::MissingOperand { keyword: "or", .. })
        ));
    }

    #[test]
    fn test_not_query() {
        let p = single_pattern("not test", SearchType::Literal);
        assert!(p.negated);
        let p = single_pattern("-test", SearchType::Literal);
        assert!(p.negated);
        assert_eq!(p.value, "test");
    }

    #[test]
    fn test_lone_dash_is_text() {
        let nodes = parse("a - b", SearchType::Literal).unwrap();
        assert_eq!(patterns(&nodes)[1].value, "-");
    }

    #[test]
    fn test_negated_group_rejected() {
        assert_eq!(
            parse("not (a or b)", SearchType::Literal),
            Err(ParseError::NegatedGroup(0))
        );
        assert_eq!(parse("x -(a)", SearchType::Literal), Err(ParseError::NegatedGroup(2)));
    }

    #[test]
    fn test_groups() {
        let nodes = parse("(a or b) c", SearchType::Literal).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[0], Node::Operator(op) if op.kind == OperatorKind::Or));
    }

    #[test]
    fn test_group_errors() {
        assert_eq!(parse("(a b", SearchType::Literal), Err(ParseError::UnclosedGroup(0)));
        assert_eq!(parse("x ( )", SearchType::Literal), Err(ParseError::EmptyGroup(2)));
    }

    #[test]
    fn test_call_parens_stay_in_word() {
        let p = single_pattern("foo()", SearchType::Literal);
        assert_eq!(p.value, "foo()");

        let nodes = parse("(foo() or bar)", SearchType::Literal).unwrap();
        let values: Vec<_> = patterns(&nodes).iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec!["foo()", "bar"]);
    }

    #[test]
    fn test_field_filter() {
        let nodes = parse("repo:sourcegraph -file:test foo", SearchType::Literal).unwrap();
        assert_eq!(nodes.len(), 3);
        match &nodes[1] {
            Node::Parameter(p) => {
                assert_eq!(p.field, Field::File);
                assert_eq!(p.value, "test");
                assert!(p.negated);
            }
            other => panic!("expected parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_parameter_value() {
        let nodes = parse("file:\"a b\"", SearchType::Literal).unwrap();
        match nodes.as_slice() {
            [Node::Parameter(p)] => {
                assert_eq!(p.value, "a b");
                assert!(p.annotation.labels.is_set(Label::Quoted));
            }
            other => panic!("expected parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_is_pattern_text() {
        let p = single_pattern("path:src", SearchType::Literal);
        assert_eq!(p.value, "path:src");
    }

    #[test]
    fn test_empty_parameter_value() {
        assert_eq!(
            parse("repo: foo", SearchType::Literal),
            Err(ParseError::EmptyParameterValue(Field::Repo))
        );
    }

    #[test]
    fn test_render_round_trip() {
        for input in [
            "repo:foo bar",
            "-file:test (a or b)",
            "\"quoted text\" /re.*x/",
            "a or (b and c)",
        ] {
            let nodes = parse(input, SearchType::Literal).unwrap();
            let rendered = render(&nodes);
            assert_eq!(parse(&rendered, SearchType::Literal).unwrap(), nodes, "{}", rendered);
        }
    }

    #[test]
    fn test_render_escapes_ambiguous_literals() {
        let nodes = vec![Node::Pattern(Pattern::literal("foo bar"))];
        assert_eq!(render(&nodes), "/foo bar/");

        let nodes = vec![Node::Pattern(Pattern::literal("or"))];
        assert_eq!(render(&nodes), "/or/");

        let nodes = vec![Node::Pattern(Pattern::literal("a.b -c"))];
        assert_eq!(render(&nodes), r"/a\.b \-c/");
    }

    #[test]
    fn test_render_keeps_literal_quotes_distinct() {
        let bare = vec![Node::Pattern(Pattern::literal("foo bar"))];
        let quoted = vec![Node::Pattern(Pattern::literal("\"foo bar\""))];
        assert_ne!(render(&bare), render(&quoted));
    }

    #[test]
    fn test_render_literal_round_trip() {
        for value in ["foo bar", "\"foo bar\"", "or", "-x", "a.b (c", "/x/", r"a\/b", "say \"hi\""] {
            let basic = to_basic(&[Node::Pattern(Pattern::literal(value))]).unwrap();
            let plan = pipeline(&render(&basic.to_parse_tree()), SearchType::Literal).unwrap();
            assert_eq!(plan.basics(), &[basic], "{}", value);
        }
    }

    #[test]
    fn test_normalize_unescapes_literal_regexp() {
        let nodes = parse(r"/a\.b/ /a.b/ /a\d/", SearchType::Literal).unwrap();
        let normalized = normalize(&nodes, SearchType::Literal).unwrap();
        let ps = patterns(&normalized);
        assert_eq!(ps[0], &Pattern::literal("a.b"));
        assert!(ps[1].is(Label::Regexp));
        assert!(ps[2].is(Label::Regexp));

        let kept = normalize(&nodes, SearchType::Regex).unwrap();
        assert_eq!(patterns(&kept)[0], &Pattern::regexp(r"a\.b"));
    }

    #[test]
    fn test_render_quoted_escapes() {
        let nodes = vec![Node::Pattern(Pattern::quoted("say \"hi\""))];
        assert_eq!(render(&nodes), r#""say \"hi\"""#);
        assert_eq!(
            single_pattern(&render(&nodes), SearchType::Regex).value,
            "say \"hi\""
        );
    }

    #[test]
    fn test_normalize_flattens() {
        let nodes = vec![Node::and(vec![
            Node::Pattern(Pattern::literal("a")),
            Node::and(vec![Node::Pattern(Pattern::literal("b"))]),
        ])];
        let normalized = normalize(&nodes, SearchType::Literal).unwrap();
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_normalize_relabels_plain_regexp() {
        let nodes = parse("foo bar.*", SearchType::Regex).unwrap();
        let normalized = normalize(&nodes, SearchType::Literal).unwrap();
        let ps = patterns(&normalized);
        assert!(ps[0].is(Label::Literal));
        assert!(ps[1].is(Label::Regexp));

        let kept = normalize(&nodes, SearchType::Regex).unwrap();
        assert!(patterns(&kept)[0].is(Label::Regexp));
    }

    #[test]
    fn test_normalize_rejects_invalid_regexp() {
        let nodes = parse("foo(", SearchType::Regex).unwrap();
        assert!(matches!(
            normalize(&nodes, SearchType::Regex),
            Err(ParseError::InvalidRegexp { .. })
        ));
    }

    #[test]
    fn test_to_basic_lifts_parameters() {
        let nodes = parse("foo repo:x bar", SearchType::Literal).unwrap();
        let basic = to_basic(&nodes).unwrap();
        assert_eq!(basic.parameters.len(), 1);
        assert!(matches!(&basic.pattern, Some(Node::Operator(op)) if op.operands.len() == 2));
    }

    #[test]
    fn test_to_basic_rejects_nested_parameter() {
        let nodes = parse("foo (repo:x or bar)", SearchType::Literal).unwrap();
        assert_eq!(to_basic(&nodes), Err(ParseError::NestedParameter(Field::Repo)));
    }

    #[test]
    fn test_pipeline_splits_parameter_branches() {
        let plan = pipeline("(repo:a foo) or (repo:b bar)", SearchType::Literal).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.basics()[1].find_value(Field::Repo), Some("b"));
    }

    #[test]
    fn test_pipeline_keeps_pattern_or() {
        let plan = pipeline("repo:a (foo or bar)", SearchType::Literal).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_pipeline_empty() {
        assert_eq!(pipeline("", SearchType::Literal).err(), Some(ParseError::EmptyQuery));
    }

    #[test]
    fn test_search_type_from_str() {
        assert_eq!("REGEXP".parse::<SearchType>(), Ok(SearchType::Regex));
        assert!("structural".parse::<SearchType>().is_err());
    }
}
