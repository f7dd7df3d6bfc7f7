//! JSON path parsing and evaluation.
//!
//! Supported syntax:
//!
//! | Syntax | Meaning |
//! |---|---|
//! | `$` | document root |
//! | `.name`, `['name']`, `.['name']` | object member |
//! | `[n]` | array element, negative counts from the end |
//! | `.*`, `[*]` | every member or element |
//! | `..name`, `..*` | recursive descent |
//! | `[?(expr)]` | filter |
//!
//! Filters combine `==`, `!=`, `<`, `<=`, `>`, `>=` and `=~ /regex/` with
//! `&&`, `||` and parentheses. Operands are `@`-relative or `$`-rooted paths
//! (optionally ending in `.size()` or `.length()`), quoted strings, numbers,
//! `true`, `false` and `null`. On an array a filter keeps the matching
//! elements; on any other value it keeps or drops the value itself.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{PathError, PathResult};

/// A parsed path segment.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Object member by name.
    Child(String),
    /// Array element by position.
    Index(i64),
    /// Every member or element.
    Wildcard,
    /// Recursive descent to a named member, or to everything when `None`.
    Descendant(Option<String>),
    /// Filter expression.
    Filter(Box<Filter>),
}

/// A filter expression.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Either side holds.
    Or(Box<Filter>, Box<Filter>),
    /// Both sides hold.
    And(Box<Filter>, Box<Filter>),
    /// The operand resolves to a value.
    Exists(Operand),
    /// Binary comparison.
    Compare {
        /// Left operand.
        left: Operand,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Operand,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=~`, full regex match
    Matches,
}

/// Functions applicable to a filter path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `size()` or `length()`: element, member or character count.
    Size,
}

/// A filter operand.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Path relative to the value being filtered (`@`).
    Current {
        /// Segments after `@`.
        segments: Vec<Segment>,
        /// Trailing function, if any.
        function: Option<Function>,
    },
    /// Path from the document root (`$`).
    Root {
        /// Segments after `$`.
        segments: Vec<Segment>,
        /// Trailing function, if any.
        function: Option<Function>,
    },
    /// Constant.
    Literal(Value),
    /// `/regex/` right-hand side of `=~`, compiled as a full match.
    Regex(Regex),
}

/// One step of a concrete location in a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// Concrete location of a value, as steps from the root.
pub type Location = Vec<Step>;

/// A parsed JSON path.
#[derive(Debug, Clone)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parses a path such as `$.store.book[?(@.price < 10)]`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] on malformed paths or invalid filter regexes.
    pub fn parse(path: &str) -> PathResult<Self> {
        let mut parser = Parser::new(path);
        let segments = parser.path()?;
        Ok(Self {
            source: path.to_string(),
            segments,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path can match at most one value.
    #[must_use]
    pub fn is_definite(&self) -> bool {
        is_definite(&self.segments)
    }

    /// Every value the path matches, in document order.
    #[must_use]
    pub fn evaluate<'a>(&self, json: &'a Value) -> Vec<&'a Value> {
        walk(&self.segments, json, json)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// Concrete locations of every matched value.
    #[must_use]
    pub fn locate(&self, json: &Value) -> Vec<Location> {
        walk(&self.segments, json, json)
            .into_iter()
            .map(|(location, _)| location)
            .collect()
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Reads the value at `path`.
///
/// A definite path yields the matched value; any other path yields an array
/// of every match.
///
/// # Errors
///
/// Returns [`PathError::NotFound`] when a definite path matches nothing.
pub fn read_element(json: &Value, path: &str) -> PathResult<Value> {
    let parsed = JsonPath::parse(path)?;
    let matches = parsed.evaluate(json);
    if parsed.is_definite() {
        matches
            .first()
            .map(|value| (*value).clone())
            .ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
            })
    } else {
        Ok(Value::Array(matches.into_iter().cloned().collect()))
    }
}

/// Removes every value matched by `path` and returns how many were removed.
///
/// The root itself is never removed.
///
/// # Errors
///
/// Returns [`PathError`] when the path does not parse.
pub fn delete(json: &mut Value, path: &str) -> PathResult<usize> {
    let parsed = JsonPath::parse(path)?;
    let mut locations = parsed.locate(json);
    locations.retain(|location| !location.is_empty());
    locations.sort();
    locations.dedup();
    let mut removed = 0;
    // Later siblings and descendants first so earlier locations stay valid.
    for location in locations.iter().rev() {
        if remove_at(json, location) {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Looks up a concrete location.
#[must_use]
pub fn value_at<'a>(json: &'a Value, location: &[Step]) -> Option<&'a Value> {
    location.iter().try_fold(json, |node, step| match step {
        Step::Key(key) => node.as_object()?.get(key),
        Step::Index(index) => node.as_array()?.get(*index),
    })
}

fn value_at_mut<'a>(json: &'a mut Value, location: &[Step]) -> Option<&'a mut Value> {
    location.iter().try_fold(json, |node, step| match step {
        Step::Key(key) => node.as_object_mut()?.get_mut(key),
        Step::Index(index) => node.as_array_mut()?.get_mut(*index),
    })
}

fn remove_at(json: &mut Value, location: &[Step]) -> bool {
    let Some((last, parent)) = location.split_last() else {
        return false;
    };
    let Some(parent) = value_at_mut(json, parent) else {
        return false;
    };
    match (last, parent) {
        (Step::Key(key), Value::Object(map)) => map.shift_remove(key).is_some(),
        (Step::Index(index), Value::Array(items)) if *index < items.len() => {
            items.remove(*index);
            true
        }
        _ => false,
    }
}

fn is_definite(segments: &[Segment]) -> bool {
    segments
        .iter()
        .all(|segment| matches!(segment, Segment::Child(_) | Segment::Index(_)))
}

fn extended(location: &Location, step: Step) -> Location {
    let mut next = location.clone();
    next.push(step);
    next
}

fn walk<'a>(segments: &[Segment], start: &'a Value, root: &'a Value) -> Vec<(Location, &'a Value)> {
    let mut nodes = vec![(Vec::new(), start)];
    for segment in segments {
        let mut next = Vec::new();
        for (location, node) in &nodes {
            apply(segment, location, *node, root, &mut next);
        }
        nodes = next;
    }
    nodes
}

fn apply<'a>(
    segment: &Segment,
    location: &Location,
    node: &'a Value,
    root: &'a Value,
    out: &mut Vec<(Location, &'a Value)>,
) {
    match segment {
        Segment::Child(name) => {
            if let Some(child) = node.as_object().and_then(|map| map.get(name)) {
                out.push((extended(location, Step::Key(name.clone())), child));
            }
        }
        Segment::Index(index) => {
            if let Value::Array(items) = node {
                let resolved = if *index < 0 {
                    usize::try_from(index.unsigned_abs())
                        .ok()
                        .and_then(|back| items.len().checked_sub(back))
                } else {
                    usize::try_from(*index).ok()
                };
                if let Some((i, item)) = resolved.and_then(|i| items.get(i).map(|item| (i, item))) {
                    out.push((extended(location, Step::Index(i)), item));
                }
            }
        }
        Segment::Wildcard => children(location, node, out),
        Segment::Descendant(name) => descend(location, node, name.as_deref(), out),
        Segment::Filter(filter) => match node {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if filter.test(item, root) {
                        out.push((extended(location, Step::Index(i)), item));
                    }
                }
            }
            _ => {
                if filter.test(node, root) {
                    out.push((location.clone(), node));
                }
            }
        },
    }
}

fn children<'a>(location: &Location, node: &'a Value, out: &mut Vec<(Location, &'a Value)>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                out.push((extended(location, Step::Key(key.clone())), value));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                out.push((extended(location, Step::Index(i)), item));
            }
        }
        _ => {}
    }
}

fn descend<'a>(
    location: &Location,
    node: &'a Value,
    name: Option<&str>,
    out: &mut Vec<(Location, &'a Value)>,
) {
    if let Some(name) = name {
        if let Some(child) = node.as_object().and_then(|map| map.get(name)) {
            out.push((extended(location, Step::Key(name.to_string())), child));
        }
    }
    let mut direct = Vec::new();
    children(location, node, &mut direct);
    for (child_location, child) in direct {
        if name.is_none() {
            out.push((child_location.clone(), child));
        }
        descend(&child_location, child, name, out);
    }
}

impl Filter {
    fn test(&self, current: &Value, root: &Value) -> bool {
        match self {
            Self::Or(left, right) => left.test(current, root) || right.test(current, root),
            Self::And(left, right) => left.test(current, root) && right.test(current, root),
            Self::Exists(operand) => operand.resolve(current, root).is_some(),
            Self::Compare { left, op, right } => compare(left, *op, right, current, root),
        }
    }
}

impl Operand {
    fn resolve<'a>(&'a self, current: &'a Value, root: &'a Value) -> Option<Cow<'a, Value>> {
        match self {
            Self::Literal(value) => Some(Cow::Borrowed(value)),
            Self::Regex(_) => None,
            Self::Current { segments, function } => select(segments, *function, current, root),
            Self::Root { segments, function } => select(segments, *function, root, root),
        }
    }
}

fn select<'a>(
    segments: &[Segment],
    function: Option<Function>,
    start: &'a Value,
    root: &'a Value,
) -> Option<Cow<'a, Value>> {
    let matches = walk(segments, start, root);
    let value = if is_definite(segments) {
        Cow::Borrowed(matches.into_iter().next()?.1)
    } else {
        Cow::Owned(Value::Array(
            matches.into_iter().map(|(_, value)| value.clone()).collect(),
        ))
    };
    match function {
        None => Some(value),
        Some(Function::Size) => size_of(&value).map(|size| Cow::Owned(Value::from(size))),
    }
}

fn size_of(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

fn compare(left: &Operand, op: CompareOp, right: &Operand, current: &Value, root: &Value) -> bool {
    if op == CompareOp::Matches {
        let Operand::Regex(regex) = right else {
            return false;
        };
        return left
            .resolve(current, root)
            .and_then(|value| scalar_text(&value))
            .is_some_and(|text| regex.is_match(&text));
    }
    let (Some(l), Some(r)) = (left.resolve(current, root), right.resolve(current, root)) else {
        return false;
    };
    match op {
        CompareOp::Eq => values_equal(&l, &r),
        CompareOp::Ne => !values_equal(&l, &r),
        CompareOp::Lt => ordering(&l, &r) == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering(&l, &r), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering(&l, &r) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering(&l, &r), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Matches => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numbers_cmp(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numbers_cmp(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn numbers_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::Syntax {
            path: self.source.to_string(),
            position: self.chars.get(self.pos).map_or(self.source.len(), |&(i, _)| i),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        let matches = expected
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += expected.chars().count();
        }
        matches
    }

    fn expect(&mut self, expected: char) -> PathResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn path(&mut self) -> PathResult<Vec<Segment>> {
        if !self.eat('$') {
            return Err(self.error("path must start with '$'"));
        }
        let (segments, function) = self.segments(false)?;
        if function.is_some() {
            return Err(self.error("functions are only supported inside filters"));
        }
        match self.peek() {
            None => Ok(segments),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn segments(&mut self, in_filter: bool) -> PathResult<(Vec<Segment>, Option<Function>)> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some('.') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    let segment = match self.peek() {
                        Some('*') => {
                            self.pos += 1;
                            Segment::Descendant(None)
                        }
                        Some('[') => match self.bracket()? {
                            Segment::Child(name) => Segment::Descendant(Some(name)),
                            Segment::Wildcard => Segment::Descendant(None),
                            _ => return Err(self.error("unsupported recursive descent")),
                        },
                        _ => Segment::Descendant(Some(self.name(in_filter)?)),
                    };
                    segments.push(segment);
                }
                Some('.') => {
                    self.pos += 1;
                    match self.peek() {
                        Some('*') => {
                            self.pos += 1;
                            segments.push(Segment::Wildcard);
                        }
                        Some('[') => segments.push(self.bracket()?),
                        _ => {
                            let name = self.name(in_filter)?;
                            if in_filter
                                && (name == "size" || name == "length")
                                && self.eat_str("()")
                            {
                                return Ok((segments, Some(Function::Size)));
                            }
                            segments.push(Segment::Child(name));
                        }
                    }
                }
                Some('[') => segments.push(self.bracket()?),
                _ => return Ok((segments, None)),
            }
        }
    }

    fn name(&mut self, in_filter: bool) -> PathResult<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let stop = c == '.'
                || c == '['
                || (in_filter
                    && (c.is_whitespace()
                        || matches!(c, '(' | ')' | '=' | '!' | '<' | '>' | '&' | '|' | ',')));
            if stop {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a property name"));
        }
        Ok(self.chars[start..self.pos].iter().map(|&(_, c)| c).collect())
    }

    fn bracket(&mut self) -> PathResult<Segment> {
        self.expect('[')?;
        self.skip_ws();
        let segment = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Segment::Wildcard
            }
            Some('?') => {
                self.pos += 1;
                self.skip_ws();
                self.expect('(')?;
                let filter = self.or()?;
                self.skip_ws();
                self.expect(')')?;
                Segment::Filter(Box::new(filter))
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                Segment::Child(self.quoted(quote)?)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => Segment::Index(self.integer()?),
            _ => return Err(self.error("expected '*', '?(', a quoted name or an index")),
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(segment)
    }

    fn quoted(&mut self, quote: char) -> PathResult<String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) if c == quote || c == '\\' => text.push(c),
                    Some(c) => {
                        text.push('\\');
                        text.push(c);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) if c == quote => return Ok(text),
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn integer(&mut self) -> PathResult<i64> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(':') || self.peek() == Some(',') {
            return Err(self.error("slices and unions are not supported"));
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        text.parse()
            .map_err(|_| self.error(format!("invalid index '{text}'")))
    }

    fn or(&mut self) -> PathResult<Filter> {
        let mut left = self.and()?;
        loop {
            self.skip_ws();
            if !self.eat_str("||") {
                return Ok(left);
            }
            let right = self.and()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
    }

    fn and(&mut self) -> PathResult<Filter> {
        let mut left = self.comparison()?;
        loop {
            self.skip_ws();
            if !self.eat_str("&&") {
                return Ok(left);
            }
            let right = self.comparison()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
    }

    fn comparison(&mut self) -> PathResult<Filter> {
        self.skip_ws();
        if self.eat('(') {
            let inner = self.or()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }
        let left = self.operand()?;
        self.skip_ws();
        let Some(op) = self.operator() else {
            return Ok(Filter::Exists(left));
        };
        self.skip_ws();
        let right = self.operand()?;
        if op == CompareOp::Matches && !matches!(right, Operand::Regex(_)) {
            return Err(self.error("'=~' expects a /regex/ operand"));
        }
        Ok(Filter::Compare { left, op, right })
    }

    fn operator(&mut self) -> Option<CompareOp> {
        const OPERATORS: [(&str, CompareOp); 7] = [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("=~", CompareOp::Matches),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ];
        OPERATORS
            .iter()
            .find(|(text, _)| self.eat_str(text))
            .map(|&(_, op)| op)
    }

    fn operand(&mut self) -> PathResult<Operand> {
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let (segments, function) = self.segments(true)?;
                Ok(Operand::Current { segments, function })
            }
            Some('$') => {
                self.pos += 1;
                let (segments, function) = self.segments(true)?;
                Ok(Operand::Root { segments, function })
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                Ok(Operand::Literal(Value::String(self.quoted(quote)?)))
            }
            Some('/') => {
                self.pos += 1;
                self.regex()
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            _ => self.keyword(),
        }
    }

    fn number(&mut self) -> PathResult<Operand> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        serde_json::from_str::<Number>(&text)
            .map(|n| Operand::Literal(Value::Number(n)))
            .map_err(|_| self.error(format!("invalid number '{text}'")))
    }

    fn keyword(&mut self) -> PathResult<Operand> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        match word.as_str() {
            "true" => Ok(Operand::Literal(Value::Bool(true))),
            "false" => Ok(Operand::Literal(Value::Bool(false))),
            "null" => Ok(Operand::Literal(Value::Null)),
            _ => {
                self.pos = start;
                Err(self.error("expected a filter operand"))
            }
        }
    }

    fn regex(&mut self) -> PathResult<Operand> {
        let mut body = String::new();
        loop {
            match self.bump() {
                Some('\\') if self.peek() == Some('/') => {
                    self.pos += 1;
                    body.push('/');
                }
                Some('\\') => {
                    body.push('\\');
                    if let Some(c) = self.bump() {
                        body.push(c);
                    }
                }
                Some('/') => break,
                Some(c) => body.push(c),
                None => return Err(self.error("unterminated regex")),
            }
        }
        let flags = if self.eat('i') { "(?i)" } else { "" };
        Regex::new(&format!("{flags}^(?:{body})$"))
            .map(Operand::Regex)
            .map_err(|e| PathError::InvalidRegex {
                pattern: body,
                message: e.to_string(),
            })
    }
}
