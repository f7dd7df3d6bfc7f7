//! Recursive-descent parser from expression text to a regex syntax tree.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! alternation := concat ('|' concat)*
//! concat      := repeat*
//! repeat      := atom ('*' | '+' | '?' | '{n}' | '{n,}' | '{n,m}')*
//! atom        := '(' ['?:'] alternation ')' | '[' class ']' | '.'
//!              | '"' text '"' | '\' escape | '^' | '$' | char
//! ```

use crate::charset::CharSet;
use crate::error::{RegexError, RegexResult};

/// Largest accepted `{n,m}` bound.
pub const REPETITION_LIMIT: u32 = 1000;

/// Regex syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches the empty string.
    Empty,
    /// Matches one character of the set. An empty set matches nothing.
    Class(CharSet),
    /// Matches each child in order.
    Concat(Vec<Node>),
    /// Matches any one child.
    Alternate(Vec<Node>),
    /// Matches the child between `min` and `max` times (`None` is unbounded).
    Repeat {
        /// Repeated expression.
        node: Box<Node>,
        /// Minimum repetitions.
        min: u32,
        /// Maximum repetitions.
        max: Option<u32>,
    },
}

/// Parses `pattern` into a syntax tree.
///
/// # Errors
///
/// Returns [`RegexError`] on malformed input or unsupported constructs.
pub fn parse(pattern: &str) -> RegexResult<Node> {
    let mut parser = Parser {
        chars: pattern.char_indices().collect(),
        pos: 0,
        len: pattern.len(),
    };
    let node = parser.alternation()?;
    match parser.peek() {
        None => Ok(node),
        Some(')') => Err(RegexError::syntax(parser.offset(), "unmatched ')'")),
        Some(c) => Err(RegexError::syntax(
            parser.offset(),
            format!("unexpected character '{c}'"),
        )),
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(i, _)| i)
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

    fn alternation(&mut self) -> RegexResult<Node> {
        let mut branches = vec![self.concat()?];
        while self.eat('|') {
            branches.push(self.concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.swap_remove(0)
        } else {
            Node::Alternate(branches)
        })
    }

    fn concat(&mut self) -> RegexResult<Node> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.repeat()?);
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.swap_remove(0),
            _ => Node::Concat(items),
        })
    }

    fn repeat(&mut self) -> RegexResult<Node> {
        let mut node = self.atom()?;
        loop {
            let (min, max) = match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    (0, None)
                }
                Some('+') => {
                    self.pos += 1;
                    (1, None)
                }
                Some('?') => {
                    self.pos += 1;
                    (0, Some(1))
                }
                Some('{') => self.bounds()?,
                _ => return Ok(node),
            };
            node = Node::Repeat {
                node: Box::new(node),
                min,
                max,
            };
        }
    }

    fn bounds(&mut self) -> RegexResult<(u32, Option<u32>)> {
        let start = self.offset();
        self.pos += 1;
        let min = self
            .number()?
            .ok_or_else(|| RegexError::syntax(self.offset(), "expected repetition count"))?;
        let max = if self.eat(',') {
            self.number()?
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(RegexError::syntax(self.offset(), "expected '}'"));
        }
        for bound in std::iter::once(min).chain(max) {
            if bound > REPETITION_LIMIT {
                return Err(RegexError::RepetitionTooLarge {
                    position: start,
                    bound,
                    limit: REPETITION_LIMIT,
                });
            }
        }
        if max.is_some_and(|max| max < min) {
            return Err(RegexError::syntax(
                start,
                "repetition maximum is smaller than minimum",
            ));
        }
        Ok((min, max))
    }

    fn number(&mut self) -> RegexResult<Option<u32>> {
        let start = self.offset();
        let mut value: Option<u32> = None;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.pos += 1;
            let next = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or(RegexError::RepetitionTooLarge {
                    position: start,
                    bound: u32::MAX,
                    limit: REPETITION_LIMIT,
                })?;
            value = Some(next);
        }
        Ok(value)
    }

    fn atom(&mut self) -> RegexResult<Node> {
        let offset = self.offset();
        let Some(c) = self.bump() else {
            return Err(RegexError::syntax(offset, "unexpected end of expression"));
        };
        match c {
            '(' => {
                if self.peek() == Some('?') {
                    if self.peek_at(1) == Some(':') {
                        self.pos += 2;
                    } else {
                        return Err(RegexError::unsupported(offset, "(?"));
                    }
                }
                let inner = self.alternation()?;
                if !self.eat(')') {
                    return Err(RegexError::syntax(offset, "unclosed group"));
                }
                Ok(inner)
            }
            '[' => Ok(Node::Class(self.class(offset)?)),
            '.' => Ok(Node::Class(CharSet::any())),
            '"' => self.quoted(offset),
            '\\' => Ok(Node::Class(self.escape(offset)?)),
            '^' | '$' => Ok(Node::Empty),
            '*' | '+' | '?' => Err(RegexError::syntax(
                offset,
                format!("repetition operator '{c}' has nothing to repeat"),
            )),
            '{' => Err(RegexError::syntax(offset, "repetition has nothing to repeat")),
            _ => Ok(Node::Class(CharSet::single(c))),
        }
    }

    fn quoted(&mut self, offset: usize) -> RegexResult<Node> {
        let mut items = Vec::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some(c) => items.push(Node::Class(CharSet::single(c))),
                None => return Err(RegexError::syntax(offset, "unterminated quoted string")),
            }
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.swap_remove(0),
            _ => Node::Concat(items),
        })
    }

    /// Parses an escape; the backslash at `offset` is already consumed.
    fn escape(&mut self, offset: usize) -> RegexResult<CharSet> {
        let Some(c) = self.bump() else {
            return Err(RegexError::syntax(offset, "trailing backslash"));
        };
        Ok(match c {
            'd' => CharSet::digit(),
            'D' => CharSet::digit().negate(),
            'w' => CharSet::word(),
            'W' => CharSet::word().negate(),
            's' => CharSet::space(),
            'S' => CharSet::non_space(),
            'n' => CharSet::single('\n'),
            't' => CharSet::single('\t'),
            'r' => CharSet::single('\r'),
            'f' => CharSet::single('\u{0C}'),
            'p' | 'P' | 'b' | 'B' => {
                return Err(RegexError::unsupported(offset, format!("\\{c}")));
            }
            other => CharSet::single(other),
        })
    }

    /// Parses a bracket class; the `[` at `offset` is already consumed.
    fn class(&mut self, offset: usize) -> RegexResult<CharSet> {
        let negated = self.eat('^');
        let mut set = CharSet::empty();
        let mut first = true;
        loop {
            let item_offset = self.offset();
            let Some(c) = self.bump() else {
                return Err(RegexError::syntax(offset, "unclosed character class"));
            };
            match c {
                ']' if !first => break,
                ']' => return Err(RegexError::syntax(item_offset, "empty character class")),
                '[' => set = set.union(&self.class(item_offset)?),
                '\\' => {
                    let escaped = self.escape(item_offset)?;
                    set = set.union(&self.maybe_range(escaped, item_offset)?);
                }
                _ => {
                    set = set.union(&self.maybe_range(CharSet::single(c), item_offset)?);
                }
            }
            first = false;
        }
        Ok(if negated { set.negate() } else { set })
    }

    /// Extends a single-character `start` into `start-end` when a range follows.
    fn maybe_range(&mut self, start: CharSet, offset: usize) -> RegexResult<CharSet> {
        let is_range = self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None);
        if !is_range {
            return Ok(start);
        }
        let Some(lo) = single_char(&start) else {
            return Err(RegexError::syntax(offset, "invalid range start"));
        };
        self.pos += 1;
        let end_offset = self.offset();
        let hi = match self.bump() {
            Some('\\') => single_char(&self.escape(end_offset)?)
                .ok_or_else(|| RegexError::syntax(end_offset, "invalid range end"))?,
            Some(c) => c,
            None => return Err(RegexError::syntax(end_offset, "unclosed character class")),
        };
        if hi < lo {
            return Err(RegexError::syntax(offset, "range out of order"));
        }
        Ok(CharSet::range(lo, hi))
    }
}

fn single_char(set: &CharSet) -> Option<char> {
    match set.ranges() {
        [(lo, hi)] if lo == hi => char::from_u32(*lo),
        _ => None,
    }
}
