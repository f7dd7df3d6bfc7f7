//! Indented source text accumulator.

use std::fmt;

/// Accumulates lines of generated source with block indentation.
///
/// Lines are indented by `spacer` once per open block. The line ending
/// (`;` for Java, nothing for Groovy) is appended with
/// [`add_at_the_end`](Self::add_at_the_end), which never doubles it and never
/// places it after an opening brace.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    buffer: String,
    spacer: String,
    indents: usize,
    line_ending: String,
    label_prefix: String,
}

impl BlockBuilder {
    /// Create an empty builder indenting with `spacer`.
    pub fn new(spacer: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            spacer: spacer.into(),
            indents: 0,
            line_ending: String::new(),
            label_prefix: String::new(),
        }
    }

    /// Set the statement terminator.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Set the prefix placed before BDD labels.
    pub fn with_label_prefix(mut self, label_prefix: impl Into<String>) -> Self {
        self.label_prefix = label_prefix.into();
        self
    }

    /// The statement terminator.
    pub fn line_ending(&self) -> &str {
        &self.line_ending
    }

    /// Current indentation depth.
    pub fn indents(&self) -> usize {
        self.indents
    }

    /// Open a block.
    pub fn start_block(&mut self) -> &mut Self {
        self.indents += 1;
        self
    }

    /// Close a block.
    pub fn end_block(&mut self) -> &mut Self {
        self.indents = self.indents.saturating_sub(1);
        self
    }

    /// Open two blocks.
    pub fn indent(&mut self) -> &mut Self {
        self.start_block().start_block()
    }

    /// Close two blocks.
    pub fn unindent(&mut self) -> &mut Self {
        self.end_block().end_block()
    }

    /// Append an indented line.
    pub fn add_line(&mut self, line: &str) -> &mut Self {
        self.add_indented(line).append("\n")
    }

    /// Append indented text without a newline.
    pub fn add_indented(&mut self, text: &str) -> &mut Self {
        self.add_indentation().append(text)
    }

    /// Append an indented line ending with the statement terminator.
    pub fn add_line_with_ending(&mut self, line: &str) -> &mut Self {
        let ending = self.line_ending.clone();
        self.add_indented(line)
            .add_at_the_end(&ending)
            .add_empty_line()
    }

    /// Append the statement terminator unless it is already there.
    pub fn add_ending_if_not_present(&mut self) -> &mut Self {
        let ending = self.line_ending.clone();
        self.add_at_the_end(&ending)
    }

    /// Append a label with the label prefix.
    pub fn append_with_label_prefix(&mut self, label: &str) -> &mut Self {
        let prefix = self.label_prefix.clone();
        self.append(&prefix).append(label)
    }

    /// Append a newline.
    pub fn add_empty_line(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    /// Append raw text.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    /// Append the current indentation.
    pub fn add_indentation(&mut self) -> &mut Self {
        for _ in 0..self.indents {
            self.buffer.push_str(&self.spacer);
        }
        self
    }

    /// Whether the text ends with `text`.
    pub fn ends_with(&self, text: &str) -> bool {
        self.buffer.ends_with(text)
    }

    /// Append `to_add` at the end of the last line.
    ///
    /// Nothing is added when the text already ends with `to_add`, or when the
    /// line ends with `{` and `to_add` is the terminator. A trailing newline
    /// is kept after the added text.
    pub fn add_at_the_end(&mut self, to_add: &str) -> &mut Self {
        if to_add.is_empty() {
            return self;
        }
        let mut tail = self.buffer.chars().rev();
        let Some(last) = tail.next() else {
            return self.append(to_add);
        };
        let second_last = tail.next();
        let last = last.to_string();
        let ends_with_new_line = last == "\n";
        if last == to_add {
            return self;
        }
        if !ends_with_new_line && self.is_special(&last, to_add) && to_add == self.line_ending {
            return self;
        }
        let second_last_special =
            second_last.is_some_and(|c| self.is_special(&c.to_string(), to_add));
        if ends_with_new_line {
            if !second_last_special {
                self.buffer.pop();
                self.buffer.push_str(to_add);
                self.buffer.push('\n');
            }
            return self;
        }
        self.append(to_add)
    }

    fn is_special(&self, character: &str, to_add: &str) -> bool {
        character == "{"
            || (character == self.spacer && (to_add == self.spacer || to_add == " "))
            || character == to_add
            || (character == "\n" && (to_add == "\n" || to_add == " " || to_add == self.line_ending))
    }

    /// Replace the whole text.
    pub fn update_contents(&mut self, contents: impl Into<String>) -> &mut Self {
        self.buffer = contents.into();
        self
    }
}

impl fmt::Display for BlockBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}
