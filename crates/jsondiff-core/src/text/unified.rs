use std::fmt;

use super::{split_lines, LineEdit};

/// Unchanged lines shown around each change.
const EDGE: usize = 3;
/// Changes separated by at most this many unchanged lines share a hunk.
const GAP: usize = EDGE * 2;

/// What a [`Line`] of a hunk does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Present only in the original text.
    Delete,
    /// Present only in the new text.
    Insert,
    /// Shared context.
    Equal,
}

/// One line of a hunk, terminator included when the text had one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Kind of change.
    pub kind: LineKind,
    /// Line content.
    pub content: String,
}

/// A contiguous block of changes with its context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    /// One-based line in the original text where the hunk starts.
    pub from_line: usize,
    /// One-based line in the new text where the hunk starts.
    pub to_line: usize,
    /// Lines in display order.
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Number of original lines covered by the hunk.
    #[must_use]
    pub fn from_count(&self) -> usize {
        self.lines.iter().filter(|line| line.kind != LineKind::Insert).count()
    }

    /// Number of new lines covered by the hunk.
    #[must_use]
    pub fn to_count(&self) -> usize {
        self.lines.iter().filter(|line| line.kind != LineKind::Delete).count()
    }

    fn push(&mut self, kind: LineKind, content: &str) {
        self.lines.push(Line { kind, content: content.to_string() });
    }

    /// Appends `lines[start..end]` as context, stopping at the end of the text.
    fn push_equal(&mut self, lines: &[&str], start: usize, end: usize) -> usize {
        let available = &lines[start.min(lines.len())..end.min(lines.len())];
        for line in available {
            self.push(LineKind::Equal, line);
        }
        available.len()
    }
}

/// A unified diff between two labelled texts.
///
/// Formats to nothing when there are no hunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unified {
    /// Label of the original text.
    pub from: String,
    /// Label of the new text.
    pub to: String,
    /// Hunks in order.
    pub hunks: Vec<Hunk>,
}

impl Unified {
    /// Reports whether the texts were identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

/// Groups `edits` of `content` into hunks with context.
///
/// `edits` must be sorted and non-overlapping, as [`compute_edits`](super::compute_edits) returns them.
#[must_use]
pub fn to_unified(from: &str, to: &str, content: &str, edits: &[LineEdit]) -> Unified {
    let lines = split_lines(content);
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let mut last = 0;
    let mut to_line = 0;
    for edit in edits {
        let start = edit.start;
        to_line += start.saturating_sub(last);
        let mut hunk = match current.take() {
            Some(mut hunk) if start <= last + GAP => {
                hunk.push_equal(&lines, last, start);
                hunk
            }
            previous => {
                if let Some(mut done) = previous {
                    done.push_equal(&lines, last, last + EDGE);
                    hunks.push(done);
                }
                let mut hunk = Hunk { from_line: start + 1, to_line: to_line + 1, lines: Vec::new() };
                let delta = hunk.push_equal(&lines, start.saturating_sub(EDGE), start);
                hunk.from_line -= delta;
                hunk.to_line -= delta;
                hunk
            }
        };
        for line in lines.get(start..edit.end).unwrap_or_default() {
            hunk.push(LineKind::Delete, line);
        }
        for line in &edit.insert {
            hunk.push(LineKind::Insert, line);
        }
        to_line += edit.insert.len();
        last = edit.end;
        current = Some(hunk);
    }
    if let Some(mut hunk) = current {
        hunk.push_equal(&lines, last, last + EDGE);
        hunks.push(hunk);
    }
    Unified { from: from.to_string(), to: to.to_string(), hunks }
}

fn write_range(f: &mut fmt::Formatter<'_>, sign: char, line: usize, count: usize) -> fmt::Result {
    if count > 1 {
        write!(f, " {sign}{line},{count}")
    } else {
        write!(f, " {sign}{line}")
    }
}

impl fmt::Display for Unified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hunks.is_empty() {
            return Ok(());
        }
        writeln!(f, "--- {}", self.from)?;
        writeln!(f, "+++ {}", self.to)?;
        for hunk in &self.hunks {
            f.write_str("@@")?;
            write_range(f, '-', hunk.from_line, hunk.from_count())?;
            write_range(f, '+', hunk.to_line, hunk.to_count())?;
            f.write_str(" @@\n")?;
            for line in &hunk.lines {
                let marker = match line.kind {
                    LineKind::Delete => '-',
                    LineKind::Insert => '+',
                    LineKind::Equal => ' ',
                };
                write!(f, "{marker}{}", line.content)?;
                if !line.content.ends_with('\n') {
                    f.write_str("\n\\ No newline at end of file\n")?;
                }
            }
        }
        Ok(())
    }
}
