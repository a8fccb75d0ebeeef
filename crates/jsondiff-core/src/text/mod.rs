//! Line-level text differencing and unified diff rendering.
//!
//! ```
//! use jsondiff_core::text::{compute_edits, to_unified};
//!
//! let before = "a\nb\nc\n";
//! let after = "a\nB\nc\n";
//! let edits = compute_edits(before, after);
//! let unified = to_unified("old", "new", before, &edits);
//! assert_eq!(unified.to_string(), "--- old\n+++ new\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n");
//! ```

use std::ops::{Index, IndexMut, Range};

mod unified;

pub use unified::{to_unified, Hunk, Line, LineKind, Unified};

/// Replaces lines `start..end` of the original text with `insert`.
///
/// Line numbers are zero-based. An edit with `start == end` is a pure
/// insertion; one with an empty `insert` is a pure deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineEdit {
    /// First replaced line.
    pub start: usize,
    /// One past the last replaced line.
    pub end: usize,
    /// Replacement lines, each keeping its line terminator.
    pub insert: Vec<String>,
}

/// Splits text into lines, keeping each `\n`.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Computes the edits turning `before` into `after`.
///
/// Edits are sorted and never overlap. Lines are matched with Myers'
/// algorithm in its linear-space form, so time grows with the number of
/// differences and memory with the length of the texts. Each maximal run of
/// unmatched lines becomes one edit.
///
/// ```
/// # use jsondiff_core::text::{compute_edits, LineEdit};
/// let edits = compute_edits("4\n\n", "3\n\n");
/// assert_eq!(edits, vec![LineEdit { start: 0, end: 1, insert: vec!["3\n".to_string()] }]);
/// ```
#[must_use]
pub fn compute_edits(before: &str, after: &str) -> Vec<LineEdit> {
    let lhs = split_lines(before);
    let rhs = split_lines(after);

    let mut matcher = Matcher::new(&lhs, &rhs);
    matcher.conquer(0..lhs.len(), 0..rhs.len());
    let mut runs = matcher.runs;
    runs.push(Run { old: lhs.len(), new: rhs.len(), len: 0 });

    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);
    for run in runs {
        if run.old > i || run.new > j {
            edits.push(LineEdit {
                start: i,
                end: run.old,
                insert: rhs[j..run.new].iter().map(ToString::to_string).collect(),
            });
        }
        i = run.old + run.len;
        j = run.new + run.len;
    }
    edits
}

/// `len` equal lines starting at `old` in the original and `new` in the target.
#[derive(Clone, Copy, Debug)]
struct Run {
    old: usize,
    new: usize,
    len: usize,
}

/// Furthest-reaching x per diagonal `k`, for `k` in `-max..=max`.
struct Frontier {
    offset: isize,
    values: Vec<usize>,
}

impl Frontier {
    fn new(max: usize) -> Self {
        Self { offset: max as isize, values: vec![0; 2 * max + 1] }
    }
}

impl Index<isize> for Frontier {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.values[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for Frontier {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.values[(k + self.offset) as usize]
    }
}

struct Matcher<'a> {
    lhs: &'a [&'a str],
    rhs: &'a [&'a str],
    forward: Frontier,
    backward: Frontier,
    runs: Vec<Run>,
}

impl<'a> Matcher<'a> {
    fn new(lhs: &'a [&'a str], rhs: &'a [&'a str]) -> Self {
        let max = max_d(lhs.len(), rhs.len());
        Self { lhs, rhs, forward: Frontier::new(max), backward: Frontier::new(max), runs: Vec::new() }
    }

    fn prefix_len(&self, old: Range<usize>, new: Range<usize>) -> usize {
        self.lhs[old].iter().zip(&self.rhs[new]).take_while(|(a, b)| a == b).count()
    }

    fn suffix_len(&self, old: Range<usize>, new: Range<usize>) -> usize {
        self.lhs[old].iter().rev().zip(self.rhs[new].iter().rev()).take_while(|(a, b)| a == b).count()
    }

    /// Records the equal runs between `old` and `new`, in order.
    fn conquer(&mut self, mut old: Range<usize>, mut new: Range<usize>) {
        let prefix = self.prefix_len(old.clone(), new.clone());
        if prefix > 0 {
            self.runs.push(Run { old: old.start, new: new.start, len: prefix });
        }
        old.start += prefix;
        new.start += prefix;

        let suffix = self.suffix_len(old.clone(), new.clone());
        old.end -= suffix;
        new.end -= suffix;

        if !old.is_empty() && !new.is_empty() {
            if let Some((x, y)) = self.middle_snake(old.clone(), new.clone()) {
                self.conquer(old.start..x, new.start..y);
                self.conquer(x..old.end, y..new.end);
            }
        }

        if suffix > 0 {
            self.runs.push(Run { old: old.end, new: new.end, len: suffix });
        }
    }

    /// Finds where a shortest edit path crosses the middle of the two ranges.
    fn middle_snake(&mut self, old: Range<usize>, new: Range<usize>) -> Option<(usize, usize)> {
        let n = old.len();
        let m = new.len();
        let delta = n as isize - m as isize;
        let odd = delta & 1 == 1;
        self.forward[1] = 0;
        self.backward[1] = 0;

        for d in 0..max_d(n, m) as isize {
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.forward[k - 1] < self.forward[k + 1]) {
                    self.forward[k + 1]
                } else {
                    self.forward[k - 1] + 1
                };
                let y = (x as isize - k) as usize;
                let (x0, y0) = (x, y);
                if x < n && y < m {
                    x += self.prefix_len(old.start + x..old.end, new.start + y..new.end);
                }
                self.forward[k] = x;
                if odd && (k - delta).abs() < d && self.forward[k] + self.backward[-(k - delta)] >= n {
                    return Some((old.start + x0, new.start + y0));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.backward[k - 1] < self.backward[k + 1]) {
                    self.backward[k + 1]
                } else {
                    self.backward[k - 1] + 1
                };
                let mut y = (x as isize - k) as usize;
                if x < n && y < m {
                    let advance =
                        self.suffix_len(old.start..old.start + n - x, new.start..new.start + m - y);
                    x += advance;
                    y += advance;
                }
                self.backward[k] = x;
                if !odd && (k - delta).abs() <= d && self.backward[k] + self.forward[-(k - delta)] >= n {
                    return Some((old.start + n - x, new.start + m - y));
                }
            }
        }
        None
    }
}

fn max_d(n: usize, m: usize) -> usize {
    (n + m).div_ceil(2) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(before: &str, edits: &[LineEdit]) -> String {
        let lines = split_lines(before);
        let mut out = String::new();
        let mut cursor = 0;
        for edit in edits {
            out.extend(lines[cursor..edit.start].iter().copied());
            out.extend(edit.insert.iter().map(String::as_str));
            cursor = edit.end;
        }
        out.extend(lines[cursor..].iter().copied());
        out
    }

    #[test]
    fn identical_texts_have_no_edits() {
        assert!(compute_edits("a\nb\n", "a\nb\n").is_empty());
        assert!(compute_edits("", "").is_empty());
    }

    #[test]
    fn pure_insertion_and_deletion() {
        assert_eq!(compute_edits("a\nc\n", "a\nb\nc\n"), vec![LineEdit {
            start: 1,
            end: 1,
            insert: vec!["b\n".to_string()],
        }]);
        assert_eq!(compute_edits("a\nb\nc\n", "a\nc\n"), vec![LineEdit {
            start: 1,
            end: 2,
            insert: Vec::new(),
        }]);
    }

    #[test]
    fn separate_runs_become_separate_edits() {
        let edits = compute_edits("1\n2\n3\n4\n5\n", "1\nx\n3\ny\n5\n");
        assert_eq!(edits.len(), 2);
        assert_eq!((edits[0].start, edits[0].end), (1, 2));
        assert_eq!((edits[1].start, edits[1].end), (3, 4));
    }

    #[test]
    fn edits_reproduce_the_target() {
        let cases = [
            ("a\nb\nc\nd\n", "b\nc\nd\ne\n"),
            ("x\n", ""),
            ("", "x\ny\n"),
            ("a\nb\na\nb\n", "b\na\nb\na\n"),
            ("no newline", "no newline\nnow"),
        ];
        for (before, after) in cases {
            assert_eq!(apply(before, &compute_edits(before, after)), after, "{before:?} -> {after:?}");
        }
    }

    #[test]
    fn large_texts_with_few_changes_stay_cheap() {
        let body: String = (0..12_000).map(|n| format!("  \"key{n}\": {n},\n")).collect();
        let before = body.clone();
        let after = format!("{{\n{body}}}\n");
        let edits = compute_edits(&before, &after);
        assert_eq!(edits, vec![
            LineEdit { start: 0, end: 0, insert: vec!["{\n".to_string()] },
            LineEdit { start: 12_000, end: 12_000, insert: vec!["}\n".to_string()] },
        ]);
        assert_eq!(apply(&before, &edits), after);
    }

    proptest::proptest! {
        #[test]
        fn edits_always_reproduce_the_target(
            before in proptest::collection::vec("[abc]\n", 0..40),
            after in proptest::collection::vec("[abc]\n", 0..40),
        ) {
            let (before, after) = (before.concat(), after.concat());
            let edits = compute_edits(&before, &after);
            proptest::prop_assert_eq!(apply(&before, &edits), after);
            for pair in edits.windows(2) {
                proptest::prop_assert!(pair[0].end < pair[1].start);
            }
        }
    }
}
