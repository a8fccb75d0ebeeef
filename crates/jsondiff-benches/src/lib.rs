//! Benchmark corpora for `jsondiff`.
//!
//! Corpora are generated deterministically in memory, so benchmarks need no
//! fixture files. Each corpus pairs a document with a lightly edited copy and
//! the queries worth timing against it.
//!
//! # Examples
//!
//! ```
//! let corpus = jsondiff_benches::available_corpora()
//!     .iter()
//!     .find(|corpus| corpus.name() == "inventory")
//!     .expect("registered corpus");
//! let dataset = corpus.load()?;
//! assert_ne!(dataset.before(), dataset.after());
//! # Ok::<(), jsondiff_core::DecodeError>(())
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use jsondiff_core::{DecodeError, Node};
use serde_json::{json, Value as JsonValue};

/// A named generator of benchmark input.
#[derive(Debug)]
pub struct Corpus {
    name: &'static str,
    records: usize,
    depth: usize,
    only: &'static str,
    ignore: &'static str,
}

/// The documents a corpus produces.
#[derive(Clone, Debug)]
pub struct Dataset {
    before: Node,
    after: Node,
    bytes: usize,
}

static CORPORA: &[Corpus] = &[
    Corpus { name: "inventory", records: 64, depth: 1, only: ".items[] | .price", ignore: ".items[].updated_at" },
    Corpus { name: "catalog", records: 1024, depth: 2, only: ".items[0:10]", ignore: ".items[].updated_at, .meta" },
    Corpus { name: "nested", records: 16, depth: 6, only: "..", ignore: ".items[].children" },
];

/// Returns every registered corpus.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    CORPORA
}

impl Corpus {
    /// Stable name used as the benchmark id.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Query source suited to `-only` on this corpus.
    #[must_use]
    pub fn only(&self) -> &'static str {
        self.only
    }

    /// Query source suited to `-ignore` on this corpus.
    #[must_use]
    pub fn ignore(&self) -> &'static str {
        self.ignore
    }

    /// Builds the before/after documents.
    pub fn load(&self) -> Result<Dataset, DecodeError> {
        let before = document(self.records, self.depth, 0);
        let after = document(self.records, self.depth, 1);
        let bytes = before.to_string().len() + after.to_string().len();
        Ok(Dataset { before: Node::from_json_value(before)?, after: Node::from_json_value(after)?, bytes })
    }
}

impl Dataset {
    /// The original document.
    #[must_use]
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The edited document.
    #[must_use]
    pub fn after(&self) -> &Node {
        &self.after
    }

    /// Combined size of both documents as compact JSON.
    #[must_use]
    pub fn fixture_bytes(&self) -> usize {
        self.bytes
    }
}

fn document(records: usize, depth: usize, revision: usize) -> JsonValue {
    let items: Vec<JsonValue> = (0..records).map(|idx| record(idx, depth, revision)).collect();
    json!({
        "meta": { "revision": revision, "generator": "jsondiff-benches" },
        "items": items,
    })
}

fn record(idx: usize, depth: usize, revision: usize) -> JsonValue {
    // Every seventh record changes price between revisions.
    let price = if idx % 7 == 0 { idx * 10 + revision } else { idx * 10 };
    let children: Vec<JsonValue> =
        if depth > 1 { vec![record(idx, depth - 1, revision)] } else { Vec::new() };
    json!({
        "id": idx,
        "name": format!("item-{idx}"),
        "price": price,
        "tags": ["bench", if idx % 2 == 0 { "even" } else { "odd" }],
        "updated_at": format!("2024-01-{:02}", 1 + (idx + revision) % 28),
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpora_are_deterministic() {
        for corpus in available_corpora() {
            let first = corpus.load().unwrap();
            let second = corpus.load().unwrap();
            assert_eq!(first.before(), second.before());
            assert_eq!(first.fixture_bytes(), second.fixture_bytes());
            assert!(first.fixture_bytes() > 0);
        }
    }

    #[test]
    fn corpus_queries_parse() {
        for corpus in available_corpora() {
            jsondiff_core::Query::parse(corpus.only()).unwrap();
            jsondiff_core::Query::parse(corpus.ignore()).unwrap();
        }
    }
}
