use std::fs;
use std::path::Path as FsPath;

use tracing::{debug, instrument};

use crate::text::{compute_edits, to_unified};
use crate::{
    canonicalize, evaluate, to_deletion, to_nulling, DecodeError, DiffError, DiffOptions,
    IgnoreStrategy, Node, Query, SelectionMode, Side,
};

/// Text encodings accepted for input documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// JSON (default).
    #[default]
    Json,
    /// YAML, restricted to what JSON can express.
    Yaml,
}

impl Format {
    /// Decodes `text` in this format.
    ///
    /// ```
    /// # use jsondiff_core::{Format, Node};
    /// let json = Format::Json.decode("{\"a\": [1]}")?;
    /// let yaml = Format::Yaml.decode("a:\n  - 1\n")?;
    /// assert_eq!(json, yaml);
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    pub fn decode(self, text: &str) -> Result<Node, DecodeError> {
        match self {
            Self::Json => Node::from_json_str(text),
            Self::Yaml => Node::from_yaml_str(text),
        }
    }
}

/// A document paired with the label used for it in the diff header.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    /// Label printed after `---` or `+++`.
    pub name: String,
    /// The decoded document.
    pub value: Node,
}

impl Input {
    /// Creates a labelled input.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Node) -> Self {
        Self { name: name.into(), value }
    }

    /// Reads and decodes a file, labelling it with the file's base name.
    pub fn from_path(path: &FsPath, format: Format) -> Result<Self, DecodeError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(path, &text, format)
    }

    /// Decodes text already read from `path`, labelling it with the path's base name.
    pub fn from_text(path: &FsPath, text: &str, format: Format) -> Result<Self, DecodeError> {
        let value = format.decode(text)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self { name, value })
    }
}

/// Computes the unified diff of two documents after applying the options' filtering.
///
/// Returns an empty string when the filtered documents print identically.
///
/// ```
/// use jsondiff_core::{diff, DiffOptions, Input, Node, Query};
///
/// let from = Input::new("from", Node::from_json_str(r#"{"a":1,"b":2,"c":3,"d":4}"#)?);
/// let to = Input::new("to", Node::from_json_str(r#"{"a":1,"b":1,"c":2,"d":3}"#)?);
/// let options = DiffOptions::default().with_only(Query::parse(".d")?)?;
/// assert_eq!(diff(&from, &to, &options)?, "--- from\n+++ to\n@@ -1,2 +1,2 @@\n-4\n+3\n \n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(level = "debug", skip_all, fields(from = %from.name, to = %to.name))]
pub fn diff(from: &Input, to: &Input, options: &DiffOptions) -> Result<String, DiffError> {
    let (lhs, rhs) = match options.selection()? {
        SelectionMode::All => (from.value.clone(), to.value.clone()),
        SelectionMode::Only(query) => {
            debug!(%query, "comparing selected structure only");
            evaluate_sides(query, from, to)?
        }
        SelectionMode::Ignore(query) => {
            let rewritten = match options.ignore_strategy() {
                IgnoreStrategy::Delete => to_deletion(query),
                IgnoreStrategy::Nullify => to_nulling(query),
            };
            debug!(query = %rewritten, strategy = %options.ignore_strategy(), "masking ignored structure");
            evaluate_sides(&rewritten, from, to)?
        }
    };

    let lhs = canonicalize(&lhs).map_err(|source| DiffError::Serialization { side: Side::Left, source })?;
    let rhs = canonicalize(&rhs).map_err(|source| DiffError::Serialization { side: Side::Right, source })?;

    let edits = compute_edits(&lhs, &rhs);
    debug!(edits = edits.len(), "computed line edits");
    Ok(to_unified(&from.name, &to.name, &lhs, &edits).to_string())
}

fn evaluate_sides(query: &Query, from: &Input, to: &Input) -> Result<(Node, Node), DiffError> {
    let lhs = evaluate(query, from.value.clone())
        .map_err(|source| DiffError::Evaluation { side: Side::Left, source })?;
    let rhs = evaluate(query, to.value.clone())
        .map_err(|source| DiffError::Evaluation { side: Side::Right, source })?;
    Ok((lhs, rhs))
}

/// Diffs two in-memory documents labelled `from` and `to`.
///
/// ```
/// # use jsondiff_core::{diff_from_values, DiffOptions, Node};
/// let doc = Node::from_json_str("[1, 2]")?;
/// assert!(diff_from_values(doc.clone(), doc, &DiffOptions::default())?.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn diff_from_values(from: Node, to: Node, options: &DiffOptions) -> Result<String, DiffError> {
    diff(&Input::new("from", from), &Input::new("to", to), options)
}

/// Diffs two JSON files, labelled with their base names.
pub fn diff_from_files(from: &FsPath, to: &FsPath, options: &DiffOptions) -> Result<String, DiffError> {
    let from = Input::from_path(from, Format::Json)
        .map_err(|source| DiffError::Decode { side: Side::Left, source })?;
    let to = Input::from_path(to, Format::Json)
        .map_err(|source| DiffError::Decode { side: Side::Right, source })?;
    diff(&from, &to, options)
}
