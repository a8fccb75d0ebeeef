use std::fs;
use std::path::Path;

use jsondiff_core::{diff_from_values, DiffOptions, IgnoreStrategy, Node, Query};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    lhs: String,
    rhs: String,
    #[serde(default)]
    only: Option<String>,
    #[serde(default)]
    ignore: Option<String>,
    #[serde(default)]
    strategy: IgnoreStrategy,
    expected: String,
}

impl Fixture {
    fn options(&self) -> DiffOptions {
        let parse = |source: &Option<String>| source.as_deref().map(|q| Query::parse(q).expect("query parses"));
        DiffOptions::new(parse(&self.only), parse(&self.ignore))
            .with_ignore_strategy(self.strategy)
            .expect("fixture options are valid")
    }
}

fn load_fixture(path: &Path) -> Fixture {
    let data = fs::read_to_string(path).expect("fixture should be readable");
    serde_json::from_str(&data).expect("fixture should deserialize")
}

#[test]
fn filtered_diff_golden_parity() {
    let fixtures_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/diff");
    let mut entries: Vec<_> = fs::read_dir(&fixtures_root)
        .expect("fixtures directory must exist")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    assert!(!entries.is_empty(), "expected at least one diff fixture under tests/fixtures/diff");

    for path in entries {
        let fixture = load_fixture(&path);
        let lhs = Node::from_json_str(&fixture.lhs).expect("lhs parses");
        let rhs = Node::from_json_str(&fixture.rhs).expect("rhs parses");
        let rendered = diff_from_values(lhs, rhs, &fixture.options()).expect("diff succeeds");
        assert_eq!(rendered, fixture.expected, "fixture {path:?}");
    }
}
