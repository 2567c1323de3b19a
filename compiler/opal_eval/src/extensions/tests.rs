use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

const STORED: &str = "\
#INCLUDE square_impl as sq
(lambda (x)
  (* (eval x) (eval x)))
#INCLUDE id_impl as ident
(lambda (x) (eval x))
#EXCLUDE
notes after the sentinel are ignored
";

fn block(name: &str, alias: &str, body: &str) -> ExtensionBlock {
    ExtensionBlock {
        name: Symbol::new(name),
        alias: Symbol::new(alias),
        body: body.to_string(),
    }
}

fn open(text: &str) -> (ExtensionRegistry, MemoryStore) {
    let store = MemoryStore::new(text);
    let (registry, _) = ExtensionRegistry::open(Box::new(store.clone())).unwrap();
    (registry, store)
}

#[test]
fn test_parse_blocks_with_multiline_bodies() {
    let blocks = parse_blocks(STORED).unwrap();
    assert_eq!(
        blocks,
        vec![
            block("square_impl", "sq", "(lambda (x)\n  (* (eval x) (eval x)))"),
            block("id_impl", "ident", "(lambda (x) (eval x))"),
        ]
    );
}

#[test]
fn test_spans_cover_header_and_body() {
    let spans: Vec<BlockSpan> = parse_spans(STORED)
        .unwrap()
        .into_iter()
        .map(|(span, _)| span)
        .collect();
    assert_eq!(spans[0].lines, 0..3);
    assert_eq!(spans[1].lines, 3..5);
    assert_eq!(spans[1].alias.as_str(), "ident");
}

#[test]
fn test_text_without_sentinel_runs_to_end() {
    let spans = parse_spans("#INCLUDE a as b\n(lambda () 1)\n").unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].0.lines, 0..2);
}

#[test]
fn test_leading_blank_lines_are_allowed() {
    assert!(parse_blocks("\n\n#EXCLUDE\n").unwrap().is_empty());
    assert!(parse_blocks("").unwrap().is_empty());
}

#[test]
fn test_malformed_header_is_rejected() {
    let err = parse_blocks("#INCLUDE only_name\n(lambda () 1)\n").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MalformedForm { .. }));
    assert!(parse_blocks("#INCLUDE a to b\n").is_err());
}

#[test]
fn test_text_before_first_header_is_rejected() {
    let err = parse_blocks("(lambda () 1)\n#INCLUDE a as b\n").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MalformedForm { .. }));
}

#[test]
fn test_block_display_is_parseable() {
    let original = block("square_impl", "sq", "(lambda (x) x)\n\n");
    let text = original.to_string();
    assert_eq!(text, "#INCLUDE square_impl as sq\n(lambda (x) x)\n");
    assert_eq!(parse_blocks(&text).unwrap(), vec![block("square_impl", "sq", "(lambda (x) x)")]);
}

#[test]
fn test_open_snapshots_store() {
    let (registry, _) = open(STORED);
    assert_eq!(registry.snapshot(), STORED);
    assert_eq!(registry.index().len(), 2);
    assert!(registry.session_log().is_empty());
}

#[test]
fn test_persist_inserts_before_sentinel() {
    let (mut registry, store) = open(STORED);
    registry
        .persist(&[block("cube_impl", "cube", "(lambda (x) x)")])
        .unwrap();

    let text = store.contents();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[5], "#INCLUDE cube_impl as cube");
    assert_eq!(lines.last().copied(), Some(EXCLUDE));
    // text after the old sentinel is gone
    assert!(!text.contains("notes after"));
    assert_eq!(registry.index().len(), 3);
    assert_eq!(registry.session_log(), &[Symbol::new("cube")]);
    assert_eq!(registry.persisted().unwrap(), text);
}

#[test]
fn test_persist_nothing_leaves_store_alone() {
    let (mut registry, store) = open(STORED);
    registry.persist(&[]).unwrap();
    assert_eq!(store.contents(), STORED);
}

#[test]
fn test_remove_excises_every_block_for_alias() {
    let (mut registry, store) = open("");
    registry.persist(&[block("a", "dup", "(lambda () 1)")]).unwrap();
    registry.persist(&[block("k", "keep", "(lambda () 2)")]).unwrap();
    registry.persist(&[block("b", "dup", "(lambda () 3)")]).unwrap();

    assert!(registry.remove("dup").unwrap());
    assert_eq!(
        store.contents(),
        "#INCLUDE k as keep\n(lambda () 2)\n#EXCLUDE\n"
    );
    assert_eq!(registry.session_log(), &[Symbol::new("keep")]);
    assert!(!registry.remove("dup").unwrap());
}

#[test]
fn test_finish_rolls_back_to_snapshot() {
    let (mut registry, store) = open(STORED);
    registry.remove("sq").unwrap();
    registry.persist(&[block("n", "new", "(lambda () 0)")]).unwrap();
    assert_eq!(registry.finish(false).unwrap(), ExitReport::RolledBack);
    assert_eq!(store.contents(), STORED);
    assert!(registry.session_log().is_empty());
    assert_eq!(registry.index().len(), 2);
}

#[test]
fn test_finish_permanent_keeps_store() {
    let (mut registry, store) = open("");
    registry.persist(&[block("n", "new", "(lambda () 0)")]).unwrap();
    let report = registry.finish(true).unwrap();
    assert_eq!(report, ExitReport::Kept(vec![Symbol::new("new")]));
    assert!(store.contents().starts_with("#INCLUDE n as new"));
}

#[test]
fn test_exit_report_messages() {
    assert_eq!(ExitReport::Kept(Vec::new()).to_string(), "No extensions saved.");
    assert_eq!(
        ExitReport::Kept(vec![Symbol::new("a"), Symbol::new("b")]).to_string(),
        "The following extensions have been saved:\n  a\n  b"
    );
    assert_eq!(
        ExitReport::RolledBack.to_string(),
        "Extensions from this session were discarded."
    );
}

#[test]
fn test_file_store_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("ext.opx"));
    assert_eq!(store.read().unwrap(), "");
    store.write("#EXCLUDE\n").unwrap();
    assert_eq!(store.read().unwrap(), "#EXCLUDE\n");
    assert_eq!(store.path(), dir.path().join("ext.opx").as_path());
}
