//! Extension keywords across a session and across sessions: registration,
//! persistence, deletion, and the exit policy.

use opal_eval::extensions::EXCLUDE;
use opal_eval::{ExitReport, FileStore, MemoryStore, Value};
use opal_ir::Symbol;
use pretty_assertions::assert_eq;

use crate::common::{run, session_on};

const SQUARE: &str = "#INCLUDE square_impl as sq\n(lambda (x) (* (eval x) (eval x)))\n";
const TWICE: &str = "#INCLUDE twice_impl as twice\n(lambda (x) (* 2 (eval x)))\n";

fn persisted(square: bool, twice: bool) -> String {
    let mut text = String::new();
    if square {
        text.push_str(SQUARE);
    }
    if twice {
        text.push_str(TWICE);
    }
    text.push_str(EXCLUDE);
    text.push('\n');
    text
}

#[test]
fn test_durable_extension_is_written_before_sentinel() {
    let store = MemoryStore::default();
    let mut interp = session_on(store.clone(), "");
    interp.extend(SQUARE, true).unwrap();
    interp.extend(TWICE, true).unwrap();

    assert_eq!(store.contents(), persisted(true, true));
    assert_eq!(run(&mut interp, "(twice (sq 3))"), Value::Int(18));
    let aliases: Vec<&str> = interp
        .extensions()
        .index()
        .iter()
        .map(|span| span.alias.as_str())
        .collect();
    assert_eq!(aliases, ["sq", "twice"]);
}

#[test]
fn test_new_session_loads_persisted_extensions() {
    let store = MemoryStore::new(&persisted(true, false));
    let mut interp = session_on(store, "");
    assert!(interp.is_keyword("sq"));
    assert_eq!(run(&mut interp, "(sq 7)"), Value::Int(49));
    assert!(interp.extensions().session_log().is_empty());
    assert_eq!(interp.initial_keyword_count(), interp.keyword_count());
}

#[test]
fn test_delex_removes_persisted_record() {
    let store = MemoryStore::new(&persisted(true, true));
    let mut interp = session_on(store.clone(), "");
    run(&mut interp, "(delex sq)");

    assert!(!interp.is_keyword("sq"));
    assert_eq!(store.contents(), persisted(false, true));
    assert_eq!(interp.extensions().index().len(), 1);
    assert_eq!(run(&mut interp, "(twice 5)"), Value::Int(10));
}

#[test]
fn test_temporary_session_rolls_back() {
    let store = MemoryStore::new(&persisted(true, false));
    let mut interp = session_on(store.clone(), "");
    interp.extend(TWICE, true).unwrap();
    run(&mut interp, "(delex sq)");
    assert_eq!(store.contents(), persisted(false, true));

    let report = interp.finish().unwrap();
    assert_eq!(report, ExitReport::RolledBack);
    assert_eq!(store.contents(), persisted(true, false));
}

#[test]
fn test_permanent_session_keeps_and_reports() {
    let store = MemoryStore::default();
    let mut interp = session_on(store.clone(), "-p");
    interp
        .run_script("@start\n#INCLUDE twice_impl as twice\n(lambda (x) (* 2 (eval x)))\n@end\n")
        .unwrap();

    let report = interp.finish().unwrap();
    assert_eq!(report, ExitReport::Kept(vec![Symbol::new("twice")]));
    assert_eq!(
        report.to_string(),
        "The following extensions have been saved:\n  twice"
    );
    assert_eq!(store.contents(), persisted(false, true));
}

#[test]
fn test_permanent_session_without_extensions() {
    let mut interp = session_on(MemoryStore::default(), "p");
    assert_eq!(interp.finish().unwrap().to_string(), "No extensions saved.");
}

#[test]
fn test_deleted_extension_leaves_session_log() {
    let store = MemoryStore::default();
    let mut interp = session_on(store, "-p");
    interp.extend(SQUARE, true).unwrap();
    interp.extend(TWICE, true).unwrap();
    run(&mut interp, "(delex sq)");
    assert_eq!(
        interp.finish().unwrap(),
        ExitReport::Kept(vec![Symbol::new("twice")])
    );
}

#[test]
fn test_file_store_round_trip_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extensions.opx");

    let mut first = session_on(FileStore::new(&path), "-p");
    first.extend(SQUARE, true).unwrap();
    first.finish().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), persisted(true, false));

    let mut second = session_on(FileStore::new(&path), "");
    assert_eq!(run(&mut second, "(sq 4)"), Value::Int(16));
    second.extend(TWICE, true).unwrap();
    second.finish().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), persisted(true, false));
}

#[test]
fn test_missing_file_reads_as_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut interp = session_on(FileStore::new(dir.path().join("absent.opx")), "");
    assert_eq!(interp.extensions().snapshot(), "");
    assert_eq!(interp.finish().unwrap(), ExitReport::RolledBack);
}
