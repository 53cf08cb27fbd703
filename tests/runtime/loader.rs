//! Integration tests for the file loader

use std::fs;
use std::path::PathBuf;

use datagraft_foundation::{ErrorKind, Value};
use datagraft_runtime::{Loader, LoaderConfig};

const SCHEMA: &str = r#"{
    "types": [
        {"kind": "object", "name": "Message", "fields": [
            {"key": "text", "type": "string"},
            {"key": "tone", "type": "string", "required": false},
            {"key": "wgt", "type": "number", "required": false, "default": 1}
        ]}
    ],
    "default": "Message"
}"#;

/// A scratch directory removed on drop.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("datagraft-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn write(&self, file: &str, contents: &str) -> PathBuf {
        let path = self.0.join(file);
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn loads_schema_and_documents_from_files() {
    let scratch = Scratch::new("files");
    let schema = scratch.write("schema.json", SCHEMA);
    let base = scratch.write("base.json", r#"[{"$name": "greet", "text": "hello", "wgt": 4}]"#);
    let mods = scratch.write(
        "mods.json",
        r#"{"$values": [{"$name": "greet2", "$inherit": "greet", "tone": "warm"}]}"#,
    );

    let mut loader = Loader::from_schema_file(&schema, LoaderConfig::default()).unwrap();
    loader.load_file(&base).unwrap();
    let report = loader.load_file(&mods).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.committed.len(), 1);

    let env = loader.into_environment();
    let greet2 = env.get_value("greet2").unwrap();
    assert_eq!(greet2.get("text"), Some(&Value::from("hello")));
    assert_eq!(greet2.get("tone"), Some(&Value::from("warm")));
    assert_eq!(greet2.get("wgt"), Some(&Value::Int(4)));
}

#[test]
fn schema_errors_carry_the_schema_path() {
    let scratch = Scratch::new("bad-schema");
    let schema = scratch.write("schema.json", r#"{"types": [{"kind": "object"}]}"#);
    let err = Loader::from_schema_file(&schema, LoaderConfig::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse(_)));
    let source = err.context.and_then(|c| c.source).unwrap();
    assert!(source.ends_with("schema.json"));
}

#[test]
fn missing_schema_file() {
    let err = Loader::from_schema_file("/no/such/schema.json", LoaderConfig::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}

#[test]
fn document_errors_carry_the_document_path() {
    let scratch = Scratch::new("bad-doc");
    let schema = scratch.write("schema.json", SCHEMA);
    let doc = scratch.write("msgs.json", r#"[{"$name": "m", "text": "ok", "wgt": "heavy"}]"#);

    let mut loader = Loader::from_schema_file(&schema, LoaderConfig::default()).unwrap();
    let err = loader.load_file(&doc).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::KindMismatch { .. }));
    assert_eq!(err.path(), "m.wgt");
    let context = err.context.unwrap();
    assert!(context.source.unwrap().ends_with("msgs.json"));
}

#[test]
fn aborted_load_reports_file_and_path() {
    let scratch = Scratch::new("abort-report");
    let schema = scratch.write("schema.json", SCHEMA);
    let doc = scratch.write(
        "doc.json",
        r#"[{"$name": "ok", "text": "hi"}, {"$name": "broken", "text": 5}]"#,
    );

    let mut loader = Loader::from_schema_file(&schema, LoaderConfig::default()).unwrap();
    let report = loader.load_file(&doc).unwrap_err().report();
    assert!(report.contains("doc.json"), "{report}");
    assert!(report.ends_with("at broken.text)"), "{report}");
    assert!(loader.environment().contains("ok"));
}

// =============================================================================
// Policy and Output
// =============================================================================

#[test]
fn lenient_loading_skips_bad_entries() {
    let scratch = Scratch::new("lenient");
    let schema = scratch.write("schema.json", SCHEMA);
    let doc = scratch.write(
        "msgs.json",
        r#"[{"$name": "a", "text": 1}, {"$name": "b", "text": "fine"}]"#,
    );

    let mut loader = Loader::from_schema_file(&schema, LoaderConfig::lenient()).unwrap();
    let report = loader.load_file(&doc).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name.as_deref(), Some("a"));
    assert!(!loader.environment().contains("a"));
    assert!(loader.environment().contains("b"));
}

#[test]
fn compact_rendering() {
    let scratch = Scratch::new("render");
    let schema = scratch.write("schema.json", SCHEMA);
    let config = LoaderConfig::default().with_pretty_output(false);
    let mut loader = Loader::from_schema_file(&schema, config).unwrap();
    loader
        .load_str("inline", r#"[{"$name": "msg1", "text": "hi", "wgt": 2}]"#)
        .unwrap();
    assert_eq!(
        loader.render(Some("msg1")).unwrap().as_deref(),
        Some(r#"{"text":"hi","wgt":2}"#)
    );
}

#[test]
fn pretty_rendering_spans_lines() {
    let scratch = Scratch::new("pretty");
    let schema = scratch.write("schema.json", SCHEMA);
    let mut loader = Loader::from_schema_file(&schema, LoaderConfig::default()).unwrap();
    loader
        .load_str("inline", r#"[{"$name": "msg1", "text": "hi"}]"#)
        .unwrap();
    let text = loader.render(None).unwrap().unwrap();
    assert!(text.lines().count() > 1);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["msg1"]["wgt"], serde_json::json!(1));
}
