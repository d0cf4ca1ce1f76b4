//! Runs the `jsconf` binary as a subprocess.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn jsconf() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_jsconf"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(jsconf())
        .current_dir(dir)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run jsconf")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn completes_at_caret_with_modules() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        tmp.path().join("nuxt.config.js"),
        "export default {\n  head: {\n    meta: [{ <caret> }],\n  },\n}\n",
    )
    .unwrap();

    let output = run(
        tmp.path(),
        &["complete", "nuxt.config.js", "--caret", "--module", "nuxt@2.8.1"],
    );
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert_eq!(
        stdout_lines(&output),
        ["\"http-equiv\"", "charset", "content", "name", "vmid"]
    );
}

#[test]
fn nearest_package_json_gates_keys() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        tmp.path().join("package.json"),
        r#"{ "dependencies": { "nuxt": "2.8.1" } }"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("nuxt.config.ts"), "export default { build: {}, }\n").unwrap();

    let output = run(tmp.path(), &["complete", "nuxt.config.ts", "--offset", "27"]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "\"vue.config\"");
    assert!(!lines.iter().any(|l| l == "build"));
    assert!(!lines.iter().any(|l| l == "target"));
    assert_eq!(lines.len(), 30);
}

#[test]
fn json_output_carries_details() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(tmp.path().join("nuxt.config.js"), "export default { router: { <caret> } }").unwrap();

    let output = run(tmp.path(), &["complete", "nuxt.config.js", "--caret", "--json"]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let candidates: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let base = candidates
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "base")
        .expect("base is offered");
    assert_eq!(base["detail"], "Base URL of the app");
}

#[test]
fn unknown_file_kind_is_a_usage_error() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(tmp.path().join("vite.config.js"), "export default {}").unwrap();

    let output = run(tmp.path(), &["complete", "vite.config.js", "--offset", "16"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("pass --kind"));
}

#[test]
fn missing_file_is_an_io_error() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let output = run(tmp.path(), &["tree", "nope.config.js"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn tree_reports_parse_errors() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(tmp.path().join("nuxt.config.js"), "export default { a: 1 b: 2 }").unwrap();

    let output = run(tmp.path(), &["tree", "nuxt.config.js"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("export default [0, 14]"));
    let stderr = strip_ansi_escapes::strip_str(String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("missing comma"), "{stderr}");
}

#[test]
fn check_schema() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        tmp.path().join("good.json"),
        r#"{ "kind": "vite-config", "files": ["vite.config.ts"],
             "root": { "kind": "object", "properties": { "base": "leaf", "root": "leaf" } } }"#,
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("bad.json"),
        r#"{ "kind": "vite-config", "files": [],
             "root": { "kind": "object", "properties": { "build": { "kind": "tree" } } } }"#,
    )
    .unwrap();

    let good = run(tmp.path(), &["check-schema", "good.json"]);
    assert_eq!(good.status.code(), Some(0), "{good:?}");
    assert!(String::from_utf8_lossy(&good.stdout).contains("2 root properties"));

    let bad = run(tmp.path(), &["check-schema", "bad.json"]);
    assert_eq!(bad.status.code(), Some(1));
    let stderr = strip_ansi_escapes::strip_str(String::from_utf8_lossy(&bad.stderr));
    assert!(stderr.contains("root.build"), "{stderr}");
}

#[test]
fn schema_listing_includes_extra_schemas() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        tmp.path().join("vite.json"),
        r#"{ "kind": "vite-config", "files": ["vite.config.ts"],
             "root": { "kind": "object", "properties": { "base": "leaf" } } }"#,
    )
    .unwrap();

    let output = run(tmp.path(), &["schema", "--schema", "vite.json"]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("nuxt-config\t"));
    assert_eq!(lines[1], "vite-config\tvite.config.ts");

    let output = run(tmp.path(), &["schema", "nuxt-config"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("  head: object"));
}
