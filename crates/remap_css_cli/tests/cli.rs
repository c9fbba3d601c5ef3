use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;

fn remap_css() -> Command {
  let mut command = Command::new(env!("CARGO_BIN_EXE_remap-css"));
  command.env_remove("RUST_LOG");
  command
}

#[test]
fn remaps_files_into_output() {
  let dir = tempfile::tempdir().unwrap();
  let input = dir.path().join("input.css");
  let mappings = dir.path().join("mappings.json");
  let output = dir.path().join("output.css");
  fs::write(&input, "a { color: red; margin: 0 } b { margin: 0 }").unwrap();
  fs::write(&mappings, r#"{"color: red": "color: blue"}"#).unwrap();

  let status = remap_css()
    .arg(&input)
    .arg("--mappings")
    .arg(&mappings)
    .arg("--prefix")
    .arg(".dark")
    .arg("--output")
    .arg(&output)
    .status()
    .unwrap();

  assert!(status.success());
  assert_eq!(fs::read_to_string(&output).unwrap(), ".dark a {color: blue}\n");
}

#[test]
fn reads_stdin_and_writes_stdout() {
  let dir = tempfile::tempdir().unwrap();
  let mappings = dir.path().join("mappings.json");
  fs::write(&mappings, r#"{"$value: $monochrome": "$invert"}"#).unwrap();

  let mut child = remap_css()
    .arg("--mappings")
    .arg(&mappings)
    .arg("--stylistic")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .spawn()
    .unwrap();
  child
    .stdin
    .take()
    .unwrap()
    .write_all(b"a { color: #000 }")
    .unwrap();
  let output = child.wait_with_output().unwrap();

  assert!(output.status.success());
  assert_eq!(
    String::from_utf8(output.stdout).unwrap(),
    "a {\n  color: #ffffffff;\n}\n"
  );
}

#[test]
fn invalid_mappings_fail() {
  let dir = tempfile::tempdir().unwrap();
  let input = dir.path().join("input.css");
  let mappings = dir.path().join("mappings.json");
  fs::write(&input, "a { color: red }").unwrap();
  fs::write(&mappings, r#"{"$font: red": "blue"}"#).unwrap();

  let output = remap_css()
    .arg(&input)
    .arg("--mappings")
    .arg(&mappings)
    .output()
    .unwrap();

  assert!(!output.status.success());
  let stderr = String::from_utf8(output.stderr).unwrap();
  assert!(stderr.contains("unknown mapping category"), "{stderr}");
}
