use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use remap_css::{remap, MappingSpec, RemapOptions, Source};

/// Rewrites stylesheet declarations according to JSON mapping tables
#[derive(Parser, Debug, Clone)]
#[command(name = "remap-css", version)]
pub struct RemapCommand {
  /// Input stylesheets. Reads stdin when none are given
  pub inputs: Vec<PathBuf>,
  /// JSON mapping table. Later files override earlier ones
  #[arg(short, long = "mappings", required = true)]
  pub mappings: Vec<PathBuf>,
  /// JSON file with remap options. Flags given on the command line win
  #[arg(short, long)]
  pub config: Option<PathBuf>,
  /// Selector prepended to every output selector
  #[arg(long)]
  pub prefix: Option<String>,
  /// Selector left unprefixed
  #[arg(long = "match")]
  pub match_selectors: Vec<String>,
  /// Regular expression; matching output selectors are dropped
  #[arg(long = "ignore-selector")]
  pub ignore_selectors: Vec<String>,
  /// Keep declarations no mapping applies to
  #[arg(long)]
  pub keep: bool,
  /// Drop outputs that are not valid for their property
  #[arg(long)]
  pub validate: bool,
  /// Write a comment naming the replaced values before each rule
  #[arg(long)]
  pub comments: bool,
  /// Multi-line indented output
  #[arg(long)]
  pub stylistic: bool,
  #[arg(long)]
  pub indent: Option<usize>,
  #[arg(long)]
  pub line_length: Option<usize>,
  /// Output file. Writes to stdout when omitted
  #[arg(short, long)]
  pub output: Option<PathBuf>,
  /// [possible values: "error", "warn", "info", "debug", "trace"]
  #[arg(long, env = "RUST_LOG", hide_env_values = true)]
  pub log: Option<String>,
}

pub fn main(cmd: RemapCommand) -> anyhow::Result<()> {
  let spec = load_mappings(&cmd.mappings)?;
  let options = cmd.options()?;
  let sources = cmd.sources()?;

  tracing::debug!(
    sources = sources.len(),
    mappings = spec.len(),
    "remapping stylesheets"
  );

  let output = remap(&sources, &spec, &options)?;

  match &cmd.output {
    Some(path) => fs::write(path, &output.css)
      .with_context(|| format!("Failed to write output to {}", path.display()))?,
    None => io::stdout()
      .lock()
      .write_all(output.css.as_bytes())
      .context("Failed to write output to stdout")?,
  }

  Ok(())
}

impl RemapCommand {
  fn options(&self) -> anyhow::Result<RemapOptions> {
    let mut options = match &self.config {
      Some(path) => {
        let contents = read_file(path)?;
        serde_json::from_str::<RemapOptions>(&contents)
          .with_context(|| format!("Invalid config file {}", path.display()))?
      }
      None => RemapOptions::default(),
    };

    options
      .ignore_selectors
      .extend(self.ignore_selectors.iter().cloned());
    options.keep |= self.keep;
    options.validate |= self.validate;
    options.comments |= self.comments;
    options.stylistic |= self.stylistic;
    if let Some(indent) = self.indent {
      options.indent = indent;
    }
    if let Some(line_length) = self.line_length {
      options.line_length = line_length;
    }

    Ok(options)
  }

  fn sources(&self) -> anyhow::Result<Vec<Source>> {
    if self.inputs.is_empty() {
      let mut css = String::new();
      io::stdin()
        .read_to_string(&mut css)
        .context("Failed to read stylesheet from stdin")?;
      return Ok(vec![self.source(css, "<stdin>".to_string())]);
    }

    self
      .inputs
      .iter()
      .map(|path| Ok(self.source(read_file(path)?, path.display().to_string())))
      .collect()
  }

  fn source(&self, css: String, name: String) -> Source {
    Source {
      css,
      prefix: self.prefix.clone(),
      match_selectors: self.match_selectors.clone(),
      name: Some(name),
    }
  }
}

fn load_mappings(paths: &[PathBuf]) -> anyhow::Result<MappingSpec> {
  let mut spec = MappingSpec::new();
  for path in paths {
    let contents = read_file(path)?;
    let entries: MappingSpec = serde_json::from_str(&contents)
      .with_context(|| format!("Invalid mapping file {}", path.display()))?;
    spec.extend(entries);
  }
  Ok(spec)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
  fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(
      &config,
      r#"{"ignoreSelectors": ["^\\.a"], "indent": 4, "keep": false}"#,
    )
    .unwrap();

    let cmd = RemapCommand::parse_from([
      "remap-css",
      "--mappings",
      "m.json",
      "--config",
      config.to_str().unwrap(),
      "--ignore-selector",
      "^\\.b",
      "--keep",
      "--line-length",
      "100",
    ]);
    let options = cmd.options().unwrap();

    assert_eq!(options.ignore_selectors, vec!["^\\.a".to_string(), "^\\.b".to_string()]);
    assert!(options.keep);
    assert_eq!(options.indent, 4);
    assert_eq!(options.line_length, 100);
  }

  #[test]
  fn later_mapping_files_win() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    fs::write(&first, r#"{"$value: red": "blue", "$value: white": "black"}"#).unwrap();
    fs::write(&second, r#"{"$value: red": "green"}"#).unwrap();

    let spec = load_mappings(&[first, second]).unwrap();
    assert_eq!(spec.get("$value: red").map(String::as_str), Some("green"));
    assert_eq!(spec.len(), 2);
  }

  #[test]
  fn missing_mapping_file_is_reported() {
    let error = load_mappings(&[PathBuf::from("/does/not/exist.json")]).unwrap_err();
    assert!(error.to_string().contains("/does/not/exist.json"));
  }
}
