//! Grammar source configuration from `grammars.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::Result;
use crate::grammar::{cache_dir, grammar_search_paths, runtime_dir};

/// Embedded default configuration.
const GRAMMARS_TOML: &str = include_str!("../../../../runtime/grammars.toml");

/// A grammar whose sources can be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrammarConfig {
	/// The grammar name (used for the output library name).
	#[serde(rename = "name")]
	pub grammar_id: String,
	/// Grammar checkout. Relative paths are resolved against
	/// [`grammar_sources_dir`].
	pub path: PathBuf,
	/// Optional subdirectory holding the grammar within the checkout.
	#[serde(default)]
	pub subpath: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GrammarsFile {
	#[serde(default)]
	grammar: Vec<GrammarConfig>,
}

/// Loads grammar configurations from the embedded `grammars.toml`.
pub fn load_grammar_configs() -> Result<Vec<GrammarConfig>> {
	parse_grammar_configs(GRAMMARS_TOML)
}

/// Loads grammar configurations from a file on disk.
///
/// Relative grammar paths are resolved against the file's directory.
pub fn load_grammar_configs_from(path: &Path) -> Result<Vec<GrammarConfig>> {
	let input = fs::read_to_string(path)?;
	let base = path.parent().unwrap_or_else(|| Path::new("."));

	Ok(parse_grammar_configs(&input)?
		.into_iter()
		.map(|mut config| {
			if config.path.is_relative() {
				config.path = base.join(&config.path);
			}
			config
		})
		.collect())
}

/// Parses grammar configurations from a TOML string.
pub fn parse_grammar_configs(input: &str) -> Result<Vec<GrammarConfig>> {
	let file: GrammarsFile = toml::from_str(input)?;
	Ok(file.grammar)
}

/// Get the directory where grammar sources are stored.
pub fn grammar_sources_dir() -> PathBuf {
	cache_dir().unwrap_or_else(runtime_dir).join("grammars").join("sources")
}

/// Get the directory where compiled grammars are written.
pub fn grammar_lib_dir() -> PathBuf {
	grammar_search_paths().first().cloned().unwrap_or_else(|| runtime_dir().join("grammars"))
}

/// Directory containing the grammar's `parser.c`.
pub fn get_grammar_src_dir(grammar: &GrammarConfig) -> PathBuf {
	let root = if grammar.path.is_absolute() {
		grammar.path.clone()
	} else {
		grammar_sources_dir().join(&grammar.path)
	};

	match &grammar.subpath {
		Some(subpath) => root.join(subpath).join("src"),
		None => root.join("src"),
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn embedded_config_lists_joy() {
		let configs = load_grammar_configs().unwrap();
		assert!(configs.iter().any(|c| c.grammar_id == "joy"));
	}

	#[test]
	fn parses_subpath() {
		let configs = parse_grammar_configs(
			r#"
			[[grammar]]
			name = "joy"
			path = "/opt/joy"
			subpath = "tree-sitter-joy"
			"#,
		)
		.unwrap();

		assert_eq!(configs.len(), 1);
		assert_eq!(get_grammar_src_dir(&configs[0]), PathBuf::from("/opt/joy/tree-sitter-joy/src"));
	}

	#[test]
	fn empty_file_has_no_grammars() {
		assert!(parse_grammar_configs("").unwrap().is_empty());
	}

	#[test]
	fn missing_name_is_a_parse_error() {
		let err = parse_grammar_configs("[[grammar]]\npath = \"x\"\n").unwrap_err();
		assert!(matches!(err, super::super::GrammarBuildError::ConfigParse(_)));
	}

	#[test]
	fn file_paths_resolve_against_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("grammars.toml");
		fs::write(&file, "[[grammar]]\nname = \"joy\"\npath = \"tree-sitter-joy\"\n").unwrap();

		let configs = load_grammar_configs_from(&file).unwrap();
		assert_eq!(configs[0].path, dir.path().join("tree-sitter-joy"));
		assert_eq!(get_grammar_src_dir(&configs[0]), dir.path().join("tree-sitter-joy").join("src"));
	}
}
