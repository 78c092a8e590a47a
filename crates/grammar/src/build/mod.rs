//! Grammar building.
//!
//! Compiles tree-sitter grammar sources (`parser.c` plus an optional external
//! scanner) listed in `grammars.toml` into shared libraries that
//! [`crate::grammar::load_grammar`] can open.

mod compile;
mod config;
mod parallel;

use std::path::PathBuf;

pub use compile::{BuildStatus, build_grammar, build_grammar_into, c_compiler};
pub use config::{
	GrammarConfig, get_grammar_src_dir, grammar_lib_dir, grammar_sources_dir, load_grammar_configs,
	load_grammar_configs_from, parse_grammar_configs,
};
pub use parallel::{ProgressCallback, build_all_grammars};
use thiserror::Error;

/// Errors that can occur during grammar building.
#[derive(Debug, Error)]
pub enum GrammarBuildError {
	#[error("failed to read grammars.toml: {0}")]
	ConfigRead(#[from] std::io::Error),
	#[error("failed to parse grammars.toml: {0}")]
	ConfigParse(#[from] toml::de::Error),
	#[error("compilation failed: {0}")]
	Compilation(String),
	#[error("no parser.c found in {0}")]
	NoParserSource(PathBuf),
}

/// Result type for grammar build operations.
pub type Result<T> = std::result::Result<T, GrammarBuildError>;
