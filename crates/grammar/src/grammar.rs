//! Grammar library discovery and search path configuration.
//!
//! Compiled grammars live in shared libraries named after the grammar
//! (`libjoy.so`, `libjoy.dylib`, `joy.dll`). This module knows where to look
//! for them and opens the first match.
//!
//! # Runtime Directory
//!
//! Runtime data lives in `~/.local/share/joy-grammar/` unless
//! `JOY_GRAMMAR_RUNTIME` points elsewhere. Grammar sources and compiled
//! libraries are kept under the cache directory since they can be rebuilt.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::build::{GrammarBuildError, GrammarConfig, build_grammar_into, grammar_lib_dir, load_grammar_configs};
use crate::entrypoint::LibraryEntrypoint;
use crate::manifest::GrammarManifest;

/// Errors that can occur when loading a grammar.
#[derive(Error, Debug)]
pub enum GrammarError {
	/// The entrypoint ran but returned a null handle.
	#[error("Error loading grammar: {0}")]
	LoadFailure(String),

	/// The handle names an ABI version the runtime cannot read.
	#[error("grammar {name} has ABI version {version}, supported range is {min}..={max}")]
	IncompatibleAbi { name: String, version: u32, min: u32, max: u32 },

	/// Grammar library not found in any search path.
	#[error("grammar not found: {0}")]
	NotFound(String),

	/// Failed to load the dynamic library.
	#[error("failed to load grammar library: {0}")]
	LoadError(String),

	/// Grammar library exists but doesn't export an expected symbol.
	#[error("grammar library missing symbol: {0}")]
	MissingSymbol(String),

	/// Compiling the grammar from source failed.
	#[error("grammar build failed: {0}")]
	Build(#[from] GrammarBuildError),

	/// Filesystem I/O error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Loads a grammar library by manifest name from the search paths.
///
/// For automatic building of missing grammars, use [`load_grammar_or_build`].
pub fn load_grammar(manifest: &GrammarManifest) -> Result<LibraryEntrypoint, GrammarError> {
	let lib_name = grammar_library_name(&manifest.name);

	match find_library(&lib_name, &grammar_search_paths()) {
		Some(path) => LibraryEntrypoint::open(&path, manifest),
		None => Err(GrammarError::NotFound(manifest.name.to_string())),
	}
}

/// Loads a grammar, compiling it from the configured sources first if needed.
///
/// Build failures are returned as [`GrammarError::Build`]; only a grammar with
/// no `grammars.toml` entry is reported as [`GrammarError::NotFound`].
pub fn load_grammar_or_build(manifest: &GrammarManifest) -> Result<LibraryEntrypoint, GrammarError> {
	match load_grammar(manifest) {
		Ok(grammar) => return Ok(grammar),
		Err(GrammarError::NotFound(_)) => {
			info!(grammar = %manifest.name, "Grammar not found, attempting to build");
		}
		Err(e) => return Err(e),
	}

	let config = load_grammar_configs()?
		.into_iter()
		.find(|c| c.grammar_id == manifest.name)
		.ok_or_else(|| GrammarError::NotFound(format!("{} (no entry in grammars.toml)", manifest.name)))?;

	build_and_load_grammar(manifest, &config, &grammar_lib_dir())
		.inspect_err(|e| warn!(grammar = %manifest.name, error = %e, "Failed to auto-build grammar"))
}

/// Compiles `config` into `lib_dir` and opens the resulting library.
pub fn build_and_load_grammar(manifest: &GrammarManifest, config: &GrammarConfig, lib_dir: &Path) -> Result<LibraryEntrypoint, GrammarError> {
	info!(grammar = %manifest.name, "Building grammar");
	let status = build_grammar_into(config, lib_dir)?;
	info!(grammar = %manifest.name, ?status, "Grammar library ready");

	LibraryEntrypoint::open(&lib_dir.join(grammar_library_name(&manifest.name)), manifest)
}

/// Returns the first `dirs` entry containing `lib_name`.
pub fn find_library(lib_name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
	dirs.iter().map(|dir| dir.join(lib_name)).find(|path| path.exists())
}

/// Returns the platform-specific library filename for a grammar.
pub fn grammar_library_name(name: &str) -> String {
	let safe_name = name.replace('-', "_");
	format!("{}{safe_name}.{}", library_prefix(), library_extension())
}

fn library_prefix() -> &'static str {
	if cfg!(target_os = "windows") { "" } else { "lib" }
}

/// Shared library extension for the current platform.
pub fn library_extension() -> &'static str {
	if cfg!(target_os = "macos") {
		"dylib"
	} else if cfg!(target_os = "windows") {
		"dll"
	} else {
		"so"
	}
}

/// Returns the primary runtime directory: `~/.local/share/joy-grammar/`.
pub fn runtime_dir() -> PathBuf {
	if let Ok(runtime) = std::env::var("JOY_GRAMMAR_RUNTIME") {
		return PathBuf::from(runtime);
	}

	data_local_dir().map(|d| d.join("joy-grammar")).unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the cache directory: `~/.cache/joy-grammar/`.
pub fn cache_dir() -> Option<PathBuf> {
	#[cfg(unix)]
	{
		std::env::var_os("XDG_CACHE_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
			.map(|p| p.join("joy-grammar"))
	}
	#[cfg(windows)]
	{
		std::env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("joy-grammar").join("cache"))
	}
	#[cfg(not(any(unix, windows)))]
	{
		None
	}
}

/// Returns directories to search for compiled grammar libraries.
pub fn grammar_search_paths() -> Vec<PathBuf> {
	let mut dirs = Vec::new();

	if let Ok(manifest) = std::env::var("CARGO_MANIFEST_DIR")
		&& let Some(workspace) = workspace_root(Path::new(&manifest))
	{
		dirs.push(workspace.join("target").join("grammars"));
	}

	if let Some(cache) = cache_dir() {
		dirs.push(cache.join("grammars"));
	}

	dirs.push(runtime_dir().join("grammars"));

	dirs
}

/// `crates/<name>` sits two levels below the workspace root.
fn workspace_root(manifest_dir: &Path) -> Option<&Path> {
	manifest_dir.ancestors().nth(2)
}

/// Returns the platform-specific local data directory.
fn data_local_dir() -> Option<PathBuf> {
	#[cfg(unix)]
	{
		std::env::var_os("XDG_DATA_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
	}
	#[cfg(windows)]
	{
		std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
	}
	#[cfg(not(any(unix, windows)))]
	{
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_grammar_search_paths_not_empty() {
		let dirs = grammar_search_paths();
		assert!(!dirs.is_empty());
	}

	#[test]
	fn test_grammar_library_name() {
		let name = grammar_library_name("joy");
		#[cfg(target_os = "linux")]
		assert_eq!(name, "libjoy.so");
		#[cfg(target_os = "macos")]
		assert_eq!(name, "libjoy.dylib");
		#[cfg(target_os = "windows")]
		assert_eq!(name, "joy.dll");
	}

	#[test]
	fn test_dashes_in_library_name() {
		assert!(grammar_library_name("joy-doc").contains("joy_doc"));
	}

	#[test]
	fn test_find_library_prefers_first_dir() {
		let first = tempfile::tempdir().unwrap();
		let second = tempfile::tempdir().unwrap();
		std::fs::write(first.path().join("libjoy.so"), b"").unwrap();
		std::fs::write(second.path().join("libjoy.so"), b"").unwrap();

		let dirs = vec![second.path().join("missing"), first.path().to_path_buf(), second.path().to_path_buf()];
		assert_eq!(find_library("libjoy.so", &dirs), Some(first.path().join("libjoy.so")));
		assert_eq!(find_library("libother.so", &dirs), None);
	}

	#[test]
	fn test_workspace_root() {
		let root = workspace_root(Path::new("/src/joy-grammar/crates/grammar"));
		assert_eq!(root, Some(Path::new("/src/joy-grammar")));
	}

	#[test]
	fn test_missing_sources_surface_as_build_error() {
		let dir = tempfile::tempdir().unwrap();
		let config = GrammarConfig {
			grammar_id: "joy".into(),
			path: dir.path().join("tree-sitter-joy"),
			subpath: None,
		};

		let err = build_and_load_grammar(&crate::JOY, &config, &dir.path().join("grammars")).unwrap_err();
		assert!(matches!(err, GrammarError::Build(GrammarBuildError::NoParserSource(_))), "{err:?}");
		assert!(err.to_string().starts_with("grammar build failed"), "{err}");
	}

	#[test]
	fn test_broken_parser_surfaces_compiler_output() {
		// Needs a working C compiler.
		if crate::build::c_compiler().is_none() {
			return;
		}

		let dir = tempfile::tempdir().unwrap();
		let src = dir.path().join("tree-sitter-joy").join("src");
		std::fs::create_dir_all(&src).unwrap();
		std::fs::write(src.join("parser.c"), "this is not C;\n").unwrap();
		let config = GrammarConfig {
			grammar_id: "joy".into(),
			path: dir.path().join("tree-sitter-joy"),
			subpath: None,
		};

		let err = build_and_load_grammar(&crate::JOY, &config, &dir.path().join("grammars")).unwrap_err();
		match err {
			GrammarError::Build(GrammarBuildError::Compilation(ref message)) => assert!(message.contains("parser.c"), "{message}"),
			ref other => panic!("expected a compilation error, got {other:?}"),
		}
		assert!(!err.to_string().contains("not found"), "{err}");
	}

	#[test]
	fn test_load_failure_message() {
		let err = GrammarError::LoadFailure("joy".into());
		assert_eq!(err.to_string(), "Error loading grammar: joy");
	}
}
