//! Providers of grammar entrypoints.
//!
//! An entrypoint is the no-argument C function a compiled grammar exports. It
//! is either linked into the binary ([`LinkedEntrypoint`]) or resolved from a
//! shared library at runtime ([`LibraryEntrypoint`]). Resolving symbols happens
//! when the provider is constructed; invoking the function happens during
//! validation.

use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::debug;
use tree_sitter_language::LanguageFn;

use crate::grammar::GrammarError;
use crate::handle::EntrypointFn;
use crate::manifest::GrammarManifest;

/// Something that can produce a raw grammar pointer on demand.
pub trait GrammarEntrypoint {
	/// Grammar name used in diagnostics.
	fn grammar_name(&self) -> &str;

	/// Calls the entrypoint. The result may be null.
	fn raw_language(&self) -> *const ();
}

/// An entrypoint linked into the current binary.
#[derive(Clone, Copy)]
pub struct LinkedEntrypoint {
	name: &'static str,
	entry: EntrypointFn,
}

impl LinkedEntrypoint {
	/// Wraps a raw entrypoint function.
	///
	/// # Safety
	///
	/// `entry` must be safe to call with no arguments, and any non-null pointer
	/// it returns must stay valid for the life of the process.
	pub const unsafe fn new(name: &'static str, entry: EntrypointFn) -> Self {
		Self { name, entry }
	}

	/// Wraps the `LANGUAGE` constant exported by a tree-sitter grammar crate.
	pub fn from_language_fn(name: &'static str, language: LanguageFn) -> Self {
		Self {
			name,
			entry: language.into_raw(),
		}
	}
}

impl GrammarEntrypoint for LinkedEntrypoint {
	fn grammar_name(&self) -> &str {
		self.name
	}

	fn raw_language(&self) -> *const () {
		// SAFETY: upheld by the constructor contract.
		unsafe { (self.entry)() }
	}
}

impl std::fmt::Debug for LinkedEntrypoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LinkedEntrypoint").field("name", &self.name).finish_non_exhaustive()
	}
}

/// An entrypoint resolved from a grammar shared library.
///
/// Owns the library. Handles produced through it borrow the entrypoint, so
/// the library stays loaded for as long as any handle exists.
pub struct LibraryEntrypoint {
	name: String,
	path: PathBuf,
	entry: EntrypointFn,
	_library: Library,
}

impl LibraryEntrypoint {
	/// Opens `path` and resolves the symbols `manifest` says it must export.
	///
	/// Failing to open the library yields [`GrammarError::LoadError`]; a missing
	/// entrypoint or external scanner function yields
	/// [`GrammarError::MissingSymbol`]. Neither calls the entrypoint.
	pub fn open(path: &Path, manifest: &GrammarManifest) -> Result<Self, GrammarError> {
		// SAFETY: grammar libraries are plain C objects without load-time
		// initializers beyond what the C runtime provides.
		let library = unsafe { Library::new(path) }
			.map_err(|e| GrammarError::LoadError(format!("{}: {e}", path.display())))?;

		let symbol = manifest.entrypoint_symbol();
		// SAFETY: tree-sitter entrypoints have the `EntrypointFn` signature.
		let entry = unsafe {
			let resolved = library
				.get::<EntrypointFn>(symbol.as_bytes())
				.map_err(|e| GrammarError::MissingSymbol(format!("{symbol} in {}: {e}", path.display())))?;
			*resolved
		};

		let missing: Vec<String> = manifest
			.scanner_symbols()
			.into_iter()
			// SAFETY: the symbol is only looked up, never called.
			.filter(|name| unsafe { library.get::<unsafe extern "C" fn()>(name.as_bytes()) }.is_err())
			.collect();
		if !missing.is_empty() {
			return Err(GrammarError::MissingSymbol(format!("{} in {}", missing.join(", "), path.display())));
		}

		debug!(grammar = %manifest.name, path = %path.display(), "Resolved grammar entrypoint");

		Ok(Self {
			name: manifest.name.to_string(),
			path: path.to_path_buf(),
			entry,
			_library: library,
		})
	}

	/// Path the library was loaded from.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl GrammarEntrypoint for LibraryEntrypoint {
	fn grammar_name(&self) -> &str {
		&self.name
	}

	fn raw_language(&self) -> *const () {
		// SAFETY: the symbol was resolved with the entrypoint signature and the
		// owning library is still loaded.
		unsafe { (self.entry)() }
	}
}

impl std::fmt::Debug for LibraryEntrypoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LibraryEntrypoint")
			.field("name", &self.name)
			.field("path", &self.path)
			.finish_non_exhaustive()
	}
}
