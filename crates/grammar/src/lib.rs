// Library code reports through tracing, never stderr.
#![deny(clippy::print_stderr)]

//! Loading and validation of the compiled Joy tree-sitter grammar.
//!
//! A compiled grammar exports one entrypoint, `tree_sitter_joy`, that returns
//! an opaque pointer to its language description. Before anything hands that
//! pointer to a parsing runtime it must be checked for null; a null handle is
//! reported as "Error loading grammar".
//!
//! # Architecture
//!
//! * [`validate`]: The load check itself
//! * [`handle`]: Borrowed, non-null grammar handles
//! * [`entrypoint`]: Linked and dynamically loaded entrypoints
//! * [`runtime`]: Registration of handles with a parsing runtime
//! * [`manifest`]: Symbols and ABI version a grammar artifact exports
//! * [`grammar`]: Search paths and library discovery
//! * [`build`]: Compiling grammar sources into shared libraries

pub mod build;
pub mod entrypoint;
pub mod grammar;
pub mod handle;
pub mod manifest;
pub mod runtime;
pub mod validate;

pub use entrypoint::{GrammarEntrypoint, LibraryEntrypoint, LinkedEntrypoint};
pub use grammar::{
	GrammarError, build_and_load_grammar, cache_dir, grammar_library_name, grammar_search_paths, load_grammar, load_grammar_or_build, runtime_dir,
};
pub use handle::{EntrypointFn, GrammarHandle};
pub use manifest::{GrammarManifest, JOY};
pub use runtime::{AbiRuntime, CheckedLanguage, LanguageRuntime, RawHandles};
pub use validate::validate_grammar_load;
