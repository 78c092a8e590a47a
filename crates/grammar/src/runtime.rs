//! Registration of validated handles with a parsing runtime.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::grammar::GrammarError;
use crate::handle::GrammarHandle;

/// Oldest grammar ABI the tree-sitter runtime still accepts.
pub const MIN_COMPATIBLE_ABI: u32 = 13;

/// Newest grammar ABI the tree-sitter runtime understands.
pub const MAX_SUPPORTED_ABI: u32 = 15;

/// Turns a raw, non-null grammar handle into a runtime language object.
pub trait LanguageRuntime {
	/// Language object produced by registration.
	type Language<'a>;

	/// Registers `handle` under `name`.
	fn register<'a>(&self, name: &str, handle: GrammarHandle<'a>) -> Result<Self::Language<'a>, GrammarError>;
}

/// A runtime that accepts raw handles unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawHandles;

impl LanguageRuntime for RawHandles {
	type Language<'a> = GrammarHandle<'a>;

	fn register<'a>(&self, _name: &str, handle: GrammarHandle<'a>) -> Result<GrammarHandle<'a>, GrammarError> {
		Ok(handle)
	}
}

/// A language whose ABI version passed the runtime's compatibility gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedLanguage<'a> {
	pub handle: GrammarHandle<'a>,
	pub abi_version: u32,
}

/// A runtime that rejects grammars generated for an ABI it cannot read, the
/// way `ts_parser_set_language` does.
///
/// Handles registered here must point at real tree-sitter languages.
#[derive(Debug, Clone)]
pub struct AbiRuntime {
	supported: RangeInclusive<u32>,
}

impl AbiRuntime {
	pub fn new(supported: RangeInclusive<u32>) -> Self {
		Self { supported }
	}

	pub fn supported(&self) -> &RangeInclusive<u32> {
		&self.supported
	}
}

impl Default for AbiRuntime {
	fn default() -> Self {
		Self::new(MIN_COMPATIBLE_ABI..=MAX_SUPPORTED_ABI)
	}
}

impl LanguageRuntime for AbiRuntime {
	type Language<'a> = CheckedLanguage<'a>;

	fn register<'a>(&self, name: &str, handle: GrammarHandle<'a>) -> Result<CheckedLanguage<'a>, GrammarError> {
		// SAFETY: this runtime is only used with tree-sitter language handles.
		let abi_version = unsafe { handle.abi_version() };

		if !self.supported.contains(&abi_version) {
			return Err(GrammarError::IncompatibleAbi {
				name: name.to_string(),
				version: abi_version,
				min: *self.supported.start(),
				max: *self.supported.end(),
			});
		}

		debug!(grammar = name, abi_version, "Registered grammar");
		Ok(CheckedLanguage { handle, abi_version })
	}
}
