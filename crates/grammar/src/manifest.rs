//! Static description of a compiled grammar artifact.
//!
//! A grammar generated by `tree-sitter generate` exports one entrypoint named
//! `tree_sitter_<name>`, plus five external scanner functions when the grammar
//! declares `externals`.

use std::borrow::Cow;

use tracing::warn;

/// Suffixes of the functions an external scanner must export.
const SCANNER_SUFFIXES: [&str; 5] = ["create", "destroy", "serialize", "deserialize", "scan"];

/// What a grammar artifact is expected to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarManifest {
	/// Grammar name as given to `grammar({ name })`.
	pub name: Cow<'static, str>,
	/// Tokens produced by the external scanner, in declaration order.
	pub external_tokens: &'static [&'static str],
	/// `LANGUAGE_VERSION` of the generated parser, when known.
	pub abi_version: Option<u32>,
}

/// The Joy grammar: nested `(* *)` comments and `$"..${..}.."` strings come
/// from its external scanner.
pub const JOY: GrammarManifest = GrammarManifest {
	name: Cow::Borrowed("joy"),
	external_tokens: &["block_comment", "interpolated_string"],
	abi_version: Some(14),
};

impl GrammarManifest {
	/// Manifest for a grammar with no external scanner and no expected ABI version.
	pub fn plain(name: impl Into<Cow<'static, str>>) -> Self {
		Self {
			name: name.into(),
			external_tokens: &[],
			abi_version: None,
		}
	}

	/// Expects the generated parser to report `version`.
	pub fn with_abi_version(mut self, version: u32) -> Self {
		self.abi_version = Some(version);
		self
	}

	/// Whether a loaded grammar reporting `found` matches the expected version.
	///
	/// A mismatch is logged but not an error: the runtime decides what it can
	/// read. Manifests without an expected version accept anything.
	pub fn abi_matches(&self, found: u32) -> bool {
		match self.abi_version {
			Some(expected) if expected != found => {
				warn!(grammar = %self.name, expected, found, "Grammar ABI version differs from manifest");
				false
			}
			_ => true,
		}
	}

	/// C-safe form of the name used in exported symbols.
	pub fn symbol_stem(&self) -> String {
		self.name.replace('-', "_")
	}

	/// Name of the exported language function, e.g. `tree_sitter_joy`.
	pub fn entrypoint_symbol(&self) -> String {
		format!("tree_sitter_{}", self.symbol_stem())
	}

	pub fn has_external_scanner(&self) -> bool {
		!self.external_tokens.is_empty()
	}

	/// External scanner symbols the artifact must export. Empty without externals.
	pub fn scanner_symbols(&self) -> Vec<String> {
		if !self.has_external_scanner() {
			return Vec::new();
		}
		let stem = self.symbol_stem();
		SCANNER_SUFFIXES
			.iter()
			.map(|suffix| format!("tree_sitter_{stem}_external_scanner_{suffix}"))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn joy_exports() {
		assert_eq!(JOY.entrypoint_symbol(), "tree_sitter_joy");
		assert_eq!(
			JOY.scanner_symbols(),
			vec![
				"tree_sitter_joy_external_scanner_create",
				"tree_sitter_joy_external_scanner_destroy",
				"tree_sitter_joy_external_scanner_serialize",
				"tree_sitter_joy_external_scanner_deserialize",
				"tree_sitter_joy_external_scanner_scan",
			]
		);
	}

	#[test]
	fn dashed_names_become_underscores() {
		let manifest = GrammarManifest::plain("joy-doc");
		assert_eq!(manifest.entrypoint_symbol(), "tree_sitter_joy_doc");
		assert!(manifest.scanner_symbols().is_empty());
	}

	#[test]
	fn runtime_names_need_no_static_storage() {
		let name = String::from("factor");
		let manifest = GrammarManifest::plain(name);
		assert_eq!(manifest.name, "factor");
		assert_eq!(manifest.entrypoint_symbol(), "tree_sitter_factor");
		assert!(matches!(manifest.name, Cow::Owned(_)));
		assert!(matches!(JOY.name, Cow::Borrowed("joy")));
	}

	#[test]
	fn abi_version_is_compared_when_known() {
		assert!(JOY.abi_matches(14));
		assert!(!JOY.abi_matches(15));
		assert!(GrammarManifest::plain("factor").abi_matches(13));
		assert!(!GrammarManifest::plain("factor").with_abi_version(14).abi_matches(13));
	}
}
