//! The grammar load check.
//!
//! Calls a grammar's entrypoint once and refuses to go further when it
//! returns null. A non-null handle is handed to the parsing runtime for
//! registration.

use tracing::{debug, error};

use crate::entrypoint::GrammarEntrypoint;
use crate::grammar::GrammarError;
use crate::handle::GrammarHandle;
use crate::runtime::LanguageRuntime;

/// Invokes `entrypoint` and registers the resulting handle with `runtime`.
///
/// Returns [`GrammarError::LoadFailure`] when the entrypoint yields null. The
/// handle borrows `entrypoint`; nothing is cached between calls, so repeated
/// calls observe the same outcome for a deterministic artifact.
pub fn validate_grammar_load<'e, E, R>(entrypoint: &'e E, runtime: &R) -> Result<R::Language<'e>, GrammarError>
where
	E: GrammarEntrypoint + ?Sized,
	R: LanguageRuntime,
{
	let name = entrypoint.grammar_name();
	let raw = entrypoint.raw_language();

	let Some(handle) = GrammarHandle::<'e>::from_raw(raw) else {
		error!(grammar = name, "Grammar entrypoint returned null");
		return Err(GrammarError::LoadFailure(name.to_string()));
	};

	debug!(grammar = name, handle = ?handle, "Grammar entrypoint returned a handle");
	runtime.register(name, handle)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entrypoint::LinkedEntrypoint;
	use crate::runtime::{AbiRuntime, RawHandles};

	static FAKE_LANGUAGE: u32 = 14;

	unsafe extern "C" fn valid_joy() -> *const () {
		(&raw const FAKE_LANGUAGE).cast()
	}

	unsafe extern "C" fn null_joy() -> *const () {
		std::ptr::null()
	}

	#[test]
	fn non_null_handle_passes() {
		let entrypoint = unsafe { LinkedEntrypoint::new("joy", valid_joy) };
		let handle = validate_grammar_load(&entrypoint, &RawHandles).unwrap();
		assert_eq!(handle.as_ptr(), (&raw const FAKE_LANGUAGE).cast::<()>());
	}

	#[test]
	fn null_handle_fails_with_message() {
		let entrypoint = unsafe { LinkedEntrypoint::new("joy", null_joy) };
		let err = validate_grammar_load(&entrypoint, &RawHandles).unwrap_err();
		assert!(matches!(err, GrammarError::LoadFailure(ref name) if name == "joy"));
		assert!(err.to_string().contains("Error loading grammar"), "{err}");
	}

	#[test]
	fn repeated_checks_agree() {
		let good = unsafe { LinkedEntrypoint::new("joy", valid_joy) };
		let bad = unsafe { LinkedEntrypoint::new("joy", null_joy) };
		for _ in 0..3 {
			assert!(validate_grammar_load(&good, &AbiRuntime::default()).is_ok());
			assert!(validate_grammar_load(&bad, &AbiRuntime::default()).is_err());
		}
	}

	#[test]
	fn works_through_trait_objects() {
		let entrypoint = unsafe { LinkedEntrypoint::new("joy", valid_joy) };
		let dynamic: &dyn GrammarEntrypoint = &entrypoint;
		let language = validate_grammar_load(dynamic, &AbiRuntime::default()).unwrap();
		assert_eq!(language.abi_version, 14);
	}
}
