//! Opaque grammar handles.
//!
//! A handle is the pointer a grammar entrypoint returns. It is owned by
//! whatever produced it (a statically linked parser or a loaded shared
//! library) and only borrowed here.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Signature of a tree-sitter grammar entrypoint such as `tree_sitter_joy`.
///
/// Matches the function wrapped by [`tree_sitter_language::LanguageFn`].
pub type EntrypointFn = unsafe extern "C" fn() -> *const ();

/// A non-null grammar handle borrowed from its provider for `'a`.
///
/// The handle is never dereferenced mutably and never freed. The lifetime ties
/// it to the provider so a dynamically loaded library cannot be unloaded while
/// a handle to one of its languages is alive.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GrammarHandle<'a> {
	ptr: NonNull<()>,
	_provider: PhantomData<&'a ()>,
}

impl<'a> GrammarHandle<'a> {
	/// Wraps a raw entrypoint result, returning `None` for null.
	pub fn from_raw(ptr: *const ()) -> Option<Self> {
		NonNull::new(ptr.cast_mut()).map(|ptr| Self {
			ptr,
			_provider: PhantomData,
		})
	}

	/// Returns the raw pointer, suitable for handing to a parsing runtime.
	#[inline]
	pub fn as_ptr(self) -> *const () {
		self.ptr.as_ptr().cast_const()
	}

	/// Reads the ABI version stamped at the start of the language struct.
	///
	/// # Safety
	///
	/// The handle must point at a tree-sitter `TSLanguage`, whose first field
	/// is a `uint32_t` version.
	pub unsafe fn abi_version(self) -> u32 {
		// SAFETY: caller guarantees the pointee begins with a u32.
		unsafe { self.ptr.cast::<u32>().as_ptr().read_unaligned() }
	}
}

impl fmt::Debug for GrammarHandle<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("GrammarHandle").field(&self.ptr).finish()
	}
}
