//! Grammar compilation into dynamic libraries.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use super::config::{GrammarConfig, get_grammar_src_dir, grammar_lib_dir};
use super::{GrammarBuildError, Result};
use crate::grammar::grammar_library_name;

/// Returns the first compiler from `candidates` that executes successfully.
fn find_compiler<'a>(candidates: &[&'a str]) -> Option<&'a str> {
	candidates
		.iter()
		.copied()
		.find(|name| Command::new(name).arg("--version").stdout(Stdio::null()).stderr(Stdio::null()).status().is_ok())
}

/// Resolves C and C++ compilers, preferring environment variables then probing common names.
fn resolve_compilers() -> (Option<&'static str>, Option<&'static str>) {
	static COMPILERS: std::sync::OnceLock<(Option<&'static str>, Option<&'static str>)> = std::sync::OnceLock::new();
	*COMPILERS.get_or_init(|| {
		#[cfg(windows)]
		const CC_CANDIDATES: &[&str] = &["cl", "clang-cl", "clang", "gcc"];
		#[cfg(windows)]
		const CXX_CANDIDATES: &[&str] = &["cl", "clang-cl", "clang++", "g++"];
		#[cfg(not(windows))]
		const CC_CANDIDATES: &[&str] = &["cc", "clang", "gcc"];
		#[cfg(not(windows))]
		const CXX_CANDIDATES: &[&str] = &["c++", "clang++", "g++"];

		let cc = std::env::var("CC").ok().map(|s| s.leak() as &str).or_else(|| find_compiler(CC_CANDIDATES));
		let cxx = std::env::var("CXX").ok().map(|s| s.leak() as &str).or_else(|| find_compiler(CXX_CANDIDATES));
		(cc, cxx)
	})
}

/// The C compiler grammar builds will use, if one is available.
pub fn c_compiler() -> Option<&'static str> {
	resolve_compilers().0
}

/// Status of a build operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
	/// Grammar was already built and up to date.
	AlreadyBuilt,
	/// Grammar was newly built.
	Built,
}

/// Returns true if any source file is newer than the compiled library.
fn needs_recompile(src_dir: &Path, lib_path: &Path) -> bool {
	let Ok(lib_mtime) = fs::metadata(lib_path).and_then(|m| m.modified()) else {
		return true;
	};

	["parser.c", "scanner.c", "scanner.cc"].iter().any(|file| {
		fs::metadata(src_dir.join(file))
			.and_then(|m| m.modified())
			.is_ok_and(|src_mtime| src_mtime > lib_mtime)
	})
}

/// Compiles a grammar into the default grammar library directory.
///
/// See [`build_grammar_into`].
pub fn build_grammar(grammar: &GrammarConfig) -> Result<BuildStatus> {
	build_grammar_into(grammar, &grammar_lib_dir())
}

/// Compiles a tree-sitter grammar into a dynamic library inside `lib_dir`.
///
/// 1. Verifies the presence of `parser.c`.
/// 2. Skips the build when the library is newer than every source.
/// 3. Compiles object files with the [`cc`] crate.
/// 4. Links the objects into a platform-specific shared library.
///
/// # Errors
///
/// * [`GrammarBuildError::NoParserSource`] if the grammar source is incomplete.
/// * [`GrammarBuildError::Compilation`] if no compiler is found or either stage fails.
pub fn build_grammar_into(grammar: &GrammarConfig, lib_dir: &Path) -> Result<BuildStatus> {
	let src_dir = get_grammar_src_dir(grammar);
	if !src_dir.join("parser.c").exists() {
		return Err(GrammarBuildError::NoParserSource(src_dir));
	}

	fs::create_dir_all(lib_dir)?;
	let lib_path = lib_dir.join(grammar_library_name(&grammar.grammar_id));

	tracing::debug!(
		grammar = %grammar.grammar_id,
		lib_path = %lib_path.display(),
		lib_exists = lib_path.exists(),
		"Grammar library path"
	);

	if !needs_recompile(&src_dir, &lib_path) {
		return Ok(BuildStatus::AlreadyBuilt);
	}

	info!(grammar = %grammar.grammar_id, lib_path = %lib_path.display(), "Compiling grammar");

	let needs_cxx = src_dir.join("scanner.cc").exists();
	let (cc, cxx) = resolve_compilers();
	let compiler = if needs_cxx {
		cxx.ok_or_else(|| {
			GrammarBuildError::Compilation(format!(
				"C++ compiler required for {} but none found. Install clang++/g++ or set CXX env var.",
				grammar.grammar_id
			))
		})?
	} else {
		cc.ok_or_else(|| GrammarBuildError::Compilation("C compiler required but none found. Install clang/gcc or set CC env var.".into()))?
	};

	let objects = compile_objects(&src_dir, lib_dir, &grammar.grammar_id, compiler, needs_cxx)?;
	link_shared_library(&objects, &lib_path, compiler, needs_cxx)?;

	if !lib_path.exists() {
		return Err(GrammarBuildError::Compilation(format!(
			"compilation succeeded but library not found at {}",
			lib_path.display()
		)));
	}

	tracing::debug!(grammar = %grammar.grammar_id, lib_path = %lib_path.display(), "Successfully compiled grammar");
	Ok(BuildStatus::Built)
}

fn host_target() -> String {
	std::env::var("TARGET").unwrap_or_else(|_| {
		let arch = std::env::consts::ARCH;
		if cfg!(target_os = "windows") {
			format!("{arch}-pc-windows-msvc")
		} else if cfg!(target_os = "macos") {
			format!("{arch}-apple-darwin")
		} else {
			format!("{arch}-unknown-linux-gnu")
		}
	})
}

/// Compiles `parser.c` and the external scanner into position independent objects.
///
/// [`cc`] only resolves the compiler invocation; each source is compiled through
/// [`run_compiler`] so diagnostics end up in [`GrammarBuildError::Compilation`]
/// instead of on stdout.
fn compile_objects(src_dir: &Path, lib_dir: &Path, grammar_id: &str, compiler: &str, needs_cxx: bool) -> Result<Vec<PathBuf>> {
	let target = host_target();
	let scanner_cc = src_dir.join("scanner.cc");
	let scanner_c = src_dir.join("scanner.c");

	let mut sources = vec![src_dir.join("parser.c")];
	let mut build = cc::Build::new();
	build
		.opt_level(3)
		.debug(false)
		.cargo_metadata(false)
		.cargo_warnings(false)
		.warnings(false)
		.pic(true)
		.include(src_dir)
		.host(&target)
		.target(&target)
		.compiler(compiler);

	if needs_cxx && scanner_cc.exists() {
		build.cpp(true).std("c++14");
		sources.push(scanner_cc);
	} else if scanner_c.exists() {
		sources.push(scanner_c);
	}

	let tool = build.try_get_compiler().map_err(|e| GrammarBuildError::Compilation(e.to_string()))?;

	let obj_dir = lib_dir.join("obj").join(grammar_id);
	fs::create_dir_all(&obj_dir)?;

	let obj_ext = if tool.is_like_msvc() { "obj" } else { "o" };
	let mut objects = Vec::with_capacity(sources.len());
	for source in &sources {
		let stem = source.file_stem().map_or_else(|| "source".into(), |s| s.to_string_lossy());
		let object = obj_dir.join(format!("{stem}.{obj_ext}"));

		let mut cmd = tool.to_command();
		if tool.is_like_msvc() {
			cmd.arg("/nologo").arg("/c").arg(source).arg(format!("/Fo{}", object.display()));
		} else {
			cmd.arg("-c").arg(source).arg("-o").arg(&object);
		}

		tracing::debug!(grammar = grammar_id, source = %source.display(), "Compiling object");
		run_compiler(cmd)?;
		objects.push(object);
	}

	Ok(objects)
}

/// Links object files into a shared library using the system compiler.
fn link_shared_library(objects: &[PathBuf], lib_path: &Path, compiler: &str, needs_cxx: bool) -> Result<()> {
	#[cfg(unix)]
	{
		let mut cmd = Command::new(compiler);
		cmd.arg("-shared").arg("-o").arg(lib_path).args(objects);

		if needs_cxx {
			cmd.arg("-lstdc++");
		}

		#[cfg(target_os = "linux")]
		cmd.arg("-Wl,-z,relro,-z,now");

		run_compiler(cmd)
	}

	#[cfg(windows)]
	{
		let _ = (compiler, needs_cxx);
		let mut cmd = Command::new("cl.exe");
		cmd.args(["/nologo", "/LD"]).args(objects).arg(format!("/Fe:{}", lib_path.display()));

		run_compiler(cmd)
	}
}

fn run_compiler(mut cmd: Command) -> Result<()> {
	let output = cmd.output().map_err(|e| GrammarBuildError::Compilation(e.to_string()))?;

	if output.status.success() {
		Ok(())
	} else {
		let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
		if diagnostics.trim().is_empty() {
			// MSVC reports on stdout.
			diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
		}
		Err(GrammarBuildError::Compilation(format!("{}: {}", output.status, diagnostics.trim_end())))
	}
}
