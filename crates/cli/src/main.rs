//! `joy-grammar` binary.
//!
//! Builds grammar libraries from source and checks that a compiled grammar
//! hands back a usable language handle.

mod cli;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use joy_grammar::build::{BuildStatus, GrammarConfig, build_all_grammars, grammar_lib_dir, load_grammar_configs, load_grammar_configs_from};
use joy_grammar::{
	AbiRuntime, GrammarEntrypoint, GrammarManifest, JOY, LibraryEntrypoint, grammar_search_paths, load_grammar, load_grammar_or_build,
	runtime_dir, validate_grammar_load,
};
use tracing::info;

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	match run(cli.command, &mut std::io::stdout().lock()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::FAILURE
		}
	}
}

fn run(command: Command, out: &mut impl Write) -> anyhow::Result<()> {
	match command {
		Command::Check { library, name, build } => check(library.as_deref(), &name, build, out),
		Command::Build { config, only } => build(config.as_deref(), only, out),
		Command::Paths => {
			writeln!(out, "runtime: {}", runtime_dir().display())?;
			writeln!(out, "output:  {}", grammar_lib_dir().display())?;
			for path in grammar_search_paths() {
				writeln!(out, "search:  {}", path.display())?;
			}
			Ok(())
		}
	}
}

fn manifest_for(name: &str) -> GrammarManifest {
	if JOY.name == name { JOY } else { GrammarManifest::plain(name.to_owned()) }
}

fn check(library: Option<&Path>, name: &str, build: bool, out: &mut impl Write) -> anyhow::Result<()> {
	let manifest = manifest_for(name);

	let entrypoint = match library {
		Some(path) => LibraryEntrypoint::open(path, &manifest),
		None if build => load_grammar_or_build(&manifest),
		None => load_grammar(&manifest),
	}
	.with_context(|| format!("opening grammar {name}"))?;

	info!(grammar = entrypoint.grammar_name(), path = %entrypoint.path().display(), "Checking grammar");

	let language = validate_grammar_load(&entrypoint, &AbiRuntime::default())?;
	let expected = match manifest.abi_version {
		Some(expected) if !manifest.abi_matches(language.abi_version) => format!(", expected {expected}"),
		_ => String::new(),
	};
	writeln!(out, "ok: {} (abi {}{expected}) from {}", entrypoint.grammar_name(), language.abi_version, entrypoint.path().display())?;
	Ok(())
}

fn build(config: Option<&Path>, only: Option<Vec<String>>, out: &mut impl Write) -> anyhow::Result<()> {
	let mut grammars: Vec<GrammarConfig> = match config {
		Some(path) => load_grammar_configs_from(path).with_context(|| format!("reading {}", path.display()))?,
		None => load_grammar_configs()?,
	};

	if let Some(only) = &only {
		grammars.retain(|g| only.contains(&g.grammar_id));
	}
	if grammars.is_empty() {
		bail!("no grammars selected");
	}

	let results = build_all_grammars(grammars, Some(Box::new(|name: &str, status: &str| info!(grammar = name, status, "Build finished"))));

	let mut failed = 0usize;
	for (grammar, result) in &results {
		match result {
			Ok(BuildStatus::Built) => writeln!(out, "built: {}", grammar.grammar_id)?,
			Ok(BuildStatus::AlreadyBuilt) => writeln!(out, "up to date: {}", grammar.grammar_id)?,
			Err(e) => {
				failed += 1;
				writeln!(out, "failed: {}: {e}", grammar.grammar_id)?;
			}
		}
	}

	if failed > 0 {
		bail!("{failed} of {} grammars failed to build", results.len());
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("joy_grammar=debug,info")
		} else {
			EnvFilter::new("joy_grammar=info,warn")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(verbose).init();
}
