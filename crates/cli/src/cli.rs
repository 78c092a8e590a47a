use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "joy-grammar")]
#[command(about = "Build and check the Joy tree-sitter grammar")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Load a compiled grammar and check that its entrypoint returns a handle
	Check {
		/// Grammar library to load instead of searching the grammar paths
		#[arg(long, value_name = "PATH")]
		library: Option<PathBuf>,

		/// Grammar name; only `joy` declares an external scanner
		#[arg(long, default_value = "joy")]
		name: String,

		/// Build the grammar from grammars.toml if it is not found
		#[arg(long)]
		build: bool,
	},
	/// Build grammar shared libraries
	Build {
		/// grammars.toml to read instead of the embedded one
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,

		/// Only build specific grammars (comma-separated)
		#[arg(long, value_delimiter = ',')]
		only: Option<Vec<String>>,
	},
	/// Print the runtime directory and grammar search paths
	Paths,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn check_defaults_to_joy() {
		let cli = Cli::parse_from(["joy-grammar", "check"]);
		assert!(matches!(cli.command, Command::Check { ref name, library: None, build: false } if name == "joy"));
	}

	#[test]
	fn build_only_splits_on_commas() {
		let cli = Cli::parse_from(["joy-grammar", "-v", "build", "--only", "joy,joy-doc"]);
		assert!(cli.verbose);
		let Command::Build { only, config } = cli.command else {
			panic!("expected build");
		};
		assert_eq!(only, Some(vec!["joy".to_string(), "joy-doc".to_string()]));
		assert!(config.is_none());
	}
}
