//! Parallel grammar building.

use std::sync::mpsc;
use std::thread;

use super::Result;
use super::compile::{BuildStatus, build_grammar};
use super::config::GrammarConfig;

/// Callback type for progress reporting: `(grammar, status)`.
pub type ProgressCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Build all grammars in parallel.
///
/// Results arrive in completion order, one per input grammar.
pub fn build_all_grammars(grammars: Vec<GrammarConfig>, on_progress: Option<ProgressCallback>) -> Vec<(GrammarConfig, Result<BuildStatus>)> {
	if grammars.is_empty() {
		return Vec::new();
	}

	let (tx, rx) = mpsc::channel();
	let num_jobs = thread::available_parallelism().map(|n| n.get()).unwrap_or(4).min(8);

	let chunk_size = grammars.len().div_ceil(num_jobs).max(1);
	let chunks: Vec<Vec<GrammarConfig>> = grammars.chunks(chunk_size).map(|c| c.to_vec()).collect();

	for chunk in chunks {
		let tx = tx.clone();

		thread::spawn(move || {
			for grammar in chunk {
				let result = build_grammar(&grammar);
				let _ = tx.send((grammar, result));
			}
		});
	}

	drop(tx);

	let mut results = Vec::new();
	for (grammar, result) in rx {
		if let Some(ref cb) = on_progress {
			let status = match &result {
				Ok(BuildStatus::AlreadyBuilt) => "up to date",
				Ok(BuildStatus::Built) => "built",
				Err(_) => "error",
			};
			cb(&grammar.grammar_id, status);
		}
		results.push((grammar, result));
	}

	results
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Mutex};

	use super::*;
	use crate::build::GrammarBuildError;

	#[test]
	fn reports_every_grammar() {
		let dir = tempfile::tempdir().unwrap();
		let grammars: Vec<GrammarConfig> = ["joy", "joy-doc", "joy-test"]
			.into_iter()
			.map(|name| GrammarConfig {
				grammar_id: name.into(),
				path: dir.path().join(name),
				subpath: None,
			})
			.collect();

		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let results = build_all_grammars(
			grammars,
			Some(Box::new(move |name: &str, status: &str| sink.lock().unwrap().push((name.to_string(), status.to_string())))),
		);

		assert_eq!(results.len(), 3);
		assert!(results.iter().all(|(_, r)| matches!(r, Err(GrammarBuildError::NoParserSource(_)))));

		let mut seen = seen.lock().unwrap().clone();
		seen.sort();
		assert_eq!(
			seen,
			vec![
				("joy".to_string(), "error".to_string()),
				("joy-doc".to_string(), "error".to_string()),
				("joy-test".to_string(), "error".to_string()),
			]
		);
	}

	#[test]
	fn nothing_to_build() {
		assert!(build_all_grammars(Vec::new(), None).is_empty());
	}
}
