//! Diagnostics sink shared by every pipeline stage.

use std::fmt::Display;

use crate::{error::interpreter::RuntimeError, scanner::Token};

/// Receives diagnostics from the scanner, parser, resolver and interpreter.
pub trait ErrorSink {
	/// Record a static diagnostic. `context` is the already rendered location,
	/// e.g. `"lexeme"` or `end`.
	fn report(&mut self, line: usize, context: Option<&str>, message: &str);

	fn runtime_error(&mut self, error: &RuntimeError);

	fn had_error(&self) -> bool;

	fn had_runtime_error(&self) -> bool;

	/// Clear both flags, keeping everything else.
	fn reset(&mut self);

	fn error_at(&mut self, token: &Token, message: &str) { self.report(token.line, Some(&token.to_string()), message) }
}

/// A diagnostic as it was reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
	pub line:    usize,
	pub context: Option<String>,
	pub message: String,
	/// Raised while executing rather than found statically.
	pub runtime: bool,
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match (&self.context, self.runtime) {
			(_, true) => write!(f, "{}\n[line {}]", self.message, self.line),
			(Some(context), false) => write!(f, "[line {}] Error at {context}: {}", self.line, self.message),
			(None, false) => write!(f, "[line {}] Error: {}", self.line, self.message),
		}
	}
}

/// The default sink: keeps every diagnostic it was given and echoes each one
/// to stderr unless built with [`Reporter::silent`].
#[derive(Debug, Default)]
pub struct Reporter {
	diagnostics:       Vec<Diagnostic>,
	had_error:         bool,
	had_runtime_error: bool,
	silent:            bool,
}

impl Reporter {
	pub fn new() -> Self { Self::default() }

	pub fn silent() -> Self { Self { silent: true, ..Self::default() } }

	pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

	/// Messages only, in the order they were reported.
	pub fn messages(&self) -> Vec<&str> { self.diagnostics.iter().map(|d| d.message.as_str()).collect() }

	fn record(&mut self, diagnostic: Diagnostic) {
		if !self.silent {
			eprintln!("{diagnostic}");
		}
		self.diagnostics.push(diagnostic);
	}
}

impl ErrorSink for Reporter {
	fn report(&mut self, line: usize, context: Option<&str>, message: &str) {
		self.had_error = true;
		self.record(Diagnostic { line, context: context.map(str::to_owned), message: message.to_owned(), runtime: false });
	}

	fn runtime_error(&mut self, error: &RuntimeError) {
		self.had_runtime_error = true;
		self.record(Diagnostic { line: error.line, context: None, message: error.to_string(), runtime: true });
	}

	fn had_error(&self) -> bool { self.had_error }

	fn had_runtime_error(&self) -> bool { self.had_runtime_error }

	fn reset(&mut self) {
		self.had_error = false;
		self.had_runtime_error = false;
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::{error::interpreter::RuntimeErrorKind, scanner::TokenType};

	#[test]
	fn renders_location() {
		let mut reporter = Reporter::silent();
		reporter.error_at(&Token::new(TokenType::Identifier, "x", 7), "Redefinition of x");
		reporter.error_at(&Token::new(TokenType::Eof, "", 9), "Expect ';' after value");
		reporter.report(2, None, "Unterminated string");
		let rendered: Vec<String> = reporter.diagnostics().iter().map(ToString::to_string).collect();
		assert_eq!(rendered, vec![
			"[line 7] Error at \"x\": Redefinition of x".to_string(),
			"[line 9] Error at end: Expect ';' after value".to_string(),
			"[line 2] Error: Unterminated string".to_string(),
		]);
	}

	#[test]
	fn reset_clears_flags_only() {
		let mut reporter = Reporter::silent();
		reporter.report(1, None, "bad");
		reporter.runtime_error(&RuntimeError::new(2, RuntimeErrorKind::DivisionByZero));
		assert!(reporter.had_error() && reporter.had_runtime_error());
		reporter.reset();
		assert!(!reporter.had_error());
		assert!(!reporter.had_runtime_error());
		assert_eq!(reporter.messages(), vec!["bad", "Division by zero is not allowed"]);
		assert_eq!(reporter.diagnostics()[1].to_string(), "Division by zero is not allowed\n[line 2]");
	}
}
