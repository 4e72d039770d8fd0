use std::{fs::read_to_string, io::Write, path::Path};

use anyhow::Context;

use crate::{
	LoxError,
	error::reporter::{ErrorSink, Reporter},
	interpreter::{Interpreter, value::Value},
	parser::Parser,
	resolver::Resolver,
	scanner::Scanner,
};

/// Loxer drives the whole pipeline and keeps one interpreter alive across
/// runs, so globals and closures survive from one REPL line to the next.
pub struct Loxer {
	interpreter: Interpreter,
	reporter:    Reporter,
}

impl Default for Loxer {
	fn default() -> Self { Self::new() }
}

impl Loxer {
	pub fn new() -> Self { Self { interpreter: Interpreter::new(), reporter: Reporter::new() } }

	/// A Loxer whose programs print to `output` and whose diagnostics go to
	/// `reporter`.
	pub fn with_output(output: Box<dyn Write>, reporter: Reporter) -> Self {
		Self { interpreter: Interpreter::with_output(output), reporter }
	}

	/// Print the value of each top-level expression statement.
	pub fn echo(mut self, echo: bool) -> Self {
		self.interpreter.echo(echo);
		self
	}

	pub fn reporter(&self) -> &Reporter { &self.reporter }

	/// Run a script file.
	pub fn run_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoxError> {
		let source = read_to_string(path).context("Failed open source file")?;
		self.run_source(&source)?;
		Ok(())
	}

	/// Run the REPL prompt.
	pub fn run_prompt(&mut self) {
		self.interpreter.echo(true);
		let mut input = String::new();
		let stdin = std::io::stdin();
		loop {
			input.clear();
			print!("> ");
			if let Err(e) = std::io::stdout().flush() {
				eprintln!("Failed flush: {e}");
			}
			match stdin.read_line(&mut input) {
				Ok(0) => {
					println!("\nExited loxer repl");
					break;
				}
				Ok(_) => {}
				Err(e) => {
					eprintln!("Failed read line: {e}");
					continue;
				}
			}
			if let Err(e) = self.run_source(input.trim()) {
				eprintln!("Failed run prompt: {e}");
			}
			self.reporter.reset();
			tracing::debug!("reset error flags");
		}
	}

	/// Scan, parse, resolve and run `source`. Each stage reports every error it
	/// finds before the run is abandoned.
	pub fn run_source(&mut self, source: &str) -> Result<Option<Value>, LoxError> {
		let tokens = Scanner::new(source).scan_tokens(&mut self.reporter)?;
		let statements = Parser::new(tokens).parse(&mut self.reporter)?;
		let resolutions = Resolver::new().resolve(&statements, &mut self.reporter)?;
		self.interpreter.resolve(resolutions);
		match self.interpreter.interpret(&statements) {
			Ok(value) => Ok(value),
			Err(error) => {
				tracing::debug!(line = error.line, %error, "runtime error halted the run");
				self.reporter.runtime_error(&error);
				Err(error.into())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::utils::RcCell;

	fn loxer() -> (Loxer, RcCell<Vec<u8>>) {
		let output = RcCell::new(Vec::new());
		(Loxer::with_output(Box::new(output.clone()), Reporter::silent()), output)
	}

	#[test]
	fn state_survives_between_runs() {
		let (mut loxer, _) = loxer();
		loxer.run_source("let count = 1; fun bump() { count = count + 1; return count; }").unwrap();
		assert_eq!(loxer.run_source("bump();").unwrap(), Some(Value::Number(2.0)));
		assert_eq!(loxer.run_source("{ let f = () => bump(); f(); }").unwrap(), None);
		assert_eq!(loxer.run_source("count;").unwrap(), Some(Value::Number(3.0)));
	}

	#[test]
	fn each_stage_stops_the_run() {
		let (mut loxer, output) = loxer();
		assert!(matches!(loxer.run_source("print(\"a);"), Err(LoxError::ScannerErrors(1))));
		assert!(matches!(loxer.run_source("print(1"), Err(LoxError::ParserErrors(1))));
		assert!(matches!(loxer.run_source("print(1); return;"), Err(LoxError::ResolverErrors(1))));
		assert!(matches!(loxer.run_source("print(2); 1 / 0; print(3);"), Err(LoxError::RuntimeError(_))));
		assert_eq!(String::from_utf8(output.borrow().clone()).unwrap(), "2\n");
		assert!(loxer.reporter().had_error());
		assert!(loxer.reporter().had_runtime_error());
		assert_eq!(loxer.reporter().diagnostics().last().map(ToString::to_string), Some(
			"Division by zero is not allowed\n[line 1]".to_string()
		));
	}

	#[test]
	fn missing_super_call_is_caught_before_running() {
		let (mut loxer, output) = loxer();
		let source = "print(\"ran\"); class A {} class B < A { public: init() { print(1); } }";
		assert!(matches!(loxer.run_source(source), Err(LoxError::ResolverErrors(1))));
		assert!(output.borrow().is_empty());
	}

	#[test]
	fn echo_prints_expression_values() {
		let output = RcCell::new(Vec::new());
		let mut loxer = Loxer::with_output(Box::new(output.clone()), Reporter::silent()).echo(true);
		loxer.run_source("1 + 2; \"s\" ++ \"t\";").unwrap();
		assert_eq!(String::from_utf8(output.borrow().clone()).unwrap(), "3\n\"st\"\n");
	}

	#[test]
	fn missing_file_is_an_internal_error() {
		let (mut loxer, _) = loxer();
		let error = loxer.run_file("does/not/exist.lox").unwrap_err();
		assert!(matches!(error, LoxError::InternalError(_)));
		assert_eq!(error.exit_code(), crate::EX_IOERR);
	}
}
