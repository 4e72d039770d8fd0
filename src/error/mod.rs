pub mod interpreter;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod scanner;

/// Exit status for source that failed to scan, parse or resolve.
pub const EX_DATAERR: i32 = 65;
/// Exit status for a program halted by a runtime fault.
pub const EX_SOFTWARE: i32 = 70;
/// Exit status for failures reading the script or talking to the terminal.
pub const EX_IOERR: i32 = 74;

/// LoxError is the top-level error type for the Lox interpreter.
#[derive(thiserror::Error, Debug)]
pub enum LoxError {
	/// Internal interpreter error, I/O or an impossible state
	#[error("InterpreterInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	/// Scanner errors encountered during scanning
	#[error("Generated {0} scanner errors")]
	ScannerErrors(usize),
	/// Parser errors encountered during parsing
	#[error("Generated {0} parser errors")]
	ParserErrors(usize),
	/// Resolver errors encountered during static resolution
	#[error("Generated {0} resolver errors")]
	ResolverErrors(usize),
	/// Runtime fault that halted the program
	#[error("Runtime error:\n{0}")]
	RuntimeError(#[from] interpreter::RuntimeError),
}

impl LoxError {
	/// Process exit status for this failure, following the `sysexits.h` convention.
	pub fn exit_code(&self) -> i32 {
		match self {
			LoxError::ScannerErrors(_) | LoxError::ParserErrors(_) | LoxError::ResolverErrors(_) => EX_DATAERR,
			LoxError::RuntimeError(_) => EX_SOFTWARE,
			LoxError::InternalError(_) => EX_IOERR,
		}
	}
}
