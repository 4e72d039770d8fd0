#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	ScanError(#[from] ScanError),
}

/// A lexical error on a given source line. Scanning carries on past it so
/// every bad token in the input gets reported.
#[derive(thiserror::Error, Debug)]
#[error("line {line}: {type}")]
pub struct ScanError {
	pub line:   usize,
	pub r#type: ScanErrorType,
}

impl ScanError {
	pub fn new(line: usize, r#type: ScanErrorType) -> Self { Self { line, r#type } }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScanErrorType {
	/// A `/*` with no matching `*/` before end of input.
	#[error("Unterminated block comment")]
	UnterminatedBlockComment,
	#[error("Unexpected character '{0}'")]
	UnexpectedCharacter(char),
	#[error("Unterminated string")]
	UnterminatedString,
}
