use crate::scanner::Token;

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	ParseError(#[from] ParseError),
}

/// A syntax error, anchored at the token where parsing went wrong.
#[derive(thiserror::Error, Debug)]
#[error("line {}: {type}", token.line)]
pub struct ParseError {
	pub token:  Token,
	pub r#type: ParseErrorType,
}

impl ParseError {
	pub fn new(token: Token, r#type: ParseErrorType) -> Self { Self { token, r#type } }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParseErrorType {
	#[error("Expected expression")]
	ExpectedExpression,
	/// A specific token was required, e.g. `Expect ';' after value`.
	#[error("Expect {0}")]
	Expected(&'static str),
	#[error("Invalid assignment target")]
	InvalidAssignmentTarget,
	#[error("Can't have more than 255 parameters")]
	TooManyParameters,
	#[error("Can't have more than 255 arguments")]
	TooManyArguments,
	#[error("Default parameter value can't be 'nil'")]
	NilDefault,
	#[error("Parameter without a default value can't follow one with a default")]
	MissingDefault,
	#[error("Operand of \"{0}\" must be a variable")]
	InvalidIncrementTarget(&'static str),
}
