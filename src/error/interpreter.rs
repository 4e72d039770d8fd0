use std::rc::Rc;

use crate::statement::Visibility;

/// A fault raised while executing a program. It halts the current run and is
/// reported once at the top-level statement loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
	/// Source line of the token the fault is attributed to.
	pub line: usize,
	pub kind: RuntimeErrorKind,
}

impl RuntimeError {
	pub fn new(line: usize, kind: RuntimeErrorKind) -> Self { Self { line, kind } }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
	#[error("Undefined variable '{0}'.")]
	UndefinedVariable(Rc<str>),
	#[error("Undefined property \"{0}\".")]
	UndefinedProperty(Rc<str>),
	#[error("Operand must be a number.")]
	OperandMustBeNumber,
	#[error("Operands must be numbers.")]
	OperandsMustBeNumbers,
	/// Target of `++`/`--` does not hold a number.
	#[error("Value must be a number.")]
	ValueMustBeNumber,
	/// Names the expression kind, e.g. `addition`.
	#[error("Unsupported operands in {0} expression")]
	UnsupportedOperands(&'static str),
	#[error("Division by zero is not allowed")]
	DivisionByZero,
	#[error("Expected {expected} argument(s) but got {got}.")]
	ArityMismatch { expected: usize, got: usize },
	#[error("Expected {required} to {total} argument(s) but got {got}.")]
	DefaultArityMismatch { required: usize, total: usize, got: usize },
	#[error("Object is not callable")]
	NotCallable,
	#[error("Is not a class or instance of a class")]
	NotAnObject,
	#[error("Object is not subscript-able")]
	NotSubscriptable,
	#[error("Array index out of bounds")]
	IndexOutOfBounds,
	#[error("\"{member}\" is a {visibility} member of {owner}.")]
	IllegalAccess { member: Rc<str>, visibility: Visibility, owner: Rc<str> },
	/// `*` on a string or list whose result would not fit in memory.
	#[error("Repetition result is too large")]
	RepetitionTooLarge,
	#[error("Superclass must be a class.")]
	SuperclassNotClass,
	#[error("Evaluated default value of \"{0}\" is 'nil'")]
	NilDefault(Rc<str>),
	#[error("Superclass constructor was already invoked for this instance")]
	SuperAlreadyConstructed,
	#[error("Assertion failed: {0}")]
	AssertionFailed(String),
	/// Writing program output failed.
	#[error("Failed to write output: {0}")]
	Output(String),
}
