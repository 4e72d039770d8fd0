use std::rc::Rc;

use crate::scanner::Token;

/// A static error found while resolving names, anchored at the offending token.
#[derive(thiserror::Error, Debug, Clone)]
#[error("line {}: {type}", token.line)]
pub struct ResolveError {
	pub token:  Token,
	pub r#type: ResolveErrorType,
}

impl ResolveError {
	pub fn new(token: Token, r#type: ResolveErrorType) -> Self { Self { token, r#type } }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolveErrorType {
	#[error("Redefinition of {0}")]
	Redefinition(Rc<str>),
	#[error("Can't read local variable in its own initializer")]
	ReadInOwnInitializer,
	#[error("Cannot return from top level code.")]
	TopLevelReturn,
	#[error("Cannot return a value from a constructor")]
	ValueFromConstructor,
	/// `break` or `continue` with no enclosing loop.
	#[error("Cannot use \"{0}\" outside of a loop")]
	OutsideLoop(Rc<str>),
	/// `break` or `continue` inside a lambda whose only enclosing loop is outside it.
	#[error("Cannot use \"{0}\" to leave a loop from inside a lambda body")]
	AcrossLambda(Rc<str>),
	#[error("Cannot use \"this\" outside of a class")]
	ThisOutsideClass,
	#[error("Cannot use \"super\" outside of a class")]
	SuperOutsideClass,
	#[error("Cannot use \"super\" in a class with no superclass")]
	SuperWithoutSuperclass,
	#[error("\"super\" must be the first statement in subclass constructor")]
	MissingSuperConstructorCall,
	#[error("A class cannot inherit from itself.")]
	InheritsFromItself,
	#[error("Attempt to call constructor within constructor results in a stack overflow")]
	ConstructorCallWithinClass,
	#[error("Attempt to call constructor on an already initialized instance.")]
	ConstructorCallOnInstance,
	#[error("Cannot redefine constructor within constructor")]
	ConstructorRedefinitionWithinClass,
	#[error("Cannot redefine constructor after initialization")]
	ConstructorRedefinitionOnInstance,
}
