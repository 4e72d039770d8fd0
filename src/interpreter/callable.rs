use std::{fmt::{Debug, Display}, rc::Rc};

use super::{ControlFlow, Interpreter, value::Value};
use crate::{
	environment::Environment,
	error::interpreter::{RuntimeError, RuntimeErrorKind},
	parser::expression::Lambda,
	scanner::Token,
	statement::Function,
	utils::RcCell,
};

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	Exact(usize),
	/// Trailing parameters with default values may be left out.
	Defaults { required: usize, total: usize },
	/// Any number, used by natives such as `print`.
	Variadic,
}

impl Arity {
	pub fn check(self, got: usize) -> Result<(), RuntimeErrorKind> {
		match self {
			Arity::Exact(expected) if expected != got => Err(RuntimeErrorKind::ArityMismatch { expected, got }),
			Arity::Defaults { required, total } if got < required || got > total => {
				Err(RuntimeErrorKind::DefaultArityMismatch { required, total, got })
			}
			_ => Ok(()),
		}
	}
}

/// Anything a call expression can invoke. Arity is checked by the caller
/// before `call` runs.
pub trait Callable {
	fn arity(&self) -> Arity;

	fn call(&self, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

pub type NativeBody = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeErrorKind>;

pub struct NativeFunction {
	pub name:  &'static str,
	pub arity: Arity,
	pub body:  NativeBody,
}

/// A declared function or method together with the scope it closes over.
#[derive(Clone)]
pub struct FunctionValue {
	pub declaration:    Rc<Function>,
	/// `None` for functions declared at the top level.
	pub closure:        Option<RcCell<Environment>>,
	/// Set for `init` methods, which always return their receiver.
	pub is_initializer: bool,
}

impl FunctionValue {
	pub fn new(declaration: Rc<Function>, closure: Option<RcCell<Environment>>, is_initializer: bool) -> Self {
		Self { declaration, closure, is_initializer }
	}

	/// A copy of this method whose scope holds `receiver` as `this`.
	pub fn bind(&self, receiver: Value) -> FunctionValue {
		let environment = Environment::nested(self.closure.clone());
		environment.borrow_mut().define(receiver);
		Self { closure: Some(environment), ..self.clone() }
	}
}

impl Callable for FunctionValue {
	fn arity(&self) -> Arity {
		let declaration = &self.declaration;
		if declaration.has_defaults() {
			Arity::Defaults { required: declaration.required(), total: declaration.parameters.len() }
		} else {
			Arity::Exact(declaration.parameters.len())
		}
	}

	fn call(&self, interpreter: &mut Interpreter, _paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		let environment = Environment::nested(self.closure.clone());
		let mut arguments = arguments.into_iter();
		for parameter in &self.declaration.parameters {
			let value = match (arguments.next(), &parameter.default) {
				(Some(value), _) => value,
				(None, Some(default)) => match interpreter.evaluate_in(default, environment.clone())? {
					Value::Nil => {
						let kind = RuntimeErrorKind::NilDefault(parameter.name.lexeme.clone());
						return Err(RuntimeError::new(parameter.name.line, kind));
					}
					value => value,
				},
				(None, None) => Value::Nil,
			};
			environment.borrow_mut().define(value);
		}

		let flow = interpreter.execute_body(&self.declaration.body, environment.clone())?;
		if self.is_initializer {
			return Ok(environment.borrow().this_object());
		}
		Ok(flow.into_call_result())
	}
}

#[derive(Clone)]
pub struct LambdaValue {
	pub declaration: Rc<Lambda>,
	pub closure:     Option<RcCell<Environment>>,
}

impl Callable for LambdaValue {
	fn arity(&self) -> Arity { Arity::Exact(self.declaration.parameters.len()) }

	fn call(&self, interpreter: &mut Interpreter, _paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		let environment = Environment::nested(self.closure.clone());
		for argument in arguments {
			environment.borrow_mut().define(argument);
		}
		Ok(interpreter.execute_body(&self.declaration.body, environment)?.into_call_result())
	}
}

/// Every callable that is not a class.
pub enum CallableValue {
	Native(NativeFunction),
	Function(FunctionValue),
	Lambda(LambdaValue),
}

impl Callable for CallableValue {
	fn arity(&self) -> Arity {
		match self {
			CallableValue::Native(native) => native.arity,
			CallableValue::Function(function) => function.arity(),
			CallableValue::Lambda(lambda) => lambda.arity(),
		}
	}

	fn call(&self, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		match self {
			CallableValue::Native(native) => {
				(native.body)(interpreter, &arguments).map_err(|kind| RuntimeError::new(paren.line, kind))
			}
			CallableValue::Function(function) => function.call(interpreter, paren, arguments),
			CallableValue::Lambda(lambda) => lambda.call(interpreter, paren, arguments),
		}
	}
}

impl Display for CallableValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CallableValue::Native(_) => write!(f, "<native fn>"),
			CallableValue::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),
			CallableValue::Lambda(LambdaValue { declaration, .. }) => match &declaration.name {
				Some(name) => write!(f, "<lambda {name}>"),
				None => write!(f, "<lambda>"),
			},
		}
	}
}

impl Debug for CallableValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{self}") }
}

impl From<FunctionValue> for Value {
	fn from(function: FunctionValue) -> Self { Value::Callable(Rc::new(CallableValue::Function(function))) }
}

impl ControlFlow {
	/// What a call evaluates to once its body has finished with this signal.
	///
	/// # Panics
	/// On `break` or `continue`, which the resolver never lets escape a body.
	pub(super) fn into_call_result(self) -> Value {
		match self {
			ControlFlow::Normal => Value::Nil,
			ControlFlow::Return(value) => value,
			ControlFlow::Break | ControlFlow::Continue => panic!("loop signal escaped a call frame"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn arity_rules() {
		assert_eq!(Arity::Exact(2).check(2), Ok(()));
		assert_eq!(Arity::Exact(2).check(1), Err(RuntimeErrorKind::ArityMismatch { expected: 2, got: 1 }));
		let defaults = Arity::Defaults { required: 1, total: 3 };
		assert!(defaults.check(1).is_ok() && defaults.check(3).is_ok());
		assert_eq!(defaults.check(4), Err(RuntimeErrorKind::DefaultArityMismatch { required: 1, total: 3, got: 4 }));
		assert!(defaults.check(0).is_err());
		assert_eq!(Arity::Variadic.check(17), Ok(()));
	}

	#[test]
	#[should_panic(expected = "loop signal escaped")]
	fn loop_signals_never_leave_a_call() { ControlFlow::Break.into_call_result(); }
}
