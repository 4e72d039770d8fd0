//! Lox tree-walking interpreter.
//!
//! The interpreter walks the statements produced by the parser, trusting the
//! addresses the resolver computed for every local name: a local is found by
//! hopping `depth` environments up from the current one and reading `slot`,
//! anything without an address is looked up in the global table by name.
//!
//! # Control flow
//!
//! `break`, `continue` and `return` are not errors. Executing a statement
//! yields a [`ControlFlow`] signal that loops and calls consume; only
//! [`RuntimeError`]s travel all the way up to [`Interpreter::interpret`].
//!
//! # Objects
//!
//! Member lookups on classes and instances go through [`member::MemberTable`],
//! which checks visibility against the class whose method body is performing
//! the access. That class is known statically and recorded by the resolver for
//! every `this` and `super`.

pub(crate) mod callable;
pub(crate) mod class;
pub(crate) mod instance;
pub(crate) mod member;
pub(crate) mod native;
pub(crate) mod value;

use std::{io::Write, rc::Rc};

use Expression::*;
use callable::{Callable, CallableValue, FunctionValue, LambdaValue};
use class::{ClassValue, MetaClass};
use instance::InstanceValue;
use member::{LookupContext, MemberTable};
use rustc_hash::FxHashMap;
use value::Value;

use crate::{
	environment::Environment,
	error::interpreter::{RuntimeError, RuntimeErrorKind},
	parser::expression::{ExprId, Expression, LiteralValue},
	resolver::{Address, Resolutions},
	scanner::{Token, TokenType},
	statement::{Class, Statement},
	utils::RcCell,
};

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
	Normal,
	Break,
	Continue,
	Return(Value),
}

/// What a call expression is about to invoke.
enum Callee {
	Value(Value),
	/// `super(...)` inside a constructor: the result is linked to `instance`
	/// instead of being returned.
	SuperConstructor { superclass: Rc<ClassValue>, instance: Rc<InstanceValue> },
}

pub struct Interpreter {
	globals:     FxHashMap<Rc<str>, Value>,
	/// `None` while executing top-level code.
	environment: Option<RcCell<Environment>>,
	resolutions: Resolutions,
	output:      Box<dyn Write>,
	/// Print the value of every top-level expression statement.
	echo:        bool,
}

impl Default for Interpreter {
	fn default() -> Self { Self::new() }
}

impl Interpreter {
	pub fn new() -> Self { Self::with_output(Box::new(std::io::stdout())) }

	/// An interpreter whose program output goes to `output`.
	pub fn with_output(output: Box<dyn Write>) -> Self {
		let mut globals = FxHashMap::default();
		native::load(&mut globals);
		Self { globals, environment: None, resolutions: Resolutions::default(), output, echo: false }
	}

	pub fn echo(&mut self, echo: bool) { self.echo = echo; }

	/// Add the addresses computed for freshly parsed statements. Earlier ones
	/// stay valid, the closures that need them may still be called.
	pub fn resolve(&mut self, resolutions: Resolutions) { self.resolutions.extend(resolutions); }

	pub fn resolutions(&self) -> &Resolutions { &self.resolutions }

	pub fn global(&self, name: &str) -> Option<Value> { self.globals.get(name).cloned() }

	/// Run top-level statements, returning the value of the last expression
	/// statement, if any.
	pub fn interpret(&mut self, statements: &[Statement]) -> Result<Option<Value>, RuntimeError> {
		let mut last = None;
		for statement in statements {
			match statement {
				Statement::Expression(expression) => {
					let value = self.evaluate(expression)?;
					if self.echo {
						self.write_line(&value.to_string()).map_err(|kind| RuntimeError::new(expression.line(), kind))?;
					}
					last = Some(value);
				}
				other => {
					self.execute(other)?;
				}
			}
		}
		Ok(last)
	}

	pub(crate) fn write_line(&mut self, line: &str) -> Result<(), RuntimeErrorKind> {
		writeln!(self.output, "{line}").map_err(|e| RuntimeErrorKind::Output(e.to_string()))
	}

	/// Run `statements` in `environment`, which becomes current until they
	/// finish or one of them signals.
	pub(crate) fn execute_body(
		&mut self,
		statements: &[Statement],
		environment: RcCell<Environment>,
	) -> Result<ControlFlow, RuntimeError> {
		self.with_environment(environment, |this| {
			for statement in statements {
				match this.execute(statement)? {
					ControlFlow::Normal => {}
					flow => return Ok(flow),
				}
			}
			Ok(ControlFlow::Normal)
		})
	}

	pub(crate) fn evaluate_in(
		&mut self,
		expression: &Expression,
		environment: RcCell<Environment>,
	) -> Result<Value, RuntimeError> {
		self.with_environment(environment, |this| this.evaluate(expression))
	}

	fn with_environment<T>(&mut self, environment: RcCell<Environment>, f: impl FnOnce(&mut Self) -> T) -> T {
		let previous = self.environment.replace(environment);
		let result = f(self);
		self.environment = previous;
		result
	}

	fn execute(&mut self, statement: &Statement) -> Result<ControlFlow, RuntimeError> {
		Ok(match statement {
			Statement::Expression(expression) => {
				self.evaluate(expression)?;
				ControlFlow::Normal
			}
			Statement::If { condition, then_branch, else_branch } => {
				if self.evaluate(condition)?.to_bool() {
					self.execute(then_branch)?
				} else if let Some(else_branch) = else_branch {
					self.execute(else_branch)?
				} else {
					ControlFlow::Normal
				}
			}
			Statement::FunDecl(function) => {
				let value = FunctionValue::new(function.clone(), self.environment.clone(), false);
				self.define(&function.name, value.into());
				ControlFlow::Normal
			}
			Statement::Block(statements) => {
				let environment = Environment::nested(self.environment.clone());
				self.execute_body(statements, environment)?
			}
			Statement::ClassDecl(class) => {
				self.declare_class(class)?;
				ControlFlow::Normal
			}
			Statement::Break(_) => ControlFlow::Break,
			Statement::Continue(_) => ControlFlow::Continue,
			Statement::Assert { keyword, condition, message } => {
				if !self.evaluate(condition)?.to_bool() {
					let message = message.as_deref().map_or_else(|| condition.to_string(), str::to_owned);
					return Err(RuntimeError::new(keyword.line, RuntimeErrorKind::AssertionFailed(message)));
				}
				ControlFlow::Normal
			}
			Statement::Let(declaration) => {
				let value = match &declaration.initializer {
					Some(initializer) => self.evaluate(initializer)?,
					None => Value::Nil,
				};
				self.define(&declaration.name, value);
				ControlFlow::Normal
			}
			Statement::While { condition, body, increment } => {
				while self.evaluate(condition)?.to_bool() {
					match self.execute(body)? {
						ControlFlow::Break => break,
						ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
						ControlFlow::Normal | ControlFlow::Continue => {}
					}
					if let Some(increment) = increment {
						self.evaluate(increment)?;
					}
				}
				ControlFlow::Normal
			}
			Statement::Return { value, .. } => ControlFlow::Return(match value {
				Some(value) => self.evaluate(value)?,
				None => Value::Nil,
			}),
		})
	}

	/// Bind the next declared name: a new slot in the current scope, or a global.
	fn define(&mut self, name: &Token, value: Value) {
		match &self.environment {
			Some(environment) => environment.borrow_mut().define(value),
			None => {
				self.globals.insert(name.lexeme.clone(), value);
			}
		}
	}

	fn declare_class(&mut self, class: &Rc<Class>) -> Result<(), RuntimeError> {
		let superclass = match &class.superclass {
			Some(expression) => match self.evaluate(expression)? {
				Value::Class(superclass) => Some(superclass),
				_ => return Err(RuntimeError::new(expression.line(), RuntimeErrorKind::SuperclassNotClass)),
			},
			None => None,
		};

		// The class name takes its slot before the body is evaluated.
		let placeholder = self.environment.as_ref().map(|environment| {
			let mut environment = environment.borrow_mut();
			environment.define(Value::Nil);
			environment.len() - 1
		});

		let name = class.name.lexeme.clone();
		let class_environment = Environment::nested(self.environment.clone());
		class_environment.borrow_mut().define(Value::Nil);
		let mut meta_fields = MemberTable::new(name.clone());
		for field in &class.static_fields {
			let value = match &field.initializer {
				Some(initializer) => self.evaluate_in(initializer, class_environment.clone())?,
				None => Value::Nil,
			};
			meta_fields.insert(field.name.lexeme.clone(), field.visibility, value);
		}

		let mut meta_methods = MemberTable::new(name.clone());
		for method in &class.static_methods {
			let function = FunctionValue::new(method.clone(), self.environment.clone(), false);
			meta_methods.insert(method.name.lexeme.clone(), method.visibility, function);
		}
		let mut methods = MemberTable::new(name.clone());
		for method in &class.methods {
			let function = FunctionValue::new(method.clone(), self.environment.clone(), method.is_initializer());
			methods.insert(method.name.lexeme.clone(), method.visibility, function);
		}

		let value = Value::Class(Rc::new(ClassValue {
			name: name.clone(),
			meta: MetaClass { fields: meta_fields.into(), methods: meta_methods },
			superclass,
			closure: self.environment.clone(),
			declaration: class.clone(),
			methods,
		}));
		match (&self.environment, placeholder) {
			(Some(environment), Some(slot)) => environment.borrow_mut().assign(0, slot, value),
			_ => {
				self.globals.insert(name, value);
			}
		}
		Ok(())
	}

	fn evaluate(&mut self, expr: &Expression) -> Result<Value, RuntimeError> {
		Ok(match expr {
			Literal(literal) => match literal {
				LiteralValue::Nil => Value::Nil,
				LiteralValue::Boolean(b) => Value::Boolean(*b),
				LiteralValue::Number(n) => Value::Number(*n),
				LiteralValue::StringLiteral(s) => Value::StringValue(s.clone()),
			},
			Unary { operator, right } => {
				let right = self.evaluate(right)?;
				match (&operator.r#type, right) {
					(TokenType::Bang, value) => Value::Boolean(!value.to_bool()),
					(TokenType::Minus, Value::Number(n)) => Value::Number(-n),
					(TokenType::Plus, Value::Number(n)) => Value::Number(n),
					_ => return Err(RuntimeError::new(operator.line, RuntimeErrorKind::OperandMustBeNumber)),
				}
			}
			Binary { left, operator, right } => {
				let left = self.evaluate(left)?;
				let right = self.evaluate(right)?;
				left.binary_op(&operator.r#type, &right).map_err(|kind| RuntimeError::new(operator.line, kind))?
			}
			Logical { left, operator, right } => {
				let left = self.evaluate(left)?;
				match operator.r#type {
					TokenType::Or if left.to_bool() => left,
					TokenType::And if !left.to_bool() => left,
					_ => self.evaluate(right)?,
				}
			}
			Ternary { condition, then_branch, else_branch } => {
				if self.evaluate(condition)?.to_bool() {
					self.evaluate(then_branch)?
				} else {
					self.evaluate(else_branch)?
				}
			}
			Comma { left, right } => {
				self.evaluate(left)?;
				self.evaluate(right)?
			}
			Grouping(inner) => self.evaluate(inner)?,
			Variable { id, name } => self.look_up(*id, name)?,
			Assign { id, name, value } => {
				let value = self.evaluate(value)?;
				self.assign(*id, name, value.clone())?;
				value
			}
			Call { callee, paren, arguments } => self.call(callee, paren, arguments)?,
			Subscript { object, bracket, index } => {
				let object = self.evaluate(object)?;
				let index = self.evaluate(index)?.to_index();
				let Value::List(values) = object else {
					return Err(RuntimeError::new(bracket.line, RuntimeErrorKind::NotSubscriptable));
				};
				let values = values.borrow();
				match usize::try_from(index).ok().and_then(|index| values.get(index)) {
					Some(value) => value.clone(),
					None => return Err(RuntimeError::new(bracket.line, RuntimeErrorKind::IndexOutOfBounds)),
				}
			}
			PropertyGet { object, property } => {
				let accessor = self.accessor(object);
				let context = LookupContext::new(accessor.as_deref(), property);
				match self.evaluate(object)? {
					Value::Instance(instance) => instance.get(context)?,
					Value::Class(class) => class.get(context)?,
					_ => return Err(RuntimeError::new(property.line, RuntimeErrorKind::NotAnObject)),
				}
			}
			PropertySet { object, property, value } => {
				let accessor = self.accessor(object);
				let context = LookupContext::new(accessor.as_deref(), property);
				let object = self.evaluate(object)?;
				let value = self.evaluate(value)?;
				match object {
					Value::Instance(instance) => instance.set(context, value.clone())?,
					Value::Class(class) => class.set(context, value.clone())?,
					_ => return Err(RuntimeError::new(property.line, RuntimeErrorKind::NotAnObject)),
				}
				value
			}
			This { id, keyword } => self.look_up(*id, keyword)?,
			Super { id, keyword, member } => self.super_member(*id, keyword, member.as_ref())?,
			List { elements, .. } => {
				let values = elements.iter().map(|element| self.evaluate(element)).collect::<Result<Vec<_>, _>>()?;
				values.into()
			}
			Expression::Lambda(lambda) => Value::Callable(Rc::new(CallableValue::Lambda(LambdaValue {
				declaration: lambda.clone(),
				closure:     self.environment.clone(),
			}))),
			Prefix { id, operator, name } => Value::Number(self.step(*id, name, operator)?.1),
			Postfix { id, name, operator } => Value::Number(self.step(*id, name, operator)?.0),
		})
	}

	/// Increment or decrement a numeric variable in place, returning the value
	/// it held before and the one it holds now.
	fn step(&mut self, id: ExprId, name: &Token, operator: &Token) -> Result<(f64, f64), RuntimeError> {
		let Value::Number(previous) = self.look_up(id, name)? else {
			return Err(RuntimeError::new(operator.line, RuntimeErrorKind::ValueMustBeNumber));
		};
		let updated = if operator.r#type == TokenType::PlusPlus { previous + 1.0 } else { previous - 1.0 };
		self.assign(id, name, Value::Number(updated))?;
		Ok((previous, updated))
	}

	fn local_environment(&self) -> &RcCell<Environment> {
		match &self.environment {
			Some(environment) => environment,
			None => panic!("resolved local used outside every scope"),
		}
	}

	fn look_up(&self, id: ExprId, name: &Token) -> Result<Value, RuntimeError> {
		match self.resolutions.address(id) {
			Some(Address { depth, slot }) => Ok(self.local_environment().borrow().get(depth, slot)),
			None => self
				.globals
				.get(&name.lexeme)
				.cloned()
				.ok_or_else(|| RuntimeError::new(name.line, RuntimeErrorKind::UndefinedVariable(name.lexeme.clone()))),
		}
	}

	fn assign(&mut self, id: ExprId, name: &Token, value: Value) -> Result<(), RuntimeError> {
		match self.resolutions.address(id) {
			Some(Address { depth, slot }) => self.local_environment().borrow_mut().assign(depth, slot, value),
			None => match self.globals.get_mut(&name.lexeme) {
				Some(global) => *global = value,
				None => {
					return Err(RuntimeError::new(name.line, RuntimeErrorKind::UndefinedVariable(name.lexeme.clone())));
				}
			},
		}
		Ok(())
	}

	/// The class whose body is accessing members of `object`, when `object`
	/// is `this`, possibly parenthesised.
	fn accessor(&self, object: &Expression) -> Option<Rc<str>> {
		match object {
			This { id, .. } => self.resolutions.receiver(*id).cloned(),
			Grouping(inner) => self.accessor(inner),
			_ => None,
		}
	}

	fn call(&mut self, callee: &Expression, paren: &Token, arguments: &[Expression]) -> Result<Value, RuntimeError> {
		let callee = self.callee(callee)?;
		let arguments = arguments.iter().map(|argument| self.evaluate(argument)).collect::<Result<Vec<_>, _>>()?;
		let arity_error = |kind| RuntimeError::new(paren.line, kind);

		match callee {
			Callee::Value(value) => {
				let Some(callable) = value.as_callable() else {
					return Err(RuntimeError::new(paren.line, RuntimeErrorKind::NotCallable));
				};
				callable.arity().check(arguments.len()).map_err(arity_error)?;
				tracing::trace!(callee = %value, arguments = arguments.len(), line = paren.line, "call");
				callable.call(self, paren, arguments)
			}
			Callee::SuperConstructor { superclass, instance } => {
				superclass.arity().check(arguments.len()).map_err(arity_error)?;
				tracing::trace!(superclass = %superclass.name, arguments = arguments.len(), line = paren.line, "call");
				if let Value::Instance(portion) = superclass.call(self, paren, arguments)? {
					instance.attach(portion).map_err(|kind| RuntimeError::new(paren.line, kind))?;
				}
				Ok(Value::Nil)
			}
		}
	}

	fn callee(&mut self, callee: &Expression) -> Result<Callee, RuntimeError> {
		if let Super { id, keyword, member: None } = callee
			&& let Value::Instance(this) = self.look_up(*id, keyword)?
		{
			let portion = self.lexical_portion(*id, &this);
			if let Some(superclass) = portion.class.superclass.clone() {
				return Ok(Callee::SuperConstructor { superclass, instance: portion });
			}
		}
		Ok(Callee::Value(self.evaluate(callee)?))
	}

	/// The part of `this` built by the class whose body contains `id`.
	fn lexical_portion(&self, id: ExprId, this: &Rc<InstanceValue>) -> Rc<InstanceValue> {
		self.resolutions.receiver(id).and_then(|class_name| this.portion_of(class_name)).unwrap_or_else(|| this.clone())
	}

	/// `super.member`, or bare `super` used as a value.
	fn super_member(&mut self, id: ExprId, keyword: &Token, member: Option<&Token>) -> Result<Value, RuntimeError> {
		let class_name = self.resolutions.receiver(id).cloned();
		let no_superclass = || RuntimeError::new(keyword.line, RuntimeErrorKind::SuperclassNotClass);

		match self.look_up(id, keyword)? {
			Value::Instance(this) => {
				let portion = self.lexical_portion(id, &this);
				let superclass = portion.class.superclass.clone().ok_or_else(no_superclass)?;
				let Some(member) = member else {
					return Ok(match portion.super_instance() {
						Some(super_instance) => Value::Instance(super_instance.clone()),
						None => Value::Class(superclass),
					});
				};
				let context = LookupContext::new(class_name.as_deref(), member);
				match portion.super_instance() {
					Some(super_instance) => super_instance.get(context),
					None => match superclass.find_method(context)? {
						Some(method) => Ok(method.bind(Value::Instance(this)).into()),
						None => Err(context.undefined()),
					},
				}
			}
			Value::Class(class) => {
				let owner = class_name.as_deref().and_then(|name| class.ancestor(name)).unwrap_or(class);
				let superclass = owner.superclass.clone().ok_or_else(no_superclass)?;
				match member {
					Some(member) => superclass.get(LookupContext::new(class_name.as_deref(), member)),
					None => Ok(Value::Class(superclass)),
				}
			}
			_ => Err(RuntimeError::new(keyword.line, RuntimeErrorKind::NotAnObject)),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::{error::reporter::Reporter, parser::Parser, resolver::Resolver, scanner::Scanner};

	struct Run {
		result: Result<Option<Value>, RuntimeError>,
		output: String,
	}

	fn run(source: &str) -> Run {
		let mut reporter = Reporter::silent();
		let tokens = Scanner::new(source).scan_tokens(&mut reporter).unwrap();
		let statements = Parser::new(tokens).parse(&mut reporter).unwrap();
		let resolutions = Resolver::new().resolve(&statements, &mut reporter).unwrap();
		let output = RcCell::new(Vec::new());
		let mut interpreter = Interpreter::with_output(Box::new(output.clone()));
		interpreter.resolve(resolutions);
		let result = interpreter.interpret(&statements);
		let output = String::from_utf8(output.borrow().clone()).unwrap();
		Run { result, output }
	}

	fn value(source: &str) -> String {
		match run(source).result {
			Ok(Some(value)) => value.to_string(),
			other => panic!("expected a value from {source:?}, got {other:?}"),
		}
	}

	fn fault(source: &str) -> RuntimeError {
		match run(source).result {
			Err(error) => error,
			other => panic!("expected a runtime error from {source:?}, got {other:?}"),
		}
	}

	#[test]
	fn test_variable_declaration() {
		assert_eq!(value("let x = 10; x;"), "10");
		assert_eq!(value("let x; x;"), "nil");
		assert_eq!(value("let x = 10; x = 20; x;"), "20");
		assert_eq!(value("let a = 1; { let a = 2; { let b = a + 1; a = b; } a; }"), "3");
	}

	#[test]
	fn test_undefined_variable() {
		let error = fault("undefined_var;");
		assert_eq!(error.to_string(), "Undefined variable 'undefined_var'.");
		assert_eq!(error.line, 1);
		assert_eq!(fault("nope = 1;").kind, RuntimeErrorKind::UndefinedVariable("nope".into()));
	}

	#[test]
	fn test_globals_are_late_bound() {
		assert_eq!(value("fun f() { return later; } let later = 5; f();"), "5");
		assert_eq!(fault("fun f() { return later; } f(); let later = 5;").kind, RuntimeErrorKind::UndefinedVariable(
			"later".into()
		));
	}

	#[test]
	fn test_operators() {
		assert_eq!(value("[1, 2] ++ [3];"), "[1, 2, 3]");
		assert_eq!(value("\"ab\" * 3;"), "\"ababab\"");
		assert_eq!(value("len([1, 2, 3]);"), "3");
		assert_eq!(value("len(\"abc\");"), "0");
		assert_eq!(value("2 ^ 3 ** 2;"), "64");
		assert_eq!(value("1, 2, 3;"), "3");
		assert_eq!(value("-1 ? \"yes\" : \"no\";"), "\"no\"");
		assert_eq!(value("0.5 ? \"yes\" : \"no\";"), "\"yes\"");
		assert_eq!(value("nil or \"fallback\";"), "\"fallback\"");
		assert_eq!(value("0 and crash();"), "0");
		assert_eq!(value("let xs = [1]; xs << 2 << 3; xs;"), "[1, 2, 3]");
		assert_eq!(value("\"n = \" + 4;"), "\"n = 4\"");
		assert_eq!(value("!nil == true;"), "true");
		assert_eq!(value("+3;"), "3");
	}

	#[test]
	fn test_operator_faults() {
		assert_eq!(fault("5 / 0;").kind, RuntimeErrorKind::DivisionByZero);
		assert_eq!(fault("5 % 0;").kind, RuntimeErrorKind::DivisionByZero);
		assert_eq!(fault("-\"a\";").kind, RuntimeErrorKind::OperandMustBeNumber);
		assert_eq!(fault("1 + nil;").to_string(), "Unsupported operands in addition expression");
		assert_eq!(fault("\"a\" < 1;").kind, RuntimeErrorKind::OperandsMustBeNumbers);
	}

	#[test]
	fn test_subscript() {
		assert_eq!(value("[10, 20, 30][1];"), "20");
		assert_eq!(value("[10, 20, 30][1.9];"), "20");
		assert_eq!(value("[10, 20][true];"), "20");
		assert_eq!(value("[10, 20][nil];"), "10");
		assert_eq!(fault("[10, 20][2];").kind, RuntimeErrorKind::IndexOutOfBounds);
		assert_eq!(fault("[][0];").kind, RuntimeErrorKind::IndexOutOfBounds);
		assert_eq!(fault("[1][-1];").kind, RuntimeErrorKind::IndexOutOfBounds);
		assert_eq!(fault("\"abc\"[0];").kind, RuntimeErrorKind::NotSubscriptable);
	}

	#[test]
	fn test_prefix_and_postfix() {
		assert_eq!(value("let i = 1; let j = i++; [i, j];"), "[2, 1]");
		assert_eq!(value("let i = 1; let j = --i; [i, j];"), "[0, 0]");
		assert_eq!(value("fun f() { let n = 5; n--; return n; } f();"), "4");
		assert_eq!(fault("let s = \"a\"; s++;").kind, RuntimeErrorKind::ValueMustBeNumber);
	}

	#[test]
	fn test_postfix_yields_the_value_it_read() {
		assert_eq!(value("let x = 0.1; x++;"), "0.1");
		assert_eq!(value("let x = 0.1; x++; x;"), "1.1");
		assert_eq!(value("let x = 0.7; x--;"), "0.7");
		assert_eq!(value("fun f() { let y = 2.5; let z = y--; return [z, y]; } f();"), "[2.5, 1.5]");
	}

	#[test]
	fn test_loops() {
		let source = "
			let seen = [];
			for (let i = 0; i < 6; i++) {
				if (i == 1) continue;
				if (i == 4) break;
				seen << i;
			}
			seen;";
		assert_eq!(value(source), "[0, 2, 3]");
		assert_eq!(value("let n = 0; while (n < 3) n = n + 1; n;"), "3");
		assert_eq!(value("fun f() { while (true) { return \"out\"; } } f();"), "\"out\"");
	}

	#[test]
	fn test_closures_capture_per_iteration() {
		let source = "
			let fns = [];
			let i = 0;
			while (i < 3) {
				let captured = i;
				fns << () => captured;
				i++;
			}
			[fns[0](), fns[1](), fns[2]()];";
		assert_eq!(value(source), "[0, 1, 2]");
	}

	#[test]
	fn test_closures_share_their_scope() {
		let source = "
			fun counter() {
				let count = 0;
				fun increment() { count = count + 1; return count; }
				return increment;
			}
			let next = counter();
			next();
			next();";
		assert_eq!(value(source), "2");
	}

	#[test]
	fn test_functions_and_lambdas() {
		assert_eq!(value("fun add(a, b) { return a + b; } add(1, 2);"), "3");
		assert_eq!(value("fun nothing() {} nothing();"), "nil");
		assert_eq!(value("let twice = (f, x) => f(f(x)); twice(x => x * 2, 3);"), "12");
		assert_eq!(value("let named = () => 1; named;"), "<lambda named>");
		assert_eq!(value("fun f() {} f;"), "<fn f>");
		assert_eq!(value("clock;"), "<native fn>");
		assert_eq!(value("clock() > 0;"), "true");
		let error = fault("fun add(a, b) { return a + b; } add(1);");
		assert_eq!(error.to_string(), "Expected 2 argument(s) but got 1.");
		assert_eq!(fault("let x = 1; x();").kind, RuntimeErrorKind::NotCallable);
	}

	#[test]
	fn test_default_parameters() {
		assert_eq!(value("fun f(a, b = a * 10) { return a + b; } f(1);"), "11");
		assert_eq!(value("fun f(a, b = a * 10) { return a + b; } f(1, 2);"), "3");
		assert_eq!(value("let calls = 0; fun tick() { calls++; return calls; } fun f(x = tick()) { return x; } f(); f();"), "2");
		assert_eq!(fault("fun f(a, b = 2) {} f();").kind, RuntimeErrorKind::DefaultArityMismatch {
			required: 1,
			total:    2,
			got:      0,
		});
		assert_eq!(fault("let none; fun f(a = none) {} f();").kind, RuntimeErrorKind::NilDefault("a".into()));
	}

	#[test]
	fn test_print_writes_output() {
		let run = run("print(1, \"two\", [3], nil); print();");
		assert!(run.result.is_ok());
		assert_eq!(run.output, "1 \"two\" [3] nil\n\n");
	}

	#[test]
	fn test_echo_prints_top_level_expressions_only() {
		let output = RcCell::new(Vec::new());
		let mut interpreter = Interpreter::with_output(Box::new(output.clone()));
		interpreter.echo(true);
		let mut reporter = Reporter::silent();
		let tokens = Scanner::new("1 + 1; let x = 2; fun f() { 3; } f();").scan_tokens(&mut reporter).unwrap();
		let statements = Parser::new(tokens).parse(&mut reporter).unwrap();
		interpreter.resolve(Resolver::new().resolve(&statements, &mut reporter).unwrap());
		interpreter.interpret(&statements).unwrap();
		assert_eq!(String::from_utf8(output.borrow().clone()).unwrap(), "2\nnil\n");
	}

	#[test]
	fn test_assert() {
		assert!(run("assert 1 < 2;").result.is_ok());
		assert_eq!(fault("assert(1 > 2, \"math broke\");").to_string(), "Assertion failed: math broke");
		assert_eq!(fault("assert 1 > 2;").to_string(), "Assertion failed: (> 1 2)");
	}

	#[test]
	fn test_classes() {
		let source = "
			class Point {
				public:
				let x = 0;
				let y = 0;
				init(x, y) { this.x = x; this.y = y; }
				sum() { return this.x + this.y; }
			}
			let p = Point(3, 4);
			p.x = 10;
			[p.sum(), p.y, p];";
		assert_eq!(value(source), "[14, 4, <Point instance>]");
		assert_eq!(value("class A {} A;"), "<class A>");
		assert_eq!(fault("class A {} A(1);").kind, RuntimeErrorKind::ArityMismatch { expected: 0, got: 1 });
		assert_eq!(fault("class A {} A().missing;").to_string(), "Undefined property \"missing\".");
		assert_eq!(fault("class A {} A().missing = 1;").to_string(), "Undefined property \"missing\".");
		assert_eq!(fault("let x = 1; x.y;").kind, RuntimeErrorKind::NotAnObject);
		assert_eq!(fault("let NotClass = 1; class B < NotClass {}").kind, RuntimeErrorKind::SuperclassNotClass);
	}

	#[test]
	fn test_initializer_returns_instance() {
		let source = "
			class A {
				public:
				let ready = false;
				init() { this.ready = true; return; }
			}
			A().ready;";
		assert_eq!(value(source), "true");
		assert_eq!(value("class A { public: init() { return; } } A();"), "<A instance>");
	}

	#[test]
	fn test_visibility() {
		let class = "
			class Vault {
				let secret = 1;
				protected:
				let shared = 2;
				public:
				let open = 3;
				reveal() { return this.secret; }
				reveal_grouped() { return (this).secret; }
			}
			let v = Vault();";
		assert_eq!(value(&format!("{class} v.open;")), "3");
		assert_eq!(value(&format!("{class} v.reveal();")), "1");
		assert_eq!(fault(&format!("{class} v.secret;")).to_string(), "\"secret\" is a private member of Vault.");
		assert_eq!(fault(&format!("{class} v.shared;")).to_string(), "\"shared\" is a protected member of Vault.");
		assert_eq!(value(&format!("{class} v.reveal_grouped();")), "1");
		assert_eq!(fault(&format!("{class} (v).secret;")).to_string(), "\"secret\" is a private member of Vault.");
		assert_eq!(fault(&format!("{class} v.secret = 5;")).kind, RuntimeErrorKind::IllegalAccess {
			member:     "secret".into(),
			visibility: crate::statement::Visibility::Private,
			owner:      "Vault".into(),
		});
	}

	#[test]
	fn test_inherited_access() {
		let classes = "
			class Animal {
				protected:
				let sound = \"woof\";
				private:
				let name = \"rex\";
				public:
				speak() { return this.sound; }
			}
			class Dog < Animal {
				public:
				init() { super(); }
				loud() { return super.sound ++ \"!\"; }
				peek() { return super.name; }
			}";
		assert_eq!(value(&format!("{classes} Dog().speak();")), "\"woof\"");
		assert_eq!(value(&format!("{classes} Dog().loud();")), "\"woof!\"");
		assert_eq!(fault(&format!("{classes} Dog().sound;")).to_string(), "\"sound\" is a protected member of Animal.");
		assert_eq!(fault(&format!("{classes} Dog().peek();")).to_string(), "\"name\" is a private member of Animal.");
	}

	#[test]
	fn test_super_constructor_arguments() {
		let source = "
			class Base {
				public:
				let label = nil;
				init(label) { this.label = label; }
				describe() { return \"base \" ++ this.label; }
			}
			class Derived < Base {
				public:
				init(label) { super(label ++ \"!\"); }
				describe() { return \"derived, \" ++ super.describe(); }
			}
			Derived(\"x\").describe();";
		assert_eq!(value(source), "\"derived, base x!\"");
	}

	#[test]
	fn test_subclass_without_initializer_builds_its_superclass() {
		let source = "
			class Base {
				public:
				let value = 0;
				init(value) { this.value = value; }
			}
			class Derived < Base {}
			Derived(7).value;";
		assert_eq!(value(source), "7");
		let error = fault("class Base { public: init(a) {} } class Derived < Base {} Derived();");
		assert_eq!(error.kind, RuntimeErrorKind::ArityMismatch { expected: 1, got: 0 });
	}

	#[test]
	fn test_second_super_call_faults() {
		let source = "
			class Base {}
			class Derived < Base {
				public:
				init() { super(); super(); }
			}
			Derived();";
		assert_eq!(fault(source).kind, RuntimeErrorKind::SuperAlreadyConstructed);
	}

	#[test]
	fn test_static_members() {
		let source = "
			class Counter {
				public:
				static let count = 0;
				static bump() { this.count = this.count + 1; return this.count; }
			}
			Counter.bump();
			Counter.bump();
			Counter.count;";
		assert_eq!(value(source), "2");
		let inherited = "
			class Base { public: static make() { return \"made\"; } }
			class Derived < Base {}
			Derived.make();";
		assert_eq!(value(inherited), "\"made\"");
	}

	#[test]
	fn test_local_classes_and_field_initializers() {
		let source = "
			fun build() {
				let base = 40;
				class Local {
					public:
					let answer = base + 2;
					let me = this;
				}
				return Local();
			}
			let local = build();
			[local.answer, local.me == local];";
		assert_eq!(value(source), "[42, true]");
	}
}
