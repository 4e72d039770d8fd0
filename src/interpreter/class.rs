use std::{cell::RefCell, fmt::Debug, rc::Rc};

use super::{
	Interpreter,
	callable::{Arity, Callable, FunctionValue},
	instance::InstanceValue,
	member::{LookupContext, MemberTable},
	value::Value,
};
use crate::{
	environment::Environment,
	error::interpreter::{RuntimeError, RuntimeErrorKind},
	scanner::Token,
	statement::Class,
	utils::RcCell,
};

/// The static side of a class: fields evaluated once at declaration and
/// methods whose receiver is the class itself.
pub struct MetaClass {
	pub fields:  RefCell<MemberTable<Value>>,
	pub methods: MemberTable<FunctionValue>,
}

pub struct ClassValue {
	pub name:        Rc<str>,
	pub meta:        MetaClass,
	pub superclass:  Option<Rc<ClassValue>>,
	/// Scope the class was declared in.
	pub closure:     Option<RcCell<Environment>>,
	pub declaration: Rc<Class>,
	pub methods:     MemberTable<FunctionValue>,
}

impl ClassValue {
	/// Nearest method by that name, from this class up through its ancestors.
	pub fn find_method(&self, context: LookupContext) -> Result<Option<FunctionValue>, RuntimeError> {
		if let Some(method) = self.methods.get(context)? {
			return Ok(Some(method));
		}
		match &self.superclass {
			Some(superclass) => superclass.find_method(context),
			None => Ok(None),
		}
	}

	pub fn find_initializer(&self) -> Option<FunctionValue> {
		match self.methods.find("init") {
			Some(field) => Some(field.value.clone()),
			None => self.superclass.as_ref().and_then(|superclass| superclass.find_initializer()),
		}
	}

	/// This class or the ancestor called `name`.
	pub fn ancestor(self: &Rc<Self>, name: &str) -> Option<Rc<ClassValue>> {
		if &*self.name == name {
			return Some(self.clone());
		}
		self.superclass.as_ref().and_then(|superclass| superclass.ancestor(name))
	}

	pub fn get(self: &Rc<Self>, context: LookupContext) -> Result<Value, RuntimeError> {
		self.lookup(context)?.ok_or_else(|| context.undefined())
	}

	fn lookup(self: &Rc<Self>, context: LookupContext) -> Result<Option<Value>, RuntimeError> {
		if let Some(value) = self.meta.fields.borrow().get(context)? {
			return Ok(Some(value));
		}
		if let Some(method) = self.meta.methods.get(context)? {
			return Ok(Some(method.bind(Value::Class(self.clone())).into()));
		}
		match &self.superclass {
			Some(superclass) => superclass.lookup(context),
			None => Ok(None),
		}
	}

	pub fn set(&self, context: LookupContext, value: Value) -> Result<(), RuntimeError> {
		if self.assign(context, value)? { Ok(()) } else { Err(context.undefined()) }
	}

	fn assign(&self, context: LookupContext, value: Value) -> Result<bool, RuntimeError> {
		if self.meta.fields.borrow_mut().set(context, value.clone())? {
			return Ok(true);
		}
		match &self.superclass {
			Some(superclass) => superclass.assign(context, value),
			None => Ok(false),
		}
	}

	/// Evaluate the instance field initialisers of this class, each with `this`
	/// bound to the instance under construction.
	fn initialize_fields(&self, interpreter: &mut Interpreter, instance: &Rc<InstanceValue>) -> Result<(), RuntimeError> {
		for field in &self.declaration.fields {
			let value = match &field.initializer {
				Some(initializer) => {
					let environment = Environment::nested(self.closure.clone());
					environment.borrow_mut().define(Value::Instance(instance.clone()));
					interpreter.evaluate_in(initializer, environment)?
				}
				None => Value::Nil,
			};
			instance.define_field(field.name.lexeme.clone(), field.visibility, value);
		}
		Ok(())
	}
}

impl Callable for Rc<ClassValue> {
	fn arity(&self) -> Arity { self.find_initializer().map_or(Arity::Exact(0), |initializer| initializer.arity()) }

	fn call(&self, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		let instance = Rc::new(InstanceValue::new(self.clone()));
		self.initialize_fields(interpreter, &instance)?;

		if let Some(initializer) = self.methods.find("init") {
			initializer.value.bind(Value::Instance(instance.clone())).call(interpreter, paren, arguments)?;
		} else if let Some(superclass) = &self.superclass
			&& let Value::Instance(portion) = superclass.call(interpreter, paren, arguments)?
		{
			instance.attach(portion).map_err(|kind| RuntimeError::new(paren.line, kind))?;
		}
		Ok(Value::Instance(instance))
	}
}

impl Debug for ClassValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClassValue")
			.field("name", &self.name)
			.field("superclass", &self.superclass.as_ref().map(|superclass| &superclass.name))
			.finish_non_exhaustive()
	}
}

impl LookupContext<'_> {
	pub fn undefined(&self) -> RuntimeError {
		RuntimeError::new(self.name.line, RuntimeErrorKind::UndefinedProperty(self.name.lexeme.clone()))
	}
}
