use std::{
	cell::{OnceCell, RefCell},
	fmt::Debug,
	rc::Rc,
};

use super::{class::ClassValue, member::{LookupContext, MemberTable}, value::Value};
use crate::{
	error::interpreter::{RuntimeError, RuntimeErrorKind},
	statement::Visibility,
};

/// An object built by calling a class. The part of its state declared by the
/// superclass lives in a separate instance, linked once the superclass
/// constructor has run.
pub struct InstanceValue {
	pub class:      Rc<ClassValue>,
	fields:         RefCell<MemberTable<Value>>,
	super_instance: OnceCell<Rc<InstanceValue>>,
}

impl InstanceValue {
	pub fn new(class: Rc<ClassValue>) -> Self {
		let fields = RefCell::new(MemberTable::new(class.name.clone()));
		Self { class, fields, super_instance: OnceCell::new() }
	}

	pub fn define_field(&self, name: Rc<str>, visibility: Visibility, value: Value) {
		self.fields.borrow_mut().insert(name, visibility, value);
	}

	pub fn super_instance(&self) -> Option<&Rc<InstanceValue>> { self.super_instance.get() }

	/// Link the superclass portion. It can only happen once.
	pub fn attach(&self, portion: Rc<InstanceValue>) -> Result<(), RuntimeErrorKind> {
		self.super_instance.set(portion).map_err(|_| RuntimeErrorKind::SuperAlreadyConstructed)
	}

	/// The portion of this object built by the class called `class_name`.
	pub fn portion_of(self: &Rc<Self>, class_name: &str) -> Option<Rc<InstanceValue>> {
		if &*self.class.name == class_name {
			return Some(self.clone());
		}
		self.super_instance.get()?.portion_of(class_name)
	}

	pub fn get(self: &Rc<Self>, context: LookupContext) -> Result<Value, RuntimeError> {
		self.lookup(context)?.ok_or_else(|| context.undefined())
	}

	fn lookup(self: &Rc<Self>, context: LookupContext) -> Result<Option<Value>, RuntimeError> {
		if let Some(value) = self.fields.borrow().get(context)? {
			return Ok(Some(value));
		}
		if let Some(method) = self.class.find_method(context)? {
			return Ok(Some(method.bind(Value::Instance(self.clone())).into()));
		}
		match self.super_instance.get() {
			Some(portion) => portion.lookup(context),
			None => Ok(None),
		}
	}

	pub fn set(&self, context: LookupContext, value: Value) -> Result<(), RuntimeError> {
		if self.assign(context, value)? { Ok(()) } else { Err(context.undefined()) }
	}

	fn assign(&self, context: LookupContext, value: Value) -> Result<bool, RuntimeError> {
		if self.fields.borrow_mut().set(context, value.clone())? {
			return Ok(true);
		}
		match self.super_instance.get() {
			Some(portion) => portion.assign(context, value),
			None => Ok(false),
		}
	}
}

impl Debug for InstanceValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InstanceValue")
			.field("class", &self.class.name)
			.field("fields", &self.fields)
			.field("super_instance", &self.super_instance.get())
			.finish()
	}
}
