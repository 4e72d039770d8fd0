//! Runtime scopes. Each block, call and class body gets an [`Environment`]
//! whose slots line up one to one with the names the resolver declared for
//! the matching syntactic scope, so a variable is found by walking `depth`
//! parents and indexing `slot`, never by name.
//!
//! Globals are not stored here, see [`crate::Interpreter`].

use crate::{interpreter::value::Value, utils::RcCell};

#[derive(Debug, Default)]
pub struct Environment {
	values:    Vec<Value>,
	enclosing: Option<RcCell<Environment>>,
}

impl Environment {
	pub fn new(enclosing: Option<RcCell<Environment>>) -> Self { Self { values: Vec::new(), enclosing } }

	/// A fresh scope nested in `enclosing`, ready to be shared.
	pub fn nested(enclosing: Option<RcCell<Environment>>) -> RcCell<Self> { RcCell::new(Self::new(enclosing)) }

	/// Append the value of the next declared name.
	pub fn define(&mut self, value: Value) { self.values.push(value); }

	pub fn len(&self) -> usize { self.values.len() }

	pub fn is_empty(&self) -> bool { self.values.is_empty() }

	/// # Panics
	/// If the address does not exist. Addresses come from the resolver, so
	/// this is a bug in the interpreter, not in the program being run.
	pub fn get(&self, depth: usize, slot: usize) -> Value {
		if depth > 0 {
			return self.enclosing(depth).borrow().get(depth - 1, slot);
		}
		match self.values.get(slot) {
			Some(value) => value.clone(),
			None => panic!("slot {slot} out of range for a scope of {} values", self.values.len()),
		}
	}

	/// # Panics
	/// If the address does not exist, as for [`Environment::get`].
	pub fn assign(&mut self, depth: usize, slot: usize, value: Value) {
		if depth > 0 {
			return self.enclosing(depth).borrow_mut().assign(depth - 1, slot, value);
		}
		let len = self.values.len();
		match self.values.get_mut(slot) {
			Some(target) => *target = value,
			None => panic!("slot {slot} out of range for a scope of {len} values"),
		}
	}

	/// The receiver of the method whose parameter scope this is: a bound
	/// method keeps `this` in slot 0 of the scope right above its call.
	pub fn this_object(&self) -> Value { self.get(1, 0) }

	fn enclosing(&self, depth: usize) -> &RcCell<Environment> {
		match &self.enclosing {
			Some(enclosing) => enclosing,
			None => panic!("address {depth} scopes up walks past the outermost scope"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chain() -> RcCell<Environment> {
		let outer = Environment::nested(None);
		outer.borrow_mut().define(Value::Number(1.0));
		outer.borrow_mut().define(Value::Number(2.0));
		let inner = Environment::nested(Some(outer));
		inner.borrow_mut().define(Value::Boolean(true));
		inner
	}

	#[test]
	fn addresses_walk_parents() {
		let inner = chain();
		assert!(matches!(inner.borrow().get(0, 0), Value::Boolean(true)));
		assert!(matches!(inner.borrow().get(1, 1), Value::Number(n) if n == 2.0));
		assert!(matches!(inner.borrow().this_object(), Value::Number(n) if n == 1.0));
	}

	#[test]
	fn assignment_is_visible_through_every_handle() {
		let inner = chain();
		let sibling = Environment::nested(inner.borrow().enclosing.clone());
		inner.borrow_mut().assign(1, 0, Value::Nil);
		assert!(matches!(sibling.borrow().get(1, 0), Value::Nil));
		assert_eq!(inner.borrow().len(), 1);
	}

	#[test]
	#[should_panic(expected = "walks past the outermost scope")]
	fn depth_past_root_is_a_bug() { chain().borrow().get(2, 0); }

	#[test]
	#[should_panic(expected = "out of range")]
	fn missing_slot_is_a_bug() { chain().borrow().get(0, 3); }
}
