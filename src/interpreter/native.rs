//! Functions every program starts with.

use std::{rc::Rc, time::{SystemTime, UNIX_EPOCH}};

use rustc_hash::FxHashMap;

use super::{
	Interpreter,
	callable::{Arity, CallableValue, NativeFunction},
	value::Value,
};
use crate::error::interpreter::RuntimeErrorKind;

pub(super) fn load(globals: &mut FxHashMap<Rc<str>, Value>) {
	let natives = [
		NativeFunction { name: "clock", arity: Arity::Exact(0), body: clock },
		NativeFunction { name: "print", arity: Arity::Variadic, body: print },
		NativeFunction { name: "len", arity: Arity::Exact(1), body: len },
	];
	for native in natives {
		globals.insert(native.name.into(), Value::Callable(Rc::new(CallableValue::Native(native))));
	}
}

/// Seconds since the Unix epoch.
fn clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeErrorKind> {
	let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or_default();
	Ok(Value::Number(elapsed))
}

fn print(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, RuntimeErrorKind> {
	let line = arguments.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
	interpreter.write_line(&line)?;
	Ok(Value::Nil)
}

fn len(_: &mut Interpreter, arguments: &[Value]) -> Result<Value, RuntimeErrorKind> {
	Ok(Value::Number(match arguments.first() {
		Some(Value::List(values)) => values.borrow().len() as f64,
		_ => 0.0,
	}))
}
