use std::{fmt::{Debug, Display}, rc::Rc};

use Value::*;

use super::{callable::{self, CallableValue}, class::ClassValue, instance::InstanceValue};
use crate::{error::interpreter::RuntimeErrorKind, scanner::TokenType, utils::RcCell};

/// Value represents a runtime value in Lox.
#[derive(Clone)]
pub enum Value {
	Nil,
	Boolean(bool),
	Number(f64),
	StringValue(Rc<str>),
	/// Lists are shared: `xs << 1` is visible through every alias of `xs`.
	List(RcCell<Vec<Value>>),
	Callable(Rc<CallableValue>),
	Class(Rc<ClassValue>),
	Instance(Rc<InstanceValue>),
}

fn format_number(n: f64) -> String {
	if n == 0.0 && n.is_sign_negative() {
		return "-0".to_string();
	}
	if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 { format!("{}", n as i64) } else { format!("{n}") }
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Nil => write!(f, "nil"),
			Boolean(b) => write!(f, "{b}"),
			Number(n) => f.write_str(&format_number(*n)),
			StringValue(s) => write!(f, "\"{s}\""),
			List(values) => {
				f.write_str("[")?;
				for (i, value) in values.borrow().iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{value}")?;
				}
				f.write_str("]")
			}
			Callable(callable) => write!(f, "{callable}"),
			Class(class) => write!(f, "<class {}>", class.name),
			Instance(instance) => write!(f, "<{} instance>", instance.class.name),
		}
	}
}

// Closures reach back into the environments that hold them, so objects are
// shown by name only.
impl Debug for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			List(values) => f.debug_list().entries(values.borrow().iter()).finish(),
			other => write!(f, "{other}"),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Nil, Nil) => true,
			(Boolean(l), Boolean(r)) => l == r,
			(Number(l), Number(r)) => l == r,
			(StringValue(l), StringValue(r)) => l == r,
			(List(l), List(r)) => l.ptr_eq(r) || *l.borrow() == *r.borrow(),
			(Callable(l), Callable(r)) => Rc::ptr_eq(l, r),
			(Class(l), Class(r)) => Rc::ptr_eq(l, r),
			(Instance(l), Instance(r)) => Rc::ptr_eq(l, r),
			_ => false,
		}
	}
}

impl From<Vec<Value>> for Value {
	fn from(values: Vec<Value>) -> Self { List(RcCell::new(values)) }
}

impl From<&str> for Value {
	fn from(s: &str) -> Self { StringValue(s.into()) }
}

impl From<f64> for Value {
	fn from(n: f64) -> Self { Number(n) }
}

impl Value {
	/// Performs a binary operation between two values.
	pub fn binary_op(&self, op: &TokenType, right: &Self) -> Result<Value, RuntimeErrorKind> {
		use TokenType::*;

		match op {
			Plus => self.plus(right),
			PlusPlus => self.concatenate(right),
			Insertion => self.insert(right),
			Star => self.star(right),
			Slash => self.divide(right, |l, r| l / r),
			Percent => self.divide(right, |l, r| l % r),
			Minus => self.numbers(right, |l, r| Number(l - r)),
			Exponent => self.numbers(right, |l, r| Number(l.powf(r))),
			Greater => self.numbers(right, |l, r| Boolean(l > r)),
			GreaterEqual => self.numbers(right, |l, r| Boolean(l >= r)),
			Less => self.numbers(right, |l, r| Boolean(l < r)),
			LessEqual => self.numbers(right, |l, r| Boolean(l <= r)),
			EqualEqual => Ok(Boolean(self == right)),
			BangEqual => Ok(Boolean(self != right)),
			_ => Err(RuntimeErrorKind::UnsupportedOperands("binary")),
		}
	}

	/// `nil` and `false` are falsy, and so is every number not above zero.
	pub fn to_bool(&self) -> bool {
		match self {
			Nil => false,
			Boolean(b) => *b,
			Number(n) => *n > 0.0,
			StringValue(s) => !s.is_empty(),
			List(values) => !values.borrow().is_empty(),
			Callable(_) | Class(_) | Instance(_) => true,
		}
	}

	/// Coerce a subscript to an integer the way conditions coerce to booleans.
	pub fn to_index(&self) -> i64 {
		match self {
			Number(n) => n.floor() as i64,
			Nil => 0,
			other => other.to_bool() as i64,
		}
	}

	/// The value as a callee, if it can be called at all.
	pub fn as_callable(&self) -> Option<&dyn callable::Callable> {
		match self {
			Callable(callable) => Some(callable.as_ref()),
			Class(class) => Some(class),
			_ => None,
		}
	}

	fn numbers(&self, other: &Self, op: impl Fn(f64, f64) -> Value) -> Result<Value, RuntimeErrorKind> {
		match (self, other) {
			(Number(l), Number(r)) => Ok(op(*l, *r)),
			_ => Err(RuntimeErrorKind::OperandsMustBeNumbers),
		}
	}

	fn divide(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Result<Value, RuntimeErrorKind> {
		match (self, other) {
			(Number(_), Number(r)) if *r == 0.0 => Err(RuntimeErrorKind::DivisionByZero),
			(Number(l), Number(r)) => Ok(Number(op(*l, *r))),
			_ => Err(RuntimeErrorKind::OperandsMustBeNumbers),
		}
	}

	fn plus(&self, other: &Self) -> Result<Value, RuntimeErrorKind> {
		match (self, other) {
			(Number(l), Number(r)) => Ok(Number(l + r)),
			(StringValue(l), Number(r)) => Ok(StringValue(format!("{l}{}", format_number(*r)).into())),
			(StringValue(l), Boolean(r)) => Ok(StringValue(format!("{l}{r}").into())),
			_ => Err(RuntimeErrorKind::UnsupportedOperands("addition")),
		}
	}

	fn concatenate(&self, other: &Self) -> Result<Value, RuntimeErrorKind> {
		match (self, other) {
			(StringValue(l), StringValue(_)) if l.is_empty() => Ok(other.clone()),
			(StringValue(_), StringValue(r)) if r.is_empty() => Ok(self.clone()),
			(StringValue(l), StringValue(r)) => Ok(StringValue(format!("{l}{r}").into())),
			(List(l), List(r)) => {
				let mut joined = l.borrow().clone();
				joined.extend(r.borrow().iter().cloned());
				Ok(joined.into())
			}
			_ => Err(RuntimeErrorKind::UnsupportedOperands("concatenation")),
		}
	}

	fn insert(&self, other: &Self) -> Result<Value, RuntimeErrorKind> {
		match self {
			List(values) => {
				values.borrow_mut().push(other.clone());
				Ok(self.clone())
			}
			_ => Err(RuntimeErrorKind::UnsupportedOperands("insertion")),
		}
	}

	fn star(&self, other: &Self) -> Result<Value, RuntimeErrorKind> {
		match (self, other) {
			(Number(l), Number(r)) => Ok(Number(l * r)),
			(StringValue(_) | List(_), Number(r)) if r.floor() == 1.0 => Ok(self.clone()),
			(StringValue(s), Number(_)) if s.is_empty() => Ok(self.clone()),
			(StringValue(s), Number(r)) => {
				let times = repeat_count(*r);
				repeated_len(s.len(), times, isize::MAX as usize)?;
				Ok(StringValue(s.repeat(times).into()))
			}
			(List(values), Number(r)) => {
				let values = values.borrow();
				if values.is_empty() {
					return Ok(Vec::new().into());
				}
				let times = repeat_count(*r);
				let total = repeated_len(values.len(), times, isize::MAX as usize / size_of::<Value>())?;
				let mut repeated = Vec::with_capacity(total);
				for _ in 0..times {
					repeated.extend(values.iter().cloned());
				}
				Ok(repeated.into())
			}
			_ => Err(RuntimeErrorKind::UnsupportedOperands("multiplication")),
		}
	}
}

/// Repetition counts are floored, anything below one repeats nothing.
fn repeat_count(times: f64) -> usize { if times >= 1.0 { times.floor() as usize } else { 0 } }

/// Length of `len` elements repeated `times` times, if it stays within `limit`.
fn repeated_len(len: usize, times: usize, limit: usize) -> Result<usize, RuntimeErrorKind> {
	len.checked_mul(times).filter(|total| *total <= limit).ok_or(RuntimeErrorKind::RepetitionTooLarge)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::{Value::Nil, *};
	use crate::scanner::TokenType::*;

	fn list(values: &[f64]) -> Value { values.iter().copied().map(Number).collect::<Vec<_>>().into() }

	#[test]
	fn stringify() {
		assert_eq!(Nil.to_string(), "nil");
		assert_eq!(Number(3.0).to_string(), "3");
		assert_eq!(Number(-2.5).to_string(), "-2.5");
		assert_eq!(Value::from("hi").to_string(), "\"hi\"");
		let nested: Value = vec![Number(1.0), vec![Value::from("a")].into(), Nil].into();
		assert_eq!(nested.to_string(), "[1, [\"a\"], nil]");
		assert_eq!(Value::from(Vec::new()).to_string(), "[]");
	}

	#[test]
	fn truthiness_follows_positive_numbers() {
		assert!(!Number(-1.0).to_bool());
		assert!(!Number(0.0).to_bool());
		assert!(Number(0.5).to_bool());
		assert!(!Nil.to_bool());
		assert!(!Value::from("").to_bool());
		assert!(Value::from("x").to_bool());
		assert!(!list(&[]).to_bool());
		assert!(list(&[0.0]).to_bool());
	}

	#[test]
	fn addition() {
		assert_eq!(Number(1.0).binary_op(&Plus, &Number(2.0)), Ok(Number(3.0)));
		assert_eq!(Value::from("n=").binary_op(&Plus, &Number(2.0)), Ok(Value::from("n=2")));
		assert_eq!(Value::from("ok ").binary_op(&Plus, &Boolean(true)), Ok(Value::from("ok true")));
		assert_eq!(
			Number(1.0).binary_op(&Plus, &Value::from("x")),
			Err(RuntimeErrorKind::UnsupportedOperands("addition"))
		);
	}

	#[test]
	fn concatenation() {
		let joined = list(&[1.0, 2.0]).binary_op(&PlusPlus, &list(&[3.0])).unwrap();
		assert_eq!(joined.to_string(), "[1, 2, 3]");
		assert_eq!(Value::from("ab").binary_op(&PlusPlus, &Value::from("cd")), Ok(Value::from("abcd")));
		assert_eq!(Value::from("").binary_op(&PlusPlus, &Value::from("cd")), Ok(Value::from("cd")));
		assert!(Value::from("a").binary_op(&PlusPlus, &list(&[])).is_err());
	}

	#[test]
	fn insertion_mutates_in_place() {
		let xs = list(&[1.0]);
		let alias = xs.clone();
		xs.binary_op(&Insertion, &Number(2.0)).unwrap();
		assert_eq!(alias.to_string(), "[1, 2]");
		assert_eq!(Number(1.0).binary_op(&Insertion, &Nil), Err(RuntimeErrorKind::UnsupportedOperands("insertion")));
	}

	#[test]
	fn repetition() {
		assert_eq!(Value::from("ab").binary_op(&Star, &Number(3.0)).unwrap().to_string(), "\"ababab\"");
		assert_eq!(Value::from("ab").binary_op(&Star, &Number(2.7)), Ok(Value::from("abab")));
		assert_eq!(Value::from("ab").binary_op(&Star, &Number(0.0)), Ok(Value::from("")));
		assert_eq!(list(&[1.0]).binary_op(&Star, &Number(3.0)), Ok(list(&[1.0, 1.0, 1.0])));
		assert_eq!(list(&[1.0]).binary_op(&Star, &Number(-1.0)), Ok(list(&[])));
		assert_eq!(Number(2.0).binary_op(&Star, &Number(4.0)), Ok(Number(8.0)));
	}

	#[test]
	fn oversized_repetition_faults() {
		let huge = Number(1e19);
		assert_eq!(Value::from("ab").binary_op(&Star, &huge), Err(RuntimeErrorKind::RepetitionTooLarge));
		assert_eq!(list(&[1.0, 2.0]).binary_op(&Star, &huge), Err(RuntimeErrorKind::RepetitionTooLarge));
		assert_eq!(list(&[]).binary_op(&Star, &huge), Ok(list(&[])));
		assert_eq!(Value::from("").binary_op(&Star, &huge), Ok(Value::from("")));
	}

	#[test]
	fn negative_zero_keeps_its_sign() {
		assert_eq!(Number(-0.0).to_string(), "-0");
		assert_eq!(Number(0.0).to_string(), "0");
		assert_eq!(Number(-3.0).to_string(), "-3");
	}

	#[test]
	fn division_by_zero_faults() {
		assert_eq!(Number(5.0).binary_op(&Slash, &Number(0.0)), Err(RuntimeErrorKind::DivisionByZero));
		assert_eq!(Number(5.0).binary_op(&Percent, &Number(0.0)), Err(RuntimeErrorKind::DivisionByZero));
		assert_eq!(Number(5.0).binary_op(&Percent, &Number(3.0)), Ok(Number(2.0)));
		assert_eq!(Number(2.0).binary_op(&Exponent, &Number(10.0)), Ok(Number(1024.0)));
	}

	#[test]
	fn comparison_and_equality() {
		assert_eq!(Number(1.0).binary_op(&Less, &Number(2.0)), Ok(Boolean(true)));
		assert_eq!(Value::from("a").binary_op(&Less, &Number(2.0)), Err(RuntimeErrorKind::OperandsMustBeNumbers));
		assert_eq!(Nil.binary_op(&EqualEqual, &Nil), Ok(Boolean(true)));
		assert_eq!(Nil.binary_op(&EqualEqual, &Boolean(false)), Ok(Boolean(false)));
		assert_eq!(list(&[1.0]).binary_op(&BangEqual, &list(&[1.0])), Ok(Boolean(false)));
	}

	#[test]
	fn index_coercion() {
		assert_eq!(Number(2.9).to_index(), 2);
		assert_eq!(Boolean(true).to_index(), 1);
		assert_eq!(Nil.to_index(), 0);
		assert_eq!(Value::from("").to_index(), 0);
		assert_eq!(Number(-0.5).to_index(), -1);
	}
}
