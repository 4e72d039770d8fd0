use std::{cell::{Ref, RefCell, RefMut}, fmt::Debug, io::Write, rc::Rc};

/// Shared, interior-mutable handle. Cloning is shallow: every clone observes
/// the same cell, which is what environments captured by closures and lists
/// mutated through `<<` rely on.
#[derive(Default)]
pub struct RcCell<T> {
	inner: Rc<RefCell<T>>,
}

impl<T> Clone for RcCell<T> {
	fn clone(&self) -> Self { Self { inner: Rc::clone(&self.inner) } }
}

impl<T> RcCell<T> {
	pub fn new(value: T) -> Self { Self { inner: Rc::new(RefCell::new(value)) } }

	pub fn borrow(&self) -> Ref<'_, T> { self.inner.borrow() }

	pub fn borrow_mut(&self) -> RefMut<'_, T> { self.inner.borrow_mut() }

	/// Identity comparison, two handles to the same cell.
	pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.inner, &other.inner) }
}

impl<T> From<T> for RcCell<T> {
	fn from(value: T) -> Self { Self::new(value) }
}

impl<T: Debug> Debug for RcCell<T> {
	// Environments and lists may be large; show the value without the Rc noise.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.inner.try_borrow() {
			Ok(inner) => inner.fmt(f),
			Err(_) => f.write_str("<borrowed>"),
		}
	}
}

/// A shared byte buffer, handy for capturing what a program prints.
impl Write for RcCell<Vec<u8>> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.borrow_mut().write(buf) }

	fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_the_cell() {
		let first = RcCell::new(vec![1]);
		let second = first.clone();
		second.borrow_mut().push(2);
		assert_eq!(*first.borrow(), vec![1, 2]);
		assert!(first.ptr_eq(&second));
		assert!(!first.ptr_eq(&RcCell::new(vec![1, 2])));
	}

	#[test]
	fn writes_land_in_every_clone() {
		let buffer = RcCell::new(Vec::new());
		let mut writer = buffer.clone();
		write!(writer, "out").unwrap();
		assert_eq!(&*buffer.borrow(), b"out");
	}
}
