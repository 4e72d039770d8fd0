//! Named members of classes and instances, guarded by their visibility.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::{error::interpreter::{RuntimeError, RuntimeErrorKind}, scanner::Token, statement::Visibility};

#[derive(Debug, Clone)]
pub struct Field<T> {
	pub visibility: Visibility,
	pub value:      T,
}

/// Who is asking for which member.
#[derive(Debug, Clone, Copy)]
pub struct LookupContext<'a> {
	/// Name of the class whose method body performs the access, `None` when the
	/// access happens outside every class body or through some other object
	/// than `this`/`super`.
	pub accessor: Option<&'a str>,
	pub name:     &'a Token,
}

impl<'a> LookupContext<'a> {
	pub fn new(accessor: Option<&'a str>, name: &'a Token) -> Self { Self { accessor, name } }
}

/// Members declared by one class, either on its instances or on the class
/// itself.
#[derive(Debug)]
pub struct MemberTable<T> {
	owner:   Rc<str>,
	members: FxHashMap<Rc<str>, Field<T>>,
}

impl<T: Clone> MemberTable<T> {
	pub fn new(owner: Rc<str>) -> Self { Self { owner, members: FxHashMap::default() } }

	pub fn insert(&mut self, name: Rc<str>, visibility: Visibility, value: T) {
		self.members.insert(name, Field { visibility, value });
	}

	/// `Ok(None)` when this table does not own the name, so the caller can keep
	/// looking up the chain.
	pub fn get(&self, context: LookupContext) -> Result<Option<T>, RuntimeError> {
		match self.members.get(&*context.name.lexeme) {
			Some(field) => {
				self.check_access(field, context)?;
				Ok(Some(field.value.clone()))
			}
			None => Ok(None),
		}
	}

	/// Overwrite an owned member, returning whether the name was found.
	pub fn set(&mut self, context: LookupContext, value: T) -> Result<bool, RuntimeError> {
		let Some(field) = self.members.get(&*context.name.lexeme) else { return Ok(false) };
		self.check_access(field, context)?;
		if let Some(field) = self.members.get_mut(&*context.name.lexeme) {
			field.value = value;
		}
		Ok(true)
	}

	/// Lookup that skips the visibility check, for the runtime's own use.
	pub fn find(&self, name: &str) -> Option<&Field<T>> { self.members.get(name) }

	pub fn owner(&self) -> &Rc<str> { &self.owner }

	fn check_access(&self, field: &Field<T>, context: LookupContext) -> Result<(), RuntimeError> {
		let allowed = match field.visibility {
			Visibility::Public | Visibility::Unrestricted => true,
			Visibility::Protected => context.accessor.is_some(),
			Visibility::Private => context.accessor == Some(&*self.owner),
		};
		if allowed {
			return Ok(());
		}
		Err(RuntimeError::new(context.name.line, RuntimeErrorKind::IllegalAccess {
			member:     context.name.lexeme.clone(),
			visibility: field.visibility,
			owner:      self.owner.clone(),
		}))
	}
}
