//! Static name resolution.
//!
//! One pass over the statements, run before they are executed. Every local
//! variable gets an address: how many scopes up from the current one it was
//! declared, and at which position in that scope. Names that are not found in
//! any enclosing scope are globals and stay unaddressed; the interpreter looks
//! them up by name when they are used.
//!
//! The walk also rejects programs that misuse `return`, `break`, `continue`,
//! `this` or `super`. Errors never stop the walk, every one is reported.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::{
	LoxError,
	error::{
		reporter::ErrorSink,
		resolver::{ResolveError, ResolveErrorType},
	},
	parser::expression::{ExprId, Expression, Lambda},
	scanner::Token,
	statement::{Class, Function, Let, Statement},
};

/// Where a local lives at run time: `depth` scopes up, at position `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
	pub depth: usize,
	pub slot:  usize,
}

/// Side table produced by the resolver, keyed by expression identity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Resolutions {
	locals:    FxHashMap<ExprId, Address>,
	/// For `this` and `super`, the class whose body contains them.
	receivers: FxHashMap<ExprId, Rc<str>>,
}

impl Resolutions {
	pub fn address(&self, id: ExprId) -> Option<Address> { self.locals.get(&id).copied() }

	pub fn receiver(&self, id: ExprId) -> Option<&Rc<str>> { self.receivers.get(&id) }

	/// Number of addressed locals.
	pub fn len(&self) -> usize { self.locals.len() }

	pub fn is_empty(&self) -> bool { self.locals.is_empty() }

	pub fn extend(&mut self, other: Resolutions) {
		self.locals.extend(other.locals);
		self.receivers.extend(other.receivers);
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingState {
	Declared,
	Defined,
	Read,
}

#[derive(Debug)]
struct Binding {
	token: Token,
	state: BindingState,
	slot:  usize,
}

type Scope = FxHashMap<Rc<str>, Binding>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
	None,
	Function,
	Lambda,
	Method,
	Initializer,
	MetaMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
	None,
	Class,
	Subclass,
}

pub struct Resolver {
	scopes:         Vec<Scope>,
	function:       FunctionKind,
	class:          ClassKind,
	/// Innermost class body last.
	class_names:    Vec<Rc<str>>,
	/// Loops enclosing the current point inside the current function body.
	loop_depth:     usize,
	/// Inside a lambda that was itself written inside a loop.
	lambda_in_loop: bool,
	resolutions:    Resolutions,
	errors:         Vec<ResolveError>,
}

impl Default for Resolver {
	fn default() -> Self { Self::new() }
}

impl Resolver {
	pub fn new() -> Self {
		Self {
			scopes:         Vec::new(),
			function:       FunctionKind::None,
			class:          ClassKind::None,
			class_names:    Vec::new(),
			loop_depth:     0,
			lambda_in_loop: false,
			resolutions:    Resolutions::default(),
			errors:         Vec::new(),
		}
	}

	/// Resolve a whole program, or one REPL line of it.
	pub fn resolve(&mut self, statements: &[Statement], sink: &mut dyn ErrorSink) -> Result<Resolutions, LoxError> {
		self.resolve_statements(statements);
		if !self.errors.is_empty() {
			for error in &self.errors {
				sink.error_at(&error.token, &error.r#type.to_string());
			}
			return Err(LoxError::ResolverErrors(std::mem::take(&mut self.errors).len()));
		}
		let resolutions = std::mem::take(&mut self.resolutions);
		tracing::debug!(count = resolutions.len(), "resolved locals");
		Ok(resolutions)
	}

	fn resolve_statements(&mut self, statements: &[Statement]) {
		for statement in statements {
			self.statement(statement);
		}
	}

	fn statement(&mut self, statement: &Statement) {
		match statement {
			Statement::Expression(expression) => self.expression(expression),
			Statement::If { condition, then_branch, else_branch } => {
				self.expression(condition);
				self.statement(then_branch);
				if let Some(else_branch) = else_branch {
					self.statement(else_branch);
				}
			}
			Statement::FunDecl(function) => {
				self.declare(&function.name);
				self.define(&function.name);
				self.function(function, FunctionKind::Function);
			}
			Statement::Block(statements) => {
				self.scopes.push(Scope::default());
				self.resolve_statements(statements);
				self.end_scope();
			}
			Statement::ClassDecl(class) => self.class(class),
			Statement::Break(keyword) | Statement::Continue(keyword) => {
				if self.loop_depth == 0 {
					let keyword_name = keyword.lexeme.clone();
					if self.lambda_in_loop {
						self.error(keyword, ResolveErrorType::AcrossLambda(keyword_name));
					} else {
						self.error(keyword, ResolveErrorType::OutsideLoop(keyword_name));
					}
				}
			}
			Statement::Assert { condition, .. } => self.expression(condition),
			Statement::Let(declaration) => self.let_declaration(declaration),
			Statement::While { condition, body, increment } => {
				self.expression(condition);
				self.loop_depth += 1;
				self.statement(body);
				if let Some(increment) = increment {
					self.expression(increment);
				}
				self.loop_depth -= 1;
			}
			Statement::Return { keyword, value } => {
				if self.function == FunctionKind::None {
					self.error(keyword, ResolveErrorType::TopLevelReturn);
				}
				if let Some(value) = value {
					if self.function == FunctionKind::Initializer {
						self.error(keyword, ResolveErrorType::ValueFromConstructor);
					}
					self.expression(value);
				}
			}
		}
	}

	fn let_declaration(&mut self, declaration: &Let) {
		self.declare(&declaration.name);
		if let Some(initializer) = &declaration.initializer {
			self.expression(initializer);
		}
		self.define(&declaration.name);
	}

	fn class(&mut self, class: &Class) {
		let enclosing_class = self.class;
		self.class = ClassKind::Class;
		self.declare(&class.name);
		self.define(&class.name);

		if let Some(superclass) = &class.superclass {
			if let Expression::Variable { name, .. } = superclass
				&& name.lexeme == class.name.lexeme
			{
				self.error(name, ResolveErrorType::InheritsFromItself);
			}
			self.class = ClassKind::Subclass;
			self.expression(superclass);
		}

		self.class_names.push(class.name.lexeme.clone());
		self.scopes.push(Scope::default());
		let this = Token::synthetic(crate::scanner::TokenType::This, "this", class.name.line);
		self.declare(&this);
		self.mark(&this, BindingState::Read);

		for field in &class.static_fields {
			self.field_initializer(field);
		}
		for method in &class.static_methods {
			self.function(method, FunctionKind::MetaMethod);
		}
		for field in &class.fields {
			self.field_initializer(field);
		}
		for method in &class.methods {
			let kind = if method.is_initializer() { FunctionKind::Initializer } else { FunctionKind::Method };
			self.function(method, kind);
			if kind == FunctionKind::Initializer && self.class == ClassKind::Subclass {
				self.check_super_constructor_call(method);
			}
		}

		self.end_scope();
		self.class_names.pop();
		self.class = enclosing_class;
	}

	/// Field initialisers are resolved in the class scope, where `this` lives.
	fn field_initializer(&mut self, field: &Let) {
		if let Some(initializer) = &field.initializer {
			self.expression(initializer);
		}
	}

	/// A subclass constructor must start by constructing its superclass.
	fn check_super_constructor_call(&mut self, initializer: &Function) {
		match initializer.body.first() {
			Some(Statement::Expression(expression)) if expression.is_super_constructor_call() => {}
			_ => self.error(&initializer.name, ResolveErrorType::MissingSuperConstructorCall),
		}
	}

	fn function(&mut self, function: &Function, kind: FunctionKind) {
		let enclosing = (self.function, self.loop_depth, self.lambda_in_loop);
		self.function = kind;
		self.loop_depth = 0;
		self.lambda_in_loop = false;

		self.scopes.push(Scope::default());
		for parameter in &function.parameters {
			if let Some(default) = &parameter.default {
				self.expression(default);
			}
			self.declare(&parameter.name);
			self.define(&parameter.name);
		}
		self.resolve_statements(&function.body);
		self.end_scope();

		(self.function, self.loop_depth, self.lambda_in_loop) = enclosing;
	}

	fn lambda(&mut self, lambda: &Lambda) {
		let enclosing = (self.function, self.loop_depth, self.lambda_in_loop);
		self.lambda_in_loop = self.loop_depth > 0 || self.lambda_in_loop;
		self.function = FunctionKind::Lambda;
		self.loop_depth = 0;

		self.scopes.push(Scope::default());
		for parameter in &lambda.parameters {
			self.declare(parameter);
			self.define(parameter);
		}
		self.resolve_statements(&lambda.body);
		self.end_scope();

		(self.function, self.loop_depth, self.lambda_in_loop) = enclosing;
	}

	fn expression(&mut self, expression: &Expression) {
		match expression {
			Expression::Literal(_) => {}
			Expression::Variable { id, name } => {
				let in_own_initializer = self
					.scopes
					.last()
					.and_then(|scope| scope.get(&name.lexeme))
					.is_some_and(|binding| binding.state == BindingState::Declared);
				if in_own_initializer {
					self.error(name, ResolveErrorType::ReadInOwnInitializer);
				}
				self.local(*id, name);
			}
			Expression::Assign { id, name, value } => {
				self.expression(value);
				self.local(*id, name);
			}
			Expression::Prefix { id, name, .. } | Expression::Postfix { id, name, .. } => self.local(*id, name),
			Expression::Unary { right, .. } => self.expression(right),
			Expression::Binary { left, right, .. }
			| Expression::Logical { left, right, .. }
			| Expression::Comma { left, right } => {
				self.expression(left);
				self.expression(right);
			}
			Expression::Ternary { condition, then_branch, else_branch } => {
				self.expression(condition);
				self.expression(then_branch);
				self.expression(else_branch);
			}
			Expression::Grouping(inner) => self.expression(inner),
			Expression::Call { callee, arguments, .. } => {
				self.expression(callee);
				for argument in arguments {
					self.expression(argument);
				}
			}
			Expression::Subscript { object, index, .. } => {
				self.expression(object);
				self.expression(index);
			}
			Expression::PropertyGet { object, property } => {
				self.expression(object);
				if &*property.lexeme == "init" {
					let r#type = if self.class == ClassKind::None {
						ResolveErrorType::ConstructorCallOnInstance
					} else {
						ResolveErrorType::ConstructorCallWithinClass
					};
					self.error(property, r#type);
				}
			}
			Expression::PropertySet { object, property, value } => {
				if &*property.lexeme == "init" {
					let r#type = if self.class == ClassKind::None {
						ResolveErrorType::ConstructorRedefinitionOnInstance
					} else {
						ResolveErrorType::ConstructorRedefinitionWithinClass
					};
					self.error(property, r#type);
				}
				self.expression(value);
				self.expression(object);
			}
			Expression::This { id, keyword } => {
				if self.class == ClassKind::None {
					self.error(keyword, ResolveErrorType::ThisOutsideClass);
					return;
				}
				self.receiver(*id, keyword);
			}
			Expression::Super { id, keyword, .. } => {
				match self.class {
					ClassKind::None => self.error(keyword, ResolveErrorType::SuperOutsideClass),
					ClassKind::Class => self.error(keyword, ResolveErrorType::SuperWithoutSuperclass),
					ClassKind::Subclass => self.receiver(*id, keyword),
				}
			}
			Expression::List { elements, .. } => {
				for element in elements {
					self.expression(element);
				}
			}
			Expression::Lambda(lambda) => self.lambda(lambda),
		}
	}

	/// `this` and `super` both resolve to the receiver bound in the class
	/// scope, and remember which class body they appear in.
	fn receiver(&mut self, id: ExprId, keyword: &Token) {
		let this = Token::synthetic(keyword.r#type.clone(), "this", keyword.line);
		self.local(id, &this);
		if let Some(class_name) = self.class_names.last() {
			self.resolutions.receivers.insert(id, class_name.clone());
		}
	}

	/// Record the address of `name` if some enclosing scope declares it.
	fn local(&mut self, id: ExprId, name: &Token) {
		let height = self.scopes.len();
		for (index, scope) in self.scopes.iter_mut().enumerate().rev() {
			if let Some(binding) = scope.get_mut(&name.lexeme) {
				if binding.state == BindingState::Defined {
					binding.state = BindingState::Read;
				}
				let address = Address { depth: height - 1 - index, slot: binding.slot };
				tracing::trace!(name = %name.lexeme, depth = address.depth, slot = address.slot, "resolved local");
				self.resolutions.locals.insert(id, address);
				return;
			}
		}
	}

	fn declare(&mut self, name: &Token) {
		let Some(scope) = self.scopes.last_mut() else { return };
		if scope.contains_key(&name.lexeme) {
			self.error(name, ResolveErrorType::Redefinition(name.lexeme.clone()));
			return;
		}
		let slot = scope.len();
		scope.insert(name.lexeme.clone(), Binding { token: name.clone(), state: BindingState::Declared, slot });
	}

	fn define(&mut self, name: &Token) { self.mark(name, BindingState::Defined); }

	fn mark(&mut self, name: &Token, state: BindingState) {
		if let Some(binding) = self.scopes.last_mut().and_then(|scope| scope.get_mut(&name.lexeme))
			&& binding.state == BindingState::Declared
		{
			binding.state = state;
		}
	}

	fn end_scope(&mut self) {
		let Some(scope) = self.scopes.pop() else { return };
		for binding in scope.values().filter(|binding| binding.state != BindingState::Read) {
			tracing::trace!(name = %binding.token.lexeme, line = binding.token.line, "local never read");
		}
	}

	fn error(&mut self, token: &Token, r#type: ResolveErrorType) {
		self.errors.push(ResolveError::new(token.clone(), r#type));
	}
}
