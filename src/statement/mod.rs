//! There is no place in the grammar where both an expression and a statement
//! are allowed. The operands of, say, `+` are always expressions, never
//! statements. The body of a `while` loop is always a statement.

use std::{fmt::Display, rc::Rc};

use crate::{parser::expression::Expression, scanner::Token};

/// A statement in the programming language.
#[derive(Debug)]
pub enum Statement {
	/// An expression used as a statement.
	Expression(Expression),
	If {
		condition:   Expression,
		then_branch: Box<Statement>,
		else_branch: Option<Box<Statement>>,
	},
	/// A named function declaration.
	FunDecl(Rc<Function>),
	/// A block of statements, with its own scope.
	Block(Vec<Statement>),
	ClassDecl(Rc<Class>),
	/// A break statement to exit loops.
	Break(Token),
	/// Skip to the loop's increment, then its condition.
	Continue(Token),
	/// `assert cond;` or `assert(cond, "message");`
	Assert {
		keyword:   Token,
		condition: Expression,
		message:   Option<Rc<str>>,
	},
	/// A variable declaration statement.
	Let(Let),
	/// Both `while` and desugared `for` loops. `increment` is the `for`
	/// increment clause, run after the body even when it `continue`s.
	While {
		condition: Expression,
		body:      Box<Statement>,
		increment: Option<Expression>,
	},
	/// A return statememnt.
	Return {
		keyword: Token,
		value:   Option<Expression>,
	},
}

/// Access level of a class member. Top-level and local declarations are
/// `Unrestricted` and never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
	Public,
	Protected,
	Private,
	Unrestricted,
}

impl Display for Visibility {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Visibility::Public => "public",
			Visibility::Protected => "protected",
			Visibility::Private => "private",
			Visibility::Unrestricted => "none",
		})
	}
}

/// `let name = initializer;`, as a statement or a class field.
#[derive(Debug)]
pub struct Let {
	/// The token of the variable being declared.
	pub name:        Token,
	/// An optional initializer expression.
	pub initializer: Option<Expression>,
	pub visibility:  Visibility,
}

#[derive(Debug)]
pub struct Parameter {
	pub name:    Token,
	/// Evaluated per call when the argument is omitted.
	pub default: Option<Expression>,
}

#[derive(Debug)]
pub struct Function {
	pub name:       Token,
	pub parameters: Vec<Parameter>,
	pub body:       Vec<Statement>,
	pub visibility: Visibility,
}

impl Function {
	/// Parameters that must be passed explicitly. Defaults are always trailing.
	pub fn required(&self) -> usize { self.parameters.iter().take_while(|p| p.default.is_none()).count() }

	pub fn has_defaults(&self) -> bool { self.required() != self.parameters.len() }

	pub fn is_initializer(&self) -> bool { &*self.name.lexeme == "init" }
}

#[derive(Debug)]
pub struct Class {
	pub name:           Token,
	/// Always an `Expression::Variable`.
	pub superclass:     Option<Expression>,
	pub fields:         Vec<Let>,
	pub methods:        Vec<Rc<Function>>,
	pub static_fields:  Vec<Let>,
	pub static_methods: Vec<Rc<Function>>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{error::reporter::Reporter, parser::Parser, scanner::Scanner};

	fn parse(input: &str) -> Vec<Statement> {
		let mut reporter = Reporter::silent();
		let tokens = Scanner::new(input).scan_tokens(&mut reporter).unwrap();
		Parser::new(tokens).parse(&mut reporter).unwrap()
	}

	fn first_function(input: &str) -> Rc<Function> {
		match parse(input).remove(0) {
			Statement::FunDecl(function) => function,
			other => panic!("expected a function, got {other:?}"),
		}
	}

	#[test]
	fn test_let_declaration() {
		let statements = parse("let x; let y = 1 + 2;");
		assert_eq!(statements.len(), 2);
		match &statements[0] {
			Statement::Let(Let { name, initializer, visibility }) => {
				assert_eq!(&*name.lexeme, "x");
				assert!(initializer.is_none());
				assert_eq!(*visibility, Visibility::Unrestricted);
			}
			other => panic!("expected let, got {other:?}"),
		}
		assert!(matches!(&statements[1], Statement::Let(Let { initializer: Some(_), .. })));
	}

	#[test]
	fn test_default_parameters() {
		let function = first_function("fun f(a, b = 2, c = \"x\") {}");
		assert_eq!(function.required(), 1);
		assert!(function.has_defaults());
		assert!(!first_function("fun g(a, b) {}").has_defaults());
		assert!(first_function("fun init() {}").is_initializer());
	}

	#[test]
	fn test_class_members() {
		let statements = parse(
			"class B < A {
				let hidden = 1;
				public:
				let shown = 2;
				static let count = 0;
				static make() { return B(); }
				protected:
				init() { super(); }
				speak() {}
			}",
		);
		let Statement::ClassDecl(class) = &statements[0] else { panic!("expected class") };
		assert_eq!(&*class.name.lexeme, "B");
		assert!(class.superclass.is_some());
		let fields: Vec<(&str, Visibility)> = class.fields.iter().map(|f| (&*f.name.lexeme, f.visibility)).collect();
		assert_eq!(fields, vec![("hidden", Visibility::Private), ("shown", Visibility::Public)]);
		assert_eq!(class.static_fields[0].visibility, Visibility::Public);
		assert_eq!(&*class.static_methods[0].name.lexeme, "make");
		let methods: Vec<(&str, Visibility)> =
			class.methods.iter().map(|m| (&*m.name.lexeme, m.visibility)).collect();
		assert_eq!(methods, vec![("init", Visibility::Protected), ("speak", Visibility::Protected)]);
	}

	#[test]
	fn test_for_desugars_to_while() {
		let statements = parse("for (let i = 0; i < 3; i++) {}");
		let Statement::Block(inner) = &statements[0] else { panic!("expected block") };
		assert!(matches!(inner[0], Statement::Let(_)));
		assert!(matches!(inner[1], Statement::While { increment: Some(_), .. }));

		let statements = parse("for (;;) break;");
		assert!(matches!(&statements[0], Statement::While { increment: None, .. }));
	}

	#[test]
	fn test_assert_forms() {
		let statements = parse("assert 1 > 0; assert(1 > 0, \"positive\");");
		assert!(matches!(&statements[0], Statement::Assert { message: None, .. }));
		match &statements[1] {
			Statement::Assert { message: Some(message), .. } => assert_eq!(&**message, "positive"),
			other => panic!("expected assert, got {other:?}"),
		}
	}
}
