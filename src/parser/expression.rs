//! Expression AST nodes
//!
//! An `Expression` is a tree structure representing code like `-123 *
//! (45.67)` as nested nodes. Nodes that name a variable (`Variable`, `Assign`,
//! `Prefix`, `Postfix`, `This`, `Super`) carry an [`ExprId`]: the resolver
//! records where their binding lives in a side table keyed by it.

use std::{
	fmt::Display,
	rc::Rc,
	sync::atomic::{AtomicUsize, Ordering},
};

use Expression::*;
use LiteralValue::*;

use crate::{scanner::{Token, TokenType}, statement::Statement};

/// Identity of a name-bearing expression node, unique for the whole process so
/// trees parsed from separate REPL lines never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
	pub fn fresh() -> Self {
		static NEXT: AtomicUsize = AtomicUsize::new(0);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

/// Expression AST nodes
#[derive(Debug)]
pub enum Expression {
	Literal(LiteralValue),
	Variable { id: ExprId, name: Token },
	Assign { id: ExprId, name: Token, value: Box<Expression> },
	Unary { operator: Token, right: Box<Expression> },
	Binary { left: Box<Expression>, operator: Token, right: Box<Expression> },
	Logical { left: Box<Expression>, operator: Token, right: Box<Expression> },
	Ternary { condition: Box<Expression>, then_branch: Box<Expression>, else_branch: Box<Expression> },
	Comma { left: Box<Expression>, right: Box<Expression> },
	Grouping(Box<Expression>),
	/// `callee(arguments)`, `paren` is the closing parenthesis.
	Call { callee: Box<Expression>, paren: Token, arguments: Vec<Expression> },
	/// `object[index]`
	Subscript { object: Box<Expression>, bracket: Token, index: Box<Expression> },
	PropertyGet { object: Box<Expression>, property: Token },
	PropertySet { object: Box<Expression>, property: Token, value: Box<Expression> },
	This { id: ExprId, keyword: Token },
	/// Bare `super` names the superclass constructor, `super.member` a member.
	Super { id: ExprId, keyword: Token, member: Option<Token> },
	/// `[a, b, c]`
	List { bracket: Token, elements: Vec<Expression> },
	Lambda(Rc<Lambda>),
	/// `++x` / `--x`
	Prefix { id: ExprId, operator: Token, name: Token },
	/// `x++` / `x--`
	Postfix { id: ExprId, name: Token, operator: Token },
}

/// An anonymous function: `(a, b) => a + b` or `x => { ... }`.
#[derive(Debug)]
pub struct Lambda {
	pub arrow:      Token,
	pub parameters: Vec<Token>,
	pub body:       Vec<Statement>,
	/// Set when the lambda initialises a `let`, for display only.
	pub name:       Option<Rc<str>>,
}

impl Expression {
	pub fn variable(name: Token) -> Box<Self> { Box::new(Variable { id: ExprId::fresh(), name }) }

	pub fn unary(operator: Token, right: Box<Self>) -> Box<Self> { Box::new(Unary { operator, right }) }

	pub fn binary(left: Box<Self>, operator: Token, right: Box<Self>) -> Box<Self> {
		Box::new(Binary { left, operator, right })
	}

	pub fn comma(left: Box<Self>, right: Box<Self>) -> Box<Self> { Box::new(Comma { left, right }) }

	pub fn ternary(condition: Box<Self>, then_branch: Box<Self>, else_branch: Box<Self>) -> Box<Self> {
		Box::new(Ternary { condition, then_branch, else_branch })
	}

	pub fn grouping(expr: Box<Self>) -> Box<Self> { Box::new(Grouping(expr)) }

	pub fn assign(name: Token, value: Box<Self>) -> Box<Self> { Box::new(Assign { id: ExprId::fresh(), name, value }) }

	pub fn logical(left: Box<Self>, operator: Token, right: Box<Self>) -> Box<Self> {
		Box::new(Logical { left, operator, right })
	}

	pub fn call(callee: Box<Self>, paren: Token, arguments: Vec<Self>) -> Box<Self> {
		Box::new(Call { callee, paren, arguments })
	}

	pub fn subscript(object: Box<Self>, bracket: Token, index: Box<Self>) -> Box<Self> {
		Box::new(Subscript { object, bracket, index })
	}

	pub fn get(object: Box<Self>, property: Token) -> Box<Self> { Box::new(PropertyGet { object, property }) }

	pub fn set(object: Box<Self>, property: Token, value: Box<Self>) -> Box<Self> {
		Box::new(PropertySet { object, property, value })
	}

	pub fn this(keyword: Token) -> Box<Self> { Box::new(This { id: ExprId::fresh(), keyword }) }

	pub fn super_(keyword: Token, member: Option<Token>) -> Box<Self> {
		Box::new(Super { id: ExprId::fresh(), keyword, member })
	}

	pub fn list(bracket: Token, elements: Vec<Self>) -> Box<Self> { Box::new(List { bracket, elements }) }

	pub fn prefix(operator: Token, name: Token) -> Box<Self> { Box::new(Prefix { id: ExprId::fresh(), operator, name }) }

	pub fn postfix(name: Token, operator: Token) -> Box<Self> {
		Box::new(Postfix { id: ExprId::fresh(), name, operator })
	}

	/// Source line of the leftmost token this node keeps, 0 for a bare literal.
	pub fn line(&self) -> usize {
		match self {
			Literal(_) => 0,
			Variable { name, .. } | Assign { name, .. } => name.line,
			Unary { operator, .. } | Binary { operator, .. } | Logical { operator, .. } => operator.line,
			Prefix { operator, .. } | Postfix { operator, .. } => operator.line,
			Ternary { condition: inner, .. } | Comma { left: inner, .. } | Grouping(inner) => inner.line(),
			Call { paren, .. } => paren.line,
			Subscript { bracket, .. } | List { bracket, .. } => bracket.line,
			PropertyGet { property, .. } | PropertySet { property, .. } => property.line,
			This { keyword, .. } | Super { keyword, .. } => keyword.line,
			Expression::Lambda(lambda) => lambda.arrow.line,
		}
	}

	/// Is this a call whose callee is bare `super`, i.e. `super(...)`?
	pub fn is_super_constructor_call(&self) -> bool {
		matches!(self, Call { callee, .. } if matches!(**callee, Super { member: None, .. }))
	}
}

/// Literal values in the AST
#[derive(Debug, PartialEq)]
pub enum LiteralValue {
	Number(f64),
	StringLiteral(Rc<str>),
	Boolean(bool),
	Nil,
}

impl TryFrom<Token> for Expression {
	type Error = anyhow::Error;

	fn try_from(token: Token) -> Result<Self, Self::Error> {
		Ok(match token.r#type {
			TokenType::NumberLiteral(n) => Literal(Number(n)),
			TokenType::StringLiteral(s) => Literal(StringLiteral(s)),
			TokenType::True => Literal(Boolean(true)),
			TokenType::False => Literal(Boolean(false)),
			TokenType::Nil => Literal(Nil),
			TokenType::Identifier => Variable { id: ExprId::fresh(), name: token },
			_ => anyhow::bail!("Cannot convert token {:?} to Expression::Literal", token),
		})
	}
}

fn join(expressions: &[Expression]) -> String {
	expressions.iter().map(|arg| format!("{arg}")).collect::<Vec<String>>().join(" ")
}

impl Display for Expression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Literal(lit) => write!(f, "{lit}"),
			Unary { operator, right } => write!(f, "({} {right})", operator.lexeme),
			Binary { left, operator, right } => write!(f, "({} {left} {right})", operator.lexeme),
			Grouping(expression) => write!(f, "(group {expression})"),
			Comma { left, right } => write!(f, "(, {left} {right})"),
			Ternary { condition, then_branch, else_branch } => {
				write!(f, "(? {condition} : {then_branch} {else_branch})")
			}
			Variable { name, .. } => write!(f, "{}", name.lexeme),
			Assign { name, value, .. } => write!(f, "(= {} {value})", name.lexeme),
			Logical { left, operator, right } => write!(f, "({} {left} {right})", operator.lexeme),
			Call { callee, arguments, .. } => write!(f, "(call {callee} ({}))", join(arguments)),
			Subscript { object, index, .. } => write!(f, "(index {object} {index})"),
			PropertyGet { object, property } => write!(f, "(get {object}.{})", property.lexeme),
			PropertySet { object, property, value } => write!(f, "(set {object}.{} {value})", property.lexeme),
			This { .. } => write!(f, "this"),
			Super { member: Some(member), .. } => write!(f, "super.{}", member.lexeme),
			Super { member: None, .. } => write!(f, "super"),
			List { elements, .. } => write!(f, "[{}]", join(elements)),
			Expression::Lambda(lambda) => {
				let parameters: Vec<&str> = lambda.parameters.iter().map(|p| &*p.lexeme).collect();
				write!(f, "(lambda ({}))", parameters.join(" "))
			}
			Prefix { operator, name, .. } => write!(f, "({}pre {})", operator.lexeme, name.lexeme),
			Postfix { name, operator, .. } => write!(f, "({}post {})", operator.lexeme, name.lexeme),
		}
	}
}

impl Display for LiteralValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Number(n) => write!(f, "{n}"),
			StringLiteral(s) => write!(f, "\"{s}\""),
			Boolean(b) => write!(f, "{b}"),
			Nil => write!(f, "nil"),
		}
	}
}
