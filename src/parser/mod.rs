//! The `Scanner` use `Lexical grammar`, implement `alphabet` as `Characters`,
//! `string` as `Lexme` or `Token`
//! The `Parser` use `Syntactic grammar`, implement `alphabet` as `Tokens`,
//! `string` as `Statement`s built from `Expression`s
//!
//! |Name|Operators|Associates
//! --|--|--
//! Comma|,|Left
//! Assignment|=|Right
//! Conditional|?:|Right
//! Logic|or and|Left
//! Equality|== !=|Left
//! Comparison|< > <= >=|Left
//! Concat|++|Left
//! Insertion|<<|Left
//! Term|+ -|Left
//! Factor|* / % ^ **|Left
//! Unary|! - +|Right
//! Prefix / Postfix|++ --|
//!
//! Expression grammar:
//!
//! ``` BNF
//! expression     → comma ;
//! comma          → assignment ( "," assignment )* ;
//! assignment     → ( call "." IDENT | IDENT ) "=" assignment | conditional ;
//! conditional    → or ( "?" expression ":" conditional )? ;
//! or             → and ( "or" and )* ;
//! and            → equality ( "and" equality )* ;
//! equality       → comparison ( ( "!=" | "==" ) comparison )* ;
//! comparison     → concat ( ( ">" | ">=" | "<" | "<=" ) concat )* ;
//! concat         → insertion ( "++" insertion )* ;
//! insertion      → term ( "<<" term )* ;
//! term           → factor ( ( "-" | "+" ) factor )* ;
//! factor         → unary ( ( "/" | "*" | "%" | "^" ) unary )* ;
//! unary          → ( "!" | "-" | "+" ) unary | prefix ;
//! prefix         → ( "++" | "--" ) IDENT | postfix ;
//! postfix        → IDENT ( "++" | "--" ) | call ;
//! call           → primary ( "(" arguments? ")" | "[" expression "]" | "." IDENT )* ;
//! primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
//!                | "super" ( "." IDENT )? | IDENT | "[" arguments? "]"
//!                | "(" expression ")" | lambda ;
//! lambda         → ( "(" ( IDENT ( "," IDENT )* )? ")" | IDENT ) "=>" ( block | assignment ) ;
//! ```

pub(crate) mod expression;

use std::rc::Rc;

use TokenType::*;
use anyhow::anyhow;
use expression::{Expression, Lambda, LiteralValue};

use crate::{
	LoxError,
	error::{parser::{ParseError, ParseErrorType, ParserError}, reporter::ErrorSink},
	scanner::{Token, TokenType},
	statement::{Class as ClassDecl, Function, Let as LetDecl, Parameter, Statement, Visibility},
};

const MAX_ARGUMENTS: usize = 255;

/// Recursive descent parser producing a list of statements.
pub struct Parser {
	/// The tokens to parse, always terminated by `Eof`.
	tokens:  Vec<Token>,
	current: usize,
	/// Every syntax error seen so far, reported together at the end.
	errors:  Vec<ParseError>,
}

impl Parser {
	pub fn new(tokens: Vec<Token>) -> Self { Self { tokens, current: 0, errors: Vec::new() } }

	/// Parse the whole program. Errors do not stop parsing: the parser
	/// resynchronises at the next statement and keeps going.
	pub fn parse(&mut self, sink: &mut dyn ErrorSink) -> Result<Vec<Statement>, LoxError> {
		let mut statements = Vec::new();
		while !self.is_at_end() {
			match self.recovering_declaration() {
				Ok(Some(statement)) => statements.push(statement),
				Ok(None) => {}
				Err(ParserError::InternalError(e)) => return Err(e.into()),
				Err(ParserError::ParseError(e)) => self.errors.push(e),
			}
		}
		if !self.errors.is_empty() {
			for error in &self.errors {
				sink.error_at(&error.token, &error.r#type.to_string());
			}
			return Err(LoxError::ParserErrors(self.errors.len()));
		}
		tracing::debug!(count = statements.len(), "parsed statements");
		Ok(statements)
	}

	fn recovering_declaration(&mut self) -> Result<Option<Statement>, ParserError> {
		match self.declaration() {
			Ok(statement) => Ok(Some(statement)),
			Err(ParserError::ParseError(e)) => {
				self.errors.push(e);
				self.synchronize()?;
				Ok(None)
			}
			Err(e) => Err(e),
		}
	}

	fn declaration(&mut self) -> Result<Statement, ParserError> {
		match self.peek()?.r#type {
			Class => {
				self.advance()?;
				Ok(Statement::ClassDecl(Rc::new(self.class_declaration()?)))
			}
			Fun => {
				self.advance()?;
				Ok(Statement::FunDecl(Rc::new(self.function(Visibility::Unrestricted)?)))
			}
			Let => {
				self.advance()?;
				Ok(Statement::Let(self.let_declaration(Visibility::Unrestricted)?))
			}
			_ => self.statement(),
		}
	}

	/// Members are private until an access label says otherwise; a label
	/// applies to every member after it.
	fn class_declaration(&mut self) -> Result<ClassDecl, ParserError> {
		let name = self.consume(Identifier, "class name")?;
		let superclass = if self.match_type(Less) {
			Some(*Expression::variable(self.consume(Identifier, "superclass name")?))
		} else {
			None
		};
		self.consume(LeftBrace, "'{' before class body")?;

		let mut class = ClassDecl {
			name,
			superclass,
			fields: Vec::new(),
			methods: Vec::new(),
			static_fields: Vec::new(),
			static_methods: Vec::new(),
		};
		let mut visibility = Visibility::Private;
		while !self.check(&RightBrace) && !self.is_at_end() {
			if let Some(label) = self.access_label()? {
				visibility = label;
			} else if self.match_type(Static) {
				if self.match_type(Let) {
					class.static_fields.push(self.let_declaration(visibility)?);
				} else {
					class.static_methods.push(Rc::new(self.function(visibility)?));
				}
			} else if self.match_type(Let) {
				class.fields.push(self.let_declaration(visibility)?);
			} else {
				class.methods.push(Rc::new(self.function(visibility)?));
			}
		}
		self.consume(RightBrace, "'}' after class body")?;
		Ok(class)
	}

	/// `public:`, `protected:` or `private:`.
	fn access_label(&mut self) -> Result<Option<Visibility>, ParserError> {
		let visibility = match self.peek()?.r#type {
			Public => Visibility::Public,
			Protected => Visibility::Protected,
			Private => Visibility::Private,
			_ => return Ok(None),
		};
		if !matches!(self.type_at(1), Some(Colon)) {
			return Ok(None);
		}
		self.advance()?;
		self.advance()?;
		Ok(Some(visibility))
	}

	fn function(&mut self, visibility: Visibility) -> Result<Function, ParserError> {
		let name = self.consume(Identifier, "function name")?;
		self.consume(LeftParen, "'(' after function name")?;
		let mut parameters: Vec<Parameter> = Vec::new();
		if !self.check(&RightParen) {
			loop {
				if parameters.len() >= MAX_ARGUMENTS {
					let token = self.peek()?.clone();
					self.error(token, ParseErrorType::TooManyParameters);
				}
				let name = self.consume(Identifier, "parameter name")?;
				let default = if self.match_type(Equal) {
					let value = self.assignment()?;
					if matches!(*value, Expression::Literal(LiteralValue::Nil)) {
						self.error(name.clone(), ParseErrorType::NilDefault);
					}
					Some(*value)
				} else {
					if parameters.iter().any(|p| p.default.is_some()) {
						self.error(name.clone(), ParseErrorType::MissingDefault);
					}
					None
				};
				parameters.push(Parameter { name, default });
				if !self.match_type(Comma) {
					break;
				}
			}
		}
		self.consume(RightParen, "')' after parameters")?;
		self.consume(LeftBrace, "'{' before function body")?;
		let body = self.block()?;
		Ok(Function { name, parameters, body, visibility })
	}

	fn let_declaration(&mut self, visibility: Visibility) -> Result<LetDecl, ParserError> {
		let name = self.consume(Identifier, "variable name")?;
		let mut initializer = if self.match_type(Equal) { Some(*self.expression()?) } else { None };
		if let Some(Expression::Lambda(lambda)) = &mut initializer
			&& let Some(lambda) = Rc::get_mut(lambda)
		{
			lambda.name = Some(name.lexeme.clone());
		}
		self.consume(Semicolon, "';' after variable declaration")?;
		Ok(LetDecl { name, initializer, visibility })
	}

	fn statement(&mut self) -> Result<Statement, ParserError> {
		match self.peek()?.r#type {
			For => self.for_statement(),
			If => self.if_statement(),
			Return => self.return_statement(),
			Break => {
				let keyword = self.advance()?;
				self.consume(Semicolon, "';' after 'break'")?;
				Ok(Statement::Break(keyword))
			}
			Continue => {
				let keyword = self.advance()?;
				self.consume(Semicolon, "';' after 'continue'")?;
				Ok(Statement::Continue(keyword))
			}
			Assert => self.assert_statement(),
			While => self.while_statement(),
			LeftBrace => {
				self.advance()?;
				Ok(Statement::Block(self.block()?))
			}
			_ => self.expression_statement(),
		}
	}

	/// `for (init; condition; increment) body` becomes
	/// `{ init; while (condition) body, increment }`.
	fn for_statement(&mut self) -> Result<Statement, ParserError> {
		self.advance()?;
		self.consume(LeftParen, "'(' after 'for'")?;
		let initializer = if self.match_type(Semicolon) {
			None
		} else if self.match_type(Let) {
			Some(Statement::Let(self.let_declaration(Visibility::Unrestricted)?))
		} else {
			Some(self.expression_statement()?)
		};
		let condition = if self.check(&Semicolon) {
			Expression::Literal(LiteralValue::Boolean(true))
		} else {
			*self.expression()?
		};
		self.consume(Semicolon, "';' after loop condition")?;
		let increment = if self.check(&RightParen) { None } else { Some(*self.expression()?) };
		self.consume(RightParen, "')' after for clauses")?;
		let body = Box::new(self.statement()?);

		let looped = Statement::While { condition, body, increment };
		Ok(match initializer {
			Some(initializer) => Statement::Block(vec![initializer, looped]),
			None => looped,
		})
	}

	fn if_statement(&mut self) -> Result<Statement, ParserError> {
		self.advance()?;
		self.consume(LeftParen, "'(' after 'if'")?;
		let condition = *self.expression()?;
		self.consume(RightParen, "')' after if condition")?;
		let then_branch = Box::new(self.statement()?);
		let else_branch = if self.match_type(Else) { Some(Box::new(self.statement()?)) } else { None };
		Ok(Statement::If { condition, then_branch, else_branch })
	}

	fn while_statement(&mut self) -> Result<Statement, ParserError> {
		self.advance()?;
		self.consume(LeftParen, "'(' after 'while'")?;
		let condition = *self.expression()?;
		self.consume(RightParen, "')' after condition")?;
		let body = Box::new(self.statement()?);
		Ok(Statement::While { condition, body, increment: None })
	}

	fn return_statement(&mut self) -> Result<Statement, ParserError> {
		let keyword = self.advance()?;
		let value = if self.check(&Semicolon) { None } else { Some(*self.expression()?) };
		self.consume(Semicolon, "';' after return value")?;
		Ok(Statement::Return { keyword, value })
	}

	fn assert_statement(&mut self) -> Result<Statement, ParserError> {
		let keyword = self.advance()?;
		let (condition, message) = if self.match_type(LeftParen) {
			let condition = *self.assignment()?;
			let message = if self.match_type(Comma) {
				let token = self.advance()?;
				match token.r#type {
					StringLiteral(message) => Some(message),
					_ => return Err(ParseError::new(token, ParseErrorType::Expected("assertion message string")).into()),
				}
			} else {
				None
			};
			self.consume(RightParen, "')' after assertion")?;
			(condition, message)
		} else {
			(*self.assignment()?, None)
		};
		self.consume(Semicolon, "';' after assertion")?;
		Ok(Statement::Assert { keyword, condition, message })
	}

	fn expression_statement(&mut self) -> Result<Statement, ParserError> {
		let expression = *self.expression()?;
		self.consume(Semicolon, "';' after expression")?;
		Ok(Statement::Expression(expression))
	}

	/// The statements of a block whose `{` has been consumed.
	fn block(&mut self) -> Result<Vec<Statement>, ParserError> {
		let mut statements = Vec::new();
		while !self.check(&RightBrace) && !self.is_at_end() {
			if let Some(statement) = self.recovering_declaration()? {
				statements.push(statement);
			}
		}
		self.consume(RightBrace, "'}' after block")?;
		Ok(statements)
	}

	/// Parse comma expressions.
	fn expression(&mut self) -> Result<Box<Expression>, ParserError> { self.comma() }

	fn comma(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expr = self.assignment()?;
		while self.match_type(Comma) {
			expr = Expression::comma(expr, self.assignment()?)
		}
		Ok(expr)
	}

	fn assignment(&mut self) -> Result<Box<Expression>, ParserError> {
		let expr = self.conditional()?;
		if !self.check(&Equal) {
			return Ok(expr);
		}
		let equals = self.advance()?;
		let value = self.assignment()?;
		Ok(match *expr {
			Expression::Variable { name, .. } => Expression::assign(name, value),
			Expression::PropertyGet { object, property } => Expression::set(object, property, value),
			target => {
				// Not fatal, the parser is still in a sane state.
				self.error(equals, ParseErrorType::InvalidAssignmentTarget);
				Box::new(target)
			}
		})
	}

	fn conditional(&mut self) -> Result<Box<Expression>, ParserError> {
		let condition = self.or()?;
		if self.match_type(Question) {
			let then_branch = self.expression()?;
			self.consume(Colon, "':' in conditional expression")?;
			let else_branch = self.conditional()?;
			return Ok(Expression::ternary(condition, then_branch, else_branch));
		}
		Ok(condition)
	}

	fn or(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.and()?;
		while matches!(self.peek()?.r#type, Or) {
			expression = Expression::logical(expression, self.advance()?, self.and()?)
		}
		Ok(expression)
	}

	fn and(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.equality()?;
		while matches!(self.peek()?.r#type, And) {
			expression = Expression::logical(expression, self.advance()?, self.equality()?)
		}
		Ok(expression)
	}

	/// Parse equality expressions.
	fn equality(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.comparison()?;
		while matches!(self.peek()?.r#type, BangEqual | EqualEqual) {
			expression = Expression::binary(expression, self.advance()?, self.comparison()?)
		}
		Ok(expression)
	}

	/// Parse comparison expressions.
	fn comparison(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.concat()?;
		while matches!(self.peek()?.r#type, Greater | GreaterEqual | Less | LessEqual) {
			expression = Expression::binary(expression, self.advance()?, self.concat()?)
		}
		Ok(expression)
	}

	fn concat(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.insertion()?;
		while matches!(self.peek()?.r#type, PlusPlus) {
			expression = Expression::binary(expression, self.advance()?, self.insertion()?)
		}
		Ok(expression)
	}

	fn insertion(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.term()?;
		while matches!(self.peek()?.r#type, Insertion) {
			expression = Expression::binary(expression, self.advance()?, self.term()?)
		}
		Ok(expression)
	}

	/// Parse term expressions.
	fn term(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.factor()?;
		while matches!(self.peek()?.r#type, Minus | Plus) {
			expression = Expression::binary(expression, self.advance()?, self.factor()?)
		}
		Ok(expression)
	}

	/// Parse factor expressions.
	fn factor(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expression = self.unary()?;
		while matches!(self.peek()?.r#type, Slash | Star | Percent | Exponent) {
			expression = Expression::binary(expression, self.advance()?, self.unary()?)
		}
		Ok(expression)
	}

	/// Parse unary expressions.
	fn unary(&mut self) -> Result<Box<Expression>, ParserError> {
		if matches!(self.peek()?.r#type, Bang | Minus | Plus) {
			return Ok(Expression::unary(self.advance()?, self.unary()?));
		}
		self.prefix()
	}

	fn prefix(&mut self) -> Result<Box<Expression>, ParserError> {
		if !matches!(self.peek()?.r#type, PlusPlus | MinusMinus) {
			return self.postfix();
		}
		let operator = self.advance()?;
		if !self.check(&Identifier) {
			let symbol = if operator.r#type == PlusPlus { "++" } else { "--" };
			return Err(ParseError::new(self.peek()?.clone(), ParseErrorType::InvalidIncrementTarget(symbol)).into());
		}
		Ok(Expression::prefix(operator, self.advance()?))
	}

	/// `x++` is an increment unless an operand follows, then `++` is
	/// concatenation (`a ++ b`).
	fn postfix(&mut self) -> Result<Box<Expression>, ParserError> {
		let is_postfix = self.check(&Identifier)
			&& matches!(self.type_at(1), Some(PlusPlus | MinusMinus))
			&& !matches!(self.type_at(2), Some(Identifier | StringLiteral(_) | LeftBracket | LeftParen));
		if is_postfix {
			let name = self.advance()?;
			return Ok(Expression::postfix(name, self.advance()?));
		}
		self.call()
	}

	fn call(&mut self) -> Result<Box<Expression>, ParserError> {
		let mut expr = self.primary()?;
		loop {
			if self.match_type(LeftParen) {
				let arguments = self.arguments(&RightParen)?;
				let paren = self.consume(RightParen, "')' after arguments")?;
				expr = Expression::call(expr, paren, arguments);
			} else if self.check(&LeftBracket) {
				let bracket = self.advance()?;
				let index = self.expression()?;
				self.consume(RightBracket, "']' after index")?;
				expr = Expression::subscript(expr, bracket, index);
			} else if self.match_type(Dot) {
				let property = self.consume(Identifier, "property name after '.'")?;
				expr = Expression::get(expr, property);
			} else {
				break;
			}
		}
		Ok(expr)
	}

	/// Comma separated assignments up to, not including, `closing`.
	fn arguments(&mut self, closing: &TokenType) -> Result<Vec<Expression>, ParserError> {
		let mut arguments = Vec::new();
		if self.check(closing) {
			return Ok(arguments);
		}
		loop {
			if arguments.len() >= MAX_ARGUMENTS {
				let token = self.peek()?.clone();
				self.error(token, ParseErrorType::TooManyArguments);
			}
			arguments.push(*self.assignment()?);
			if !self.match_type(Comma) {
				break;
			}
		}
		Ok(arguments)
	}

	/// Parse primary expressions.
	fn primary(&mut self) -> Result<Box<Expression>, ParserError> {
		let token = self.peek()?.clone();
		match &token.r#type {
			False | True | Nil | NumberLiteral(_) | StringLiteral(_) => {
				let token = self.advance()?;
				Ok(Box::new(token.try_into()?))
			}
			This => {
				self.advance()?;
				Ok(Expression::this(token))
			}
			Super => {
				self.advance()?;
				let member = if self.match_type(Dot) {
					Some(self.consume(Identifier, "superclass member name after '.'")?)
				} else {
					None
				};
				Ok(Expression::super_(token, member))
			}
			Identifier => {
				let parameter = self.advance()?;
				if self.check(&Arrow) {
					return self.lambda(vec![parameter]);
				}
				Ok(Expression::variable(parameter))
			}
			LeftBracket => {
				self.advance()?;
				let elements = self.arguments(&RightBracket)?;
				self.consume(RightBracket, "']' after list elements")?;
				Ok(Expression::list(token, elements))
			}
			LeftParen if self.lambda_ahead() => {
				self.advance()?;
				let mut parameters = Vec::new();
				if !self.check(&RightParen) {
					loop {
						parameters.push(self.consume(Identifier, "parameter name")?);
						if !self.match_type(Comma) {
							break;
						}
					}
				}
				self.consume(RightParen, "')' after lambda parameters")?;
				self.lambda(parameters)
			}
			LeftParen => {
				self.advance()?; // consume '('
				let expr = self.expression()?;
				self.consume(RightParen, "')' after expression")?;
				Ok(Expression::grouping(expr))
			}
			_ => Err(ParseError::new(token, ParseErrorType::ExpectedExpression).into()),
		}
	}

	/// A lambda whose parameters have been consumed. An expression body is
	/// sugar for a block returning it.
	fn lambda(&mut self, parameters: Vec<Token>) -> Result<Box<Expression>, ParserError> {
		let arrow = self.consume(Arrow, "'=>' after lambda parameters")?;
		let body = if self.match_type(LeftBrace) {
			self.block()?
		} else {
			let value = self.assignment()?;
			vec![Statement::Return { keyword: Token::synthetic(Return, "return", arrow.line), value: Some(*value) }]
		};
		Ok(Box::new(Expression::Lambda(Rc::new(Lambda { arrow, parameters, body, name: None }))))
	}

	/// Does `( IDENT, ... ) =>` start at the current token?
	fn lambda_ahead(&self) -> bool {
		let mut offset = 1;
		if matches!(self.type_at(offset), Some(RightParen)) {
			return matches!(self.type_at(offset + 1), Some(Arrow));
		}
		loop {
			if !matches!(self.type_at(offset), Some(Identifier)) {
				return false;
			}
			offset += 1;
			match self.type_at(offset) {
				Some(Comma) => offset += 1,
				Some(RightParen) => return matches!(self.type_at(offset + 1), Some(Arrow)),
				_ => return false,
			}
		}
	}

	/// Advance to the next token. `Eof` is never consumed.
	fn advance(&mut self) -> Result<Token, ParserError> {
		let token = self.tokens.get(self.current).cloned().ok_or_else(|| anyhow!("Unexpected EOF"))?;
		if token.r#type != Eof {
			self.current += 1;
		}
		Ok(token)
	}

	/// Peek at the current token.
	fn peek(&self) -> Result<&Token, ParserError> {
		self.tokens.get(self.current).ok_or_else(|| anyhow!("Unexpected EOF").into())
	}

	fn type_at(&self, offset: usize) -> Option<&TokenType> { self.tokens.get(self.current + offset).map(|t| &t.r#type) }

	fn check(&self, r#type: &TokenType) -> bool { self.peek().is_ok_and(|token| token.r#type == *r#type) }

	fn match_type(&mut self, r#type: TokenType) -> bool {
		self.check(&r#type) && { self.current += 1; true }
	}

	fn consume(&mut self, r#type: TokenType, expected: &'static str) -> Result<Token, ParserError> {
		if self.check(&r#type) {
			return self.advance();
		}
		Err(ParseError::new(self.peek()?.clone(), ParseErrorType::Expected(expected)).into())
	}

	fn is_at_end(&self) -> bool { self.check(&Eof) || self.current >= self.tokens.len() }

	/// Record an error that does not need resynchronising.
	fn error(&mut self, token: Token, r#type: ParseErrorType) { self.errors.push(ParseError::new(token, r#type)); }

	/// Skip tokens until the start of the next statement.
	fn synchronize(&mut self) -> Result<(), ParserError> {
		if self.advance()?.r#type == Semicolon {
			return Ok(());
		}
		while !self.is_at_end() {
			if matches!(self.peek()?.r#type, Class | Fun | Let | For | If | While | Return | Assert) {
				return Ok(());
			}
			if self.advance()?.r#type == Semicolon {
				return Ok(());
			}
		}
		Ok(())
	}
}
