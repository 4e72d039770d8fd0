use std::{fmt::Display, rc::Rc};

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub r#type: TokenType,
	pub lexeme: Rc<str>,
	pub line:   usize,
}

impl Token {
	pub fn new(r#type: TokenType, lexeme: &str, line: usize) -> Self { Self { r#type, lexeme: lexeme.into(), line } }

	/// A token that never came from source text, e.g. the implicit `this` or
	/// the `return` wrapped around an expression-bodied lambda.
	pub fn synthetic(r#type: TokenType, lexeme: &str, line: usize) -> Self { Self::new(r#type, lexeme, line) }
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.r#type {
			TokenType::Eof => write!(f, "end"),
			_ => write!(f, "\"{}\"", self.lexeme),
		}
	}
}

/// The different types of tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
	/// New Line Character `\n`.
	NewLine,
	/// Empty Character: ` `, `\r`, `\t`.
	EmptyChar,
	/// Comment `//` or /* ... */
	Comment,
	/// Left parenthesis `(`.
	LeftParen,
	/// Right parenthesis `)`.
	RightParen,
	/// Left brace `{`.
	LeftBrace,
	/// Right brace `}`.
	RightBrace,
	/// Left bracket `[`.
	LeftBracket,
	/// Right bracket `]`.
	RightBracket,
	/// Comma `,`.
	Comma,
	/// Question mark `?`.
	Question,
	/// Colon `:`.
	Colon,
	/// Dot `.`.
	Dot,
	/// Minus `-`.
	Minus,
	/// Decrement `--`.
	MinusMinus,
	/// Plus `+`.
	Plus,
	/// Increment or concatenation `++`.
	PlusPlus,
	/// Semicolon `;`.
	Semicolon,
	/// Slash `/`.
	Slash,
	/// Asterisk `*`.
	Star,
	/// Modulo `%`.
	Percent,
	/// Exponent `^` or `**`.
	Exponent,
	/// Bang `!`.
	Bang,
	/// Bang equal `!=`.
	BangEqual,
	/// Equal `=`.
	Equal,
	/// Equal equal `==`.
	EqualEqual,
	/// Lambda arrow `=>`.
	Arrow,
	/// Greater than `>`.
	Greater,
	/// Greater than or equal `>=`.
	GreaterEqual,
	/// Less than `<`.
	Less,
	/// Less than or equal `<=`.
	LessEqual,
	/// List insertion `<<`.
	Insertion,
	/// Identifier, e.g. variable or function name.
	Identifier,
	/// String literal, e.g. `"hello"`.
	StringLiteral(Rc<str>),
	/// Number literal, e.g. `123.45`.
	NumberLiteral(f64),
	And,
	Assert,
	Break,
	Class,
	Continue,
	Else,
	False,
	Fun,
	For,
	If,
	Let,
	Nil,
	Or,
	Private,
	Protected,
	Public,
	Return,
	Static,
	Super,
	This,
	True,
	While,
	/// End of file/input.
	Eof,
}

impl TokenType {
	pub fn is_ignored(&self) -> bool {
		matches!(self, TokenType::EmptyChar | TokenType::NewLine | TokenType::Comment)
	}

	pub fn keyword_or_identifier(value: &str) -> Self {
		match value {
			"and" => TokenType::And,
			"assert" => TokenType::Assert,
			"break" => TokenType::Break,
			"class" => TokenType::Class,
			"continue" => TokenType::Continue,
			"else" => TokenType::Else,
			"false" => TokenType::False,
			"for" => TokenType::For,
			"fun" => TokenType::Fun,
			"if" => TokenType::If,
			"let" => TokenType::Let,
			"nil" => TokenType::Nil,
			"or" => TokenType::Or,
			"private" => TokenType::Private,
			"protected" => TokenType::Protected,
			"public" => TokenType::Public,
			"return" => TokenType::Return,
			"static" => TokenType::Static,
			"super" => TokenType::Super,
			"this" => TokenType::This,
			"true" => TokenType::True,
			"while" => TokenType::While,
			_ => TokenType::Identifier,
		}
	}
}
