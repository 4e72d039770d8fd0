//! Turns source text into a flat list of tokens.
//!
//! Each lexeme is classified the moment it is recognised: punctuation and
//! operators by their characters, literals by converting their text to the
//! runtime value they denote, and words by checking the keyword table only
//! after the whole identifier has been consumed (`maximal munch`, so `classy`
//! stays an identifier).
//!
//! Scanning does not stop at the first bad character. Every error is reported
//! to the sink and the stage fails with the total count.
mod token;

use std::{iter::Peekable, str::CharIndices};

use TokenType::*;
use anyhow::Context;
pub use token::*;

use crate::{LoxError, error::{reporter::ErrorSink, scanner::{ScanError, ScanErrorType, ScannerError}}};

/// A scanner for Lox source code
pub struct Scanner<'a> {
	/// User input source code
	source:      &'a str,
	/// User input source code iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points just past the character currently being considered
	cursor:      usize,
	/// Source line of `cursor`, stamped on every token.
	line:        usize,
}

impl<'a> Scanner<'a> {
	pub fn new(source: &'a str) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { source, source_iter, start: 0, cursor: 0, line: 1 }
	}

	/// Scan all tokens from the source code
	pub fn scan_tokens(&mut self, sink: &mut dyn ErrorSink) -> Result<Vec<Token>, LoxError> {
		let mut tokens = Vec::new();
		let mut error_count = 0;
		while let Some(&(index, _)) = self.source_iter.peek() {
			// We are at the beginning of the next lexeme.
			self.start = index;
			self.cursor = self.start;
			match self.scan_token(&mut tokens) {
				Err(ScannerError::ScanError(e)) => {
					sink.report(e.line, None, &e.r#type.to_string());
					error_count += 1;
				}
				Err(ScannerError::InternalError(e)) => {
					return Err(e.into());
				}
				Ok(_) => {}
			}
		}
		if error_count != 0 {
			return Err(LoxError::ScannerErrors(error_count));
		}
		tokens.push(Token::new(Eof, "", self.line));
		tracing::debug!(count = tokens.len(), "scanned tokens");
		Ok(tokens)
	}

	/// Scan a single token from the source code
	fn scan_token(&mut self, tokens: &mut Vec<Token>) -> Result<(), ScannerError> {
		let next_char = self.advance().context("Unexpected EOF")?;
		// Strings may span lines, so the token is stamped with the line it started on.
		let line = self.line;
		#[rustfmt::skip]
		let r#type = match next_char {
			'(' => LeftParen,
			')' => RightParen,
			'{' => LeftBrace,
			'}' => RightBrace,
			'[' => LeftBracket,
			']' => RightBracket,
			',' => Comma,
			'?' => Question,
			':' => Colon,
			'.' => Dot,
			';' => Semicolon,
			'%' => Percent,
			'^' => Exponent,
			'-' => if self.match_next('-') { MinusMinus } else { Minus },
			'+' => if self.match_next('+') { PlusPlus } else { Plus },
			'*' => if self.match_next('*') { Exponent } else { Star },
			'!' => if self.match_next('=') { BangEqual } else { Bang },
			'=' => if self.match_next('=') { EqualEqual } else if self.match_next('>') { Arrow } else { Equal },
			'<' => if self.match_next('=') { LessEqual } else if self.match_next('<') { Insertion } else { Less },
			'>' => if self.match_next('=') { GreaterEqual } else { Greater },
			'/' => if self.match_next('/') {
				while self.peek().is_some_and(|c| c != '\n') { self.advance(); }
				Comment
			} else if self.match_next('*') {
				self.block_comment()?
			} else { Slash },
			' ' | '\r' | '\t' => EmptyChar,
			'\n' => { self.line += 1; NewLine }
			'"' => self.string()?,
			c if c.is_ascii_digit() => self.number()?,
			c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
			_ => return Err(ScanError::new(self.line, ScanErrorType::UnexpectedCharacter(next_char)).into()),
		};

		if !r#type.is_ignored() {
			let lexeme = &self.source[self.start..self.cursor];
			tokens.push(Token::new(r#type, lexeme, line));
		}

		Ok(())
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	/// Peek the second character ahead
	fn peek_second(&mut self) -> Option<char> {
		let mut it = self.source_iter.clone();
		it.next()?;
		it.peek().map(|&(_, c)| c)
	}

	/// Consume a `/* ... */` comment whose opening has already been matched.
	fn block_comment(&mut self) -> Result<TokenType, ScannerError> {
		while let Some(c) = self.peek() {
			if c == '*' && self.peek_second().is_some_and(|c| c == '/') {
				self.advance(); // consume '*'
				self.advance(); // consume '/'
				return Ok(Comment);
			}
			if c == '\n' {
				self.line += 1;
			}
			self.advance();
		}
		Err(ScanError::new(self.line, ScanErrorType::UnterminatedBlockComment).into())
	}

	/// Scan a string literal
	fn string(&mut self) -> Result<TokenType, ScannerError> {
		while let Some(c) = self.peek() {
			if c == '"' {
				break;
			}
			if c == '\n' {
				self.line += 1
			}
			self.advance();
		}

		self.peek().ok_or_else(|| ScanError::new(self.line, ScanErrorType::UnterminatedString))?;
		self.advance(); // The closing "
		let value = &self.source[self.start + 1..self.cursor - 1];
		Ok(StringLiteral(value.into()))
	}

	/// Scan a number literal
	fn number(&mut self) -> Result<TokenType, ScannerError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}

		// Look for a fractional part.
		if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
			self.advance(); // consume '.'
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.advance();
			}
		}

		let s = &self.source[self.start..self.cursor];
		Ok(NumberLiteral(s.parse().context("Failed to parse number literal")?))
	}

	/// Scan an identifier or keyword. Primes are allowed after the first
	/// character, as in `x'`.
	fn identifier(&mut self) -> TokenType {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\'') {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		TokenType::keyword_or_identifier(text)
	}
}
