//! Character-level input cursor

use std::borrow::Cow;

use crate::error::{ConversionError, ConversionResult};
use crate::escape::unescape;

/// Bytes shown on either side of an error position.
const FRAGMENT_RADIUS: usize = 12;

/// Cursor over decoded input with one byte of lookahead.
pub(crate) struct Reader<'a> {
	input: &'a str,
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	pub(crate) fn new(input: &'a str) -> Self {
		Self {
			input,
			bytes: input.as_bytes(),
			pos: 0,
		}
	}

	/// Current byte offset
	pub(crate) fn position(&self) -> usize {
		self.pos
	}

	pub(crate) fn skip_ws(&mut self) {
		while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
			self.pos += 1;
		}
	}

	pub(crate) fn peek(&self) -> Option<u8> {
		self.bytes.get(self.pos).copied()
	}

	pub(crate) fn advance(&mut self) {
		if self.pos < self.bytes.len() {
			self.pos += 1;
		}
	}

	/// Whether only whitespace remains.
	pub(crate) fn at_end(&mut self) -> bool {
		self.skip_ws();
		self.pos >= self.bytes.len()
	}

	/// Skip whitespace, then consume `expected`.
	pub(crate) fn expect(&mut self, expected: u8) -> ConversionResult<()> {
		self.skip_ws();
		match self.peek() {
			Some(b) if b == expected => {
				self.pos += 1;
				Ok(())
			}
			Some(_) => Err(self.error(format!("Expected '{}'", expected as char))),
			None => Err(self.eof()),
		}
	}

	/// Read a quoted literal starting at the cursor and return its unescaped
	/// content.
	pub(crate) fn read_string(&mut self) -> ConversionResult<Cow<'a, str>> {
		self.expect(b'"')?;
		let start = self.pos;
		while let Some(b) = self.peek() {
			match b {
				b'\\' => self.pos += 2,
				b'"' => {
					let literal = &self.input[start..self.pos];
					self.pos += 1;
					return Ok(unescape(literal));
				}
				_ => self.pos += 1,
			}
		}
		self.pos = self.bytes.len();
		Err(self.eof())
	}

	/// Read an unquoted token up to the next delimiter or whitespace.
	pub(crate) fn read_bare(&mut self) -> ConversionResult<&'a str> {
		let start = self.pos;
		while let Some(b) = self.peek() {
			if matches!(b, b',' | b']' | b'}') || b.is_ascii_whitespace() {
				break;
			}
			self.pos += 1;
		}
		if self.pos == start {
			return Err(match self.peek() {
				Some(_) => self.error("Expected a value"),
				None => self.eof(),
			});
		}
		Ok(&self.input[start..self.pos])
	}

	/// Input around the cursor.
	pub(crate) fn fragment(&self) -> String {
		let mut start = self.pos.saturating_sub(FRAGMENT_RADIUS);
		while !self.input.is_char_boundary(start) {
			start -= 1;
		}
		self.input[start..]
			.chars()
			.take(FRAGMENT_RADIUS * 2)
			.collect()
	}

	pub(crate) fn error(&self, message: impl Into<String>) -> ConversionError {
		ConversionError::structural(message, self.pos, self.fragment())
	}

	pub(crate) fn eof(&self) -> ConversionError {
		self.error("Unexpected end of input")
	}
}
