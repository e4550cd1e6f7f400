//! String literal escaping
//!
//! [`escape`] turns raw text into the body of a quoted literal, [`unescape`]
//! reverses the single-character escapes, and [`decode_unicode_escapes`] is
//! the pass run once over a whole input before tokenizing that resolves
//! `\uHHHH` sequences.

use std::borrow::Cow;

use crate::error::{ConversionError, ConversionResult};

/// Whether a character is in the printable ASCII set that never needs a
/// `\u` escape.
fn is_plain_ascii(ch: char) -> bool {
	matches!(ch, '\u{20}' | '\u{21}' | '\u{23}'..='\u{5B}' | '\u{5D}'..='\u{7E}')
}

fn short_escape(ch: char) -> Option<&'static str> {
	match ch {
		'"' => Some("\\\""),
		'\\' => Some("\\\\"),
		'/' => Some("\\/"),
		'\u{08}' => Some("\\b"),
		'\u{0C}' => Some("\\f"),
		'\n' => Some("\\n"),
		'\r' => Some("\\r"),
		'\t' => Some("\\t"),
		_ => None,
	}
}

fn needs_escape(ch: char, unicode: bool) -> bool {
	short_escape(ch).is_some() || ch < '\u{20}' || (unicode && !is_plain_ascii(ch))
}

fn push_unicode_escape(out: &mut String, ch: char) {
	let mut units = [0u16; 2];
	for unit in ch.encode_utf16(&mut units) {
		out.push_str(&format!("\\u{:04x}", unit));
	}
}

/// Escape text for use inside a quoted literal.
///
/// Quote, backslash, slash and the five common control characters get their
/// two-character escapes; any other C0 control becomes `\u00hh`. With
/// `unicode` set, every character outside printable ASCII is written as
/// lowercase `\uhhhh`, using a surrogate pair above the BMP.
///
/// Text that needs no escaping is returned borrowed.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use reinhardt_json::escape::escape;
///
/// assert!(matches!(escape("plain", false), Cow::Borrowed("plain")));
/// assert_eq!(escape("a/b\n", false), "a\\/b\\n");
/// assert_eq!(escape("café", true), "caf\\u00e9");
/// assert_eq!(escape("😀", true), "\\ud83d\\ude00");
/// ```
pub fn escape(text: &str, unicode: bool) -> Cow<'_, str> {
	let Some(first) = text.find(|ch| needs_escape(ch, unicode)) else {
		return Cow::Borrowed(text);
	};

	let mut out = String::with_capacity(text.len() + 16);
	out.push_str(&text[..first]);
	for ch in text[first..].chars() {
		if let Some(escaped) = short_escape(ch) {
			out.push_str(escaped);
		} else if ch < '\u{20}' || (unicode && !is_plain_ascii(ch)) {
			push_unicode_escape(&mut out, ch);
		} else {
			out.push(ch);
		}
	}
	Cow::Owned(out)
}

/// Resolve single-character escapes.
///
/// An unrecognised escape letter is passed through without its backslash,
/// so `\u` comes out as `u`: unicode escapes are resolved earlier by
/// [`decode_unicode_escapes`].
///
/// # Examples
///
/// ```
/// use reinhardt_json::escape::unescape;
///
/// assert_eq!(unescape("a\\/b\\n"), "a/b\n");
/// assert_eq!(unescape("\\q"), "q");
/// ```
pub fn unescape(literal: &str) -> Cow<'_, str> {
	if !literal.contains('\\') {
		return Cow::Borrowed(literal);
	}

	let mut out = String::with_capacity(literal.len());
	let mut chars = literal.chars();
	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}
		match chars.next() {
			Some('b') => out.push('\u{08}'),
			Some('f') => out.push('\u{0C}'),
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some('t') => out.push('\t'),
			Some(other) => out.push(other),
			None => out.push('\\'),
		}
	}
	Cow::Owned(out)
}

/// Resolve every unescaped `\uHHHH` sequence of an input.
///
/// Only a backslash that is not itself escaped starts a unicode escape, so
/// `\\u0041` is left alone. A decoded character that would otherwise end or
/// corrupt a literal (quote, backslash, or one of the short-escaped
/// controls) is written back in its two-character form for the tokenizer.
/// Surrogate pairs are combined.
///
/// # Errors
///
/// Returns [`ConversionError::MalformedUnicodeEscape`] when an escape lacks
/// four hex digits or a surrogate is unpaired.
///
/// # Examples
///
/// ```
/// use reinhardt_json::escape::decode_unicode_escapes;
///
/// assert_eq!(decode_unicode_escapes("\"caf\\u00e9\"").unwrap(), "\"café\"");
/// assert_eq!(decode_unicode_escapes("\"\\u0022\"").unwrap(), "\"\\\"\"");
/// assert_eq!(decode_unicode_escapes("\"\\\\u0041\"").unwrap(), "\"\\\\u0041\"");
/// assert!(decode_unicode_escapes("\"\\u00zz\"").is_err());
/// ```
pub fn decode_unicode_escapes(input: &str) -> ConversionResult<Cow<'_, str>> {
	if !input.contains("\\u") {
		return Ok(Cow::Borrowed(input));
	}

	let bytes = input.as_bytes();
	let mut out = String::with_capacity(input.len());
	let mut copied = 0;
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] != b'\\' {
			i += 1;
			continue;
		}
		match bytes.get(i + 1) {
			Some(b'u') => {
				out.push_str(&input[copied..i]);
				let (ch, consumed) = decode_escape_at(input, i)?;
				match short_escape(ch).filter(|_| ch != '/') {
					Some(escaped) => out.push_str(escaped),
					None => out.push(ch),
				}
				i += consumed;
				copied = i;
			}
			Some(_) => i += 2,
			None => i += 1,
		}
	}
	out.push_str(&input[copied..]);
	Ok(Cow::Owned(out))
}

/// Decode the escape starting at the backslash at `at`, returning the
/// character and the number of bytes consumed.
fn decode_escape_at(input: &str, at: usize) -> ConversionResult<(char, usize)> {
	let unit = read_hex4(input, at)?;
	match unit {
		0xD800..=0xDBFF => {
			let rest = &input[at + 6..];
			if rest.starts_with("\\u") {
				let low = read_hex4(input, at + 6)?;
				if (0xDC00..=0xDFFF).contains(&low) {
					let code = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
					if let Some(ch) = char::from_u32(code) {
						return Ok((ch, 12));
					}
				}
			}
			Err(malformed(input, at, 6))
		}
		0xDC00..=0xDFFF => Err(malformed(input, at, 6)),
		_ => char::from_u32(u32::from(unit))
			.map(|ch| (ch, 6))
			.ok_or_else(|| malformed(input, at, 6)),
	}
}

fn read_hex4(input: &str, at: usize) -> ConversionResult<u16> {
	let digits = input
		.get(at + 2..at + 6)
		.filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
		.ok_or_else(|| malformed(input, at, 6))?;
	u16::from_str_radix(digits, 16).map_err(|_| malformed(input, at, 6))
}

fn malformed(input: &str, at: usize, chars: usize) -> ConversionError {
	ConversionError::MalformedUnicodeEscape {
		position: at,
		fragment: input[at..].chars().take(chars).collect(),
	}
}
