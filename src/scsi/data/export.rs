/*!
Encoders for `KEY=value` lines, as consumed by udev rules (`IMPORT{program}`).

## Example

```
use inq::scsi::data::export;

let model = export::encode_whitespaces(b"  Samsung SSD 970 EVO  ");
assert_eq!(model, b"Samsung_SSD_970_EVO");
assert_eq!(export::udev_escape(b"a/b"), "a\\x2fb");
```
*/

use std::fmt::Write;

fn is_blank(c: u8) -> bool {
	c == b' ' || c == b'\t'
}

fn is_print(c: u8) -> bool {
	c >= 0x20 && c < 0x7f
}

/// Characters udev leaves unescaped: `[0-9A-Za-z#+-.:=@_]`
pub fn is_udev_safe(c: u8) -> bool {
	c.is_ascii_alphanumeric() || b"#+-.:=@_".contains(&c)
}

/// Replaces every byte that is not [udev-safe](fn.is_udev_safe.html) with `\xHH`.
pub fn udev_escape(data: &[u8]) -> String {
	let mut s = String::with_capacity(data.len());
	for &c in data {
		if is_udev_safe(c) {
			s.push(c as char);
		} else {
			let _ = write!(s, "\\x{:02x}", c);
		}
	}
	s
}

/**
Strips leading and trailing blanks, collapses inner runs of blanks into a single `_`, and replaces non-printable characters with `.`.

A single NUL is skipped (to cope with UTF-16-ish strings), two consecutive NULs end the string. Returns an empty vector if there are no printable characters at all.
*/
pub fn encode_whitespaces(data: &[u8]) -> Vec<u8> {
	let mut start = data.iter().take_while(|&&c| is_blank(c)).count();
	if start < data.len() {
		// possible unicode prefix
		start += data[start ..].iter().take_while(|&&c| c < 0x20).count();
	}

	let mut end = data.len();
	while end > start && (is_blank(data[end - 1]) || data[end - 1] == 0) {
		end -= 1;
	}

	let mut out = Vec::with_capacity(end - start);
	let mut valid = false;
	let mut zeroes = false;
	for &c in &data[start .. end] {
		if is_blank(c) {
			if out.last().map_or(false, |&l| l != b'_') {
				out.push(b'_');
				valid = true;
			}
			zeroes = false;
		} else if c == 0 {
			if zeroes { break; }
			zeroes = true;
		} else if !is_print(c) {
			out.push(b'.');
			zeroes = false;
		} else {
			out.push(c);
			valid = true;
			zeroes = false;
		}
	}

	if !valid { out.clear(); }
	out
}

/// Escapes blanks and non-printable characters as `\xHH`, leaves the rest as is.
pub fn encode_string(data: &[u8]) -> String {
	let mut s = String::with_capacity(data.len());
	for &c in data {
		if is_blank(c) || !is_print(c) {
			let _ = write!(s, "\\x{:02x}", c);
		} else {
			s.push(c as char);
		}
	}
	s
}

/// Skips single NULs, stops at two consecutive NULs, turns non-printable characters into spaces.
pub fn encode_unicode(data: &[u8]) -> String {
	let mut s = String::with_capacity(data.len());
	let mut zeroes = false;
	for &c in data {
		if c == 0 {
			if zeroes { break; }
			zeroes = true;
		} else {
			zeroes = false;
			s.push(if is_print(c) { c as char } else { ' ' });
		}
	}
	s
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn whitespaces() {
		assert_eq!(encode_whitespaces(b"SEAGATE "), b"SEAGATE");
		assert_eq!(encode_whitespaces(b"a \t b"), b"a_b");
		assert_eq!(encode_whitespaces(b"a\x01b"), b"a.b");
		// single NUL is skipped, double NUL terminates
		assert_eq!(encode_whitespaces(b"a\0b\0\0c"), b"ab");
		assert_eq!(encode_whitespaces(b"    "), b"");
		assert_eq!(encode_whitespaces(b"\x01\x02"), b"");
	}

	#[test]
	fn strings() {
		assert_eq!(encode_string(b"ST 1"), "ST\\x201");
		assert_eq!(udev_escape(b"naa.5000 c500"), "naa.5000\\x20c500");
		assert_eq!(encode_unicode(b"SN 1\0\0junk"), "SN 1");
	}
}
