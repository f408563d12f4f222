use std::fmt::Write;

/**
Renders `data` as lines of 16 bytes, each prefixed with the offset of its first byte and followed by the printable ASCII rendition.

```
let dump = inq::utils::hexdump(b"NVMe");
assert!(dump.starts_with(" 00     4e 56 4d 65 "));
assert!(dump.ends_with("  NVMe\n"));
```
*/
pub fn hexdump(data: &[u8]) -> String {
	// 4× len for ' {:02x}' and ascii, plus the offset column every 16 bytes
	let mut dump = String::with_capacity(4*data.len() + 10*(data.len()/16 + 1));

	for (line, chunk) in data.chunks(16).enumerate() {
		let _ = write!(dump, " {:02x}    ", line * 16);
		for (i, b) in chunk.iter().enumerate() {
			if i == 8 { dump.push(' '); }
			let _ = write!(dump, " {:02x}", b);
		}
		// pad short lines so that ascii columns stay aligned
		for i in chunk.len() .. 16 {
			if i == 8 { dump.push(' '); }
			dump.push_str("   ");
		}
		dump.push_str("  ");
		dump.extend(chunk.iter().map(|&b| printable(b)));
		dump.push('\n');
	}
	dump
}

fn printable(b: u8) -> char {
	if b >= 0x20 && b < 0x7f { b as char } else { '.' }
}

/// Contiguous lowercase hex, as used for identifiers (`0x` prefix is up to the caller).
pub fn hex_string(data: &[u8]) -> String {
	let mut s = String::with_capacity(2*data.len());
	for b in data {
		let _ = write!(s, "{:02x}", b);
	}
	s
}

pub fn all_zeros(data: &[u8]) -> bool {
	data.iter().all(|&b| b == 0)
}
