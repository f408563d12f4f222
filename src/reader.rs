/*!
Bounds-checked field extraction from raw response buffers.

SCSI structures are big-endian, NVMe structures are little-endian; every accessor names the byte order it uses, so that the choice is visible at the call site.

## Example

```
use inq::reader::Reader;

let r = Reader::new(&[0x00, 0x83, 0x00, 0x0c]);
assert_eq!(r.u16_be(2).unwrap(), 12);
assert!(r.u32_be(2).is_err());
```
*/

use byteorder::{ByteOrder, BigEndian, LittleEndian};

quick_error! {
	#[derive(Debug, Clone, PartialEq)]
	pub enum Error {
		OutOfRange { offset: usize, len: usize, available: usize } {
			display("{} byte(s) at offset {} are past the end of a {}-byte buffer", len, offset, available)
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
	data: &'a [u8],
}

impl<'a> Reader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Reader { data }
	}

	pub fn len(&self) -> usize { self.data.len() }
	pub fn is_empty(&self) -> bool { self.data.is_empty() }
	pub fn data(&self) -> &'a [u8] { self.data }

	/// Returns `len` bytes starting at `offset`.
	pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], Error> {
		match offset.checked_add(len) {
			Some(end) if end <= self.data.len() => Ok(&self.data[offset .. end]),
			_ => Err(Error::OutOfRange { offset, len, available: self.data.len() }),
		}
	}

	/// Everything from `offset` to the end of the buffer (possibly empty).
	pub fn rest(&self, offset: usize) -> Result<&'a [u8], Error> {
		if offset > self.data.len() {
			return Err(Error::OutOfRange { offset, len: 0, available: self.data.len() });
		}
		Ok(&self.data[offset ..])
	}

	/// Narrows the reader down to `len` bytes at `offset`; offsets of the new reader start from zero.
	pub fn sub(&self, offset: usize, len: usize) -> Result<Reader<'a>, Error> {
		self.bytes(offset, len).map(Reader::new)
	}

	pub fn u8(&self, offset: usize) -> Result<u8, Error> {
		self.bytes(offset, 1).map(|b| b[0])
	}

	pub fn bit(&self, offset: usize, bit: usize) -> Result<bool, Error> {
		self.u8(offset).map(|b| is_set(b, bit))
	}

	pub fn u16_be(&self, offset: usize) -> Result<u16, Error> {
		self.bytes(offset, 2).map(BigEndian::read_u16)
	}
	pub fn u24_be(&self, offset: usize) -> Result<u32, Error> {
		self.bytes(offset, 3).map(BigEndian::read_u24)
	}
	pub fn u32_be(&self, offset: usize) -> Result<u32, Error> {
		self.bytes(offset, 4).map(BigEndian::read_u32)
	}
	pub fn u64_be(&self, offset: usize) -> Result<u64, Error> {
		self.bytes(offset, 8).map(BigEndian::read_u64)
	}

	pub fn u16_le(&self, offset: usize) -> Result<u16, Error> {
		self.bytes(offset, 2).map(LittleEndian::read_u16)
	}
	pub fn u24_le(&self, offset: usize) -> Result<u32, Error> {
		self.bytes(offset, 3).map(LittleEndian::read_u24)
	}
	pub fn u32_le(&self, offset: usize) -> Result<u32, Error> {
		self.bytes(offset, 4).map(LittleEndian::read_u32)
	}
	pub fn u64_le(&self, offset: usize) -> Result<u64, Error> {
		self.bytes(offset, 8).map(LittleEndian::read_u64)
	}

	/// ASCII field with trailing blanks and NULs removed; non-printable characters become spaces.
	pub fn ascii(&self, offset: usize, len: usize) -> Result<String, Error> {
		self.bytes(offset, len).map(ascii)
	}
}

pub fn is_set(x: u8, bit: usize) -> bool {
	x & (1 << bit) != 0
}

/// See [`Reader::ascii`](struct.Reader.html#method.ascii).
pub fn ascii(data: &[u8]) -> String {
	let s: String = data.iter()
		.map(|&c| if c >= 0x20 && c < 0x7f { c as char } else { ' ' })
		.collect();
	s.trim_end().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endianness() {
		let r = Reader::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
		assert_eq!(r.u16_be(0).unwrap(), 0x0102);
		assert_eq!(r.u16_le(0).unwrap(), 0x0201);
		assert_eq!(r.u24_be(1).unwrap(), 0x020304);
		assert_eq!(r.u24_le(1).unwrap(), 0x040302);
		assert_eq!(r.u32_be(4).unwrap(), 0x05060708);
		assert_eq!(r.u32_le(4).unwrap(), 0x08070605);
		assert_eq!(r.u64_be(0).unwrap(), 0x0102030405060708);
		assert_eq!(r.u64_le(0).unwrap(), 0x0807060504030201);
	}

	#[test]
	fn out_of_range() {
		let r = Reader::new(&[0; 4]);
		assert_eq!(r.u32_be(1), Err(Error::OutOfRange { offset: 1, len: 4, available: 4 }));
		assert!(r.bytes(usize::max_value(), 2).is_err());
		assert_eq!(r.rest(4).unwrap().len(), 0);
		assert!(r.rest(5).is_err());
	}

	#[test]
	fn sub_reader() {
		let r = Reader::new(&[0, 1, 2, 3, 4, 5]);
		let s = r.sub(2, 3).unwrap();
		assert_eq!(s.u8(0).unwrap(), 2);
		assert!(s.u8(3).is_err());
	}

	#[test]
	fn ascii_trim() {
		assert_eq!(ascii(b"NVMe    "), "NVMe");
		assert_eq!(ascii(b"ab\x01c\0\0"), "ab c");
	}
}
