/*!
IDENTIFY DEVICE data.

## Example

```
use inq::ata::id;

let mut data = [0u8; 512];
data[54..58].copy_from_slice(b"HTSU"); // model is stored with bytes swapped in every word
let id = id::parse(&data).unwrap();
assert_eq!(id.model, "THUS");
```
*/

use std::fmt;

use crate::reader::{Reader, Error};

pub const IDENTIFY_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub enum Ternary {
	Unsupported, Disabled, Enabled
}

impl fmt::Display for Ternary {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Ternary::Unsupported => write!(f, "not supported"),
			Ternary::Disabled    => write!(f, "supported, disabled"),
			Ternary::Enabled     => write!(f, "supported, enabled"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub enum RPM {
	Unknown, NonRotating, RPM(u16)
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub struct Id {
	pub is_ata: bool, // probably redundant
	pub incomplete: bool, // content of words other that 0 or 2 might be invalid

	pub serial: String,
	pub firmware: String,
	pub model: String,

	pub capacity: u64,
	pub sector_size_phy: u32,
	pub sector_size_log: u32,

	pub rpm: RPM,
	pub ata_version: Option<&'static str>,
	pub wwn: Option<u64>,

	pub write_cache: Ternary,
	pub smart: Ternary,
}

/// IDENTIFY data is an array of little-endian words
struct Words<'a>(Reader<'a>);

impl<'a> Words<'a> {
	fn word(&self, i: usize) -> Result<u16, Error> {
		self.0.u16_le(2*i)
	}

	fn is_set(&self, i: usize, bit: usize) -> Result<bool, Error> {
		Ok(self.word(i)? & (1 << bit) != 0)
	}

	fn ternary(&self, word_sup: usize, bit_sup: usize, word_enabled: usize, bit_enabled: usize) -> Result<Ternary, Error> {
		Ok(if !self.is_set(word_sup, bit_sup)? {
			Ternary::Unsupported
		} else if self.is_set(word_enabled, bit_enabled)? {
			Ternary::Enabled
		} else {
			Ternary::Disabled
		})
	}

	// two characters per word, the first one in the high byte
	fn string(&self, start: usize, fin: usize) -> Result<String, Error> {
		let mut output = String::with_capacity((fin - start + 1) * 2);
		for i in start ..= fin {
			let w = self.word(i)?;
			for &c in &[(w >> 8) as u8, w as u8] {
				output.push(if c >= 0x20 && c < 0x7f { c as char } else { ' ' });
			}
		}
		Ok(output.trim().to_string())
	}
}

fn ata_version(x: u16) -> Option<&'static str> {
	match x {
		0x0001 ..= 0x000c => Some("(obsolete)"),

		0x000d => Some("ATA/ATAPI-4 X3T13 1153D revision 6"),
		0x000e => Some("ATA/ATAPI-4 T13 1153D revision 13"),
		0x000f => Some("ATA/ATAPI-4 X3T13 1153D revision 7"),
		0x0010 => Some("ATA/ATAPI-4 T13 1153D revision 18"),
		0x0011 => Some("ATA/ATAPI-4 T13 1153D revision 15"),
		0x0012 => Some("ATA/ATAPI-4 published, ANSI INCITS 317-1998"),
		0x0013 => Some("ATA/ATAPI-5 T13 1321D revision 3"),
		0x0014 => Some("ATA/ATAPI-4 T13 1153D revision 14"),
		0x0015 => Some("ATA/ATAPI-5 T13 1321D revision 1"),
		0x0016 => Some("ATA/ATAPI-5 published, ANSI INCITS 340-2000"),
		0x0017 => Some("ATA/ATAPI-4 T13 1153D revision 17"),
		0x0018 => Some("ATA/ATAPI-6 T13 1410D revision 0"),
		0x0019 => Some("ATA/ATAPI-6 T13 1410D revision 3a"),
		0x001a => Some("ATA/ATAPI-7 T13 1532D revision 1"),
		0x001b => Some("ATA/ATAPI-6 T13 1410D revision 2"),
		0x001c => Some("ATA/ATAPI-6 T13 1410D revision 1"),
		0x001d => Some("ATA/ATAPI-7 published ANSI INCITS 397-2005"),
		0x001e => Some("ATA/ATAPI-7 T13 1532D revision 0"),
		0x001f => Some("ACS-3 Revision 3b"),
		0x0021 => Some("ATA/ATAPI-7 T13 1532D revision 4a"),
		0x0022 => Some("ATA/ATAPI-6 published, ANSI INCITS 361-2002"),
		0x0027 => Some("ATA8-ACS revision 3c"),
		0x0028 => Some("ATA8-ACS revision 6"),
		0x0029 => Some("ATA8-ACS revision 4"),
		0x0031 => Some("ACS-2 revision 2"),
		0x0033 => Some("ATA8-ACS revision 3e"),
		0x0039 => Some("ATA8-ACS revision 4c"),
		0x0042 => Some("ATA8-ACS revision 3f"),
		0x0052 => Some("ATA8-ACS revision 3b"),
		0x005e => Some("ACS-4 revision 5"),
		0x006d => Some("ACS-3 revision 5"),
		0x0082 => Some("ACS-2 published, ANSI INCITS 482-2012"),
		0x0107 => Some("ATA8-ACS revision 2d"),
		0x010a => Some("ACS-3 published, ANSI INCITS 522-2014"),
		0x0110 => Some("ACS-2 revision 3"),
		0x011b => Some("ACS-3 revision 4"),
		_ => None, // not reported, or reserved
	}
}

pub fn parse(data: &[u8]) -> Result<Id, Error> {
	let r = Reader::new(data);
	// make sure the whole structure is there before looking at any word
	r.bytes(0, IDENTIFY_LEN)?;
	let w = Words(r);

	let sectors = ((w.word(61)? as u64) << 16) + w.word(60)? as u64;
	let sectors_48bit = r.u64_le(200)?;

	// word 106 is valid if bit 14 is 1 and bit 15 is 0
	let w106 = w.word(106)?;
	let sector_size_valid = w106 & ((1<<14) + (1<<15)) == (1<<14);

	let sector_size_log = if sector_size_valid {
		(
			if w106 & (1<<12) != 0 {
				// logical sector is longer than 256 words, see words 117-118
				((w.word(118)? as u32) << 16) + w.word(117)? as u32
			} else { 256 }
		) << 1 // words to bytes
	} else {
		512
	};

	// bits 0..3 of word 106: physical sector is 2^x logical ones
	let sector_size_phy = if sector_size_valid && w106 & (1<<13) != 0 {
		sector_size_log << (w106 as u32 & 0xf)
	} else { sector_size_log };

	let wwn = if w.is_set(84, 8)? {
		Some((108 ..= 111).try_fold(0u64, |acc, i| w.word(i).map(|x| (acc << 16) | x as u64))?)
	} else { None };

	Ok(Id {
		is_ata: !w.is_set(0, 15)?,
		incomplete: w.is_set(0, 2)?,

		serial: w.string(10, 19)?,
		firmware: w.string(23, 26)?,
		model: w.string(27, 46)?,

		capacity: (sector_size_log as u64) * if sectors_48bit > 0 { sectors_48bit } else { sectors },
		sector_size_phy,
		sector_size_log,

		rpm: match w.word(217)? {
			0x0000 | 0xffff | 0x0002 ..= 0x0400 => RPM::Unknown,
			0x0001 => RPM::NonRotating,
			i => RPM::RPM(i),
		},
		ata_version: ata_version(w.word(81)?),
		wwn,

		write_cache: w.ternary(82, 5, 85, 5)?,
		smart: w.ternary(82, 0, 85, 0)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn put_string(data: &mut [u8], word: usize, s: &[u8]) {
		for (i, pair) in s.chunks(2).enumerate() {
			data[2*(word + i)] = pair[1];
			data[2*(word + i) + 1] = pair[0];
		}
	}

	#[test]
	fn strings() {
		let mut data = vec![0u8; 512];
		put_string(&mut data, 10, b"  WD-WCC4N1234567   ");
		put_string(&mut data, 23, b"82.00A82");
		put_string(&mut data, 27, b"WDC WD40EFRX-68N32N0                    ");
		let id = parse(&data).unwrap();
		assert_eq!(id.serial, "WD-WCC4N1234567");
		assert_eq!(id.firmware, "82.00A82");
		assert_eq!(id.model, "WDC WD40EFRX-68N32N0");
		assert!(id.is_ata);
	}

	#[test]
	fn geometry() {
		let mut data = vec![0u8; 512];
		// 48-bit sector count
		data[200] = 0x00;
		data[201] = 0x10;
		// word 106: valid, 8 logical per physical
		data[212] = 0x03;
		data[213] = 0x60;
		// word 217: 5400 rpm
		data[434] = 0x18;
		data[435] = 0x15;
		// word 81
		data[162] = 0x6d;
		let id = parse(&data).unwrap();
		assert_eq!(id.capacity, 0x1000 * 512);
		assert_eq!(id.sector_size_phy, 4096);
		assert_eq!(id.rpm, RPM::RPM(5400));
		assert_eq!(id.ata_version, Some("ACS-3 revision 5"));
		assert_eq!(id.wwn, None);
	}

	#[test]
	fn short() {
		assert!(parse(&[0; 100]).is_err());
	}
}
