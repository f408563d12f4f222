/*!
Sense data: parsing of both formats, building of the ones SNTL returns, and sense key specific field pointers.
*/

pub mod fixed;
pub use self::fixed::FixedData;

pub mod key;
pub use self::key::SenseKey;

pub mod descriptor;
pub use self::descriptor::{Descriptor, DescriptorData};

use byteorder::{ByteOrder, BigEndian};

#[derive(Debug)]
pub enum Sense<'a> {
	Fixed(FixedData<'a>),
	Descriptor(DescriptorData<'a>),
}

impl<'a> Sense<'a> {
	/// Returns Key Code Qualifier, as a tuple `(key, asc, ascq)`
	pub fn kcq(&self) -> (u8, u8, u8) {
		match *self {
			Sense::Fixed(FixedData { key, asc, ascq, .. }) => (key, asc, ascq),
			Sense::Descriptor(DescriptorData { key, asc, ascq, .. }) => (key, asc, ascq),
		}
	}

	/// Sense key specific bytes, if SKSV bit is set
	pub fn sks(&self) -> Option<[u8; 3]> {
		let sks = match *self {
			Sense::Fixed(ref data) => data.sks,
			Sense::Descriptor(ref data) => {
				let desc = data.descriptors.iter()
					.find(|d| d.code == descriptor::SKS_DESCRIPTOR && d.data.len() >= 5)?;
				[desc.data[2], desc.data[3], desc.data[4]]
			},
		};
		if sks[0] & 0x80 != 0 { Some(sks) } else { None }
	}
}

/**
Parses sense data of any of the supported formats (70h–73h).

Returns tuple `(current, data)`, where `current` indicates whether this sense represents current or deferred error; or `None` if:

* `data` is empty, or its format is not recognized,
* `data` buffer has not enough data to decode sense.
*/
pub fn parse(data: &[u8]) -> Option<(bool, Sense)> {
	let response_code = data.first()? & 0x7f;
	let (fixed, current) = match response_code {
		0x70 => (true, true),
		0x71 => (true, false),
		0x72 => (false, true),
		0x73 => (false, false),
		_ => return None,
	};

	let data = if fixed {
		fixed::parse(data).map(Sense::Fixed)
	} else {
		descriptor::parse(data).map(Sense::Descriptor)
	};

	data.map(|data| (current, data))
}

/// Location of an invalid field, as reported in sense key specific bytes of ILLEGAL REQUEST sense (SPC-5, 4.4.2.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub struct FieldPointer {
	/// C/D bit: field is in the CDB (as opposed to parameter data)
	pub in_cdb: bool,
	pub byte: u16,
	/// Bit pointer, if BPV is set
	pub bit: Option<u8>,
}

impl FieldPointer {
	pub fn encode(&self) -> [u8; 3] {
		let mut sks = [0x80, 0, 0]; // SKSV
		if self.in_cdb { sks[0] |= 0x40; }
		if let Some(bit) = self.bit {
			sks[0] |= 0x08 | (bit & 0x7);
		}
		BigEndian::write_u16(&mut sks[1..3], self.byte);
		sks
	}

	pub fn decode(sks: [u8; 3]) -> Option<Self> {
		if sks[0] & 0x80 == 0 {
			return None;
		}
		Some(FieldPointer {
			in_cdb: sks[0] & 0x40 != 0,
			byte: BigEndian::read_u16(&sks[1..3]),
			bit: if sks[0] & 0x08 != 0 { Some(sks[0] & 0x7) } else { None },
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_roundtrip() {
		let ptr = FieldPointer { in_cdb: true, byte: 2, bit: Some(5) };
		let data = fixed::build(5, 0x24, 0, Some(ptr.encode()));
		assert_eq!(data.len(), 18);
		assert_eq!(&data[15..18], &[0xcd, 0x00, 0x02]);

		let (current, sense) = parse(&data).unwrap();
		assert!(current);
		assert_eq!(sense.kcq(), (5, 0x24, 0));
		assert_eq!(sense.sks().and_then(FieldPointer::decode), Some(ptr));
	}

	#[test]
	fn descriptor_sks() {
		let ptr = FieldPointer { in_cdb: false, byte: 12, bit: None };
		let data = descriptor::build(5, 0x26, 0, Some(ptr.encode()));
		assert_eq!(data.len(), 16);
		assert_eq!(data[7], 8);

		let (_, sense) = parse(&data).unwrap();
		assert_eq!(sense.kcq(), (5, 0x26, 0));
		assert_eq!(sense.sks().and_then(FieldPointer::decode), Some(ptr));
	}

	#[test]
	fn garbage() {
		assert!(parse(&[]).is_none());
		assert!(parse(&[0x7f, 0, 0]).is_none());
		// additional length points past the buffer
		assert!(parse(&[0x72, 5, 0x24, 0, 0, 0, 0, 20]).is_none());
		// truncated descriptor
		assert!(parse(&[0x72, 5, 0x24, 0, 0, 0, 0, 4, 2, 6, 0, 0]).is_none());
	}
}
