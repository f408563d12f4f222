use crate::reader::Reader;

#[derive(Debug)]
pub struct FixedData<'a> {
	/// Used in SSC READ and SPACE commands
	pub file_mark: bool,
	/// End of Medium; used in SSC READ, SPACE, and WRITE commands
	pub eom: bool,
	/// Used in SBC READ LONG, SBC WRITE LONG, and SSC READ commands
	pub incorrect_length: bool,
	pub key: u8,
	/// Only reported if VALID bit is set
	pub info: Option<u32>,
	/// Command-Specific Information
	pub cmd_info: u32,
	/// Additional Sense Code
	pub asc: u8,
	/// Additional Sense Code Qualifier
	pub ascq: u8,
	/// Field Replaceable Unit Code
	pub fruc: u8,
	/// Sense Key Specific (including the SKSV leading bit)
	pub sks: [u8; 3],
	/// Additional Sense Bytes
	pub more: &'a [u8],
}

pub fn parse(data: &[u8]) -> Option<FixedData> {
	if data.len() < 18 {
		return None;
	}
	let r = Reader::new(data);

	// data[7] is Additional Sense Length, starting from data[8]
	let len = data[7] as usize + 8;
	let more = match r.bytes(18, len.saturating_sub(18)) {
		Ok(more) => more,
		// sense reports more data than `data` buffer actually fits
		Err(_) => return None,
	};

	let mut sks = [0; 3];
	sks.copy_from_slice(&data[15..18]);

	Some(FixedData {
		file_mark: data[2] & 0b1000_0000 != 0,
		eom: data[2] & 0b0100_0000 != 0,
		incorrect_length: data[2] & 0b0010_0000 != 0,
		key: data[2] & 0b1111,

		info: if data[0] & 0x80 != 0 { r.u32_be(3).ok() } else { None },
		cmd_info: r.u32_be(8).ok()?,
		asc: data[12],
		ascq: data[13],
		fruc: data[14],
		sks,
		more,
	})
}

/// Builds current, fixed format (70h) sense data of 18 bytes.
pub fn build(key: u8, asc: u8, ascq: u8, sks: Option<[u8; 3]>) -> Vec<u8> {
	let mut data = vec![0; 18];
	data[0] = 0x70;
	data[2] = key & 0xf;
	data[7] = 10; // additional sense length
	data[12] = asc;
	data[13] = ascq;
	if let Some(sks) = sks {
		data[15..18].copy_from_slice(&sks);
	}
	data
}
