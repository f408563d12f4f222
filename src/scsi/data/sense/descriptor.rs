#[derive(Debug)]
pub struct Descriptor<'a> {
	/// Descriptor Type
	pub code: u8,
	/// Descriptor Specific Data
	pub data: &'a [u8],
}

#[derive(Debug)]
pub struct DescriptorData<'a> {
	pub key: u8,
	/// Additional Sense Code
	pub asc: u8,
	/// Additional Sense Code Qualifier
	pub ascq: u8,
	pub descriptors: Vec<Descriptor<'a>>,
}

pub const SKS_DESCRIPTOR: u8 = 0x02;

pub fn parse(data: &[u8]) -> Option<DescriptorData> {
	if data.len() < 8 {
		return None;
	}

	// data[7] is Additional Sense Length, starting from data[8]
	let len = data[7] as usize + 8;
	if data.len() < len {
		// not enough data
		return None;
	}

	let mut descriptors = vec![];
	let mut current_desc: usize = 8;
	while current_desc + 2 <= len {
		let code = data[current_desc];
		let dlen = data[current_desc + 1] as usize;

		// skip this descriptors' header
		current_desc += 2;
		if current_desc + dlen > len {
			// truncated descriptor
			return None;
		}

		descriptors.push(Descriptor {
			code,
			data: &data[current_desc .. current_desc + dlen],
		});

		current_desc += dlen;
	}

	Some(DescriptorData {
		key: data[1] & 0b1111,
		asc: data[2],
		ascq: data[3],
		descriptors,
	})
}

/// Builds current, descriptor format (72h) sense data, with a sense key specific descriptor if `sks` is given.
pub fn build(key: u8, asc: u8, ascq: u8, sks: Option<[u8; 3]>) -> Vec<u8> {
	let mut data = vec![0; 8];
	data[0] = 0x72;
	data[1] = key & 0xf;
	data[2] = asc;
	data[3] = ascq;
	if let Some(sks) = sks {
		data.extend_from_slice(&[SKS_DESCRIPTOR, 6, 0, 0, sks[0], sks[1], sks[2], 0]);
	}
	data[7] = (data.len() - 8) as u8;
	data
}
