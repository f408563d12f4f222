/*!
SCSI commands the translation layer knows about, in the order REPORT SUPPORTED OPERATION CODES lists them.

`len_mask[0]` is the CDB length, the remaining bytes are the CDB usage data (bits the device looks at); `len_mask[len - 1]` is the CONTROL byte mask.
*/

use byteorder::{ByteOrder, BigEndian};

/// Service action is in the low 5 bits of CDB byte 1
pub const F_SA_LOW: u32 = 0x80;
/// Service action is in CDB bytes 8..10
pub const F_SA_HIGH: u32 = 0x100;
pub const FF_SA: u32 = F_SA_LOW | F_SA_HIGH;
/// Not supported, do not report
pub const F_INV_OP: u32 = 0x200;
/// Only supported if the controller sets the Timestamp bit in ONCS
pub const F_NEED_TS_SUP: u32 = 0x10_0000;

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
	/// Command set that defines the command: -1 for SPC, 0 for SBC
	pub doc_pdt: i8,
	pub opcode: u8,
	pub sa: u16,
	pub flags: u32,
	pub len_mask: [u8; 16],
}

impl OpcodeInfo {
	pub fn cdb_len(&self) -> usize { self.len_mask[0] as usize }

	pub fn has_sa(&self) -> bool { self.flags & FF_SA != 0 }

	/// CDB usage data: opcode followed by the mask of every other byte
	pub fn usage(&self) -> Vec<u8> {
		let mut usage = self.len_mask[.. self.cdb_len()].to_vec();
		if let Some(first) = usage.first_mut() {
			*first = self.opcode;
		}
		usage
	}

	fn is_sentinel(&self) -> bool { self.flags == 0xffff }

	/// Whether the command is available on a controller with (`ts_sup = true`) or without Timestamp feature
	pub fn supported(&self, ts_sup: bool) -> bool {
		self.flags & F_INV_OP == 0 && (ts_sup || self.flags & F_NEED_TS_SUP == 0)
	}
}

const fn row(doc_pdt: i8, opcode: u8, sa: u16, flags: u32, len_mask: [u8; 16]) -> OpcodeInfo {
	OpcodeInfo { doc_pdt, opcode, sa, flags, len_mask }
}

const SPC: i8 = -1;
const SBC: i8 = 0;

pub static OPCODES: &[OpcodeInfo] = &[
	// TEST UNIT READY
	row(SPC, 0x00, 0, 0, [6, 0, 0, 0, 0, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// REQUEST SENSE
	row(SPC, 0x03, 0, 0, [6, 0xe1, 0, 0, 0xff, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// INQUIRY
	row(SPC, 0x12, 0, 0, [6, 0xe3, 0xff, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// START STOP UNIT
	row(SBC, 0x1b, 0, 0, [6, 0x1, 0, 0xf, 0xf7, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// RECEIVE DIAGNOSTIC RESULTS
	row(SPC, 0x1c, 0, 0, [6, 0x1, 0xff, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// SEND DIAGNOSTIC
	row(SPC, 0x1d, 0, 0, [6, 0xf7, 0, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
	// READ CAPACITY(10)
	row(SBC, 0x25, 0, 0, [10, 0x1, 0xff, 0xff, 0xff, 0xff, 0, 0, 0x1, 0xc7, 0, 0, 0, 0, 0, 0]),
	// READ(10)
	row(SBC, 0x28, 0, 0, [10, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// WRITE(10)
	row(SBC, 0x2a, 0, 0, [10, 0xfb, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// VERIFY(10)
	row(SBC, 0x2f, 0, 0, [10, 0xf6, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// SYNCHRONIZE CACHE(10)
	row(SBC, 0x35, 0, 0, [10, 0x7, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// WRITE SAME(10)
	row(SBC, 0x41, 0, 0, [10, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// MODE SELECT(10)
	row(SPC, 0x55, 0, 0, [10, 0x13, 0, 0, 0, 0, 0, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// MODE SENSE(10)
	row(SPC, 0x5a, 0, 0, [10, 0x18, 0xff, 0xff, 0, 0, 0, 0xff, 0xff, 0xc7, 0, 0, 0, 0, 0, 0]),
	// READ(16)
	row(SBC, 0x88, 0, 0, [16, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xc7]),
	// WRITE(16)
	row(SBC, 0x8a, 0, 0, [16, 0xfb, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xc7]),
	// VERIFY(16)
	row(SBC, 0x8f, 0, 0, [16, 0xf6, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xc7]),
	// SYNCHRONIZE CACHE(16)
	row(SBC, 0x91, 0, 0, [16, 0x7, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xc7]),
	// WRITE SAME(16)
	row(SBC, 0x93, 0, 0, [16, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0xc7]),
	// READ CAPACITY(16), SERVICE ACTION IN(16)
	row(SBC, 0x9e, 0x10, F_SA_LOW, [16, 0x10, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x1, 0xc7]),
	// REPORT LUNS
	row(SPC, 0xa0, 0, 0, [12, 0xe3, 0xff, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0xc7, 0, 0, 0, 0]),
	// REPORT SUPPORTED OPERATION CODES, MAINTENANCE IN
	row(SPC, 0xa3, 0xc, F_SA_LOW, [12, 0xc, 0x87, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0xc7, 0, 0, 0, 0]),
	// REPORT SUPPORTED TASK MANAGEMENT FUNCTIONS
	row(SPC, 0xa3, 0xd, F_SA_LOW, [12, 0xd, 0x80, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0xc7, 0, 0, 0, 0]),
	// REPORT TIMESTAMP
	row(SPC, 0xa3, 0xf, F_SA_LOW | F_NEED_TS_SUP, [12, 0xf, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0xc7, 0, 0, 0, 0]),
	// SET TIMESTAMP, MAINTENANCE OUT
	row(SPC, 0xa4, 0xf, F_SA_LOW | F_NEED_TS_SUP, [12, 0xf, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0xc7, 0, 0, 0, 0]),

	row(-127, 0xff, 0xffff, 0xffff, [0; 16]),
];

/// Table rows, sentinel excluded
pub fn iter() -> impl Iterator<Item = &'static OpcodeInfo> {
	OPCODES.iter().take_while(|op| !op.is_sentinel())
}

/// Looks up the command by opcode and, for commands with service actions, by service action
pub fn find(opcode: u8, sa: u16) -> Option<&'static OpcodeInfo> {
	iter().find(|op| op.opcode == opcode && (!op.has_sa() || op.sa == sa))
}

/// Extracts the service action from `cdb` the way the command with this `opcode` encodes it
pub fn cdb_sa(cdb: &[u8]) -> u16 {
	let opcode = match cdb.first() {
		Some(&op) => op,
		None => return 0,
	};
	let flags = iter().find(|op| op.opcode == opcode).map(|op| op.flags).unwrap_or(0);
	if flags & F_SA_LOW != 0 {
		cdb.get(1).map(|b| u16::from(b & 0x1f)).unwrap_or(0)
	} else if flags & F_SA_HIGH != 0 && cdb.len() >= 10 {
		BigEndian::read_u16(&cdb[8..10])
	} else {
		0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_sentinel_at_the_end() {
		let last = OPCODES.last().unwrap();
		assert_eq!(last.flags, 0xffff);
		assert_eq!(OPCODES.iter().filter(|op| op.is_sentinel()).count(), 1);
		assert_eq!(iter().count(), OPCODES.len() - 1);
	}

	#[test]
	fn lengths() {
		for op in iter() {
			let len = op.cdb_len();
			assert!(len == 6 || len == 10 || len == 12 || len == 16, "{:02x}", op.opcode);
			// control byte
			assert_eq!(op.len_mask[len - 1], 0xc7, "{:02x}", op.opcode);
		}
	}

	#[test]
	fn service_actions() {
		assert_eq!(find(0xa3, 0xc).unwrap().len_mask[1], 0xc);
		assert_eq!(find(0xa3, 0xd).unwrap().len_mask[1], 0xd);
		assert!(find(0xa3, 0x5).is_none());
		assert!(find(0x12, 0x1234).is_some());
		assert!(find(0xa4, 0xf).unwrap().flags & F_NEED_TS_SUP != 0);
		assert!(!find(0xa4, 0xf).unwrap().supported(false));

		assert_eq!(cdb_sa(&[0xa3, 0x0c, 0, 0]), 0xc);
		assert_eq!(cdb_sa(&[0x12, 0x01, 0x80]), 0);
	}

	#[test]
	fn usage_data() {
		let inq = find(0x12, 0).unwrap();
		assert_eq!(inq.usage(), vec![0x12, 0xe3, 0xff, 0xff, 0xff, 0xc7]);
	}
}
