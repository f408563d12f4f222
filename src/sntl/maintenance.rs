//! MAINTENANCE IN service actions: REPORT SUPPORTED OPERATION CODES and REPORT SUPPORTED TASK MANAGEMENT FUNCTIONS

use byteorder::{ByteOrder, BigEndian};

use super::opcodes::{self, OpcodeInfo};
use super::SenseInfo;

pub const SA_REPORT_OPCODES: u16 = 0x0c;
pub const SA_REPORT_TMFS: u16 = 0x0d;

/// Length of command timeouts descriptor, including its length field
const TIMEOUTS_DESC_LEN: usize = 12;

fn timeouts_descriptor() -> [u8; TIMEOUTS_DESC_LEN] {
	let mut desc = [0u8; TIMEOUTS_DESC_LEN];
	// timeouts are unspecified (zero)
	BigEndian::write_u16(&mut desc[0..2], (TIMEOUTS_DESC_LEN - 2) as u16);
	desc
}

/// All supported commands: 8-byte command descriptors, each followed by a timeouts descriptor if `rctd` is set
fn all_commands(rctd: bool, ts_sup: bool) -> Vec<u8> {
	let mut resp = vec![0u8; 4];
	for op in opcodes::iter().filter(|op| op.supported(ts_sup)) {
		let mut desc = [0u8; 8];
		desc[0] = op.opcode;
		BigEndian::write_u16(&mut desc[2..4], op.sa);
		if rctd { desc[5] |= 0x2; } // CTDP
		if op.has_sa() { desc[5] |= 0x1; } // SERVACTV
		BigEndian::write_u16(&mut desc[6..8], op.cdb_len() as u16);
		resp.extend_from_slice(&desc);
		if rctd {
			resp.extend_from_slice(&timeouts_descriptor());
		}
	}
	let len = resp.len() - 4;
	BigEndian::write_u32(&mut resp[0..4], len as u32);
	resp
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Support {
	NotSupported = 1,
	Supported = 3,
}

/// Looks up the command a single-command query (reporting options 1 to 3) asks about; `Ok(None)` means it is not supported
fn one_command(options: u8, opcode: u8, sa: u16, ts_sup: bool) -> Result<Option<&'static OpcodeInfo>, SenseInfo> {
	let mut rows = opcodes::iter().filter(|op| op.opcode == opcode && op.supported(ts_sup)).peekable();
	let with_sa = match rows.peek() {
		Some(op) => op.has_sa(),
		None => return Ok(None),
	};

	match options {
		// opcode only
		1 => {
			if with_sa {
				return Err(SenseInfo::invalid_field(true, 2, Some(2)));
			}
			Ok(rows.next())
		},
		// opcode and service action
		2 => {
			if !with_sa {
				return Err(SenseInfo::invalid_field(true, 4, None));
			}
			Ok(rows.find(|op| op.sa == sa))
		},
		// opcode, and service action if the command has them
		_ => {
			if with_sa {
				Ok(rows.find(|op| op.sa == sa))
			} else if sa == 0 {
				Ok(rows.next())
			} else {
				Ok(None)
			}
		},
	}
}

/// REPORT SUPPORTED OPERATION CODES; `ts_sup` tells whether the controller supports Timestamp feature
pub fn report_opcodes(cdb: &[u8], ts_sup: bool, alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 12)?;
	let rctd = cdb[2] & 0x80 != 0;
	let options = cdb[2] & 0x7;
	let req_opcode = cdb[3];
	let req_sa = BigEndian::read_u16(&cdb[4..6]);
	let alloc = BigEndian::read_u32(&cdb[6..10]) as usize;

	if alloc < 4 || alloc > 0xffff {
		return Err(SenseInfo::invalid_field(true, 6, None));
	}

	let resp = match options {
		0 => all_commands(rctd, ts_sup),
		1 ..= 3 => {
			let found = one_command(options, req_opcode, req_sa, ts_sup)?;
			let mut resp = vec![0u8; 4];
			let support = match found {
				Some(op) => {
					BigEndian::write_u16(&mut resp[2..4], op.cdb_len() as u16);
					resp.extend(op.usage());
					Support::Supported
				},
				None => Support::NotSupported,
			};
			resp[1] = if rctd {0x80} else {0} | support as u8;
			if rctd {
				resp.extend_from_slice(&timeouts_descriptor());
			}
			resp
		},
		_ => return Err(SenseInfo::invalid_field(true, 2, Some(2))),
	};

	let len = resp.len().min(alloc).min(alloc_max);
	Ok(resp[.. len].to_vec())
}

/// REPORT SUPPORTED TASK MANAGEMENT FUNCTIONS
pub fn report_tmfs(cdb: &[u8], alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 12)?;
	let repd = cdb[2] & 0x80 != 0;
	let alloc = BigEndian::read_u32(&cdb[6..10]) as usize;
	if alloc < 4 {
		return Err(SenseInfo::invalid_field(true, 6, None));
	}

	let mut resp = vec![0u8; if repd {16} else {4}];
	resp[0] = 0xc8; // ABORT TASK, ABORT TASK SET, LOGICAL UNIT RESET
	resp[1] = 0x01; // I_T NEXUS RESET
	if repd {
		resp[3] = 0x0c; // additional data length
	}

	let len = resp.len().min(alloc).min(alloc_max);
	resp.truncate(len);
	Ok(resp)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rsoc(rctd: bool, options: u8, opcode: u8, sa: u16) -> [u8; 12] {
		let mut cdb = [0u8; 12];
		cdb[0] = 0xa3;
		cdb[1] = 0x0c;
		cdb[2] = if rctd {0x80} else {0} | options;
		cdb[3] = opcode;
		BigEndian::write_u16(&mut cdb[4..6], sa);
		BigEndian::write_u32(&mut cdb[6..10], 4096);
		cdb
	}

	#[test]
	fn all() {
		let resp = report_opcodes(&rsoc(false, 0, 0, 0), false, 4096).unwrap();
		let count = opcodes::iter().count() - 2; // no timestamp
		assert_eq!(BigEndian::read_u32(&resp[0..4]) as usize, count * 8);
		assert_eq!(resp.len(), 4 + count * 8);
		// TEST UNIT READY
		assert_eq!(&resp[4 .. 12], &[0, 0, 0, 0, 0, 0, 0, 6]);

		let ts = report_opcodes(&rsoc(false, 0, 0, 0), true, 4096).unwrap();
		assert_eq!(ts.len(), resp.len() + 16);
		// SET TIMESTAMP is the last one
		assert_eq!(&ts[ts.len() - 8 ..], &[0xa4, 0, 0, 0xf, 0, 1, 0, 12]);
	}

	#[test]
	fn all_with_timeouts() {
		let resp = report_opcodes(&rsoc(true, 0, 0, 0), false, 4096).unwrap();
		let count = opcodes::iter().count() - 2;
		assert_eq!(resp.len(), 4 + count * 20);
		assert_eq!(resp[4 + 5], 0x2);
		assert_eq!(&resp[12 .. 14], &[0, 0xa]);
	}

	#[test]
	fn one() {
		let resp = report_opcodes(&rsoc(false, 1, 0x12, 0), false, 4096).unwrap();
		assert_eq!(resp, vec![0, 3, 0, 6, 0x12, 0xe3, 0xff, 0xff, 0xff, 0xc7]);

		let resp = report_opcodes(&rsoc(false, 2, 0xa3, 0xd), false, 4096).unwrap();
		assert_eq!(&resp[.. 6], &[0, 3, 0, 12, 0xa3, 0xd]);

		let resp = report_opcodes(&rsoc(true, 3, 0x9e, 0x10), false, 4096).unwrap();
		assert_eq!(resp[1], 0x83);
		assert_eq!(resp.len(), 4 + 16 + 12);

		// not supported
		let resp = report_opcodes(&rsoc(false, 1, 0xc0, 0), false, 4096).unwrap();
		assert_eq!(resp, vec![0, 1, 0, 0]);
		let resp = report_opcodes(&rsoc(false, 2, 0xa3, 0xf), false, 4096).unwrap();
		assert_eq!(resp, vec![0, 1, 0, 0]);
		let resp = report_opcodes(&rsoc(false, 3, 0x12, 1), false, 4096).unwrap();
		assert_eq!(resp[1], 1);
	}

	#[test]
	fn invalid() {
		let err = report_opcodes(&rsoc(false, 1, 0xa3, 0xc), false, 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((2, Some(2))));
		let err = report_opcodes(&rsoc(false, 2, 0x12, 0), false, 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((4, None)));
		let err = report_opcodes(&rsoc(false, 5, 0, 0), false, 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((2, Some(2))));

		let mut cdb = rsoc(false, 0, 0, 0);
		BigEndian::write_u32(&mut cdb[6..10], 2);
		let err = report_opcodes(&cdb, false, 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((6, None)));
		BigEndian::write_u32(&mut cdb[6..10], 0x10000);
		assert!(report_opcodes(&cdb, false, 4096).is_err());
	}

	#[test]
	fn tmfs() {
		let mut cdb = [0xa3, 0x0d, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0];
		assert_eq!(report_tmfs(&cdb, 4096).unwrap(), vec![0xc8, 1, 0, 0]);
		cdb[2] = 0x80;
		let resp = report_tmfs(&cdb, 4096).unwrap();
		assert_eq!(resp.len(), 16);
		assert_eq!(resp[3], 0xc);
		cdb[9] = 3;
		assert!(report_tmfs(&cdb, 4096).is_err());
	}

	#[test]
	fn every_row_reports_itself() {
		for op in opcodes::iter().filter(|op| op.supported(true)) {
			let resp = report_opcodes(&rsoc(false, 3, op.opcode, op.sa), true, 4096).unwrap();
			assert_eq!(resp[1] & 0x7, Support::Supported as u8, "{:02x}/{:x}", op.opcode, op.sa);
			assert_eq!(BigEndian::read_u16(&resp[2..4]) as usize, op.cdb_len());
			assert_eq!(resp[4 ..], op.usage()[..]);
		}
	}
}
