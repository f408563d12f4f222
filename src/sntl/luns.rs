//! REPORT LUNS: every NVMe namespace is reported as a logical unit

use byteorder::{ByteOrder, BigEndian};

use super::SenseInfo;

/// Largest REPORT LUNS response; longer LUN lists are cut, although the LUN list length still tells the whole count
pub const MAX_LEN: usize = 256;

/// `nn` is the number of namespaces of the controller, `nsid` is the namespace this translation layer is attached to
pub fn report(cdb: &[u8], nn: u32, nsid: u32, alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 12)?;
	let select_report = cdb[2];
	let alloc = BigEndian::read_u32(&cdb[6..10]) as usize;

	let num = match select_report {
		0 | 2 => nn,
		// well known and administrative LUNs
		1 | 0x10 | 0x12 => 0,
		0x11 => if nsid == 1 { nn } else { 0 },
		x => {
			debug!("REPORT LUNS: bad SELECT REPORT value {:#x}", x);
			return Err(SenseInfo::invalid_field(true, 2, Some(7)));
		},
	};

	let list_len = u64::from(num) * 8;
	let len = (list_len + 8).min(MAX_LEN as u64) as usize;
	let mut resp = vec![0u8; len];
	BigEndian::write_u32(&mut resp[0..4], list_len as u32);
	for (k, lun) in resp[8 ..].chunks_mut(8).enumerate() {
		BigEndian::write_u16(&mut lun[0..2], k as u16);
	}

	resp.truncate(alloc.min(alloc_max));
	Ok(resp)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cdb(select: u8) -> [u8; 12] {
		[0xa0, 0, select, 0, 0, 0, 0, 0, 0x10, 0, 0, 0]
	}

	#[test]
	fn namespaces() {
		let resp = report(&cdb(0), 3, 1, 4096).unwrap();
		assert_eq!(resp.len(), 32);
		assert_eq!(&resp[0..4], &[0, 0, 0, 24]);
		assert_eq!(&resp[8..16], &[0; 8]);
		assert_eq!(&resp[16..18], &[0, 1]);
		assert_eq!(&resp[24..26], &[0, 2]);
	}

	#[test]
	fn selects() {
		assert_eq!(report(&cdb(0x10), 3, 1, 4096).unwrap(), vec![0; 8]);
		assert_eq!(report(&cdb(0x11), 3, 1, 4096).unwrap().len(), 32);
		assert_eq!(report(&cdb(0x11), 3, 2, 4096).unwrap().len(), 8);
		let err = report(&cdb(0x13), 3, 1, 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((2, Some(7))));
	}

	#[test]
	fn zero_allocation_length() {
		let mut cdb = cdb(0);
		cdb[8] = 0;
		assert_eq!(report(&cdb, 3, 1, 4096).unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn many_namespaces() {
		let resp = report(&cdb(2), 1024, 1, 4096).unwrap();
		assert_eq!(resp.len(), MAX_LEN);
		assert_eq!(BigEndian::read_u32(&resp[0..4]), 1024 * 8);
		assert_eq!(BigEndian::read_u16(&resp[248..250]), 30);
	}
}
