//! Standard INQUIRY data and VPD pages of an NVMe device

use byteorder::{ByteOrder, BigEndian};

use crate::nvme::{IdentifyController, IDENTIFY_LEN};
use crate::scsi::{PDT_SES, PDT_UNKNOWN};
use super::{devid, DeviceState, SenseInfo};

pub const STD_INQ_LEN: usize = 74;

/// Vendor specific VPD page with Identify Controller data appended
pub const VPD_NICR: u8 = 0xde;

/// VPD pages the translation layer responds to, in ascending order
pub const SUPPORTED_VPD: &[u8] = &[0x00, 0x80, 0x83, 0x86, 0x87, 0x92, 0xb1, VPD_NICR];

const VENDOR: &[u8; 8] = b"NVMe    ";

// SAM-6, SPC-5, SNT
const VERSION_DESCRIPTORS: &[u16] = &[0x00c2, 0x05c2, 0x1f60];
const SBC4: u16 = 0x0602;
const SES4: u16 = 0x0682;

/// Last `n` characters of `s` that precede trailing blanks (and anything after the first NUL), padded with spaces if there are not enough
fn last_non_blank(s: &[u8], n: usize) -> Vec<u8> {
	let s = match s.iter().position(|&b| b == 0) {
		Some(nul) => &s[.. nul],
		None => s,
	};
	let end = s.iter().rposition(|&b| b != b' ').map(|i| i + 1).unwrap_or(0);
	let start = end.saturating_sub(n);
	let mut out = s[start .. end].to_vec();
	out.resize(n, b' ');
	out
}

pub fn standard(ctl: &IdentifyController, pdt: u8, enc_serv: bool) -> Vec<u8> {
	let mut inq = vec![0u8; STD_INQ_LEN];
	inq[0] = pdt & 0x1f;
	inq[2] = 7; // SPC-5
	inq[3] = 2; // response data format
	inq[4] = (STD_INQ_LEN - 5) as u8;
	if enc_serv {
		inq[6] |= 0x40;
	}
	// controller is attached to more than one port
	if ctl.cmic() & 0x1 != 0 {
		inq[6] |= 0x10; // MULTIP
	}
	inq[7] = 0x2; // CMDQUE
	inq[8 .. 16].copy_from_slice(VENDOR);
	inq[16 .. 32].copy_from_slice(&ctl.model_number()[.. 16]);
	inq[32 .. 36].copy_from_slice(&last_non_blank(ctl.firmware_revision(), 4));

	let last = match pdt {
		PDT_SES => Some(SES4),
		PDT_UNKNOWN => None,
		_ => Some(SBC4),
	};
	for (i, vd) in VERSION_DESCRIPTORS.iter().cloned().chain(last).enumerate() {
		BigEndian::write_u16(&mut inq[58 + 2*i .. 60 + 2*i], vd);
	}
	inq
}

fn page(pdt: u8, code: u8, len: usize) -> Vec<u8> {
	let mut p = vec![0u8; len];
	p[0] = pdt & 0x1f;
	p[1] = code;
	BigEndian::write_u16(&mut p[2..4], (len - 4) as u16);
	p
}

pub fn vpd(ctl: &IdentifyController, ns: Option<&[u8]>, state: &DeviceState, code: u8) -> Result<Vec<u8>, SenseInfo> {
	let pdt = state.pdt;
	let p = match code {
		0x00 => {
			let mut p = page(pdt, code, 4 + SUPPORTED_VPD.len());
			p[4 ..].copy_from_slice(SUPPORTED_VPD);
			p
		},
		0x80 => {
			let mut p = page(pdt, code, 24);
			p[4 ..].copy_from_slice(ctl.serial_number());
			p
		},
		0x83 => {
			let mut p = vec![0u8; 256];
			let n = devid::make_vpd_devid_for_nvme(ctl.raw(), ns, pdt, None, &mut p);
			p.truncate(n);
			if n > 3 {
				BigEndian::write_u16(&mut p[2..4], (n - 4) as u16);
			}
			p
		},
		// Extended INQUIRY Data
		0x86 => {
			let mut p = page(pdt, code, 64);
			p[5] = 0x1; // SIMPSUP
			p[7] = 0x1; // LUICLR
			p[13] = 0x40; // maximum supported sense data length
			p
		},
		// Mode Page Policy
		0x87 => {
			let mut p = page(pdt, code, 8);
			p[4] = 0x3f; // all pages
			p[5] = 0xff; // and subpages
			p[6] = 0x80; // MLUS, shared
			p
		},
		// SCSI Feature Sets
		0x92 => {
			let mut p = page(pdt, code, 10);
			p[9] = 0x1; // SPC Discovery 2016
			p
		},
		// Block Device Characteristics
		0xb1 => {
			let mut p = page(pdt, code, 64);
			p[5] = 0x1; // non-rotating medium
			p
		},
		VPD_NICR => {
			let mut p = page(pdt, code, 64);
			BigEndian::write_u16(&mut p[2..4], (64 + IDENTIFY_LEN - 4) as u16);
			p[8 .. 16].copy_from_slice(b"SG3_UTIL");
			p[16 .. 32].copy_from_slice(b"SNT in sg3_utils");
			p[32 .. 36].copy_from_slice(b"0100");
			p.extend_from_slice(&ctl.raw()[.. IDENTIFY_LEN]);
			p
		},
		_ => return Err(SenseInfo::invalid_field(true, 2, Some(7))),
	};
	Ok(p)
}

/// Responds to the INQUIRY command in `cdb`
pub fn respond(ctl: &IdentifyController, ns: Option<&[u8]>, state: &DeviceState, cdb: &[u8], alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 6)?;
	// CmdDt is obsolete
	if cdb[1] & 0x2 != 0 {
		return Err(SenseInfo::invalid_field(true, 1, Some(1)));
	}
	let alloc = BigEndian::read_u16(&cdb[3..5]) as usize;
	let evpd = cdb[1] & 0x1 != 0;

	let mut resp = if evpd {
		vpd(ctl, ns, state, cdb[2])?
	} else {
		standard(ctl, state.pdt, state.enc_serv)
	};

	resp.truncate(alloc.min(alloc_max));
	Ok(resp)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctl() -> Vec<u8> {
		let mut ctl = vec![0u8; IDENTIFY_LEN];
		ctl[4 .. 24].copy_from_slice(b"S3EVNX0K123456      ");
		ctl[24 .. 64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");
		ctl[64 .. 72].copy_from_slice(b"2B2QEXE7");
		ctl[76] = 0x1;
		ctl
	}

	#[test]
	fn revision() {
		assert_eq!(last_non_blank(b"2B2QEXE7", 4), b"EXE7");
		assert_eq!(last_non_blank(b"1.0     ", 4), b"1.0 ");
		assert_eq!(last_non_blank(b"AB12CD  ", 4), b"12CD");
		assert_eq!(last_non_blank(b"ABCDE\0FG", 4), b"BCDE");
	}

	#[test]
	fn standard_disk() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let inq = standard(&ctl, 0, false);
		assert_eq!(inq.len(), 74);
		assert_eq!(&inq[.. 8], &[0, 0, 7, 2, 69, 0, 0x10, 2]);
		assert_eq!(&inq[8 .. 16], b"NVMe    ");
		assert_eq!(&inq[16 .. 32], b"Samsung SSD 970 ");
		assert_eq!(&inq[32 .. 36], b"EXE7");
		assert_eq!(&inq[58 .. 68], &[0x00, 0xc2, 0x05, 0xc2, 0x1f, 0x60, 0x06, 0x02, 0, 0]);
	}

	#[test]
	fn standard_other_pdts() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let inq = standard(&ctl, PDT_SES, true);
		assert_eq!(inq[0], 0xd);
		assert_eq!(inq[6], 0x50);
		assert_eq!(&inq[64 .. 66], &[0x06, 0x82]);

		let inq = standard(&ctl, PDT_UNKNOWN, false);
		assert_eq!(&inq[64 .. 66], &[0, 0]);
	}

	#[test]
	fn cmddt_and_unknown_page() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let state = DeviceState::new(0, false);

		let err = respond(&ctl, None, &state, &[0x12, 0x2, 0, 0, 0xff, 0], 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((1, Some(1))));
		let err = respond(&ctl, None, &state, &[0x12, 0x1, 0xb0, 0, 0xff, 0], 4096).unwrap_err();
		assert_eq!(err.field.map(|f| (f.byte, f.bit)), Some((2, Some(7))));
	}

	#[test]
	fn allocation_length() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let state = DeviceState::new(0, false);

		assert_eq!(respond(&ctl, None, &state, &[0x12, 0, 0, 0, 36, 0], 4096).unwrap().len(), 36);
		assert_eq!(respond(&ctl, None, &state, &[0x12, 0, 0, 0, 0, 0], 4096).unwrap(), Vec::<u8>::new());
		assert_eq!(respond(&ctl, None, &state, &[0x12, 1, 0x83, 0, 0, 0], 4096).unwrap(), Vec::<u8>::new());
		assert_eq!(respond(&ctl, None, &state, &[0x12, 0, 0, 0, 0xff, 0], 16).unwrap().len(), 16);
	}

	#[test]
	fn pages() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let state = DeviceState::new(0, false);

		let p = vpd(&ctl, None, &state, 0).unwrap();
		assert_eq!(p, vec![0, 0, 0, 8, 0x00, 0x80, 0x83, 0x86, 0x87, 0x92, 0xb1, 0xde]);

		let p = vpd(&ctl, None, &state, 0x80).unwrap();
		assert_eq!(p.len(), 24);
		assert_eq!(&p[4 ..], b"S3EVNX0K123456      ");

		let p = vpd(&ctl, None, &state, 0x83).unwrap();
		assert_eq!(BigEndian::read_u16(&p[2..4]) as usize, p.len() - 4);

		let p = vpd(&ctl, None, &state, 0xb1).unwrap();
		assert_eq!(&p[.. 6], &[0, 0xb1, 0, 60, 0, 1]);

		let p = vpd(&ctl, None, &state, VPD_NICR).unwrap();
		assert_eq!(p.len(), 64 + 4096);
		assert_eq!(BigEndian::read_u16(&p[2..4]), 4156);
		assert_eq!(&p[64 + 24 .. 64 + 40], b"Samsung SSD 970 ");
	}
}
