//! MODE SENSE(10) and MODE SELECT(10)

use byteorder::{ByteOrder, BigEndian};

use crate::scsi::{self, PDT_DISK, PDT_ZBC, ASC_PARAMETER_LIST_LENGTH_ERR, ASC_SAVING_PARAMS_UNSUP};
use crate::scsi::data::sense::SenseKey;
use super::{DeviceState, SenseInfo};

/// Largest MODE SENSE response the translation layer builds
pub const MAX_MODE_SENSE_LEN: usize = 256;
/// Largest MODE SELECT parameter list accepted
pub const MAX_MODE_SELECT_LEN: usize = 512;

// block descriptors describe an imaginary medium
const NUM_BLOCKS: u32 = 0x10_0000;
const BLOCK_SIZE: u32 = 512;

pub const DISCONNECT: [u8; 16] = [0x2, 0xe, 128, 128, 0, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

pub const CACHING: [u8; 20] = [0x8, 18, 0x14, 0, 0xff, 0xff, 0, 0, 0xff, 0xff, 0xff, 0xff, 0x80, 0x14, 0, 0, 0, 0, 0, 0];
const CACHING_CHANGEABLE: [u8; 20] = [0x8, 18, 0x4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
pub const WCE: u8 = 0x4;

pub const CONTROL: [u8; 12] = [0xa, 10, 2, 0, 0, 0, 0, 0, 0, 0, 0x2, 0x4b];
const CONTROL_CHANGEABLE: [u8; 12] = [0xa, 10, 0x6, 0, 0, 0, 0, 0, 0, 0, 0, 0];
pub const D_SENSE: u8 = 0x4;

pub const CONTROL_EXT: [u8; 32] = [
	0x4a, 0x1, 0, 0x1c, 0, 0, 0x40, 0,
	0, 0, 0, 0, 0, 0, 0, 0,
	0, 0, 0, 0, 0, 0, 0, 0,
	0, 0, 0, 0, 0, 0, 0, 0,
];

pub const IEC: [u8; 12] = [0x1c, 0xa, 0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0];
const IEC_CHANGEABLE: [u8; 12] = [0x1c, 0xa, 0x4, 0xf, 0, 0, 0, 0, 0, 0, 0, 0];

/// Vendor specific Unit Attention page; byte 2 is the enclosure override
pub const VENDOR_UA: [u8; 16] = [0x0, 0xe, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
const VENDOR_UA_CHANGEABLE: [u8; 16] = [0x0, 0xe, 0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq)]
enum PageControl { Current, Changeable, Default }

fn select(pc: PageControl, current: &[u8], changeable: &[u8], default: &[u8]) -> Vec<u8> {
	match pc {
		PageControl::Current => current.to_vec(),
		PageControl::Changeable => changeable.to_vec(),
		PageControl::Default => default.to_vec(),
	}
}

/// Page without changeable fields: its changeable mask is all zeros past the `header` bytes
fn fixed(pc: PageControl, page: &[u8], header: usize) -> Vec<u8> {
	let mut p = page.to_vec();
	if pc == PageControl::Changeable {
		for b in p[header ..].iter_mut() { *b = 0; }
	}
	p
}

fn disconnect(pc: PageControl) -> Vec<u8> { fixed(pc, &DISCONNECT, 2) }

fn caching(pc: PageControl, state: &DeviceState) -> Vec<u8> {
	let mut current = state.caching;
	if state.wce { current[2] |= WCE; } else { current[2] &= !WCE; }
	select(pc, &current, &CACHING_CHANGEABLE, &CACHING)
}

fn control(pc: PageControl, state: &DeviceState) -> Vec<u8> {
	let mut current = state.control;
	if state.dsense { current[2] |= D_SENSE; } else { current[2] &= !D_SENSE; }
	select(pc, &current, &CONTROL_CHANGEABLE, &CONTROL)
}

fn control_ext(pc: PageControl) -> Vec<u8> { fixed(pc, &CONTROL_EXT, 4) }

fn iec(pc: PageControl, state: &DeviceState) -> Vec<u8> {
	select(pc, &state.iec, &IEC_CHANGEABLE, &IEC)
}

fn vendor_ua(pc: PageControl, state: &DeviceState) -> Vec<u8> {
	let mut current = state.vendor_ua;
	current[2] = state.enclosure_override;
	select(pc, &current, &VENDOR_UA_CHANGEABLE, &VENDOR_UA)
}

/// Builds MODE SENSE(10) response; returns data truncated to the allocation length and to `alloc_max`
pub fn sense_10(state: &DeviceState, cdb: &[u8], alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 10)?;
	let dbd = cdb[1] & 0x08 != 0;
	let llbaa = cdb[1] & 0x10 != 0;
	let pc = match cdb[2] >> 6 {
		0 => PageControl::Current,
		1 => PageControl::Changeable,
		2 => PageControl::Default,
		_ => return Err(SenseInfo::new(SenseKey::IllegalRequest, ASC_SAVING_PARAMS_UNSUP, 0)),
	};
	let page = cdb[2] & 0x3f;
	let subpage = cdb[3];
	let alloc = BigEndian::read_u16(&cdb[7..9]) as usize;

	let pdt = scsi::decay_pdt(state.pdt);
	let is_disk = pdt == PDT_DISK || pdt == PDT_ZBC;
	let bd_len = match (is_disk && !dbd, llbaa) {
		(false, _) => 0,
		(true, false) => 8,
		(true, true) => 16,
	};

	let mut resp = vec![0u8; 8];
	if is_disk {
		resp[3] = 0x10; // DPOFUA
	}
	if bd_len == 16 {
		resp[4] = 0x1; // LONGLBA
	}
	resp[7] = bd_len as u8;

	match bd_len {
		8 => {
			let mut bd = [0u8; 8];
			BigEndian::write_u32(&mut bd[0..4], NUM_BLOCKS);
			BigEndian::write_u16(&mut bd[6..8], BLOCK_SIZE as u16);
			resp.extend_from_slice(&bd);
		},
		16 => {
			let mut bd = [0u8; 16];
			BigEndian::write_u64(&mut bd[0..8], u64::from(NUM_BLOCKS));
			BigEndian::write_u32(&mut bd[12..16], BLOCK_SIZE);
			resp.extend_from_slice(&bd);
		},
		_ => (),
	}

	match (page, subpage) {
		(0x02, 0) => resp.extend(disconnect(pc)),
		(0x08, 0) if is_disk => resp.extend(caching(pc, state)),
		(0x0a, 0) => resp.extend(control(pc, state)),
		(0x0a, 1) => resp.extend(control_ext(pc)),
		(0x1c, 0) => resp.extend(iec(pc, state)),
		(0x3f, 0) | (0x3f, 0xff) => {
			resp.extend(disconnect(pc));
			if is_disk {
				resp.extend(caching(pc, state));
			}
			resp.extend(control(pc, state));
			if subpage == 0xff {
				resp.extend(control_ext(pc));
			}
			resp.extend(iec(pc, state));
			resp.extend(vendor_ua(pc, state));
		},
		(0x3f, _) => return Err(SenseInfo::invalid_field(true, 3, None)),
		(0x00, _) => resp.extend(vendor_ua(pc, state)),
		_ => return Err(SenseInfo::invalid_field(true, 2, Some(5))),
	}

	let mode_data_len = resp.len() - 2;
	BigEndian::write_u16(&mut resp[0..2], mode_data_len as u16);

	resp.truncate(alloc.min(alloc_max).min(MAX_MODE_SENSE_LEN));
	Ok(resp)
}

/// Applies MODE SELECT(10) parameter list `dout` to `state`; returns the number of parameter bytes used
pub fn select_10(state: &mut DeviceState, cdb: &[u8], dout: &[u8]) -> Result<usize, SenseInfo> {
	SenseInfo::check_cdb_len(cdb, 10)?;
	let pf = cdb[1] & 0x10 != 0;
	let sp = cdb[1] & 0x01 != 0;
	let param_len = BigEndian::read_u16(&cdb[7..9]) as usize;

	if sp {
		return Err(SenseInfo::invalid_field(true, 1, Some(0)));
	}
	if !pf {
		return Err(SenseInfo::invalid_field(true, 1, Some(4)));
	}
	if param_len > MAX_MODE_SELECT_LEN {
		return Err(SenseInfo::invalid_field(true, 7, None));
	}

	let rlen = dout.len().min(param_len);
	let mut arr = [0u8; MAX_MODE_SELECT_LEN];
	arr[.. rlen].copy_from_slice(&dout[.. rlen]);

	// mode data length is reserved for MODE SELECT
	let md_len = BigEndian::read_u16(&arr[0..2]) as usize + 2;
	if md_len > 2 {
		return Err(SenseInfo::invalid_field(false, 0, None));
	}

	let bd_len = BigEndian::read_u16(&arr[6..8]) as usize;
	let off = bd_len + 8;
	let list_len_err = || SenseInfo::new(SenseKey::IllegalRequest, ASC_PARAMETER_LIST_LENGTH_ERR, 0);
	if off + 4 > param_len {
		return Err(list_len_err());
	}

	let page = arr[off] & 0x3f;
	if arr[off] & 0x80 != 0 {
		// PS
		return Err(SenseInfo::invalid_field(false, off as u16, Some(7)));
	}
	let spf = arr[off] & 0x40 != 0;
	let (pg_len, subpage) = if spf {
		(BigEndian::read_u16(&arr[off + 2 .. off + 4]) as usize + 4, arr[off + 1])
	} else {
		(arr[off + 1] as usize + 2, 0)
	};
	if pg_len + off > param_len {
		return Err(list_len_err());
	}
	let pg = &arr[off .. off + pg_len];

	match (page, subpage) {
		(0x08, 0) if pg[1] == CACHING[1] => {
			state.caching[2 ..].copy_from_slice(&pg[2 .. CACHING.len()]);
			state.wce = state.caching[2] & WCE != 0;
			state.wce_changed = true;
			debug!("MODE SELECT: WCE={}", state.wce);
		},
		(0x0a, 0) if pg[1] == CONTROL[1] => {
			state.control[2 ..].copy_from_slice(&pg[2 .. CONTROL.len()]);
			state.dsense = state.control[2] & D_SENSE != 0;
			debug!("MODE SELECT: D_SENSE={}", state.dsense);
		},
		(0x1c, 0) if pg[1] == IEC[1] => {
			state.iec[2 ..].copy_from_slice(&pg[2 .. IEC.len()]);
		},
		(0x00, _) => {
			if pg[1] == VENDOR_UA[1] && pg.len() >= VENDOR_UA.len() {
				state.vendor_ua[2 ..].copy_from_slice(&pg[2 .. VENDOR_UA.len()]);
				state.enclosure_override = state.vendor_ua[2];
				debug!("MODE SELECT: enclosure override {:#x}", state.enclosure_override);
			}
		},
		_ => return Err(SenseInfo::invalid_field(false, off as u16, Some(5))),
	}

	Ok(rlen)
}
