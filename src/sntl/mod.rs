/*!
SCSI to NVMe translation layer (SNTL): responds to SCSI commands on behalf of an NVMe device.

[`Sntl`](struct.Sntl.html) is built of Identify Controller data (and, optionally, of Identify Namespace data of the namespace it represents). It answers commands that are fully defined by that data, and keeps mode page state (WCE, D_SENSE, …) that MODE SELECT changes.

## Example

```
use inq::sntl::Sntl;
use inq::scsi::data::sense::SenseKey;

let mut ctl = vec![0u8; 4096];
ctl[24..64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");

let mut sntl = Sntl::new(&ctl, None, 0);

let inq = sntl.execute(&[0x12, 0, 0, 0, 0xff, 0], &[], 4096).unwrap();
assert_eq!(&inq[8..32], b"NVMe    Samsung SSD 970 ");

// READ(10) needs media access, which is up to the NVMe device itself
let err = sntl.execute(&[0x28, 0, 0, 0, 0, 0, 0, 0, 1, 0], &[], 512).unwrap_err();
assert_eq!(err.key, SenseKey::IllegalRequest);
assert_eq!(err.asc, 0x20);
```
*/

pub mod opcodes;
pub mod devid;
pub mod inquiry;
pub mod mode;
pub mod maintenance;
pub mod luns;

use std::fmt;
use std::io;

use crate::Direction;
use crate::nvme::{IdentifyController, IDENTIFY_LEN};
use crate::scsi::{ScsiDevice, SAM_STAT_CHECK_CONDITION, ASC_INVALID_COMMAND_OPCODE, ASC_INVALID_FIELD_IN_CDB, ASC_INVALID_FIELD_IN_PARAM_LIST};
use crate::scsi::data::sense::{self, FieldPointer, SenseKey};

/// Location of a field ILLEGAL REQUEST sense complains about
pub type InvalidField = FieldPointer;

// LOGICAL UNIT FAILURE / INTERNAL TARGET FAILURE
const ASC_INTERNAL_TARGET_FAILURE: u8 = 0x44;

/// Outcome of a command that did not complete with GOOD status
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub struct SenseInfo {
	/// SAM status; always CHECK CONDITION for now
	pub status: u8,
	pub key: SenseKey,
	pub asc: u8,
	pub ascq: u8,
	pub field: Option<InvalidField>,
}

impl SenseInfo {
	pub fn new(key: SenseKey, asc: u8, ascq: u8) -> Self {
		SenseInfo {
			status: SAM_STAT_CHECK_CONDITION,
			key, asc, ascq,
			field: None,
		}
	}

	/// ILLEGAL REQUEST, INVALID FIELD IN CDB (`in_cdb`) or INVALID FIELD IN PARAMETER LIST, with a pointer to the offending field
	pub fn invalid_field(in_cdb: bool, byte: u16, bit: Option<u8>) -> Self {
		let asc = if in_cdb { ASC_INVALID_FIELD_IN_CDB } else { ASC_INVALID_FIELD_IN_PARAM_LIST };
		SenseInfo {
			field: Some(InvalidField { in_cdb, byte, bit }),
			..SenseInfo::new(SenseKey::IllegalRequest, asc, 0)
		}
	}

	pub fn invalid_opcode() -> Self {
		SenseInfo::new(SenseKey::IllegalRequest, ASC_INVALID_COMMAND_OPCODE, 0)
	}

	/// Fails with a pointer to the opcode byte if `cdb` is shorter than `len`
	pub fn check_cdb_len(cdb: &[u8], len: usize) -> Result<(), SenseInfo> {
		if cdb.len() < len {
			debug!("{}-byte CDB is too short, need {}", cdb.len(), len);
			return Err(SenseInfo::invalid_field(true, 0, None));
		}
		Ok(())
	}

	/// Encodes sense data: descriptor format (72h) if `descriptor` is set, fixed format (70h) otherwise
	pub fn to_sense(&self, descriptor: bool) -> Vec<u8> {
		let sks = self.field.map(|f| f.encode());
		if descriptor {
			sense::descriptor::build(self.key as u8, self.asc, self.ascq, sks)
		} else {
			sense::fixed::build(self.key as u8, self.asc, self.ascq, sks)
		}
	}
}

impl fmt::Display for SenseInfo {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let what = match self.asc {
			0x1a => "parameter list length error",
			0x20 => "invalid command operation code",
			0x24 => "invalid field in CDB",
			0x26 => "invalid field in parameter list",
			0x39 => "saving parameters not supported",
			0x44 => "internal target failure",
			_ => "",
		};
		write!(f, "{}", self.key)?;
		if what.is_empty() {
			write!(f, ", asc {:#04x}, ascq {:#04x}", self.asc, self.ascq)?;
		} else {
			write!(f, ", {}", what)?;
		}
		if let Some(field) = self.field {
			write!(f, " ({} byte {}", if field.in_cdb { "CDB" } else { "parameter list" }, field.byte)?;
			if let Some(bit) = field.bit {
				write!(f, ", bit {}", bit)?;
			}
			write!(f, ")")?;
		}
		Ok(())
	}
}

/// Mode page values and other state that outlives a single command
#[derive(Debug, Clone)]
pub struct DeviceState {
	/// Write cache enabled (Caching mode page)
	pub wce: bool,
	/// Whether WCE was ever changed with MODE SELECT
	pub wce_changed: bool,
	/// Return descriptor format sense data (Control mode page)
	pub dsense: bool,
	pub enclosure_override: u8,
	/// Peripheral device type to report
	pub pdt: u8,
	/// Set ENCSERV bit in the standard INQUIRY data
	pub enc_serv: bool,
	pub caching: [u8; 20],
	pub control: [u8; 12],
	pub iec: [u8; 12],
	pub vendor_ua: [u8; 16],
}

impl DeviceState {
	pub fn new(pdt: u8, enc_serv: bool) -> Self {
		DeviceState {
			wce: mode::CACHING[2] & mode::WCE != 0,
			wce_changed: false,
			dsense: mode::CONTROL[2] & mode::D_SENSE != 0,
			enclosure_override: mode::VENDOR_UA[2],
			pdt,
			enc_serv,
			caching: mode::CACHING,
			control: mode::CONTROL,
			iec: mode::IEC,
			vendor_ua: mode::VENDOR_UA,
		}
	}
}

/// The translation layer for one NVMe namespace
#[derive(Debug)]
pub struct Sntl {
	ctl: Vec<u8>,
	ns: Option<Vec<u8>>,
	nsid: u32,
	state: DeviceState,
}

fn identify_copy(data: &[u8]) -> Vec<u8> {
	let mut copy = data[.. data.len().min(IDENTIFY_LEN)].to_vec();
	copy.resize(IDENTIFY_LEN, 0);
	copy
}

impl Sntl {
	/**
	Makes a translation layer for namespace 1; `pdt` is the peripheral device type to report (0 for a disk, 0xd for an enclosure).

	Identify data shorter than 4096 bytes is zero-padded.
	*/
	pub fn new(ctl: &[u8], ns: Option<&[u8]>, pdt: u8) -> Self {
		if ctl.len() < IDENTIFY_LEN {
			warn!("Identify Controller data is {} bytes long, padding with zeros", ctl.len());
		}
		Sntl {
			ctl: identify_copy(ctl),
			ns: ns.map(identify_copy),
			nsid: 1,
			state: DeviceState::new(pdt, pdt == crate::scsi::PDT_SES),
		}
	}

	/// Sets namespace id reported LUNs depend on
	pub fn with_nsid(mut self, nsid: u32) -> Self {
		self.nsid = nsid;
		self
	}

	pub fn state(&self) -> &DeviceState { &self.state }
	pub fn state_mut(&mut self) -> &mut DeviceState { &mut self.state }

	/**
	Executes `cdb`; `dout` is the data-out buffer (MODE SELECT parameter list), `alloc_max` is the size of the caller's data-in buffer.

	Returns data-in on success (possibly empty), or sense information describing why the command failed.
	*/
	pub fn execute(&mut self, cdb: &[u8], dout: &[u8], alloc_max: usize) -> Result<Vec<u8>, SenseInfo> {
		let opcode = match cdb.first() {
			Some(&op) => op,
			None => return Err(SenseInfo::invalid_opcode()),
		};
		let ctl = IdentifyController::new(&self.ctl).map_err(|err| {
			error!("{}", err);
			SenseInfo::new(SenseKey::HardwareError, ASC_INTERNAL_TARGET_FAILURE, 0)
		})?;
		let ts_sup = ctl.has_timestamp();

		let sa = opcodes::cdb_sa(cdb);
		let info = match opcodes::find(opcode, sa) {
			Some(info) if info.supported(ts_sup) => info,
			Some(_) | None => {
				debug!("unsupported command {:02x}/{:x}", opcode, sa);
				if opcodes::iter().any(|op| op.opcode == opcode && op.has_sa() && op.supported(ts_sup)) {
					// known opcode, unknown service action
					return Err(SenseInfo::invalid_field(true, 1, Some(4)));
				}
				return Err(SenseInfo::invalid_opcode());
			},
		};
		SenseInfo::check_cdb_len(cdb, info.cdb_len())?;

		let ns = self.ns.as_ref().map(|ns| ns.as_slice());
		match (opcode, sa) {
			// TEST UNIT READY
			(0x00, _) => Ok(vec![]),
			// REQUEST SENSE: nothing is pending
			(0x03, _) => {
				let desc = cdb[1] & 0x1 != 0;
				let mut resp = SenseInfo::new(SenseKey::NoSense, 0, 0).to_sense(desc);
				resp.truncate((cdb[4] as usize).min(alloc_max));
				Ok(resp)
			},
			(0x12, _) => inquiry::respond(&ctl, ns, &self.state, cdb, alloc_max),
			(0x55, _) => {
				let n = mode::select_10(&mut self.state, cdb, dout)?;
				debug!("MODE SELECT(10): {} parameter bytes", n);
				Ok(vec![])
			},
			(0x5a, _) => mode::sense_10(&self.state, cdb, alloc_max),
			(0xa0, _) => luns::report(cdb, ctl.nn(), self.nsid, alloc_max),
			(0xa3, maintenance::SA_REPORT_OPCODES) => maintenance::report_opcodes(cdb, ts_sup, alloc_max),
			(0xa3, maintenance::SA_REPORT_TMFS) => maintenance::report_tmfs(cdb, alloc_max),
			_ => {
				// media access, diagnostics, timestamps are passed to the device as NVMe commands
				debug!("{:02x}/{:x} needs the device", opcode, sa);
				Err(SenseInfo::invalid_opcode())
			},
		}
	}
}

impl ScsiDevice for Sntl {
	/// Sense data format follows D_SENSE bit of the Control mode page
	fn do_cmd(&mut self, cmd: &[u8], _dir: Direction, data_out: &[u8], data_len: usize) -> Result<(Vec<u8>, Vec<u8>), io::Error> {
		match self.execute(cmd, data_out, data_len) {
			Ok(data) => Ok((vec![], data)),
			Err(info) => {
				info!("{:02x?}: {}", cmd, info);
				Ok((info.to_sense(self.state.dsense), vec![]))
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scsi::data::sense::FieldPointer;

	fn ctl() -> Vec<u8> {
		let mut ctl = vec![0u8; IDENTIFY_LEN];
		ctl[4 .. 24].copy_from_slice(b"S3EVNX0K123456      ");
		ctl[24 .. 64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");
		ctl[516] = 2;
		ctl
	}

	#[test]
	fn sense_encoding() {
		let info = SenseInfo::invalid_field(true, 2, Some(7));
		let fixed = info.to_sense(false);
		assert_eq!(fixed[0], 0x70);
		assert_eq!(fixed[2], 5);
		assert_eq!(fixed[12], 0x24);
		assert_eq!(&fixed[15..18], &[0xcf, 0, 2]);

		let desc = info.to_sense(true);
		assert_eq!(desc[0], 0x72);
		let (_, parsed) = sense::parse(&desc).unwrap();
		assert_eq!(parsed.kcq(), (5, 0x24, 0));
		assert_eq!(parsed.sks().and_then(FieldPointer::decode), info.field);
	}

	#[test]
	fn display() {
		let info = SenseInfo::invalid_field(false, 8, Some(5));
		assert_eq!(info.to_string(), "Illegal Request, invalid field in parameter list (parameter list byte 8, bit 5)");
		assert_eq!(SenseInfo::new(SenseKey::NotReady, 4, 1).to_string(), "Not Ready, asc 0x04, ascq 0x01");
	}

	#[test]
	fn dispatch() {
		let mut sntl = Sntl::new(&ctl(), None, 0);
		assert_eq!(sntl.execute(&[0, 0, 0, 0, 0, 0], &[], 0), Ok(vec![]));
		assert_eq!(sntl.execute(&[0xa3, 0x0d, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0], &[], 4096), Ok(vec![0xc8, 1, 0, 0]));

		let luns = sntl.execute(&[0xa0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0], &[], 4096).unwrap();
		assert_eq!(luns.len(), 24);

		assert_eq!(sntl.execute(&[], &[], 0), Err(SenseInfo::invalid_opcode()));
		assert_eq!(sntl.execute(&[0xc0, 0, 0, 0, 0, 0], &[], 0), Err(SenseInfo::invalid_opcode()));
		// timestamp is not supported by this controller
		assert_eq!(sntl.execute(&[0xa3, 0x0f, 0, 0, 0, 0, 0, 0, 0, 12, 0, 0], &[], 4096).unwrap_err().asc, 0x24);
		assert_eq!(sntl.execute(&[0x12, 0, 0], &[], 4096).unwrap_err().field.map(|f| f.byte), Some(0));
	}

	#[test]
	fn sense_format_follows_d_sense() {
		let mut sntl = Sntl::new(&ctl(), None, 0);
		let (sense, _) = sntl.do_cmd(&[0xc0, 0, 0, 0, 0, 0], Direction::None, &[], 0).unwrap();
		assert_eq!(sense[0], 0x70);

		let mut param = vec![0u8; 8];
		param.extend_from_slice(&mode::CONTROL);
		param[10] |= mode::D_SENSE;
		let (sense, _) = sntl.mode_select_10(true, false, &param).unwrap();
		assert!(sense.is_empty());
		assert!(sntl.state().dsense);

		let (sense, _) = sntl.do_cmd(&[0xc0, 0, 0, 0, 0, 0], Direction::None, &[], 0).unwrap();
		assert_eq!(sense[0], 0x72);

		let resp = sntl.execute(&[0x03, 0, 0, 0, 0xff, 0], &[], 4096).unwrap();
		assert_eq!(resp[0], 0x70);
		let resp = sntl.execute(&[0x03, 1, 0, 0, 0xff, 0], &[], 4096).unwrap();
		assert_eq!(resp[0], 0x72);
	}

	#[test]
	fn short_identify() {
		let mut sntl = Sntl::new(&ctl()[.. 100], None, 0);
		let vpd = sntl.execute(&[0x12, 1, 0xde, 0x20, 0, 0], &[], 0x2000).unwrap();
		assert_eq!(vpd.len(), 64 + 4096);
		assert!(vpd[64 + 100 ..].iter().all(|&b| b == 0));
	}

	#[test]
	fn responses_are_clamped() {
		let mut sntl = Sntl::new(&ctl(), None, 0);
		let cdbs: [fn(u16) -> Vec<u8>; 4] = [
			|a| vec![0x12, 0, 0, (a >> 8) as u8, a as u8, 0],
			|a| vec![0x12, 1, 0x83, (a >> 8) as u8, a as u8, 0],
			|a| vec![0x5a, 0, 0x3f, 0, 0, 0, 0, (a >> 8) as u8, a as u8, 0],
			|a| vec![0xa0, 0, 0, 0, 0, 0, 0, 0, (a >> 8) as u8, a as u8, 0, 0],
		];
		for cdb in cdbs.iter() {
			let natural = sntl.execute(&cdb(0xffff), &[], 0x10000).unwrap().len();
			for &alloc in &[0u16, 1, 16, 20, 33, 0x1000] {
				for &mx in &[16usize, 24, 0x10000] {
					let resp = sntl.execute(&cdb(alloc), &[], mx).unwrap();
					assert_eq!(resp.len(), natural.min(alloc as usize).min(mx), "{:02x?} {} {}", cdb(alloc), alloc, mx);
				}
			}
		}
	}

	#[test]
	fn builders_reject_short_cdbs() {
		let raw = ctl();
		let ctl = IdentifyController::new(&raw).unwrap();
		let mut state = DeviceState::new(0, false);
		let short = || SenseInfo::invalid_field(true, 0, None);

		assert_eq!(inquiry::respond(&ctl, None, &state, &[0x12, 0, 0], 4096), Err(short()));
		assert_eq!(luns::report(&[0xa0, 0, 0, 0, 0, 0, 0], 1, 1, 4096), Err(short()));
		assert_eq!(mode::sense_10(&state, &[0x5a, 0, 0x3f, 0, 0, 0, 0, 0x10], 4096), Err(short()));
		assert_eq!(mode::select_10(&mut state, &[0x55, 0x10], &[0; 8]), Err(short()));
		assert_eq!(maintenance::report_opcodes(&[0xa3, 0x0c, 0, 0], true, 4096), Err(short()));
		assert_eq!(maintenance::report_tmfs(&[0xa3, 0x0d], 4096), Err(short()));
		assert_eq!(luns::report(&[], 1, 1, 4096), Err(short()));
	}
}
