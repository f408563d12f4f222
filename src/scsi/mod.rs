/*!
All things SCSI.

* Implement [`ScsiDevice`](trait.ScsiDevice.html) to get typical CDBs (INQUIRY, MODE SENSE, REPORT LUNS, …) composed for you; the [SNTL](../sntl/index.html) is one such implementation.
* Use [`data` module](data/index.html) to parse various low-level structures found in SCSI replies.
* [`classify_pdt`](fn.classify_pdt.html) is the single place that groups peripheral device types into the classes VPD page layouts depend on.
*/

pub mod data;

use std::io::Error;
use byteorder::{ByteOrder, BigEndian};

use crate::Direction;

pub const PDT_MASK: u8 = 0x1f;

pub const PDT_DISK: u8 = 0x00;
pub const PDT_TAPE: u8 = 0x01;
pub const PDT_PRINTER: u8 = 0x02;
pub const PDT_PROCESSOR: u8 = 0x03;
pub const PDT_WO: u8 = 0x04;
pub const PDT_MMC: u8 = 0x05;
pub const PDT_SCANNER: u8 = 0x06;
pub const PDT_OPTICAL: u8 = 0x07;
pub const PDT_MCHANGER: u8 = 0x08;
pub const PDT_COMMS: u8 = 0x09;
pub const PDT_SAC: u8 = 0x0c;
pub const PDT_SES: u8 = 0x0d;
pub const PDT_RBC: u8 = 0x0e;
pub const PDT_OCRW: u8 = 0x0f;
pub const PDT_BCC: u8 = 0x10;
pub const PDT_OSD: u8 = 0x11;
pub const PDT_ADC: u8 = 0x12;
pub const PDT_SMD: u8 = 0x13;
pub const PDT_ZBC: u8 = 0x14;
pub const PDT_WLUN: u8 = 0x1e;
pub const PDT_UNKNOWN: u8 = 0x1f;

/// Classes of peripheral device types that share VPD page layouts (pages B0h..BFh)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub enum PdtClass {
	/// Direct access block devices (SBC, RBC, ZBC)
	Disk,
	/// Sequential access devices and media changers (SSC, SMC)
	Tape,
	/// Write-once, optical memory, and CD/DVD (MMC) devices
	Optical,
	/// Object-based storage (OSD)
	Osd,
	/// Automation/drive interface (ADC)
	Adc,
	Other,
}

/**
Maps device types that are specializations of another type onto that type: ADC onto tape, ZBC onto disk.

Other types are returned unchanged (without the peripheral qualifier).
*/
pub fn decay_pdt(pdt: u8) -> u8 {
	match pdt & PDT_MASK {
		PDT_ADC => PDT_TAPE,
		PDT_ZBC => PDT_DISK,
		x => x,
	}
}

pub fn classify_pdt(pdt: u8) -> PdtClass {
	match pdt & PDT_MASK {
		PDT_DISK | PDT_RBC | PDT_ZBC => PdtClass::Disk,
		PDT_TAPE | PDT_MCHANGER => PdtClass::Tape,
		PDT_WO | PDT_OPTICAL | PDT_MMC => PdtClass::Optical,
		PDT_OSD => PdtClass::Osd,
		PDT_ADC => PdtClass::Adc,
		_ => PdtClass::Other,
	}
}

pub fn pdt_name(pdt: u8) -> &'static str {
	match pdt & PDT_MASK {
		PDT_DISK => "disk",
		PDT_TAPE => "tape",
		PDT_PRINTER => "printer", // obsolete
		PDT_PROCESSOR => "processor",
		PDT_WO => "write once optical disk", // obsolete
		PDT_MMC => "cd/dvd",
		PDT_SCANNER => "scanner", // obsolete
		PDT_OPTICAL => "optical memory device",
		PDT_MCHANGER => "medium changer",
		PDT_COMMS => "communications", // obsolete
		0x0a | 0x0b => "graphics", // obsolete
		PDT_SAC => "storage array controller",
		PDT_SES => "enclosure services device",
		PDT_RBC => "simplified direct access device",
		PDT_OCRW => "optical card reader/writer device",
		PDT_BCC => "bridge controller commands",
		PDT_OSD => "object based storage",
		PDT_ADC => "automation/drive interface",
		PDT_SMD => "security manager device",
		PDT_ZBC => "host managed zoned block",
		PDT_WLUN => "well known logical unit",
		PDT_UNKNOWN => "unknown or no device type",
		_ => "reserved",
	}
}

/// Transport protocol identifiers, SPC-5, 7.6.1, table 444
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub enum Protocol {
	FC, // Fibre Channel, FCP-5
	SPI, // Parallel SCSI, SPI-5
	SSA, // SSA-S3P
	FireWire, // IEEE 1394, SBP-3
	RDMA, // SRP
	ISCSI,
	SAS, // SPL-4
	ADT, // Automation/Drive Interface Transport
	ATA, // ATA/ATAPI
	UAS, // USB Attached SCSI
	SOP, // SCSI over PCIe
	PCIe,
	/// No specific protocol
	None,
	Reserved(u8),
}

pub const TPROTO_UAS: u8 = 0x9;
pub const TPROTO_SOP: u8 = 0xa;
pub const TPROTO_NONE: u8 = 0xf;

impl Protocol {
	pub fn from_id(id: u8) -> Self {
		use self::Protocol::*;
		match id & 0xf {
			0 => FC,
			1 => SPI,
			2 => SSA,
			3 => FireWire,
			4 => RDMA,
			5 => ISCSI,
			6 => SAS,
			7 => ADT,
			8 => ATA,
			9 => UAS,
			0xa => SOP,
			0xb => PCIe,
			0xf => None,
			x => Reserved(x),
		}
	}

	pub fn name(&self) -> &'static str {
		use self::Protocol::*;
		match *self {
			FC => "Fibre Channel Protocol for SCSI (FCP-5)",
			SPI => "SCSI Parallel Interface (SPI-5)",
			SSA => "Serial Storage Architecture SCSI-3 Protocol (SSA-S3P)",
			FireWire => "Serial Bus Protocol for IEEE 1394 (SBP-3)",
			RDMA => "SCSI RDMA Protocol (SRP)",
			ISCSI => "Internet SCSI (iSCSI)",
			SAS => "Serial Attached SCSI Protocol (SPL-4)",
			ADT => "Automation/Drive Interface Transport (ADT-2)",
			ATA => "AT Attachment Interface (ATA/ATAPI-7)",
			UAS => "USB Attached SCSI (UAS-2)",
			SOP => "SCSIe protocol (SOP)",
			PCIe => "PCIe",
			None => "No specific protocol",
			Reserved(_) => "reserved",
		}
	}
}

/// SAM status CHECK CONDITION
pub const SAM_STAT_CHECK_CONDITION: u8 = 0x02;

// additional sense codes
pub const ASC_PARAMETER_LIST_LENGTH_ERR: u8 = 0x1a;
pub const ASC_INVALID_COMMAND_OPCODE: u8 = 0x20;
pub const ASC_INVALID_FIELD_IN_CDB: u8 = 0x24;
pub const ASC_INVALID_FIELD_IN_PARAM_LIST: u8 = 0x26;
pub const ASC_SAVING_PARAMS_UNSUP: u8 = 0x39;

/// Allocation length used by the porcelain methods of [`ScsiDevice`](trait.ScsiDevice.html)
pub const DEFAULT_ALLOC: usize = 8192;

// TODO? struct as a single argument for the commands with a lot of knobs, like it's done for ATA registers
pub trait ScsiDevice {
	/**
	Executes `cmd` and returns tuple of `(sense, data)`.

	Empty `sense` means GOOD status. `data_out` is only used with [`Direction::To`](../enum.Direction.html).
	*/
	fn do_cmd(&mut self, cmd: &[u8], dir: Direction, data_out: &[u8], data_len: usize) -> Result<(Vec<u8>, Vec<u8>), Error>;

	fn scsi_inquiry(&mut self, vital: bool, code: u8) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let alloc = DEFAULT_ALLOC;
		let cmd: [u8; 6] = [
			0x12, // opcode: INQUIRY
			if vital {1} else {0}, // reserved << 2 + cmddt (obsolete) << 1 + enable vital product data << 0
			code,
			(alloc >> 8) as u8,
			(alloc & 0xff) as u8,
			0, // control
		];

		self.do_cmd(&cmd, Direction::From, &[], alloc)
	}

	/**
	Executes MODE SENSE(10).

	- `llbaa`: long LBA accepted, i.e. allow 16-byte block descriptors
	- `dbd`: disable block descriptors
	- `pc`: page control; 0 is current, 1 changeable, 2 default, 3 saved values
	*/
	fn mode_sense_10(&mut self, llbaa: bool, dbd: bool, pc: u8, page: u8, subpage: u8) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let alloc = 0xffff_usize;
		let cmd: [u8; 10] = [
			0x5a, // opcode
			if llbaa {0x10} else {0} | if dbd {0x08} else {0},
			((pc & 0b11) << 6) | (page & 0x3f),
			subpage,
			0, 0, 0, // reserved
			(alloc >> 8) as u8,
			(alloc & 0xff) as u8,
			0, // control
		];

		self.do_cmd(&cmd, Direction::From, &[], alloc)
	}

	/// Executes MODE SELECT(10) with `data` as the parameter list; `pf` is Page Format, `sp` is Save Pages
	fn mode_select_10(&mut self, pf: bool, sp: bool, data: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let mut cmd: [u8; 10] = [
			0x55, // opcode
			if pf {0x10} else {0} | if sp {0x01} else {0},
			0, 0, 0, 0, 0, // reserved
			0, 0, // parameter list length
			0, // control
		];
		BigEndian::write_u16(&mut cmd[7..9], data.len() as u16);

		self.do_cmd(&cmd, Direction::To, data, 0)
	}

	fn report_luns(&mut self, select_report: u8) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let alloc = DEFAULT_ALLOC;
		let mut cmd = [0u8; 12];
		cmd[0] = 0xa0; // opcode
		cmd[2] = select_report;
		BigEndian::write_u32(&mut cmd[6..10], alloc as u32);

		self.do_cmd(&cmd, Direction::From, &[], alloc)
	}

	/**
	Executes REPORT SUPPORTED OPERATION CODES (MAINTENANCE IN, service action 0Ch).

	- `rctd`: return command timeouts descriptor(s)
	- `options`: reporting options; 0 lists all commands, 1..3 query one command
	*/
	fn report_supported_opcodes(&mut self, rctd: bool, options: u8, opcode: u8, sa: u16) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let alloc = DEFAULT_ALLOC;
		let mut cmd = [0u8; 12];
		cmd[0] = 0xa3; // opcode: MAINTENANCE IN
		cmd[1] = 0x0c;
		cmd[2] = if rctd {0x80} else {0} | (options & 0b111);
		cmd[3] = opcode;
		BigEndian::write_u16(&mut cmd[4..6], sa);
		BigEndian::write_u32(&mut cmd[6..10], alloc as u32);

		self.do_cmd(&cmd, Direction::From, &[], alloc)
	}

	/// Executes REPORT SUPPORTED TASK MANAGEMENT FUNCTIONS; `repd` asks for the extended format
	fn report_task_mgmt(&mut self, repd: bool) -> Result<(Vec<u8>, Vec<u8>), Error> {
		let alloc = 16;
		let mut cmd = [0u8; 12];
		cmd[0] = 0xa3; // opcode: MAINTENANCE IN
		cmd[1] = 0x0d;
		cmd[2] = if repd {0x80} else {0};
		BigEndian::write_u32(&mut cmd[6..10], alloc as u32);

		self.do_cmd(&cmd, Direction::From, &[], alloc)
	}
}
