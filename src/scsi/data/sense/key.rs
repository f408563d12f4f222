use std::fmt;

/// Sense keys, SPC-5, 4.4.8, table 49
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub enum SenseKey {
	/// Successful command, or a FILEMARK/EOM/ILI report
	NoSense = 0,
	/// Command completed after some recovery action
	Recovered = 1,
	/// The logical unit is not accessible
	NotReady = 2,
	MediumError = 3,
	/// Non-medium failure (controller, CRC, …)
	HardwareError = 4,
	/// Invalid LUN, task attribute, parameter, or a field in the CDB
	IllegalRequest = 5,
	/// Medium change, logical unit reset etc.; see SAM-5
	UnitAttention = 6,
	DataProtect = 7,
	BlankCheck = 8,
	VendorSpecific = 9,
	/// EXTENDED COPY aborted
	CopyAborted = 10,
	/// Target aborted the command; retrying might help
	AbortedCommand = 11,
	Reserved = 12,
	VolumeOverflow = 13,
	Miscompare = 14,
	Completed = 15,
}

impl SenseKey {
	pub fn from_u8(key: u8) -> Self {
		use self::SenseKey::*;
		match key & 0xf {
			0 => NoSense,
			1 => Recovered,
			2 => NotReady,
			3 => MediumError,
			4 => HardwareError,
			5 => IllegalRequest,
			6 => UnitAttention,
			7 => DataProtect,
			8 => BlankCheck,
			9 => VendorSpecific,
			10 => CopyAborted,
			11 => AbortedCommand,
			12 => Reserved,
			13 => VolumeOverflow,
			14 => Miscompare,
			_ => Completed,
		}
	}
}

impl fmt::Display for SenseKey {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::SenseKey::*;
		write!(f, "{}", match *self {
			NoSense => "No Sense",
			Recovered => "Recovered Error",
			NotReady => "Not Ready",
			MediumError => "Medium Error",
			HardwareError => "Hardware Error",
			IllegalRequest => "Illegal Request",
			UnitAttention => "Unit Attention",
			DataProtect => "Data Protect",
			BlankCheck => "Blank Check",
			VendorSpecific => "Vendor Specific",
			CopyAborted => "Copy Aborted",
			AbortedCommand => "Aborted Command",
			Reserved => "Reserved",
			VolumeOverflow => "Volume Overflow",
			Miscompare => "Miscompare",
			Completed => "Completed",
		})
	}
}
