use byteorder::{ByteOrder, LittleEndian};

use crate::reader::ascii;
use crate::report::{Report, Value};
use crate::utils::{all_zeros, hex_string};
use super::{Error, IDENTIFY_LEN, ONCS_TIMESTAMP};

#[derive(Debug, Clone, Copy)]
pub struct IdentifyController<'a> {
	data: &'a [u8],
}

impl<'a> IdentifyController<'a> {
	pub fn new(data: &'a [u8]) -> Result<Self, Error> {
		if data.len() < IDENTIFY_LEN {
			return Err(Error::Truncated("Identify Controller", data.len()));
		}
		Ok(IdentifyController { data: &data[.. IDENTIFY_LEN] })
	}

	pub fn raw(&self) -> &'a [u8] { self.data }

	pub fn pci_vendor_id(&self) -> u16 { LittleEndian::read_u16(&self.data[0..2]) }
	pub fn pci_subsystem_vendor_id(&self) -> u16 { LittleEndian::read_u16(&self.data[2..4]) }

	/// ASCII, padded with spaces
	pub fn serial_number(&self) -> &'a [u8] { &self.data[4..24] }
	pub fn model_number(&self) -> &'a [u8] { &self.data[24..64] }
	pub fn firmware_revision(&self) -> &'a [u8] { &self.data[64..72] }

	pub fn ieee_oui(&self) -> u32 { LittleEndian::read_u24(&self.data[73..76]) }
	/// Controller Multi-Path I/O and Namespace Sharing Capabilities
	pub fn cmic(&self) -> u8 { self.data[76] }
	/// Maximum Data Transfer Size, in units of the minimum memory page size, as a power of two (0 is unlimited)
	pub fn mdts(&self) -> u8 { self.data[77] }
	pub fn controller_id(&self) -> u16 { LittleEndian::read_u16(&self.data[78..80]) }
	pub fn version(&self) -> u32 { LittleEndian::read_u32(&self.data[80..84]) }
	/// FRU Globally Unique Identifier
	pub fn fguid(&self) -> &'a [u8] { &self.data[112..128] }
	/// Optional Admin Command Support
	pub fn oacs(&self) -> u16 { LittleEndian::read_u16(&self.data[256..258]) }
	/// NVM Subsystem Report
	pub fn nvmsr(&self) -> u8 { self.data[253] }
	/// Number of Power States Support, zero-based
	pub fn npss(&self) -> u8 { self.data[263] }
	pub fn total_capacity(&self) -> u128 { LittleEndian::read_u128(&self.data[280..296]) }
	pub fn unallocated_capacity(&self) -> u128 { LittleEndian::read_u128(&self.data[296..312]) }
	/// Number of Namespaces (the maximum namespace ID)
	pub fn nn(&self) -> u32 { LittleEndian::read_u32(&self.data[516..520]) }
	/// Optional NVM Command Support
	pub fn oncs(&self) -> u16 { LittleEndian::read_u16(&self.data[520..522]) }

	pub fn has_timestamp(&self) -> bool {
		self.oncs() & ONCS_TIMESTAMP != 0
	}

	pub fn decode(&self) -> Report {
		let mut rep = Report::new();
		rep.line("NVMe Identify controller response:");

		rep.field(format!("  PCI vendor ID: 0x{:04x}", self.pci_vendor_id()), "pci_vendor_id", Value::Int(self.pci_vendor_id() as u64));
		rep.field(format!("  PCI subsystem vendor ID: 0x{:04x}", self.pci_subsystem_vendor_id()), "pci_subsystem_vendor_id", Value::Int(self.pci_subsystem_vendor_id() as u64));

		let sn = ascii(self.serial_number());
		let mn = ascii(self.model_number());
		let fr = ascii(self.firmware_revision());
		rep.field(format!("  Serial number: {}", sn.trim_start()), "serial_number", Value::Str(sn.trim_start().to_string()));
		rep.field(format!("  Model number: {}", mn.trim_start()), "model_number", Value::Str(mn.trim_start().to_string()));
		rep.field(format!("  Firmware revision: {}", fr.trim_start()), "firmware_revision", Value::Str(fr.trim_start().to_string()));

		rep.field(format!("  IEEE OUI Identifier: 0x{:06x}", self.ieee_oui()), "ieee_oui", Value::Int(self.ieee_oui() as u64));
		let cmic = self.cmic();
		rep.field(format!("  Controller multi-path I/O and namespace sharing capabilities: 0x{:x}", cmic), "cmic", Value::Int(cmic as u64));
		if self.mdts() == 0 {
			rep.field("  Maximum data transfer size: unlimited", "mdts", Value::Int(0));
		} else {
			rep.field(format!("  Maximum data transfer size: 2^{} minimum memory pages", self.mdts()), "mdts", Value::Int(self.mdts() as u64));
		}
		rep.field(format!("  Controller ID: 0x{:x}", self.controller_id()), "controller_id", Value::Int(self.controller_id() as u64));

		let ver = self.version();
		if ver != 0 {
			let s = format!("{}.{}.{}", ver >> 16, (ver >> 8) & 0xff, ver & 0xff);
			rep.field(format!("  Version: {}", s), "version", Value::Str(s));
		}
		if !all_zeros(self.fguid()) {
			rep.field(format!("  FRU globally unique identifier: 0x{}", hex_string(self.fguid())), "fguid", Value::Bytes(self.fguid().to_vec()));
		}

		rep.field(format!("  Optional admin command support: 0x{:x}", self.oacs()), "oacs", Value::Int(self.oacs() as u64));
		rep.field(format!("  Optional NVM command support: 0x{:x}", self.oncs()), "oncs", Value::Int(self.oncs() as u64));
		rep.field(format!("  Number of namespaces: {}", self.nn()), "number_of_namespaces", Value::Int(self.nn() as u64));

		// capacities above 2^64 bytes are not a thing yet
		let total = self.total_capacity();
		if total != 0 {
			rep.field(format!("  Total NVM capacity: {} bytes", total), "total_nvm_capacity", Value::Int(total as u64));
			let unalloc = self.unallocated_capacity();
			rep.field(format!("  Unallocated NVM capacity: {} bytes", unalloc), "unallocated_nvm_capacity", Value::Int(unalloc as u64));
		}
		let ps = self.npss() as u64 + 1;
		rep.field(format!("  Number of power states supported: {}", ps), "power_states", Value::Int(ps));
		rep
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub struct LbaFormat {
	/// Metadata size, bytes
	pub ms: u16,
	/// LBA data size, as a power of two
	pub lbads: u8,
	/// Relative performance, 0 is best
	pub rp: u8,
}

impl LbaFormat {
	pub fn data_size(&self) -> Option<u64> {
		// values below 9 (512 bytes) are not supported, values above 31 are nonsense
		if self.lbads > 31 { None } else { Some(1 << self.lbads) }
	}
}

fn rp_name(rp: u8) -> &'static str {
	match rp & 0b11 {
		0 => "Best performance",
		1 => "Better performance",
		2 => "Good performance",
		_ => "Degraded performance",
	}
}

#[derive(Debug, Clone, Copy)]
pub struct IdentifyNamespace<'a> {
	data: &'a [u8],
}

impl<'a> IdentifyNamespace<'a> {
	pub fn new(data: &'a [u8]) -> Result<Self, Error> {
		if data.len() < IDENTIFY_LEN {
			return Err(Error::Truncated("Identify Namespace", data.len()));
		}
		Ok(IdentifyNamespace { data: &data[.. IDENTIFY_LEN] })
	}

	/// Namespace size, in logical blocks
	pub fn nsze(&self) -> u64 { LittleEndian::read_u64(&self.data[0..8]) }
	pub fn ncap(&self) -> u64 { LittleEndian::read_u64(&self.data[8..16]) }
	pub fn nuse(&self) -> u64 { LittleEndian::read_u64(&self.data[16..24]) }
	/// Number of LBA formats, zero-based
	pub fn nlbaf(&self) -> u8 { self.data[25] }

	/// Index of the LBA format the namespace is formatted with
	pub fn flbas_index(&self) -> u8 {
		let flbas = self.data[26];
		// bits 6:5 are the upper bits of the index since NVMe 2.0
		(flbas & 0xf) | (((flbas >> 5) & 0b11) << 4)
	}

	/// Namespace Globally Unique Identifier
	pub fn nguid(&self) -> &'a [u8] { &self.data[104..120] }
	pub fn eui64(&self) -> &'a [u8] { &self.data[120..128] }

	pub fn lba_format(&self, i: usize) -> Option<LbaFormat> {
		if i > 63 {
			return None;
		}
		let off = 128 + 4*i;
		Some(LbaFormat {
			ms: LittleEndian::read_u16(&self.data[off .. off + 2]),
			lbads: self.data[off + 2],
			rp: self.data[off + 3] & 0b11,
		})
	}

	pub fn decode(&self) -> Report {
		let mut rep = Report::new();
		rep.line("NVMe Identify namespace response:");
		rep.field(format!("  Namespace size: {} blocks", self.nsze()), "namespace_size", Value::Int(self.nsze()));
		rep.field(format!("  Namespace capacity: {} blocks", self.ncap()), "namespace_capacity", Value::Int(self.ncap()));
		rep.field(format!("  Namespace utilization: {} blocks", self.nuse()), "namespace_utilization", Value::Int(self.nuse()));

		let count = self.nlbaf() as usize + 1;
		let index = self.flbas_index();
		rep.field(format!("  Number of LBA formats: {}", count), "number_of_lba_formats", Value::Int(count as u64));
		rep.field(format!("  Formatted LBA size index: {}", index), "formatted_lba_index", Value::Int(index as u64));

		if !all_zeros(self.nguid()) {
			rep.field(format!("  NGUID: 0x{}", hex_string(self.nguid())), "nguid", Value::Bytes(self.nguid().to_vec()));
		}
		if !all_zeros(self.eui64()) {
			rep.field(format!("  EUI-64: 0x{}", hex_string(self.eui64())), "eui64", Value::Bytes(self.eui64().to_vec()));
		}

		for i in 0 .. count.min(64) {
			let fmt = match self.lba_format(i) {
				Some(fmt) => fmt,
				None => break,
			};
			let size = match fmt.data_size() {
				Some(size) => size,
				None => {
					rep.warn(format!("LBA format {}: LBA data size 2^{} is out of range", i, fmt.lbads));
					continue;
				},
			};
			let in_use = i == index as usize;

			let mut item = Report::new();
			item.line(format!("  LBA format {}: metadata size: {}, data size: {}, {}{}",
				i, fmt.ms, size, rp_name(fmt.rp),
				if in_use { " [in use]" } else { "" },
			));
			item.node("index", Value::Int(i as u64));
			item.node("metadata_size", Value::Int(fmt.ms as u64));
			item.node("data_size", Value::Int(size));
			item.node("relative_performance", Value::Int(fmt.rp as u64));
			item.node("in_use", Value::Bool(in_use));
			rep.push("lba_formats", item);
		}
		rep
	}
}
