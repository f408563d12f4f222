/*!
Designation descriptors of the Device Identification VPD page (83h), also found in SCSI Ports (88h) and Logical Block Provisioning (B2h) pages.

## Example

```
use inq::scsi::data::vpd::device_id::{designators, Identifier};

// NAA 5 (IEEE Registered) logical unit name
let region = [0x01, 0x03, 0x00, 0x08, 0x51, 0x54, 0xa0, 0x6b, 0x8f, 0x00, 0x00, 0x4a];
let d = designators(&region).next().unwrap().unwrap();
match d.identifier().unwrap() {
	Identifier::Naa5 { aoi, vsi } => {
		assert_eq!(aoi, 0x154a06);
		assert_eq!(vsi, 0xb8f00004a);
	},
	_ => unreachable!(),
}
```
*/

use byteorder::{ByteOrder, BigEndian};

use crate::report::{Report, Value};
use crate::scsi::{Protocol, TPROTO_UAS, TPROTO_SOP, TPROTO_NONE};
use crate::scsi::data::export::{encode_whitespaces, udev_escape};
use crate::utils::{hexdump, hex_string};
use super::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSet {
	Binary,
	ASCII, // 0x20 through 0x7e
	UTF8,
	Reserved(u8),
}

impl CodeSet {
	pub fn from_u8(x: u8) -> Self {
		match x & 0xf {
			1 => CodeSet::Binary,
			2 => CodeSet::ASCII,
			3 => CodeSet::UTF8,
			x => CodeSet::Reserved(x),
		}
	}
	pub fn is_text(&self) -> bool {
		*self == CodeSet::ASCII || *self == CodeSet::UTF8
	}
	pub fn name(&self) -> &'static str {
		match *self {
			CodeSet::Binary => "Binary",
			CodeSet::ASCII => "ASCII",
			CodeSet::UTF8 => "UTF-8",
			CodeSet::Reserved(_) => "Reserved",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
	Device, // addressed logical unit
	Port, // port that received the request
	Target, // SCSI target device that contains the addressed logical unit
	Reserved,
}

impl Association {
	pub fn from_u8(x: u8) -> Self {
		match x & 0b11 {
			0 => Association::Device,
			1 => Association::Port,
			2 => Association::Target,
			_ => Association::Reserved,
		}
	}
	pub fn name(&self) -> &'static str {
		match *self {
			Association::Device => "Addressed logical unit",
			Association::Port => "Target port",
			Association::Target => "Target device that contains addressed lu",
			Association::Reserved => "Reserved [0x3]",
		}
	}
	/// Middle part of `SCSI_IDENT_*` keys
	fn export_name(&self) -> Option<&'static str> {
		match *self {
			Association::Device => Some("LUN"),
			Association::Port => Some("PORT"),
			Association::Target => Some("TARGET"),
			Association::Reserved => None,
		}
	}
}

pub fn type_name(x: u8) -> &'static str {
	match x {
		0 => "vendor specific [0x0]",
		1 => "T10 vendor identification",
		2 => "EUI-64 based",
		3 => "NAA",
		4 => "Relative target port",
		5 => "Target port group",
		6 => "Logical unit group",
		7 => "MD5 logical unit identifier",
		8 => "SCSI name string",
		9 => "Protocol specific port identifier",
		0xa => "UUID identifier",
		_ => "reserved",
	}
}

quick_error! {
	#[derive(Debug, Clone, PartialEq)]
	pub enum Invalid {
		CodeSet(expected: &'static str, got: CodeSet) {
			display("expected {} code_set, got {}", expected, got.name())
		}
		Association(expected: Association, got: Association) {
			display("expected {} association, got {}", expected.name(), got.name())
		}
		Length(what: &'static str, got: usize) {
			display("unexpected {} identifier length: {}", what, got)
		}
		Naa(naa: u8) {
			display("bad NAA nibble, expect 2, 3, 5 or 6, got {}", naa)
		}
		Protocol(proto: u8) {
			display("unexpected protocol identifier {} with Protocol specific port identifier", Protocol::from_id(*proto).name())
		}
		Reserved(kind: u8) {
			display("reserved designator=0x{:x}", kind)
		}
	}
}

/// Decoded designator value
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier<'a> {
	VendorSpecific(&'a [u8]),
	T10 { vendor_id: &'a [u8], specific: &'a [u8] },
	Eui64 { extension: Option<u64>, ieee: u64, directory: Option<u32> },
	/// IEEE Extended
	Naa2 { vsi_a: u16, aoi: u32, vsi_b: u32 },
	/// Locally assigned
	Naa3(&'a [u8]),
	/// IEEE Registered
	Naa5 { aoi: u32, vsi: u64 },
	/// IEEE Registered Extended
	Naa6 { aoi: u32, vsi: u64, extension: u64 },
	RelativePort(u16),
	TargetPortGroup(u16),
	LogicalUnitGroup(u16),
	MD5(&'a [u8]),
	Name(&'a [u8]),
	Uas { address: u8, interface: u8 },
	Sop { bus: u8, function: u8 },
	Uuid(&'a [u8]),
}

#[derive(Debug, Clone, Copy)]
pub struct Designator<'a> {
	pub protocol: u8,
	pub code_set: CodeSet,
	/// Protocol identifier valid
	pub piv: bool,
	pub association: Association,
	pub designator_type: u8,
	/// Offset of the designator within the region
	pub offset: usize,
	/// Pre-SPC-2 page that carries a single identifier and no descriptor headers
	pub pre_spc: bool,
	pub data: &'a [u8],
}

fn expect_code_set(d: &Designator, c_set: CodeSet) -> Result<(), Invalid> {
	if d.code_set != c_set {
		return Err(Invalid::CodeSet(c_set.name(), d.code_set));
	}
	Ok(())
}

fn expect_association(d: &Designator, assoc: Association) -> Result<(), Invalid> {
	if d.association != assoc {
		return Err(Invalid::Association(assoc, d.association));
	}
	Ok(())
}

fn expect_len(d: &Designator, what: &'static str, len: usize) -> Result<(), Invalid> {
	if d.data.len() != len {
		return Err(Invalid::Length(what, d.data.len()));
	}
	Ok(())
}

// NAA 5/6: 24-bit AOI in bits 59..36, vendor specific identifier in bits 35..0
fn naa_registered(id: &[u8]) -> (u32, u64) {
	let aoi = ((id[0] as u32 & 0xf) << 20) | ((id[1] as u32) << 12) | ((id[2] as u32) << 4) | ((id[3] as u32 & 0xf0) >> 4);
	let vsi = BigEndian::read_u64(&id[0..8]) & 0xf_ffff_ffff;
	(aoi, vsi)
}

impl<'a> Designator<'a> {
	/// Validates code set, association and length expected for the designator type, and extracts its fields.
	pub fn identifier(&self) -> Result<Identifier<'a>, Invalid> {
		let id = self.data;
		match self.designator_type {
			0 => Ok(Identifier::VendorSpecific(id)),
			1 => {
				let split = id.len().min(8);
				Ok(Identifier::T10 { vendor_id: &id[.. split], specific: &id[split ..] })
			},
			2 => {
				expect_code_set(self, CodeSet::Binary)?;
				let (extension, ci_off) = match id.len() {
					8 | 12 => (None, 0),
					16 => (Some(BigEndian::read_u64(&id[0..8])), 8),
					len => return Err(Invalid::Length("EUI-64", len)),
				};
				Ok(Identifier::Eui64 {
					extension,
					ieee: BigEndian::read_u64(&id[ci_off .. ci_off + 8]),
					directory: if id.len() == 12 { Some(BigEndian::read_u32(&id[8..12])) } else { None },
				})
			},
			3 => {
				expect_code_set(self, CodeSet::Binary)?;
				let naa = id.first().map_or(0, |x| x >> 4);
				match naa {
					2 => {
						expect_len(self, "NAA 2", 8)?;
						Ok(Identifier::Naa2 {
							vsi_a: BigEndian::read_u16(&id[0..2]) & 0xfff,
							aoi: BigEndian::read_u24(&id[2..5]),
							vsi_b: BigEndian::read_u24(&id[5..8]),
						})
					},
					3 => {
						expect_len(self, "NAA 3", 8)?;
						Ok(Identifier::Naa3(id))
					},
					5 => {
						expect_len(self, "NAA 5", 8)?;
						let (aoi, vsi) = naa_registered(id);
						Ok(Identifier::Naa5 { aoi, vsi })
					},
					6 => {
						expect_len(self, "NAA 6", 16)?;
						let (aoi, vsi) = naa_registered(id);
						Ok(Identifier::Naa6 { aoi, vsi, extension: BigEndian::read_u64(&id[8..16]) })
					},
					x => Err(Invalid::Naa(x)),
				}
			},
			4 | 5 => {
				expect_code_set(self, CodeSet::Binary)?;
				expect_association(self, Association::Port)?;
				expect_len(self, type_name(self.designator_type), 4)?;
				let x = BigEndian::read_u16(&id[2..4]);
				Ok(if self.designator_type == 4 { Identifier::RelativePort(x) } else { Identifier::TargetPortGroup(x) })
			},
			6 => {
				expect_code_set(self, CodeSet::Binary)?;
				expect_association(self, Association::Device)?;
				expect_len(self, type_name(6), 4)?;
				Ok(Identifier::LogicalUnitGroup(BigEndian::read_u16(&id[2..4])))
			},
			7 => {
				expect_code_set(self, CodeSet::Binary)?;
				expect_association(self, Association::Device)?;
				Ok(Identifier::MD5(id))
			},
			8 => {
				// ASCII is tolerated
				if self.code_set != CodeSet::ASCII {
					expect_code_set(self, CodeSet::UTF8)?;
				}
				Ok(Identifier::Name(id))
			},
			9 => match self.protocol {
				TPROTO_UAS if id.len() >= 3 => Ok(Identifier::Uas { address: id[0] & 0x7f, interface: id[2] }),
				TPROTO_SOP if id.len() >= 2 => Ok(Identifier::Sop { bus: id[0], function: id[1] }),
				TPROTO_UAS | TPROTO_SOP => Err(Invalid::Length("protocol specific port", id.len())),
				x => Err(Invalid::Protocol(x)),
			},
			0xa => {
				expect_code_set(self, CodeSet::Binary)?;
				if id.len() != 18 || id[0] >> 4 != 1 {
					return Err(Invalid::Length("locally assigned UUID", id.len()));
				}
				Ok(Identifier::Uuid(&id[2..18]))
			},
			x => Err(Invalid::Reserved(x)),
		}
	}

	fn describe(&self, rep: &mut Report) -> Result<(), Invalid> {
		let raw = format!("      [0x{}]", hex_string(self.data));
		match self.identifier()? {
			Identifier::VendorSpecific(id) => {
				if self.code_set.is_text() && id.first().map_or(true, |&c| c >= 0x20 && c < 0x7f) {
					rep.line(format!("      vendor specific: {}", String::from_utf8_lossy(id)));
				} else {
					rep.line("      vendor specific:");
					for line in hexdump(id).lines() {
						rep.line(line.to_string());
					}
				}
			},
			Identifier::T10 { vendor_id, specific } => {
				let vendor = String::from_utf8_lossy(vendor_id).into_owned();
				rep.field(format!("      vendor id: {}", vendor), "t10_vendor_id", Value::Str(vendor));
				if !specific.is_empty() {
					if self.code_set.is_text() {
						rep.line(format!("      vendor specific: {}", String::from_utf8_lossy(specific)));
					} else {
						rep.line(format!("      vendor specific: 0x{}", hex_string(specific)));
					}
				}
			},
			Identifier::Eui64 { extension, ieee, directory } => {
				rep.line(format!("      EUI-64 based {} byte identifier", self.data.len()));
				if let Some(ext) = extension {
					rep.field(format!("      Identifier extension: 0x{:x}", ext), "identifier_extension", Value::Int(ext));
				}
				rep.field(format!("      IEEE identifier: 0x{:x}", ieee), "ieee_identifier", Value::Int(ieee));
				if let Some(dir) = directory {
					rep.field(format!("      Directory ID: 0x{:x}", dir), "directory_id", Value::Int(dir as u64));
				}
				rep.line(raw);
			},
			Identifier::Naa2 { vsi_a, aoi, vsi_b } => {
				rep.node("naa", Value::Int(2));
				rep.field(format!("      NAA 2, vendor specific identifier A: 0x{:x}", vsi_a), "vendor_specific_identifier_a", Value::Int(vsi_a as u64));
				rep.field(format!("      AOI: 0x{:x}", aoi), "aoi", Value::Int(aoi as u64));
				rep.field(format!("      vendor specific identifier B: 0x{:x}", vsi_b), "vendor_specific_identifier_b", Value::Int(vsi_b as u64));
				rep.line(raw);
			},
			Identifier::Naa3(_) => {
				rep.node("naa", Value::Int(3));
				rep.line("      NAA 3, Locally assigned:");
				rep.line(raw);
			},
			Identifier::Naa5 { aoi, vsi } => {
				rep.node("naa", Value::Int(5));
				rep.field(format!("      NAA 5, AOI: 0x{:x}", aoi), "aoi", Value::Int(aoi as u64));
				rep.field(format!("      Vendor Specific Identifier: 0x{:x}", vsi), "vendor_specific_identifier", Value::Int(vsi));
				rep.line(raw);
			},
			Identifier::Naa6 { aoi, vsi, extension } => {
				rep.node("naa", Value::Int(6));
				rep.field(format!("      NAA 6, AOI: 0x{:x}", aoi), "aoi", Value::Int(aoi as u64));
				rep.field(format!("      Vendor Specific Identifier: 0x{:x}", vsi), "vendor_specific_identifier", Value::Int(vsi));
				rep.field(format!("      Vendor Specific Identifier Extension: 0x{:x}", extension), "vendor_specific_identifier_extension", Value::Int(extension));
				rep.line(raw);
			},
			Identifier::RelativePort(x) =>
				rep.field(format!("      Relative target port: 0x{:x}", x), "relative_target_port", Value::Int(x as u64)),
			Identifier::TargetPortGroup(x) =>
				rep.field(format!("      Target port group: 0x{:x}", x), "target_port_group", Value::Int(x as u64)),
			Identifier::LogicalUnitGroup(x) =>
				rep.field(format!("      Logical unit group: 0x{:x}", x), "logical_unit_group", Value::Int(x as u64)),
			Identifier::MD5(id) => {
				rep.line("      MD5 logical unit identifier:");
				for line in hexdump(id).lines() {
					rep.line(line.to_string());
				}
			},
			Identifier::Name(id) => {
				let name = String::from_utf8_lossy(id).trim_end_matches('\0').to_string();
				rep.line("      SCSI name string:");
				rep.field(format!("      {}", name), "scsi_name_string", Value::Str(name));
			},
			Identifier::Uas { address, interface } => {
				rep.field(format!("      USB device address: 0x{:x}", address), "usb_device_address", Value::Int(address as u64));
				rep.field(format!("      USB interface number: 0x{:x}", interface), "usb_interface_number", Value::Int(interface as u64));
			},
			Identifier::Sop { bus, function } => {
				rep.field(format!("      PCIe routing ID, bus number: 0x{:x}", bus), "pcie_bus_number", Value::Int(bus as u64));
				rep.field(format!("          function number: 0x{:x}", function), "pcie_function_number", Value::Int(function as u64));
				rep.line(format!("          [or device number: 0x{:x}, function number: 0x{:x}]", function >> 3, function & 0x7));
			},
			Identifier::Uuid(uuid) => {
				let s = uuid_string(uuid);
				rep.field(format!("      Locally assigned UUID: {}", s), "uuid", Value::Str(s));
			},
		}
		Ok(())
	}
}

fn uuid_string(uuid: &[u8]) -> String {
	let mut s = String::with_capacity(36);
	for (i, b) in uuid.iter().enumerate() {
		if i == 4 || i == 6 || i == 8 || i == 10 {
			s.push('-');
		}
		s.push_str(&format!("{:02x}", b));
	}
	s
}

/// Iterator over designators, see [`designators()`](fn.designators.html)
#[derive(Debug, Clone)]
pub struct Designators<'a> {
	region: &'a [u8],
	off: usize,
	done: bool,
}

/**
Iterates over designation descriptors in `region` (page content without the 4-byte page header).

A descriptor that does not fit into the region yields an error, after which iteration stops. Some old EMC arrays return a pre-SPC-2 page that has no descriptor headers at all (byte 2, which is reserved in a proper descriptor, is not zero); such a region yields a single NAA designator that spans all of it.
*/
pub fn designators(region: &[u8]) -> Designators {
	Designators { region, off: 0, done: false }
}

impl<'a> Iterator for Designators<'a> {
	type Item = Result<Designator<'a>, Error>;

	fn next(&mut self) -> Option<Self::Item> {
		let (off, len) = (self.off, self.region.len());
		if self.done || off >= len {
			return None;
		}

		if off == 0 && len > 2 && self.region[2] != 0 {
			self.done = true;
			return Some(Ok(Designator {
				protocol: TPROTO_NONE,
				code_set: CodeSet::Binary,
				piv: false,
				association: Association::Device,
				designator_type: 3,
				offset: 16,
				pre_spc: true,
				data: self.region,
			}));
		}

		if off + 4 > len {
			self.done = true;
			return Some(Err(Error::Truncated("designator header", len - off, 4)));
		}
		let hdr = &self.region[off .. off + 4];
		let id_len = hdr[3] as usize;
		if off + 4 + id_len > len {
			self.done = true;
			return Some(Err(Error::Truncated("designator", len - off, 4 + id_len)));
		}

		self.off += 4 + id_len;
		Some(Ok(Designator {
			protocol: hdr[0] >> 4,
			code_set: CodeSet::from_u8(hdr[0]),
			piv: hdr[1] & 0x80 != 0,
			association: Association::from_u8(hdr[1] >> 4),
			designator_type: hdr[1] & 0xf,
			offset: off,
			pre_spc: false,
			data: &self.region[off + 4 .. off + 4 + id_len],
		}))
	}
}

/// Renders every designator in `region`, collecting them into the `designation_descriptor_list` array.
pub fn decode(region: &[u8], rep: &mut Report) {
	for (i, d) in designators(region).enumerate() {
		let j = i + 1;
		let d = match d {
			Ok(d) => d,
			Err(err) => {
				rep.warn(format!("Device identification: {}", err));
				break;
			},
		};

		let mut item = Report::new();
		if d.pre_spc {
			item.line(format!("  Pre-SPC descriptor, descriptor length: {}", d.data.len()));
		} else {
			item.line(format!("  Designation descriptor number {}, descriptor length: {}", j, d.data.len() + 4));
		}
		if d.piv && (d.association == Association::Port || d.association == Association::Target) {
			item.field(format!("    transport: {}", Protocol::from_id(d.protocol).name()), "protocol_identifier", Value::Int(d.protocol as u64));
		}
		item.line(format!("    designator_type: {},  code_set: {}", type_name(d.designator_type), d.code_set.name()));
		item.line(format!("    associated with the {}", d.association.name()));
		item.node("designator_type", Value::Int(d.designator_type as u64));
		item.node("code_set", Value::Str(d.code_set.name().to_string()));
		item.node("association", Value::Str(d.association.name().to_string()));
		item.node("designator", Value::Bytes(d.data.to_vec()));

		if let Err(err) = d.describe(&mut item) {
			item.warn(format!("Designation descriptor number {}: {}", j, err));
		}
		rep.push("designation_descriptor_list", item);
	}
}

/// `SCSI_IDENT_<association>_<type>=value` lines for udev
pub fn export(region: &[u8]) -> Vec<String> {
	let mut lines = vec![];
	for d in designators(region) {
		let d = match d {
			Ok(d) => d,
			Err(err) => {
				debug!("Device identification: {}", err);
				break;
			},
		};
		let assoc = match d.association.export_name() {
			Some(assoc) => assoc,
			None => {
				debug!("Device identification: invalid association at offset {}", d.offset);
				break;
			},
		};
		let id = d.data;
		let mut put = |key: &str, value: String| lines.push(format!("SCSI_IDENT_{}_{}={}", assoc, key, value));

		match d.designator_type {
			0 => {
				if id.is_empty() || id.len() > 128 {
					continue;
				}
				if d.code_set.is_text() {
					let enc = encode_whitespaces(id);
					if !enc.is_empty() {
						put("VENDOR", udev_escape(&enc));
					}
				} else {
					put("VENDOR", hex_string(id));
				}
			},
			1 => if d.code_set.is_text() {
				let enc = encode_whitespaces(id);
				put("T10", udev_escape(&enc));
				if enc.starts_with(b"ATA_") {
					put("ATA", String::from_utf8_lossy(&enc[4..]).into_owned());
				}
			} else {
				put("T10", hex_string(id));
			},
			2 if d.code_set == CodeSet::Binary => put("EUI64", hex_string(id)),
			3 if d.code_set == CodeSet::Binary => {
				// some (broken) devices return several NAA designators
				let suffix = match id.first().map(|x| x >> 4) {
					Some(6) => "REGEXT",
					Some(5) => "REG",
					Some(2) => "EXT",
					_ => "LOCAL",
				};
				put(&format!("NAA_{}", suffix), hex_string(id));
			},
			4 | 5 | 6 => match d.identifier() {
				Ok(Identifier::RelativePort(x)) => put("RELATIVE", x.to_string()),
				Ok(Identifier::TargetPortGroup(x)) => put("TARGET_PORT_GROUP", format!("0x{:x}", x)),
				Ok(Identifier::LogicalUnitGroup(x)) => put("LOGICAL_UNIT_GROUP", format!("0x{:x}", x)),
				_ => debug!("Device identification: {} at offset {} is malformed", type_name(d.designator_type), d.offset),
			},
			7 if d.code_set == CodeSet::Binary && d.association == Association::Device => put("MD5", hex_string(id)),
			8 if d.code_set == CodeSet::UTF8 => {
				let prefixed = [&b"eui."[..], b"EUI.", b"naa.", b"NAA.", b"iqn."].iter().any(|p| id.starts_with(p));
				if prefixed {
					let name = String::from_utf8_lossy(id);
					put("NAME", name.trim_end_matches('\0').to_string());
				} else {
					debug!("Device identification: SCSI name string without a known prefix at offset {}", d.offset);
				}
			},
			9 => match d.protocol {
				TPROTO_UAS if id.len() == 4 && d.association == Association::Port => {
					put("UAS_DEVICE_ADDRESS", format!("0x{:x}", id[0] & 0x7f));
					put("UAS_INTERFACE_NUMBER", format!("0x{:x}", id[2]));
				},
				TPROTO_SOP if id.len() == 4 || id.len() == 8 =>
					put("SOP_ROUTING_ID", format!("0x{:x}", BigEndian::read_u16(&id[0..2]))),
				x => debug!("Device identification: protocol specific port identifier, protocol_id=0x{:x}, length {}", x, id.len()),
			},
			0xa if d.code_set == CodeSet::Binary && id.len() >= 18 => {
				let mut s = String::with_capacity(2*id.len() + 4);
				for (m, b) in id.iter().enumerate().skip(2) {
					if m == 6 || m == 8 || m == 10 || m == 12 {
						s.push('-');
					}
					s.push_str(&format!("{:02x}", b));
				}
				put("UUID", s);
			},
			x => debug!("Device identification: skipping designator type 0x{:x} (code set {:?}) at offset {}", x, d.code_set, d.offset),
		}
	}
	lines
}
