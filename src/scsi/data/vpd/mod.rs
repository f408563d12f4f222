/*!
Vital Product Data pages.

Every page number (and, for pages B0h..BFh, peripheral device type) resolves to one row of the [`PAGES`](constant.PAGES.html) table, which names the page and picks the decoder. Pages that are not in the table still decode: 01h..7Fh as ASCII information, everything else as a hex dump.

## Example

```
use inq::scsi::data::vpd;

// Block Device Characteristics of a SSD
let mut page = vec![0u8; 64];
page[1] = 0xb1;
page[3] = 0x3c;
page[5] = 1; // non-rotating medium

let rep = vpd::decode(0xb1, &page, &Default::default()).unwrap();
assert_eq!(rep.lines[0], "VPD INQUIRY: Block device characteristics (SBC) page");
assert_eq!(rep.get("medium_rotation_rate").and_then(|v| v.as_int()), Some(1));
```
*/

pub mod device_id;
mod pages;

use crate::reader::{self, Reader};
use crate::report::{Report, Value};
use crate::scsi::{PdtClass, PDT_MASK, classify_pdt, decay_pdt};
use super::export::{encode_whitespaces, udev_escape};

quick_error! {
	#[derive(Debug, Clone, PartialEq)]
	pub enum Error {
		Truncated(what: &'static str, len: usize, need: usize) {
			display("{} too short: got {} byte(s), need {}", what, len, need)
		}
		PageNotSupported(page: u8) {
			display("VPD page 0x{:02x} is not in the supported VPD pages list, use force to override", page)
		}
		Reader(err: reader::Error) {
			from()
			display("{}", err)
			cause(err)
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The request itself is not valid for this device
	IllegalField,
	/// The response is malformed or truncated
	Malformed,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match *self {
			Error::PageNotSupported(_) => ErrorKind::IllegalField,
			Error::Truncated(..) | Error::Reader(_) => ErrorKind::Malformed,
		}
	}
}

/// Device types a page layout applies to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applies {
	All,
	Classes(&'static [PdtClass]),
}

const SBC: Applies = Applies::Classes(&[PdtClass::Disk, PdtClass::Optical]);
const SSC: Applies = Applies::Classes(&[PdtClass::Tape]);
const OSD: Applies = Applies::Classes(&[PdtClass::Osd]);
const ADC: Applies = Applies::Classes(&[PdtClass::Adc]);

impl Applies {
	fn contains(&self, class: PdtClass) -> bool {
		match *self {
			Applies::All => false,
			Applies::Classes(classes) => classes.contains(&class),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
	SupportedPages,
	AsciiInfo,
	SerialNumber,
	DeviceId,
	SoftwareInterface,
	ManagementNetwork,
	ExtendedInquiry,
	ModePagePolicy,
	ScsiPorts,
	ThirdPartyCopy,
	AtaInfo,
	PowerCondition,
	FeatureSets,
	BlockLimits,
	SequentialAccess,
	BlockCharacteristics,
	ManufacturerSerial,
	Provisioning,
	Referrals,
	AutomationSerial,
	Nicr,
	Hex,
}

#[derive(Debug)]
pub struct PageInfo {
	pub page: u8,
	pub applies: Applies,
	pub acronym: &'static str,
	pub name: &'static str,
	pub decoder: Decoder,
}

macro_rules! page {
	($page:expr, $applies:expr, $acronym:expr, $name:expr, $decoder:ident) => {
		PageInfo { page: $page, applies: $applies, acronym: $acronym, name: $name, decoder: Decoder::$decoder }
	};
}

/// Known VPD pages, sorted by page number
pub const PAGES: &[PageInfo] = &[
	page!(0x00, Applies::All, "sv", "Supported VPD pages", SupportedPages),
	page!(0x80, Applies::All, "sn", "Unit serial number", SerialNumber),
	page!(0x83, Applies::All, "di", "Device identification", DeviceId),
	page!(0x84, Applies::All, "sii", "Software interface identification", SoftwareInterface),
	page!(0x85, Applies::All, "mna", "Management network addresses", ManagementNetwork),
	page!(0x86, Applies::All, "ei", "Extended inquiry data", ExtendedInquiry),
	page!(0x87, Applies::All, "mpp", "Mode page policy", ModePagePolicy),
	page!(0x88, Applies::All, "sp", "SCSI ports", ScsiPorts),
	page!(0x89, Applies::All, "ai", "ATA information (SAT)", AtaInfo),
	page!(0x8a, Applies::All, "po", "Power condition", PowerCondition),
	page!(0x8b, Applies::All, "dc", "Device constituents", Hex),
	page!(0x8c, Applies::All, "cfa", "CFA profile information", Hex),
	page!(0x8d, Applies::All, "psm", "Power consumption", Hex),
	page!(0x8f, Applies::All, "tpc", "Third party copy", ThirdPartyCopy),
	page!(0x90, Applies::All, "pslu", "Protocol-specific logical unit information", Hex),
	page!(0x91, Applies::All, "pspo", "Protocol-specific port information", Hex),
	page!(0x92, Applies::All, "sfs", "SCSI Feature sets", FeatureSets),
	page!(0xb0, SBC, "bl", "Block limits (SBC)", BlockLimits),
	page!(0xb0, SSC, "sad", "Sequential access device capabilities (SSC)", SequentialAccess),
	page!(0xb0, OSD, "osdi", "OSD information", Hex),
	page!(0xb1, SBC, "bdc", "Block device characteristics (SBC)", BlockCharacteristics),
	page!(0xb1, SSC, "mas", "Manufacturer assigned serial number (SSC)", ManufacturerSerial),
	page!(0xb1, ADC, "masa", "Manufacturer assigned serial number (ADC)", ManufacturerSerial),
	page!(0xb2, SBC, "lbpv", "Logical block provisioning (SBC)", Provisioning),
	page!(0xb2, SSC, "tas", "TapeAlert supported flags (SSC)", Hex),
	page!(0xb3, SBC, "ref", "Referrals (SBC)", Referrals),
	page!(0xb3, SSC, "adsn", "Automation device serial number (SSC)", AutomationSerial),
	page!(0xb4, SBC, "sbl", "Supported block lengths and protection types (SBC)", Hex),
	page!(0xb4, SSC, "dtde", "Data transfer device element address (SSC)", Hex),
	page!(0xb5, SBC, "bdce", "Block device characteristics extension (SBC)", Hex),
	page!(0xb5, SSC, "lbpro", "Logical block protection (SSC)", Hex),
	page!(0xb6, SBC, "zbdc", "Zoned block device characteristics", Hex),
	page!(0xb7, SBC, "ble", "Block limits extension (SBC)", Hex),
	page!(0xb8, SBC, "fp", "Format presets", Hex),
	page!(0xb9, SBC, "cpr", "Concurrent positioning ranges (SBC)", Hex),
	page!(0xba, SBC, "cap", "Capacity/Product identification mapping", Hex),
	page!(0xc0, Applies::All, "upr", "Unit path report (EMC)", Hex),
	page!(0xc2, Applies::All, "rdac_vers", "RDAC software version (RDAC)", Hex),
	page!(0xc9, Applies::All, "rdac_vac", "RDAC volume access control (RDAC)", Hex),
	page!(0xde, Applies::All, "nicr", "NVMe Identify Controller Response (sg3_utils for SNT)", Nicr),
];

/**
Finds the table row for `page` as returned by a device of type `pdt`.

Below B0h, and from C0h on, the first row with matching page number wins. Pages B0h..BFh have device type specific layouts: the row for the device type class wins, then the row for the class of the type `pdt` decays to (ADC to tape, ZBC to disk), then a row that applies to all types.
*/
pub fn lookup(page: u8, pdt: u8) -> Option<&'static PageInfo> {
	let mut rows = PAGES.iter().filter(|p| p.page == page);
	if page < 0xb0 || page >= 0xc0 {
		return rows.next();
	}

	let rows: Vec<&PageInfo> = rows.collect();
	let class = classify_pdt(pdt);
	let decayed = classify_pdt(decay_pdt(pdt));

	rows.iter().find(|p| p.applies.contains(class))
		.or_else(|| rows.iter().find(|p| p.applies.contains(decayed)))
		.or_else(|| rows.iter().find(|p| p.applies == Applies::All))
		.map(|p| *p)
}

#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
	/// Content of Supported VPD Pages page (page codes only), if known
	pub supported: Option<Vec<u8>>,
	/// Decode even if `supported` does not list the page
	pub force: bool,
	/// Hex dump instead of decoding
	pub hex: bool,
	/// `KEY=value` lines instead of human-readable output (pages 80h and 83h only)
	pub export: bool,
}

/**
Decodes VPD `page` from `data`, which includes the 4-byte page header.

Truncated pages are decoded as far as possible, with a warning in [`Report::warnings`](../../../report/struct.Report.html#structfield.warnings).
*/
pub fn decode(page: u8, data: &[u8], opts: &DecodeOptions) -> Result<Report, Error> {
	if data.len() < 4 {
		return Err(Error::Truncated("VPD page", data.len(), 4));
	}
	if let Some(ref supported) = opts.supported {
		if page != 0x00 && !opts.force && !supported.contains(&page) {
			return Err(Error::PageNotSupported(page));
		}
	}

	let r = Reader::new(data);
	let pdt = data[0] & PDT_MASK;
	let info = lookup(page, pdt);
	let name = info.map(|i| i.name.to_string())
		.unwrap_or_else(|| format!("VPD page 0x{:02x}", page));

	let mut rep = Report::new();
	if data[1] != page {
		rep.warn(format!("{}: page code in response is 0x{:02x}", name, data[1]));
	}

	let declared = r.u16_be(2)? as usize + 4;
	let len = if declared > data.len() {
		rep.warn(format!("{} truncated, indicates {}, got {}", name, declared, data.len()));
		data.len()
	} else {
		declared
	};
	let r = r.sub(0, len)?;

	if opts.export && (page == 0x80 || page == 0x83) {
		rep.lines = if page == 0x80 {
			export_serial(r.rest(4)?)
		} else {
			device_id::export(r.rest(4)?)
		};
		return Ok(rep);
	}

	let decoder = match info {
		_ if opts.hex => Decoder::Hex,
		Some(info) => info.decoder,
		None if page > 0x00 && page < 0x80 => Decoder::AsciiInfo,
		None => Decoder::Hex,
	};
	debug!("VPD page 0x{:02x}, pdt 0x{:02x}: {:?}", page, pdt, decoder);

	rep.line(match info {
		Some(info) => format!("VPD INQUIRY: {} page", info.name),
		None if decoder == Decoder::AsciiInfo => format!("VPD INQUIRY: ASCII information page 0x{:02x}", page),
		None => format!("VPD INQUIRY: page=0x{:02x}", page),
	});
	rep.node("page_code", Value::Int(page as u64));
	rep.node("peripheral_qualifier", Value::Int((data[0] >> 5) as u64));
	rep.node("peripheral_device_type", Value::Int(pdt as u64));

	let result = match decoder {
		Decoder::SupportedPages => pages::supported_pages(r, pdt, &mut rep),
		Decoder::AsciiInfo => pages::ascii_info(r, &mut rep),
		Decoder::SerialNumber => pages::serial_number(r, &mut rep),
		Decoder::DeviceId => {
			device_id::decode(r.rest(4)?, &mut rep);
			Ok(())
		},
		Decoder::SoftwareInterface => pages::software_interface(r, &mut rep),
		Decoder::ManagementNetwork => pages::management_network(r, &mut rep),
		Decoder::ExtendedInquiry => pages::extended_inquiry(r, &mut rep),
		Decoder::ModePagePolicy => pages::mode_page_policy(r, &mut rep),
		Decoder::ScsiPorts => pages::scsi_ports(r, &mut rep),
		Decoder::ThirdPartyCopy => pages::third_party_copy(r, &mut rep),
		Decoder::AtaInfo => pages::ata_info(r, &mut rep),
		Decoder::PowerCondition => pages::power_condition(r, &mut rep),
		Decoder::FeatureSets => pages::feature_sets(r, &mut rep),
		Decoder::BlockLimits => pages::block_limits(r, &mut rep),
		Decoder::SequentialAccess => pages::sequential_access(r, &mut rep),
		Decoder::BlockCharacteristics => pages::block_characteristics(r, &mut rep),
		Decoder::ManufacturerSerial => pages::ascii_tail(r, "Manufacturer-assigned serial number", "manufacturer_assigned_serial_number", &mut rep),
		Decoder::Provisioning => pages::provisioning(r, &mut rep),
		Decoder::Referrals => pages::referrals(r, &mut rep),
		Decoder::AutomationSerial => pages::ascii_tail(r, "Automation device serial number", "automation_device_serial_number", &mut rep),
		Decoder::Nicr => pages::nicr(r, &mut rep),
		Decoder::Hex => {
			pages::hex(r, &mut rep);
			Ok(())
		},
	};
	if let Err(err) = result {
		rep.warn(format!("{}: {}", name, err));
	}

	Ok(rep)
}

/// `SCSI_IDENT_SERIAL=` line for Unit Serial Number page content (without the header)
pub fn export_serial(serial: &[u8]) -> Vec<String> {
	let enc = encode_whitespaces(serial);
	if enc.is_empty() {
		vec![]
	} else {
		vec![format!("SCSI_IDENT_SERIAL={}", udev_escape(&enc))]
	}
}
