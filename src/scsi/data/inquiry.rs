/*!
Standard INQUIRY data (SPC-5, 6.7.2).

## Example

```
use inq::scsi::data::inquiry;

let mut data = vec![0u8; 36];
data[2] = 0x06; // SPC-4
data[4] = 31;
data[8..16].copy_from_slice(b"SEAGATE ");
data[16..32].copy_from_slice(b"ST4000NM0023    ");
data[32..36].copy_from_slice(b"0004");

let inq = inquiry::parse(&data).unwrap();
assert_eq!(inq.vendor_id.as_ref().map(|s| s.as_str()), Some("SEAGATE"));
assert_eq!(inquiry::export(&inq)[2], "SCSI_VENDOR=SEAGATE");
```
*/

use crate::reader::{Reader, is_set, ascii};
use crate::report::{Report, Value};
use crate::scsi::pdt_name;
use super::export::{encode_whitespaces, encode_string};
use super::vpd::Error;

/// Responses are expected to be at least this long since SCSI-2
pub const COMMON_RESP_LEN: usize = 36;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serializable", derive(Serialize))]
pub struct Inquiry {
	/// Peripheral Qualifier
	pub qualifier: u8,
	/// Peripheral Device Type
	pub pdt: u8,
	pub device_type: &'static str,
	/// RMB
	pub removable: bool,
	/// LU_CONG: logical unit is a member of a conglomerate
	pub lu_cong: bool,
	pub hot_pluggable: u8,
	pub version: u8,
	pub aerc: bool, // obsolete
	pub trmtsk: bool, // obsolete
	/// Normal ACA bit support, see SAM-5
	pub naca: bool,
	/// Hierarchical addressing support
	pub hisup: bool,
	pub response_format: u8,
	/// Storage array controller component support
	pub sccs: bool,
	/// Access controls coordinator
	pub acc: bool,
	/// Target Port Group Support
	pub tpgs: u8,
	/// Third-party copy commands support
	pub tpc: bool,
	pub protect: bool,
	pub bque: bool, // obsolete
	pub enc_serv: bool,
	pub vs: bool,
	pub multi_port: bool,
	pub media_changer: bool, // obsolete
	pub ackreqq: bool, // obsolete
	pub addr16: bool,
	pub rel_adr: bool, // obsolete
	pub wbus16: bool,
	pub sync: bool,
	pub linked: bool, // obsolete
	pub tran_dis: bool, // obsolete
	pub cmd_que: bool,
	/// Byte 56 (SPI-specific clocking, QAS, IUS), if present
	pub spi: Option<u8>,

	pub vendor_id: Option<String>,
	pub product_id: Option<String>,
	pub product_rev: Option<String>,
	pub version_descriptors: Vec<u16>,

	/// Response length as indicated by the device
	pub length: usize,
	/// Bytes actually available
	pub available: usize,

	#[cfg_attr(feature = "serializable", serde(skip))]
	raw: Vec<u8>,
}

/// Parses standard INQUIRY response; fields beyond response length (or beyond available data) are omitted.
pub fn parse(data: &[u8]) -> Result<Inquiry, Error> {
	if data.len() < 8 {
		return Err(Error::Truncated("standard INQUIRY response", data.len(), 8));
	}
	let r = Reader::new(data);

	let rsp_len = if data[4] > 0 {
		data[4] as usize + 5
	} else if data.len() >= COMMON_RESP_LEN {
		debug!("malformed additional length, assuming {} bytes", COMMON_RESP_LEN);
		COMMON_RESP_LEN
	} else {
		5
	};
	let len = rsp_len.min(data.len());
	let r = r.sub(0, len)?;

	let text = |off: usize, n: usize| if len > off { r.bytes(off, n.min(len - off)).ok().map(ascii) } else { None };

	let mut version_descriptors = vec![];
	let mut off = 58;
	while version_descriptors.len() < 8 {
		match r.u16_be(off) {
			Ok(0) | Err(_) => break,
			Ok(v) => version_descriptors.push(v),
		}
		off += 2;
	}

	let pdt = data[0] & 0x1f;
	Ok(Inquiry {
		qualifier: (data[0] & 0b1110_0000) >> 5,
		pdt,
		device_type: pdt_name(pdt),
		removable: is_set(data[1], 7),
		lu_cong: is_set(data[1], 6),
		hot_pluggable: (data[1] >> 4) & 0b11,
		version: data[2],
		aerc: is_set(data[3], 7),
		trmtsk: is_set(data[3], 6),
		naca: is_set(data[3], 5),
		hisup: is_set(data[3], 4),
		response_format: data[3] & 0xf,
		sccs: is_set(data[5], 7),
		acc: is_set(data[5], 6),
		tpgs: (data[5] & 0b0011_0000) >> 4,
		tpc: is_set(data[5], 3),
		protect: is_set(data[5], 0),
		bque: is_set(data[6], 7),
		enc_serv: is_set(data[6], 6),
		vs: is_set(data[6], 5),
		multi_port: is_set(data[6], 4),
		media_changer: is_set(data[6], 3),
		ackreqq: is_set(data[6], 2),
		addr16: is_set(data[6], 0),
		rel_adr: is_set(data[7], 7),
		wbus16: is_set(data[7], 5),
		sync: is_set(data[7], 4),
		linked: is_set(data[7], 3),
		tran_dis: is_set(data[7], 2),
		cmd_que: is_set(data[7], 1),
		spi: if len > 56 { r.u8(56).ok() } else { None },

		// tabs in vendor id are seen in the wild
		vendor_id: text(8, 8).map(|s| s.replace('\t', " ")),
		product_id: text(16, 16),
		product_rev: text(32, 4),
		version_descriptors,

		length: rsp_len,
		available: data.len(),
		raw: r.data().to_vec(),
	})
}

pub fn ansi_version_name(version: u8) -> &'static str {
	match version & 0xf {
		0 => "no conformance claimed",
		1 => "SCSI-1",
		2 => "SCSI-2",
		3 => "SPC",
		4 => "SPC-2",
		5 => "SPC-3",
		6 => "SPC-4",
		7 => "SPC-5",
		0xd => "SPC-6",
		_ => "reserved version code",
	}
}

pub fn version_descriptor_name(code: u16) -> Option<&'static str> {
	Some(match code {
		0x0060 => "SAM (no version claimed)",
		0x00c0 => "SAM-6 (no version claimed)",
		0x00c2 => "SAM-6 INCITS 546-2021",
		0x0260 => "SPC-2 (no version claimed)",
		0x0300 => "SPC-3 (no version claimed)",
		0x0460 => "SPC-4 (no version claimed)",
		0x05c0 => "SPC-5 (no version claimed)",
		0x05c2 => "SPC-5 INCITS 502-2019",
		0x0320 => "SBC-2 (no version claimed)",
		0x04c0 => "SBC-3 (no version claimed)",
		0x0600 => "SBC-4 (no version claimed)",
		0x0602 => "SBC-4 INCITS 506-2021",
		0x0680 => "SES-4 (no version claimed)",
		0x0682 => "SES-4 INCITS 555-2020",
		0x0c00 => "SAS (no version claimed)",
		0x1ea0 => "SAT (no version claimed)",
		0x1f60 => "SNT (no version claimed)",
		_ => return None,
	})
}

pub fn decode(inq: &Inquiry) -> Report {
	let mut rep = Report::new();
	let b = |x: bool| if x { 1 } else { 0 };

	rep.line(match inq.qualifier {
		0 => "standard INQUIRY:".to_string(),
		1 => "standard INQUIRY: [PQ indicates LU temporarily unavailable]".to_string(),
		3 => "standard INQUIRY: [PQ indicates LU not accessible via this port]".to_string(),
		q => format!("standard INQUIRY: [reserved or vendor specific qualifier [{}]]", q),
	});

	rep.flags("  ", &[
		("PQual", "peripheral_qualifier", inq.qualifier as u64),
		("PDT", "peripheral_device_type", inq.pdt as u64),
		("RMB", "rmb", b(inq.removable)),
		("LU_CONG", "lu_cong", b(inq.lu_cong)),
		("hot_pluggable", "hot_pluggable", inq.hot_pluggable as u64),
	]);
	rep.field(
		format!("  version=0x{:02x}  [{}]", inq.version, ansi_version_name(inq.version)),
		"version", Value::Int(inq.version as u64),
	);
	rep.flags("  ", &[
		("AERC", "aerc", b(inq.aerc)),
		("TrmTsk", "trmtsk", b(inq.trmtsk)),
		("NormACA", "normaca", b(inq.naca)),
		("HiSUP", "hisup", b(inq.hisup)),
		("Resp_data_format", "response_data_format", inq.response_format as u64),
	]);
	rep.flags("  ", &[
		("SCCS", "sccs", b(inq.sccs)),
		("ACC", "acc", b(inq.acc)),
		("TPGS", "tpgs", inq.tpgs as u64),
		("3PC", "3pc", b(inq.tpc)),
		("Protect", "protect", b(inq.protect)),
		("BQue", "bque", b(inq.bque)),
	]);
	rep.flags("  ", &[
		("EncServ", "encserv", b(inq.enc_serv)),
		("MultiP", "multip", b(inq.multi_port)),
		("VS", "vs", b(inq.vs)),
		("MChngr", "mchngr", b(inq.media_changer)),
		("ACKREQQ", "ackreqq", b(inq.ackreqq)),
		("Addr16", "addr16", b(inq.addr16)),
	]);
	rep.flags("  ", &[
		("RelAdr", "reladr", b(inq.rel_adr)),
		("WBus16", "wbus16", b(inq.wbus16)),
		("Sync", "sync", b(inq.sync)),
		("Linked", "linked", b(inq.linked)),
		("TranDis", "trandis", b(inq.tran_dis)),
		("CmdQue", "cmdque", b(inq.cmd_que)),
	]);
	if let Some(spi) = inq.spi {
		rep.flags("  SPI: ", &[
			("Clocking", "clocking", ((spi & 0x0c) >> 2) as u64),
			("QAS", "qas", b(is_set(spi, 1))),
			("IUS", "ius", b(is_set(spi, 0))),
		]);
	}

	let len = inq.length.min(inq.available);
	if inq.available >= inq.length {
		rep.line(format!("    length={} (0x{:x})", len, len));
	} else {
		rep.line(format!("    length={} (0x{:x}), but only fetched {} bytes", inq.length, inq.length, inq.available));
	}
	if inq.version & 0xf >= 2 && len < COMMON_RESP_LEN {
		rep.line("  [for SCSI>=2, len>=36 is expected]");
	}
	rep.field(format!("   Peripheral device type: {}", inq.device_type), "peripheral_device_type_name", Value::Str(inq.device_type.to_string()));

	match inq.vendor_id {
		None => rep.line(format!(" Inquiry response length={}, no vendor, product or revision data", len)),
		Some(ref vendor) => {
			rep.field(format!("  Vendor identification: {}", vendor), "vendor_identification", Value::Str(vendor.clone()));
			let product = inq.product_id.clone().unwrap_or_else(|| "<none>".to_string());
			rep.field(format!("  Product identification: {}", product), "product_identification", Value::Str(product));
			let rev = inq.product_rev.clone().unwrap_or_else(|| "<none>".to_string());
			rep.field(format!("  Product revision level: {}", rev), "product_revision_level", Value::Str(rev));
		},
	}

	if inq.version_descriptors.is_empty() {
		rep.line("  No version descriptors available");
	} else {
		rep.line("  Version descriptors:");
		let mut items = vec![];
		for &code in &inq.version_descriptors {
			match version_descriptor_name(code) {
				Some(name) => rep.line(format!("    {}", name)),
				None => rep.line(format!("    [unrecognised version descriptor code: 0x{:x}]", code)),
			}
			items.push(Value::Int(code as u64));
		}
		rep.node("version_descriptor_list", Value::Array(items));
	}

	rep
}

/// `KEY=value` lines for udev (`SCSI_TPGS`, `SCSI_TYPE`, `SCSI_VENDOR` etc.)
pub fn export(inq: &Inquiry) -> Vec<String> {
	let mut lines = vec![
		format!("SCSI_TPGS={}", inq.tpgs),
		format!("SCSI_TYPE={}", inq.device_type),
	];
	let raw = &inq.raw;

	if raw.len() > 8 {
		let vendor: Vec<u8> = raw[8 .. raw.len().min(16)].iter()
			.map(|&c| if c == b'\t' { b' ' } else { c })
			.collect();
		let enc = encode_whitespaces(&vendor);
		if !enc.is_empty() {
			lines.push(format!("SCSI_VENDOR={}", String::from_utf8_lossy(&enc)));
			lines.push(format!("SCSI_VENDOR_ENC={}", encode_string(&raw[8 .. raw.len().min(16)])));
		}
	}
	if raw.len() > 16 {
		let model = &raw[16 .. raw.len().min(32)];
		let enc = encode_whitespaces(model);
		if !enc.is_empty() {
			lines.push(format!("SCSI_MODEL={}", String::from_utf8_lossy(&enc)));
			lines.push(format!("SCSI_MODEL_ENC={}", encode_string(model)));
		}
	}
	if raw.len() > 32 {
		let enc = encode_whitespaces(&raw[32 .. raw.len().min(36)]);
		if !enc.is_empty() {
			lines.push(format!("SCSI_REVISION={}", String::from_utf8_lossy(&enc)));
		}
	}

	lines
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Vec<u8> {
		let mut data = vec![0u8; 74];
		data[0] = 0x00;
		data[2] = 0x07;
		data[3] = 0x02;
		data[4] = 69;
		data[6] = 0x10; // MultiP
		data[7] = 0x02; // CmdQue
		data[8..16].copy_from_slice(b"NVMe    ");
		data[16..32].copy_from_slice(b"INTEL SSDPE2KX01");
		data[32..36].copy_from_slice(b"0131");
		data[58..60].copy_from_slice(&[0x00, 0xc2]);
		data[60..62].copy_from_slice(&[0x05, 0xc2]);
		data
	}

	#[test]
	fn fields() {
		let inq = parse(&sample()).unwrap();
		assert_eq!(inq.length, 74);
		assert_eq!(inq.version, 7);
		assert!(inq.multi_port);
		assert!(inq.cmd_que);
		assert!(!inq.removable);
		assert_eq!(inq.spi, Some(0));
		assert_eq!(inq.product_id.as_ref().unwrap(), "INTEL SSDPE2KX01");
		assert_eq!(inq.version_descriptors, vec![0x00c2, 0x05c2]);
	}

	#[test]
	fn text() {
		let rep = decode(&parse(&sample()).unwrap());
		assert_eq!(rep.lines[0], "standard INQUIRY:");
		assert_eq!(rep.lines[1], "  PQual=0  PDT=0  RMB=0  LU_CONG=0  hot_pluggable=0");
		assert!(rep.lines.contains(&"  version=0x07  [SPC-5]".to_string()));
		assert!(rep.lines.contains(&"    SPC-5 INCITS 502-2019".to_string()));
		assert_eq!(rep.get("cmdque"), Some(&Value::Int(1)));
	}

	#[test]
	fn short_response() {
		let mut data = sample();
		data[4] = 3; // 8 bytes
		let inq = parse(&data).unwrap();
		assert_eq!(inq.vendor_id, None);
		assert!(inq.version_descriptors.is_empty());
		assert_eq!(export(&inq), vec!["SCSI_TPGS=0", "SCSI_TYPE=disk"]);

		assert!(parse(&data[..7]).is_err());
	}

	#[test]
	fn zero_additional_length() {
		let mut data = sample();
		data[4] = 0;
		assert_eq!(parse(&data).unwrap().length, COMMON_RESP_LEN);
	}

	#[test]
	fn export_lines() {
		let lines = export(&parse(&sample()).unwrap());
		assert_eq!(lines, vec![
			"SCSI_TPGS=0",
			"SCSI_TYPE=disk",
			"SCSI_VENDOR=NVMe",
			"SCSI_VENDOR_ENC=NVMe\\x20\\x20\\x20\\x20",
			"SCSI_MODEL=INTEL_SSDPE2KX01",
			"SCSI_MODEL_ENC=INTEL\\x20SSDPE2KX01",
			"SCSI_REVISION=0131",
		]);
	}
}
