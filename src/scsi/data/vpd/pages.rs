use crate::reader::{Reader, Error, is_set, ascii};
use crate::report::{Report, Value};
use crate::utils::{hexdump, hex_string};
use crate::ata;
use crate::nvme::IdentifyController;
use crate::scsi::data::export::encode_unicode;
use super::{device_id, lookup};

fn b(x: bool) -> u64 { if x { 1 } else { 0 } }

fn hex_lines(rep: &mut Report, data: &[u8]) {
	for line in hexdump(data).lines() {
		rep.line(line.to_string());
	}
}

pub fn hex(r: Reader, rep: &mut Report) {
	hex_lines(rep, r.data());
	rep.node("hex", Value::Bytes(r.data().to_vec()));
}

pub fn supported_pages(r: Reader, pdt: u8, rep: &mut Report) -> Result<(), Error> {
	rep.line("   Supported VPD pages:");
	for &page in r.rest(4)? {
		let info = lookup(page, pdt);
		let mut item = Report::new();
		match info {
			Some(info) => item.line(format!("     0x{:x}\t{}", page, info.name)),
			None => item.line(format!("     0x{:x}", page)),
		}
		item.node("i", Value::Int(page as u64));
		item.node("name", Value::Str(info.map_or("unknown", |i| i.name).to_string()));
		item.node("acronym", Value::Str(info.map_or("unknown", |i| i.acronym).to_string()));
		rep.push("supported_vpd_page_list", item);
	}
	Ok(())
}

/// Pages 01h..7Fh: NUL-terminated ASCII strings, optionally followed by vendor specific data
pub fn ascii_info(r: Reader, rep: &mut Report) -> Result<(), Error> {
	if r.len() == 4 {
		return Ok(());
	}
	let mut al = r.u8(4)? as usize;
	if al + 5 > r.len() {
		al = r.len() - 5;
	}

	let mut strings = vec![];
	for s in r.bytes(5, al)?.split(|&c| c == 0) {
		if !s.is_empty() {
			strings.push(String::from_utf8_lossy(s).into_owned());
		}
	}
	for s in &strings {
		rep.line(format!("  {}", s));
	}
	rep.node("ascii_information", Value::Array(strings.into_iter().map(Value::Str).collect()));

	let vendor = r.rest(5 + al)?;
	if !vendor.is_empty() {
		rep.line("Vendor specific information in hex:");
		hex_lines(rep, vendor);
		rep.node("vendor_specific", Value::Bytes(vendor.to_vec()));
	}
	Ok(())
}

pub fn serial_number(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let serial = encode_unicode(r.rest(4)?);
	let serial = serial.trim_end();
	if !serial.is_empty() {
		rep.field(format!("  Unit serial number: {}", serial), "unit_serial_number", Value::Str(serial.to_string()));
	}
	Ok(())
}

/// Page 84h
pub fn software_interface(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let mut ids = vec![];
	for chunk in r.rest(4)?.chunks(6) {
		if chunk.len() < 6 {
			rep.warn(format!("Software interface identification: {} trailing byte(s)", chunk.len()));
			break;
		}
		let id = chunk.iter().fold(0u64, |acc, &x| (acc << 8) | x as u64);
		rep.line(format!("    IEEE identifier: 0x{:012x}", id));
		ids.push(Value::Int(id));
	}
	rep.node("software_interface_identifier_list", Value::Array(ids));
	Ok(())
}

fn network_service(x: u8) -> &'static str {
	match x {
		0 => "unspecified",
		1 => "storage configuration service",
		2 => "diagnostics",
		3 => "status",
		4 => "logging",
		5 => "code download",
		6 => "copy service",
		7 => "administrative configuration service",
		_ => "reserved",
	}
}

fn association_name(x: u8) -> &'static str {
	match x & 0b11 {
		0 => "Addressed logical unit",
		1 => "Target port",
		2 => "Target device that contains addressed lu",
		_ => "Reserved [0x3]",
	}
}

/// Page 85h
pub fn management_network(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let len = r.len();
	let mut off = 4;
	while off < len {
		let flags = r.u8(off)?;
		let na_len = r.u16_be(off + 2)? as usize;
		if off + 4 + na_len > len {
			rep.warn(format!("Management network addresses: short descriptor length={}, left={}", na_len + 4, len - off));
			break;
		}
		let assoc = (flags >> 5) & 0b11;
		let service = flags & 0x1f;
		let address = ascii(r.bytes(off + 4, na_len)?);

		let mut item = Report::new();
		item.line(format!("  {}, Service type: {}", association_name(assoc), network_service(service)));
		item.line(format!("    {}", address));
		item.node("association", Value::Int(assoc as u64));
		item.node("service_type", Value::Int(service as u64));
		item.node("network_address", Value::Str(address));
		rep.push("network_services_descriptor_list", item);

		off += 4 + na_len;
	}
	Ok(())
}

/// Page 86h
pub fn extended_inquiry(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let b4 = r.u8(4)?;
	let b5 = r.u8(5)?;
	let b6 = r.u8(6)?;
	let b7 = r.u8(7)?;
	rep.flags("  ", &[
		("ACTIVATE_MICROCODE", "activate_microcode", (b4 >> 6) as u64),
		("SPT", "spt", ((b4 >> 3) & 0b111) as u64),
		("GRD_CHK", "grd_chk", b(is_set(b4, 2))),
		("APP_CHK", "app_chk", b(is_set(b4, 1))),
		("REF_CHK", "ref_chk", b(is_set(b4, 0))),
	]);
	rep.flags("  ", &[
		("UASK_SUP", "uask_sup", b(is_set(b5, 5))),
		("GROUP_SUP", "group_sup", b(is_set(b5, 4))),
		("PRIOR_SUP", "prior_sup", b(is_set(b5, 3))),
		("HEADSUP", "headsup", b(is_set(b5, 2))),
		("ORDSUP", "ordsup", b(is_set(b5, 1))),
		("SIMPSUP", "simpsup", b(is_set(b5, 0))),
	]);
	rep.flags("  ", &[
		("WU_SUP", "wu_sup", b(is_set(b6, 3))),
		("CRD_SUP", "crd_sup", b(is_set(b6, 2))),
		("NV_SUP", "nv_sup", b(is_set(b6, 1))),
		("V_SUP", "v_sup", b(is_set(b6, 0))),
	]);
	rep.flags("  ", &[
		("NO_PI_CHK", "no_pi_chk", b(is_set(b7, 5))),
		("P_I_I_SUP", "p_i_i_sup", b(is_set(b7, 4))),
		("LUICLR", "luiclr", b(is_set(b7, 0))),
	]);

	// the rest came with SPC-4
	if r.len() < 19 {
		return Ok(());
	}
	let b8 = r.u8(8)?;
	rep.flags("  ", &[
		("LU_COLL_TYPE", "lu_coll_type", (b8 >> 5) as u64),
		("R_SUP", "r_sup", b(is_set(b8, 4))),
		("RTD_SUP", "rtd_sup", b(is_set(b8, 3))),
		("HSSRELEF", "hssrelef", b(is_set(b8, 1))),
		("CBCS", "cbcs", b(is_set(b8, 0))),
	]);
	rep.flags("  ", &[
		("Multi I_T nexus microcode download", "multi_i_t_nexus_microcode_download", (r.u8(9)? & 0xf) as u64),
	]);
	rep.flags("  ", &[
		("Extended self-test completion minutes", "extended_self_test_completion_minutes", r.u16_be(10)? as u64),
	]);
	let b12 = r.u8(12)?;
	rep.flags("  ", &[
		("POA_SUP", "poa_sup", b(is_set(b12, 7))),
		("HRA_SUP", "hra_sup", b(is_set(b12, 6))),
		("VSA_SUP", "vsa_sup", b(is_set(b12, 5))),
		("DMS_VALID", "dms_valid", b(is_set(b12, 4))),
	]);
	rep.flags("  ", &[
		("Maximum supported sense data length", "maximum_supported_sense_data_length", r.u8(13)? as u64),
	]);
	let b14 = r.u8(14)?;
	rep.flags("  ", &[
		("IBS", "ibs", b(is_set(b14, 7))),
		("IAS", "ias", b(is_set(b14, 6))),
		("SAC", "sac", b(is_set(b14, 2))),
		("NRD1", "nrd1", b(is_set(b14, 1))),
		("NRD0", "nrd0", b(is_set(b14, 0))),
	]);
	rep.flags("  ", &[
		("Maximum inquiry change logs", "maximum_inquiry_change_logs", r.u16_be(15)? as u64),
		("Maximum mode page change logs", "maximum_mode_page_change_logs", r.u16_be(17)? as u64),
	]);
	Ok(())
}

fn mode_page_policy_name(x: u8) -> &'static str {
	match x & 0b11 {
		0 => "shared",
		1 => "per target port",
		2 => "obsolete",
		_ => "per I_T nexus",
	}
}

/// Page 87h
pub fn mode_page_policy(r: Reader, rep: &mut Report) -> Result<(), Error> {
	for desc in r.rest(4)?.chunks(4) {
		if desc.len() < 4 {
			rep.warn(format!("Mode page policy: {} trailing byte(s)", desc.len()));
			break;
		}
		let page = desc[0] & 0x3f;
		let subpage = desc[1];
		let mlus = is_set(desc[2], 7);
		let policy = desc[2] & 0b11;

		let mut item = Report::new();
		if page == 0x3f && subpage == 0xff {
			item.line("  Policy page code: 0x3f and subpage code: 0xff (apply to all)");
		} else {
			item.line(format!("  Policy page code: 0x{:x}, subpage code: 0x{:x}", page, subpage));
		}
		item.line(format!("    MLUS={},  Policy: {}", b(mlus), mode_page_policy_name(policy)));
		item.node("policy_page_code", Value::Int(page as u64));
		item.node("policy_subpage_code", Value::Int(subpage as u64));
		item.node("mlus", Value::Bool(mlus));
		item.node("mode_page_policy", Value::Int(policy as u64));
		rep.push("mode_page_policy_descriptor_list", item);
	}
	Ok(())
}

/// Page 88h
pub fn scsi_ports(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let ports = r.sub(4, r.len() - 4)?;
	let len = ports.len();
	let mut k = 0;
	while k < len {
		let mut item = Report::new();
		let rel_port = ports.u16_be(k + 2)?;
		item.field(format!("Relative port={}", rel_port), "relative_port", Value::Int(rel_port as u64));

		let ip_tid_len = ports.u16_be(k + 6)? as usize;
		let mut bump = 8 + ip_tid_len;
		if k + bump > len {
			rep.push("scsi_ports_descriptor_list", item);
			rep.warn(format!("SCSI ports VPD page, short descriptor length={}, left={}", bump, len - k));
			return Ok(());
		}
		if ip_tid_len > 0 {
			let tid = ports.bytes(k + 8, ip_tid_len)?;
			item.line(" Initiator port transport id:");
			hex_lines(&mut item, tid);
			item.node("initiator_port_transport_id", Value::Bytes(tid.to_vec()));
		}

		let tpd_len = ports.u16_be(k + bump + 2)? as usize;
		if k + bump + tpd_len + 4 > len {
			rep.push("scsi_ports_descriptor_list", item);
			rep.warn(format!("SCSI ports VPD page, short descriptor(tgt) length={}, left={}", bump, len - k));
			return Ok(());
		}
		if tpd_len > 0 {
			item.line(" Target port descriptor(s):");
			device_id::decode(ports.bytes(k + bump + 4, tpd_len)?, &mut item);
		}
		bump += tpd_len + 4;

		rep.push("scsi_ports_descriptor_list", item);
		k += bump;
	}
	Ok(())
}

fn tpc_descriptor_name(code: u16) -> &'static str {
	match code {
		0x0000 => "Block Device ROD Limits",
		0x0001 => "Supported Commands",
		0x0004 => "Parameter Data",
		0x0008 => "Supported Descriptors",
		0x000c => "Supported CSCD Descriptor IDs",
		0x000d => "Copy Group Identifier",
		0x0106 => "ROD Token Features",
		0x0108 => "Supported ROD Token and ROD Types",
		0x8001 => "General Copy Operations",
		0x9101 => "Stream Copy Operations",
		0xc001 => "Held Data",
		_ => "Unknown",
	}
}

fn block_device_rod_limits(d: Reader, item: &mut Report) -> Result<(), Error> {
	let max_ranges = d.u16_be(10)?;
	item.field(format!("  Maximum range descriptors: {}", max_ranges), "maximum_range_descriptors", Value::Int(max_ranges as u64));
	let max_timeout = d.u32_be(12)?;
	item.field(format!("  Maximum inactivity timeout: {} seconds", max_timeout), "maximum_inactivity_timeout", Value::Int(max_timeout as u64));
	let def_timeout = d.u32_be(16)?;
	item.field(format!("  Default inactivity timeout: {} seconds", def_timeout), "default_inactivity_timeout", Value::Int(def_timeout as u64));
	zero_as_not_reported(item, "Maximum token transfer size", "maximum_token_transfer_size", d.u64_be(20)?, "blocks");
	zero_as_not_reported(item, "Optimal transfer count", "optimal_transfer_count", d.u64_be(28)?, "blocks");
	Ok(())
}

/// Page 8Fh: a list of third-party copy descriptors, `{type, length, body}` each
pub fn third_party_copy(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let descs = r.sub(4, r.len() - 4)?;
	let len = descs.len();
	let mut k = 0;
	while k < len {
		if k + 4 > len {
			rep.warn(format!("Third-party copy VPD page, short descriptor header, left={}", len - k));
			break;
		}
		let code = descs.u16_be(k)?;
		let desc_len = descs.u16_be(k + 2)? as usize;
		if k + 4 + desc_len > len {
			rep.warn(format!("Third-party copy VPD page, short descriptor length={}, left={}", desc_len + 4, len - k));
			break;
		}
		let desc = descs.sub(k, 4 + desc_len)?;

		let mut item = Report::new();
		item.line(format!(" {} [0x{:04x}]:", tpc_descriptor_name(code), code));
		item.node("third_party_copy_descriptor_type", Value::Int(code as u64));
		item.node("third_party_copy_descriptor_length", Value::Int(desc_len as u64));
		match code {
			0x0000 if desc_len >= 32 => block_device_rod_limits(desc, &mut item)?,
			_ => {
				let body = desc.rest(4)?;
				hex_lines(&mut item, body);
				item.node("descriptor_data", Value::Bytes(body.to_vec()));
			},
		}
		rep.push("third_party_copy_descriptor_list", item);

		k += 4 + desc_len;
	}
	Ok(())
}

/// Page 89h, SAT-5, 10.3.2
pub fn ata_info(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let vendor = r.ascii(8, 8)?;
	let product = r.ascii(16, 16)?;
	let rev = r.ascii(32, 4)?;
	rep.field(format!("  SAT Vendor identification: {}", vendor), "t10_vendor_identification", Value::Str(vendor));
	rep.field(format!("  SAT Product identification: {}", product), "product_identification", Value::Str(product));
	rep.field(format!("  SAT Product revision level: {}", rev), "product_revision_level", Value::Str(rev));

	let signature = r.bytes(36, 20)?;
	rep.line("  ATA Device signature:");
	hex_lines(rep, signature);
	rep.node("ata_device_signature", Value::Bytes(signature.to_vec()));

	let code = r.u8(56)?;
	let cmd = match code {
		0xec => "IDENTIFY DEVICE",
		0xa1 => "IDENTIFY PACKET DEVICE",
		_ => "unknown",
	};
	rep.field(format!("  Command code: 0x{:x} ({})", code, cmd), "command_code", Value::Int(code as u64));

	let id = r.rest(60)?;
	if id.len() < ata::id::IDENTIFY_LEN {
		if !id.is_empty() {
			rep.warn(format!("ATA information: IDENTIFY data is {} bytes long, expected {}", id.len(), ata::id::IDENTIFY_LEN));
		}
		return Ok(());
	}
	let id = ata::id::parse(id)?;
	rep.line(format!("  ATA command {} response summary:", cmd));
	rep.field(format!("   model: {}", id.model), "model", Value::Str(id.model.clone()));
	rep.field(format!("   serial number: {}", id.serial), "serial_number", Value::Str(id.serial.clone()));
	rep.field(format!("   firmware revision: {}", id.firmware), "firmware_revision", Value::Str(id.firmware.clone()));
	if let Some(version) = id.ata_version {
		rep.field(format!("   ATA version: {}", version), "ata_version", Value::Str(version.to_string()));
	}
	Ok(())
}

/// Page 8Ah
pub fn power_condition(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let b4 = r.u8(4)?;
	let b5 = r.u8(5)?;
	rep.flags("  ", &[
		("Standby_y", "standby_y", b(is_set(b4, 1))),
		("Standby_z", "standby_z", b(is_set(b4, 0))),
		("Idle_c", "idle_c", b(is_set(b5, 2))),
		("Idle_b", "idle_b", b(is_set(b5, 1))),
		("Idle_a", "idle_a", b(is_set(b5, 0))),
	]);
	let timers = [
		("Stopped condition recovery time", "stopped_condition_recovery_time"),
		("Standby_z condition recovery time", "standby_z_condition_recovery_time"),
		("Standby_y condition recovery time", "standby_y_condition_recovery_time"),
		("Idle_a condition recovery time", "idle_a_condition_recovery_time"),
		("Idle_b condition recovery time", "idle_b_condition_recovery_time"),
		("Idle_c condition recovery time", "idle_c_condition_recovery_time"),
	];
	for (i, &(label, name)) in timers.iter().enumerate() {
		let ms = r.u16_be(6 + 2*i)?;
		rep.field(format!("  {} (ms): {}", label, ms), name, Value::Int(ms as u64));
	}
	Ok(())
}

fn feature_set_name(code: u16) -> &'static str {
	match code {
		0x0001 => "SPC Discovery 2016",
		0x0101 => "SBC Base 2010",
		0x0102 => "SBC Base 2016",
		0x0103 => "SBC Basic Provisioning 2016",
		0x0104 => "SBC Drive Maintenance 2016",
		_ => "unknown",
	}
}

/// Page 92h
pub fn feature_sets(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let codes = r.rest(8.min(r.len()))?;
	let mut items = vec![];
	for c in codes.chunks(2) {
		if c.len() < 2 { break; }
		let code = (c[0] as u16) << 8 | c[1] as u16;
		rep.line(format!("    {}  [0x{:x}]", feature_set_name(code), code));
		items.push(Value::Int(code as u64));
	}
	rep.node("feature_set_code_list", Value::Array(items));
	Ok(())
}

fn zero_as_not_reported(rep: &mut Report, label: &str, name: &str, value: u64, unit: &str) {
	if value == 0 {
		rep.field(format!("  {}: 0 blocks [not reported]", label), name, Value::Int(0));
	} else {
		rep.field(format!("  {}: {} {}", label, value, unit), name, Value::Int(value));
	}
}

/// Page B0h for SBC devices
pub fn block_limits(r: Reader, rep: &mut Report) -> Result<(), Error> {
	if r.len() < 16 {
		rep.warn(format!("Block limits VPD page length too short={}", r.len()));
		return Ok(());
	}
	let wsnz = is_set(r.u8(4)?, 0);
	rep.field(format!("  Write same non-zero (WSNZ): {}", b(wsnz)), "wsnz", Value::Bool(wsnz));
	let mcawl = r.u8(5)? as u64;
	if mcawl == 0 {
		rep.field("  Maximum compare and write length: 0 blocks [Command not implemented]", "maximum_compare_and_write_length", Value::Int(0));
	} else {
		rep.field(format!("  Maximum compare and write length: {} blocks", mcawl), "maximum_compare_and_write_length", Value::Int(mcawl));
	}
	zero_as_not_reported(rep, "Optimal transfer length granularity", "optimal_transfer_length_granularity", r.u16_be(6)? as u64, "blocks");
	zero_as_not_reported(rep, "Maximum transfer length", "maximum_transfer_length", r.u32_be(8)? as u64, "blocks");
	zero_as_not_reported(rep, "Optimal transfer length", "optimal_transfer_length", r.u32_be(12)? as u64, "blocks");
	if r.len() < 64 {
		// SBC-2 and early SBC-3 devices stop here
		return Ok(());
	}
	zero_as_not_reported(rep, "Maximum prefetch transfer length", "maximum_prefetch_transfer_length", r.u32_be(16)? as u64, "blocks");

	let max_unmap = r.u32_be(20)?;
	rep.field(format!("  Maximum unmap LBA count: {}", max_unmap), "maximum_unmap_lba_count", Value::Int(max_unmap as u64));
	let max_unmap_desc = r.u32_be(24)?;
	rep.field(format!("  Maximum unmap block descriptor count: {}", max_unmap_desc), "maximum_unmap_block_descriptor_count", Value::Int(max_unmap_desc as u64));
	zero_as_not_reported(rep, "Optimal unmap granularity", "optimal_unmap_granularity", r.u32_be(28)? as u64, "blocks");

	let ugavalid = is_set(r.u8(32)?, 7);
	rep.field(format!("  Unmap granularity alignment valid: {}", b(ugavalid)), "ugavalid", Value::Bool(ugavalid));
	let uga = r.u32_be(32)? & 0x7fff_ffff;
	rep.field(format!("  Unmap granularity alignment: {}", uga), "unmap_granularity_alignment", Value::Int(uga as u64));

	zero_as_not_reported(rep, "Maximum write same length", "maximum_write_same_length", r.u64_be(36)?, "blocks");
	zero_as_not_reported(rep, "Maximum atomic transfer length", "maximum_atomic_transfer_length", r.u32_be(44)? as u64, "blocks");
	let align = r.u32_be(48)?;
	rep.field(format!("  Atomic alignment: {}", align), "atomic_alignment", Value::Int(align as u64));
	let gran = r.u32_be(52)?;
	rep.field(format!("  Atomic transfer length granularity: {}", gran), "atomic_transfer_length_granularity", Value::Int(gran as u64));
	zero_as_not_reported(rep, "Maximum atomic transfer length with atomic boundary", "maximum_atomic_transfer_length_with_atomic_boundary", r.u32_be(56)? as u64, "blocks");
	zero_as_not_reported(rep, "Maximum atomic boundary size", "maximum_atomic_boundary_size", r.u32_be(60)? as u64, "blocks");
	Ok(())
}

/// Page B0h for SSC devices
pub fn sequential_access(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let b4 = r.u8(4)?;
	rep.flags("  ", &[("TSMC", "tsmc", b(is_set(b4, 1)))]);
	rep.flags("  ", &[("WORM", "worm", b(is_set(b4, 0)))]);
	Ok(())
}

fn product_type(x: u8) -> &'static str {
	match x {
		0 => "Not specified",
		1 => "CFast",
		2 => "CompactFlash",
		3 => "MemoryStick",
		4 => "MultiMediaCard",
		5 => "Secure Digital Card (SD)",
		6 => "XQD",
		7 => "Universal Flash Storage Card (UFS)",
		0xf0 ..= 0xff => "Vendor specific",
		_ => "Reserved",
	}
}

fn form_factor(x: u8) -> &'static str {
	match x & 0xf {
		0 => "not reported",
		1 => "5.25 inch",
		2 => "3.5 inch",
		3 => "2.5 inch",
		4 => "1.8 inch",
		5 => "less then 1.8 inch",
		_ => "reserved",
	}
}

fn zoned(x: u8) -> &'static str {
	match x & 0b11 {
		0 => "not reported",
		1 => "host-aware",
		2 => "host-managed or device-managed",
		_ => "reserved",
	}
}

/// Page B1h for SBC devices
pub fn block_characteristics(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let rate = r.u16_be(4)?;
	let rate_str = match rate {
		0 => "Not reported".to_string(),
		1 => "Non-rotating medium (e.g. solid state)".to_string(),
		2 ..= 0x400 | 0xffff => format!("Reserved [0x{:x}]", rate),
		rpm => format!("{} rpm", rpm),
	};
	rep.field(format!("  Nominal rotation rate: {}", rate_str), "medium_rotation_rate", Value::Int(rate as u64));

	let ptype = r.u8(6)?;
	rep.field(format!("  Product type: {}", product_type(ptype)), "product_type", Value::Int(ptype as u64));

	let b7 = r.u8(7)?;
	rep.flags("  ", &[
		("WABEREQ", "wabereq", (b7 >> 6) as u64),
		("WACEREQ", "wacereq", ((b7 >> 4) & 0b11) as u64),
	]);
	rep.field(format!("  Nominal form factor: {}", form_factor(b7)), "nominal_forn_factor", Value::Int((b7 & 0xf) as u64));

	let b8 = r.u8(8)?;
	rep.flags("  ", &[
		("MACT", "mact", b(is_set(b8, 6))),
		("FUAB", "fuab", b(is_set(b8, 1))),
		("VBULS", "vbuls", b(is_set(b8, 0))),
	]);
	rep.field(format!("  ZONED field: {}", zoned(b8 >> 4)), "zoned", Value::Int(((b8 >> 4) & 0b11) as u64));
	Ok(())
}

/// Fixed-width ASCII field that spans the rest of the page
pub fn ascii_tail(r: Reader, label: &str, name: &str, rep: &mut Report) -> Result<(), Error> {
	let s = ascii(r.rest(4)?);
	rep.field(format!("  {}: {}", label, s), name, Value::Str(s.clone()));
	Ok(())
}

fn provisioning_type(x: u8) -> &'static str {
	match x & 0b111 {
		0 => "not known or fully provisioned",
		1 => "resource provisioned",
		2 => "thin provisioned",
		_ => "reserved",
	}
}

/// Page B2h for SBC devices
pub fn provisioning(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let exponent = r.u8(4)?;
	if exponent == 0 {
		rep.field("  Unmap and write same (10) threshold exponent: 0 [threshold sets not supported]", "threshold_exponent", Value::Int(0));
	} else {
		rep.field(format!("  Threshold exponent: {}", exponent), "threshold_exponent", Value::Int(exponent as u64));
	}

	let b5 = r.u8(5)?;
	rep.flags("  ", &[
		("LBPU", "lbpu", b(is_set(b5, 7))),
		("LBPWS", "lbpws", b(is_set(b5, 6))),
		("LBPWS10", "lbpws10", b(is_set(b5, 5))),
		("LBPRZ", "lbprz", ((b5 >> 2) & 0b111) as u64),
		("ANC_SUP", "anc_sup", b(is_set(b5, 1))),
		("DP", "dp", b(is_set(b5, 0))),
	]);

	let b6 = r.u8(6)?;
	rep.field(format!("  Minimum percentage: {}", b6 >> 3), "minimum_percentage", Value::Int((b6 >> 3) as u64));
	rep.field(format!("  Provisioning type: {} ({})", b6 & 0b111, provisioning_type(b6)), "provisioning_type", Value::Int((b6 & 0b111) as u64));
	let threshold = r.u8(7)?;
	rep.field(format!("  Threshold percentage: {}", threshold), "threshold_percentage", Value::Int(threshold as u64));

	if is_set(b5, 0) && r.len() > 8 {
		rep.line("  Provisioning group descriptor:");
		device_id::decode(r.rest(8)?, rep);
	}
	Ok(())
}

/// Page B3h for SBC devices
pub fn referrals(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let size = r.u32_be(8)?;
	let multiplier = r.u32_be(12)?;
	rep.field(format!("  User data segment size: {}", size), "user_data_segment_size", Value::Int(size as u64));
	rep.field(format!("  User data segment multiplier: {}", multiplier), "user_data_segment_multiplier", Value::Int(multiplier as u64));
	Ok(())
}

/// Page DEh: Identify Controller data wrapped into a VPD page by SNTL
pub fn nicr(r: Reader, rep: &mut Report) -> Result<(), Error> {
	let vendor = r.ascii(8, 8)?;
	let product = r.ascii(16, 16)?;
	let rev = r.ascii(32, 4)?;
	rep.field(format!("  T10 vendor identification: {}", vendor), "t10_vendor_identification", Value::Str(vendor));
	rep.field(format!("  Product identification: {}", product), "product_identification", Value::Str(product));
	rep.field(format!("  Product revision level: {}", rev), "product_revision_level", Value::Str(rev));

	let ctl = r.rest(64)?;
	match IdentifyController::new(ctl) {
		Ok(id) => rep.nest("identify_controller", id.decode()),
		Err(err) => {
			rep.warn(format!("NVMe Identify Controller Response: {}", err));
			rep.line(format!("  Identify controller data ({} bytes): {}", ctl.len(), hex_string(&ctl[.. ctl.len().min(16)])));
		},
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::scsi::data::vpd::{decode, DecodeOptions};
	use crate::report::Value;

	fn page(code: u8, pdt: u8, body: &[u8]) -> Vec<u8> {
		let mut data = vec![pdt, code, 0, body.len() as u8];
		data.extend_from_slice(body);
		data
	}

	#[test]
	fn supported() {
		let rep = decode(0, &page(0, 0, &[0x00, 0x80, 0x83, 0xb0, 0xf7]), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.lines[2], "     0x0\tSupported VPD pages");
		assert_eq!(rep.lines[5], "     0xb0\tBlock limits (SBC)");
		assert_eq!(rep.lines[6], "     0xf7");
		assert_eq!(rep.get("supported_vpd_page_list").and_then(|v| v.as_array()).map(|a| a.len()), Some(5));
	}

	fn tpc_descriptors() -> Vec<u8> {
		let mut rod = vec![0u8; 36];
		rod[3] = 0x20;
		rod[11] = 8; // maximum range descriptors
		rod[15] = 60; // maximum inactivity timeout
		rod[34] = 0x08; // optimal transfer count
		let mut body = rod;
		body.extend_from_slice(&[0x00, 0x01, 0x00, 0x04, 0x83, 0x00, 0x00, 0x00]);
		body
	}

	#[test]
	fn third_party_copy() {
		let rep = decode(0x8f, &page(0x8f, 0, &tpc_descriptors()), &DecodeOptions::default()).unwrap();
		assert!(rep.warnings.is_empty(), "{:?}", rep.warnings);
		assert_eq!(rep.lines[0], "VPD INQUIRY: Third party copy page");
		let list = rep.get("third_party_copy_descriptor_list").and_then(|v| v.as_array()).unwrap();
		assert_eq!(list.len(), 2);
		assert_eq!(rep.find("maximum_range_descriptors"), Some(&Value::Int(8)));
		assert_eq!(rep.find("maximum_inactivity_timeout"), Some(&Value::Int(60)));
		assert_eq!(rep.find("optimal_transfer_count"), Some(&Value::Int(0x800)));
		assert!(rep.lines.iter().any(|l| l == " Supported Commands [0x0001]:"), "{:#?}", rep.lines);
	}

	#[test]
	fn third_party_copy_truncated() {
		let mut body = tpc_descriptors();
		// second descriptor claims 4 bytes, has 2
		body.truncate(36 + 6);
		let rep = decode(0x8f, &page(0x8f, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.warnings.len(), 1, "{:?}", rep.warnings);
		let list = rep.get("third_party_copy_descriptor_list").and_then(|v| v.as_array()).unwrap();
		assert_eq!(list.len(), 1);

		// not even a header left
		body.truncate(36 + 2);
		let rep = decode(0x8f, &page(0x8f, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.warnings.len(), 1, "{:?}", rep.warnings);
	}

	#[test]
	fn block_limits_short() {
		let mut body = vec![0u8; 12];
		body[4..8].copy_from_slice(&[0, 0, 0x01, 0x00]); // max transfer length
		let rep = decode(0xb0, &page(0xb0, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.get("maximum_transfer_length"), Some(&Value::Int(256)));
		assert!(rep.get("maximum_unmap_lba_count").is_none());
		assert!(rep.warnings.is_empty());
	}

	#[test]
	fn tape_capabilities() {
		let rep = decode(0xb0, &page(0xb0, 1, &[0x03, 0, 0, 0]), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.lines[0], "VPD INQUIRY: Sequential access device capabilities (SSC) page");
		assert_eq!(rep.lines[1], "  TSMC=1");
		assert_eq!(rep.lines[2], "  WORM=1");
	}

	#[test]
	fn provisioning_flags() {
		let rep = decode(0xb2, &page(0xb2, 0, &[0, 0xe4, 0x02, 0]), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.get("lbpu"), Some(&Value::Int(1)));
		assert_eq!(rep.get("lbprz"), Some(&Value::Int(1)));
		assert_eq!(rep.get("provisioning_type"), Some(&Value::Int(2)));
	}

	#[test]
	fn mode_policy() {
		let rep = decode(0x87, &page(0x87, 0, &[0x3f, 0xff, 0x80, 0, 0x08, 0, 0x01, 0]), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.lines[1], "  Policy page code: 0x3f and subpage code: 0xff (apply to all)");
		assert_eq!(rep.lines[2], "    MLUS=1,  Policy: shared");
		assert_eq!(rep.lines[4], "    MLUS=0,  Policy: per target port");
	}

	#[test]
	fn ports() {
		let mut body = vec![
			0, 0, 0, 1, // relative port 1
			0, 0, 0, 0, // no initiator transport id
			0, 0, 0, 8, // target port descriptors length
		];
		// relative target port designator
		body.extend_from_slice(&[0x61, 0x94, 0, 4, 0, 0, 0, 1]);
		let rep = decode(0x88, &page(0x88, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.lines[1], "Relative port=1");
		assert!(rep.lines.contains(&"      Relative target port: 0x1".to_string()));
		assert!(rep.warnings.is_empty());
	}

	#[test]
	fn ports_short_descriptor() {
		let body = [0, 0, 0, 2, 0, 0, 0, 40];
		let rep = decode(0x88, &page(0x88, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.find("relative_port"), Some(&Value::Int(2)));
		assert_eq!(rep.warnings.len(), 1);
	}

	#[test]
	fn power() {
		let mut body = vec![0x03, 0x07];
		body.extend_from_slice(&[0, 100, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0]);
		let rep = decode(0x8a, &page(0x8a, 0, &body), &DecodeOptions::default()).unwrap();
		assert_eq!(rep.lines[1], "  Standby_y=1  Standby_z=1  Idle_c=1  Idle_b=1  Idle_a=1");
		assert_eq!(rep.get("stopped_condition_recovery_time"), Some(&Value::Int(100)));
		assert_eq!(rep.get("idle_c_condition_recovery_time"), Some(&Value::Int(256)));
	}
}
