//! Responses of the translation layer, fed back through the decoders

extern crate inq;

use inq::scsi::ScsiDevice;
use inq::scsi::data::{inquiry, sense, vpd};
use inq::scsi::data::sense::{FieldPointer, SenseKey};
use inq::scsi::data::vpd::device_id::{designators, Identifier};
use inq::sntl::{Sntl, SenseInfo, mode};

fn controller() -> Vec<u8> {
	let mut ctl = vec![0u8; 4096];
	ctl[4..24].copy_from_slice(b"S3EVNX0K123456      ");
	ctl[24..64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");
	ctl[64..72].copy_from_slice(b"2B2QEXE7");
	ctl[516] = 2; // number of namespaces
	ctl
}

fn namespace() -> Vec<u8> {
	let mut ns = vec![0u8; 4096];
	ns[104..120].copy_from_slice(&[0x00, 0x25, 0x38, 0x5a, 0x71, 0xb0, 0x12, 0x34, 0, 0, 0, 0, 0, 0, 0, 1]);
	ns
}

fn ok(res: (Vec<u8>, Vec<u8>)) -> Vec<u8> {
	let (sense, data) = res;
	assert!(sense.is_empty(), "unexpected sense {:02x?}", sense);
	data
}

#[test]
fn standard_inquiry() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);
	let data = ok(sntl.scsi_inquiry(false, 0).unwrap());

	let inq = inquiry::parse(&data).unwrap();
	assert_eq!(inq.pdt, 0);
	assert_eq!(inq.vendor_id.as_ref().map(|s| s.as_str()), Some("NVMe"));
	assert_eq!(inq.product_id.as_ref().map(|s| s.as_str()), Some("Samsung SSD 970"));
	assert_eq!(inq.product_rev.as_ref().map(|s| s.as_str()), Some("EXE7"));

	let rep = inquiry::decode(&inq);
	assert!(rep.warnings.is_empty(), "{:?}", rep.warnings);
}

#[test]
fn supported_pages_decode() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);
	let sv = ok(sntl.scsi_inquiry(true, 0x00).unwrap());
	assert_eq!(&sv[4..], inq::sntl::inquiry::SUPPORTED_VPD);

	let opts = vpd::DecodeOptions { supported: Some(sv[4..].to_vec()), ..Default::default() };
	for &page in &sv[4..] {
		let data = ok(sntl.scsi_inquiry(true, page).unwrap());
		let rep = vpd::decode(page, &data, &opts).unwrap();
		assert!(rep.warnings.is_empty(), "page 0x{:02x}: {:?}", page, rep.warnings);
	}

	// not in the list
	let err = vpd::decode(0x89, &[0, 0x89, 0, 0], &opts).unwrap_err();
	assert_eq!(err.kind(), vpd::ErrorKind::IllegalField);
}

#[test]
fn device_identification() {
	let (ctl, ns) = (controller(), namespace());
	let mut sntl = Sntl::new(&ctl, Some(&ns[..]), 0);
	let data = ok(sntl.scsi_inquiry(true, 0x83).unwrap());

	let list = designators(&data[4..]).collect::<Result<Vec<_>, _>>().unwrap();
	let types: Vec<u8> = list.iter().map(|d| d.designator_type).collect();
	assert_eq!(types, vec![1, 2, 8]);
	match list[0].identifier() {
		Ok(Identifier::T10 { vendor_id, .. }) => assert_eq!(vendor_id, b"NVMe    ".as_ref()),
		other => panic!("{:?}", other),
	}
	match list[2].identifier() {
		Ok(Identifier::Name(name)) => assert_eq!(name, b"eui.0025385A71B012340000000000000001".as_ref()),
		other => panic!("{:?}", other),
	}

	let rep = vpd::decode(0x83, &data, &Default::default()).unwrap();
	let descriptors = rep.get("designation_descriptor_list").and_then(|v| v.as_array()).unwrap();
	assert_eq!(descriptors.len(), 3);

	let opts = vpd::DecodeOptions { export: true, ..Default::default() };
	let export = vpd::decode(0x83, &data, &opts).unwrap().lines;
	assert!(export.contains(&"SCSI_IDENT_LUN_EUI64=0025385a71b012340000000000000001".to_string()), "{:?}", export);
}

#[test]
fn mode_select_changes_sense() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);

	// caching page, no block descriptors
	let data = ok(sntl.mode_sense_10(false, true, 0, 0x08, 0).unwrap());
	assert_eq!(data.len(), 8 + mode::CACHING.len());
	assert_ne!(data[8 + 2] & mode::WCE, 0);

	let mut param = vec![0u8; 8];
	param.extend_from_slice(&data[8..]);
	param[8 + 2] &= !mode::WCE;
	ok(sntl.mode_select_10(true, false, &param).unwrap());
	assert!(!sntl.state().wce);
	assert!(sntl.state().wce_changed);

	let data = ok(sntl.mode_sense_10(false, true, 0, 0x08, 0).unwrap());
	assert_eq!(data[8 + 2] & mode::WCE, 0);
	// defaults stay the same
	let data = ok(sntl.mode_sense_10(false, true, 2, 0x08, 0).unwrap());
	assert_ne!(data[8 + 2] & mode::WCE, 0);
}

#[test]
fn mode_select_errors() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);

	// saving pages is not supported
	let (sense, _) = sntl.mode_select_10(true, true, &[0; 8]).unwrap();
	let (_, parsed) = sense::parse(&sense).unwrap();
	assert_eq!(parsed.kcq(), (SenseKey::IllegalRequest as u8, 0x24, 0));
	assert_eq!(parsed.sks().and_then(FieldPointer::decode), Some(FieldPointer { in_cdb: true, byte: 1, bit: Some(0) }));

	// Disconnect-Reconnect page cannot be changed
	let mut param = vec![0u8; 8];
	param.extend_from_slice(&mode::DISCONNECT);
	let err = sntl.execute(&[0x55, 0x10, 0, 0, 0, 0, 0, 0, param.len() as u8, 0], &param, 0).unwrap_err();
	assert_eq!(err, SenseInfo::invalid_field(false, 8, Some(5)));
}

#[test]
fn supported_opcodes() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);

	let data = ok(sntl.report_supported_opcodes(false, 0, 0, 0).unwrap());
	let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
	assert_eq!(len % 8, 0);
	assert_eq!(data.len(), len + 4);
	let opcodes: Vec<u8> = data[4..].chunks(8).map(|d| d[0]).collect();
	assert!(opcodes.contains(&0x12));
	assert!(opcodes.contains(&0x5a));

	// INQUIRY: supported, 6-byte CDB
	let one = ok(sntl.report_supported_opcodes(false, 1, 0x12, 0).unwrap());
	assert_eq!(&one[..4], &[0, 3, 0, 6]);
	assert_eq!(one.len(), 4 + 6);
	assert_eq!(one[4], 0x12);

	// MAINTENANCE IN has service actions, so opcode alone is not enough
	let (sense, _) = sntl.report_supported_opcodes(false, 1, 0xa3, 0x0c).unwrap();
	let (_, parsed) = sense::parse(&sense).unwrap();
	assert_eq!(parsed.sks().and_then(FieldPointer::decode), Some(FieldPointer { in_cdb: true, byte: 2, bit: Some(2) }));

	// FORMAT UNIT is not there at all
	let none = ok(sntl.report_supported_opcodes(true, 1, 0x04, 0).unwrap());
	assert_eq!(none[1], 0x80 | 1);
	assert_eq!(none.len(), 4 + 12);
}

#[test]
fn luns() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);
	let data = ok(sntl.report_luns(0).unwrap());
	assert_eq!(&data[0..4], &[0, 0, 0, 16]);
	assert_eq!(data.len(), 24);
	assert_eq!(&data[16..18], &[0, 1]);
}

#[test]
fn check_condition() {
	let ctl = controller();
	let mut sntl = Sntl::new(&ctl, None, 0);

	let (sense, data) = sntl.do_cmd(&[0x28, 0, 0, 0, 0, 0, 0, 0, 1, 0], inq::Direction::From, &[], 512).unwrap();
	assert!(data.is_empty());
	assert_eq!(sense[0], 0x70);
	let (current, parsed) = sense::parse(&sense).unwrap();
	assert!(current);
	assert_eq!(parsed.kcq(), (5, 0x20, 0));

	let err = sntl.execute(&[0x12, 0x01, 0x89, 0, 0xff, 0], &[], 4096).unwrap_err();
	assert_eq!(err.to_string(), "Illegal Request, invalid field in CDB (CDB byte 2, bit 7)");
}
