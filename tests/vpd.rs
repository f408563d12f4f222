//! Decoding of VPD pages as returned by SAS devices

extern crate inq;

use inq::report::Value;
use inq::scsi::{PDT_DISK, PDT_TAPE, PDT_ZBC};
use inq::scsi::data::vpd::{self, Decoder, DecodeOptions};
use inq::scsi::data::vpd::device_id::{designators, Identifier};

fn page(pdt: u8, code: u8, content: &[u8]) -> Vec<u8> {
	let mut p = vec![pdt, code, 0, content.len() as u8];
	p.extend_from_slice(content);
	p
}

// LU NAA 5, SAS target port NAA 5, relative target port 1
const SAS_DEVID: &[u8] = &[
	0x01, 0x03, 0x00, 0x08, 0x50, 0x00, 0xc5, 0x00, 0x12, 0x34, 0x56, 0x78,
	0x61, 0x93, 0x00, 0x08, 0x50, 0x00, 0xc5, 0x00, 0x12, 0x34, 0x56, 0x79,
	0x61, 0x94, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01,
];

#[test]
fn sas_device_identification() {
	let data = page(PDT_DISK, 0x83, SAS_DEVID);

	let ids = designators(&data[4..])
		.map(|d| d.unwrap().identifier().unwrap())
		.collect::<Vec<_>>();
	assert_eq!(ids, vec![
		Identifier::Naa5 { aoi: 0xc50, vsi: 0x12345678 },
		Identifier::Naa5 { aoi: 0xc50, vsi: 0x12345679 },
		Identifier::RelativePort(1),
	]);

	let rep = vpd::decode(0x83, &data, &Default::default()).unwrap();
	assert!(rep.warnings.is_empty(), "{:?}", rep.warnings);
	assert_eq!(rep.lines[0], "VPD INQUIRY: Device identification page");
	assert!(rep.lines.iter().any(|l| l.contains("Serial Attached SCSI")), "{:#?}", rep.lines);

	let opts = DecodeOptions { export: true, ..Default::default() };
	assert_eq!(vpd::decode(0x83, &data, &opts).unwrap().lines, vec![
		"SCSI_IDENT_LUN_NAA_REG=5000c50012345678",
		"SCSI_IDENT_PORT_NAA_REG=5000c50012345679",
		"SCSI_IDENT_PORT_RELATIVE=1",
	]);
}

#[test]
fn truncated_device_identification() {
	let mut data = page(PDT_DISK, 0x83, SAS_DEVID);
	// cut in the middle of the second designator
	data.truncate(4 + 12 + 6);

	let rep = vpd::decode(0x83, &data, &Default::default()).unwrap();
	assert_eq!(rep.warnings.len(), 2, "{:?}", rep.warnings);
	let list = rep.get("designation_descriptor_list").and_then(|v| v.as_array()).unwrap();
	assert_eq!(list.len(), 1);
}

#[test]
fn unit_serial_number() {
	let data = page(PDT_DISK, 0x80, b"ZA1B2C3D    ");
	let rep = vpd::decode(0x80, &data, &Default::default()).unwrap();
	assert_eq!(rep.get("unit_serial_number"), Some(&Value::Str("ZA1B2C3D".to_string())));

	let opts = DecodeOptions { export: true, ..Default::default() };
	assert_eq!(vpd::decode(0x80, &data, &opts).unwrap().lines, vec!["SCSI_IDENT_SERIAL=ZA1B2C3D"]);
}

#[test]
fn device_type_specific_pages() {
	assert_eq!(vpd::lookup(0xb0, PDT_DISK).map(|p| p.decoder), Some(Decoder::BlockLimits));
	assert_eq!(vpd::lookup(0xb0, PDT_ZBC).map(|p| p.decoder), Some(Decoder::BlockLimits));
	assert_eq!(vpd::lookup(0xb0, PDT_TAPE).map(|p| p.decoder), Some(Decoder::SequentialAccess));
	assert_eq!(vpd::lookup(0xb1, PDT_TAPE).map(|p| p.acronym), Some("mas"));
	assert!(vpd::lookup(0xb2, 0x0d).is_none());

	// same page code, different layouts
	let mut bl = [0u8; 60];
	// maximum transfer length, at byte 8 of the page
	bl[4 .. 8].copy_from_slice(&[0, 0, 0x10, 0]);
	let rep = vpd::decode(0xb0, &page(PDT_DISK, 0xb0, &bl), &Default::default()).unwrap();
	assert_eq!(rep.get("maximum_transfer_length"), Some(&Value::Int(0x1000)));

	let rep = vpd::decode(0xb0, &page(PDT_TAPE, 0xb0, &[0x01, 0, 0, 0]), &Default::default()).unwrap();
	assert_eq!(rep.lines[0], "VPD INQUIRY: Sequential access device capabilities (SSC) page");
}

#[test]
fn unknown_pages() {
	// ASCII information
	let mut content = vec![5];
	content.extend_from_slice(b"Hello");
	let rep = vpd::decode(0x01, &page(PDT_DISK, 0x01, &content), &Default::default()).unwrap();
	assert_eq!(rep.lines[0], "VPD INQUIRY: ASCII information page 0x01");

	// vendor specific
	let rep = vpd::decode(0xd0, &page(PDT_DISK, 0xd0, &[1, 2, 3]), &Default::default()).unwrap();
	assert_eq!(rep.lines[0], "VPD INQUIRY: page=0xd0");
}

#[test]
fn too_short() {
	let err = vpd::decode(0x80, &[0, 0x80], &Default::default()).unwrap_err();
	assert_eq!(err.kind(), vpd::ErrorKind::Malformed);
}
