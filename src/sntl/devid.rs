/*!
Device Identification VPD page (83h) composed from NVMe Identify data.

The page carries a T10 vendor ID designator built of the model and serial numbers, and, when namespace data is available, the namespace's NGUID (or EUI-64 if NGUID is all zeros) as an EUI-64 designator followed by the same value as a SCSI name string.
*/

use crate::nvme::IdentifyNamespace;
use crate::utils::all_zeros;

/// Smallest buffer [`make_vpd_devid_for_nvme`](fn.make_vpd_devid_for_nvme.html) will write into
pub const MIN_LEN: usize = 56;

const VENDOR: &[u8; 8] = b"NVMe    ";

/**
Writes the device identification page into `out`; returns the number of bytes written, or 0 if `out` is shorter than [`MIN_LEN`](constant.MIN_LEN.html).

Page length (bytes 2..4) is left for the caller, as it depends on what the caller truncates the page to. Every designator is only appended if it fits entirely.

* `ctl` is an Identify Controller response (at least 4096 bytes);
* `ns` is an optional Identify Namespace response;
* `tproto`, if given, is put into designators' PROTOCOL IDENTIFIER with PIV set.
*/
pub fn make_vpd_devid_for_nvme(ctl: &[u8], ns: Option<&[u8]>, pdt: u8, tproto: Option<u8>, out: &mut [u8]) -> usize {
	let max = out.len();
	if max < MIN_LEN || ctl.len() < 72 {
		return 0;
	}
	for b in out.iter_mut() { *b = 0; }

	out[0] = pdt & 0x1f;
	out[1] = 0x83;

	// T10 vendor ID designator, LU association
	match tproto {
		Some(proto) => {
			out[4] = ((proto & 0xf) << 4) | 0x2; // ASCII
			out[5] = 0xa1; // PIV=1, association=LU, type=T10
		},
		None => {
			out[4] = 0x2;
			out[5] = 0x21; // PIV=0
		},
	}
	out[8 .. 16].copy_from_slice(VENDOR);

	let model = &ctl[24 .. 64];
	out[16 .. 56].copy_from_slice(model);
	// trailing blanks of the model number become underscores; the serial number then overwrites all but the first one
	let mut k = model.len();
	while k > 0 && out[15 + k] == b' ' {
		out[15 + k] = b'_';
		k -= 1;
	}
	if k == model.len() {
		k -= 1;
	}
	let mut n = 17 + k;
	if max < n + 20 {
		return 0;
	}

	let serial = &ctl[4 .. 24];
	let serial_len = serial.iter().rposition(|&b| b != b' ').map(|i| i + 1).unwrap_or(0);
	out[n .. n + serial_len].copy_from_slice(&serial[.. serial_len]);
	n += serial_len;

	// designators are 4-byte aligned; the padding stays NUL
	n = (n + 3) & !3;
	out[7] = (n - 8) as u8;

	let ns = match ns.and_then(|ns| IdentifyNamespace::new(ns).ok()) {
		Some(ns) => ns,
		None => return n,
	};

	let nguid = ns.nguid();
	let eui64 = ns.eui64();
	let id: &[u8] = if !all_zeros(nguid) {
		nguid
	} else if !all_zeros(eui64) {
		eui64
	} else {
		return n;
	};

	// binary EUI-64 based designator, LU association
	if max < n + 4 + id.len() {
		return n;
	}
	out[n .. n + 4].copy_from_slice(&[0x1, 0x2, 0, id.len() as u8]);
	out[n + 4 .. n + 4 + id.len()].copy_from_slice(id);
	n += 4 + id.len();

	// same value as a UTF-8 SCSI name string: "eui." + uppercase hex
	let name_len = 4 + 2 * id.len();
	if max < n + 4 + name_len {
		return n;
	}
	out[n .. n + 4].copy_from_slice(&[0x3, 0x8, 0, name_len as u8]);
	let name = format!("eui.{}", id.iter().map(|b| format!("{:02X}", b)).collect::<String>());
	out[n + 4 .. n + 4 + name.len()].copy_from_slice(name.as_bytes());
	n + 4 + name_len
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scsi::data::vpd::device_id::{designators, Identifier};

	fn ctl() -> Vec<u8> {
		let mut ctl = vec![0u8; 4096];
		ctl[4 .. 24].copy_from_slice(b"S3EVNX0K123456      ");
		ctl[24 .. 64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");
		ctl
	}

	#[test]
	fn controller_only() {
		let mut out = [0u8; 256];
		let n = make_vpd_devid_for_nvme(&ctl(), None, 0, None, &mut out);
		assert_eq!(n, 56);
		assert_eq!(&out[.. 8], &[0, 0x83, 0, 0, 0x2, 0x21, 0, 48]);
		assert_eq!(&out[8 .. 56], b"NVMe    Samsung SSD 970 EVO 500GB_S3EVNX0K123456".as_ref());
		assert!(all_zeros(&out[56 ..]));
	}

	#[test]
	fn full_length_model() {
		let mut ctl = ctl();
		ctl[24 .. 64].copy_from_slice(b"0123456789012345678901234567890123456789");
		let mut out = [0u8; 128];
		let n = make_vpd_devid_for_nvme(&ctl, None, 0xd, None, &mut out);
		assert_eq!(out[0], 0xd);
		assert_eq!(&out[16 .. 56], b"0123456789012345678901234567890123456789".as_ref());
		assert_eq!(&out[56 .. 70], b"S3EVNX0K123456");
		assert_eq!(n, 72);
	}

	#[test]
	fn too_small() {
		let mut out = [0u8; 55];
		assert_eq!(make_vpd_devid_for_nvme(&ctl(), None, 0, None, &mut out), 0);
		let mut out = [0u8; 60];
		assert_eq!(make_vpd_devid_for_nvme(&ctl(), None, 0, None, &mut out), 0);
	}

	#[test]
	fn with_nguid() {
		let mut ns = vec![0u8; 4096];
		for (i, b) in ns[104 .. 120].iter_mut().enumerate() { *b = 0xa0 + i as u8; }
		ns[120 .. 128].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

		let mut out = [0u8; 512];
		let n = make_vpd_devid_for_nvme(&ctl(), Some(&ns[..]), 0, Some(0xa), &mut out);
		assert_eq!(n, 56 + 20 + 40);
		assert_eq!(&out[4 .. 6], &[0xa2, 0xa1]);

		let list = designators(&out[4 .. n]).collect::<Result<Vec<_>, _>>().unwrap();
		assert_eq!(list.len(), 3);
		assert_eq!(list[1].designator_type, 2);
		assert_eq!(list[1].data, &ns[104 .. 120]);
		match list[2].identifier() {
			Ok(Identifier::Name(name)) => assert_eq!(name, b"eui.A0A1A2A3A4A5A6A7A8A9AAABACADAEAF".as_ref()),
			other => panic!("{:?}", other),
		}
	}

	#[test]
	fn eui64_fallback() {
		let mut ns = vec![0u8; 4096];
		ns[120 .. 128].copy_from_slice(&[0x00, 0x25, 0x38, 0x5a, 0x71, 0xb0, 0x12, 0x34]);

		let mut out = [0u8; 512];
		let n = make_vpd_devid_for_nvme(&ctl(), Some(&ns[..]), 0, None, &mut out);
		assert_eq!(n, 56 + 12 + 24);
		assert_eq!(&out[56 .. 60], &[1, 2, 0, 8]);
		assert_eq!(&out[68 .. 72], &[3, 8, 0, 20]);
		assert_eq!(&out[72 .. 92], b"eui.0025385A71B01234");

		// room for EUI-64, but not for the name string
		let mut out = [0u8; 80];
		assert_eq!(make_vpd_devid_for_nvme(&ctl(), Some(&ns[..]), 0, None, &mut out), 68);
	}

	#[test]
	fn same_input_same_page() {
		let mut ns = vec![0u8; 4096];
		ns[120 .. 128].copy_from_slice(&[0x00, 0x25, 0x38, 0x5a, 0x71, 0xb0, 0x12, 0x34]);
		let (mut a, mut b) = ([0xffu8; 256], [0u8; 256]);
		let n = make_vpd_devid_for_nvme(&ctl(), Some(&ns[..]), 0, Some(0x9), &mut a);
		assert_eq!(make_vpd_devid_for_nvme(&ctl(), Some(&ns[..]), 0, Some(0x9), &mut b), n);
		assert_eq!(&a[.. n], &b[.. n]);
	}
}
