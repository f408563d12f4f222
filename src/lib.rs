/*!
This crate decodes SCSI INQUIRY and VPD page responses, and synthesizes SCSI responses for NVMe devices (the SCSI to NVMe translation layer, SNTL).

## Example

```
use inq::sntl::Sntl;
use inq::scsi::data::vpd;

// Identify Controller response of an NVMe drive
let mut ctl = vec![0u8; 4096];
ctl[4..24].copy_from_slice(b"S3EVNX0K123456      ");
ctl[24..64].copy_from_slice(b"Samsung SSD 970 EVO 500GB               ");
ctl[516] = 1; // number of namespaces

let mut sntl = Sntl::new(&ctl, None, 0);
let resp = sntl.execute(&[0x12, 0x01, 0x80, 0x00, 0xff, 0x00], &[], 4096).unwrap();

let report = vpd::decode(0x80, &resp, &Default::default()).unwrap();
assert_eq!(report.lines[1], "  Unit serial number: S3EVNX0K123456");
```

For more, dive into documentation for the module you're interested in.
*/

#![warn(missing_debug_implementations)]

#[cfg(feature = "serializable")]
#[macro_use]
extern crate serde_derive;
#[cfg(feature = "serializable")]
extern crate serde;

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate log;
extern crate byteorder;

/// Data transfer direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction { None, From, To, Both }

pub mod reader;
pub mod report;
pub mod utils;

pub mod ata;
pub mod scsi;
pub mod nvme;
pub mod sntl;
