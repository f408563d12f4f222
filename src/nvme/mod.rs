/*!
NVMe Identify data structures (Identify Controller, CNS 01h; Identify Namespace, CNS 00h).

Both are 4096-byte little-endian structures; [`IdentifyController`](struct.IdentifyController.html) and [`IdentifyNamespace`](struct.IdentifyNamespace.html) are borrowed views that check the length once, on construction.
*/

pub mod id;
pub use self::id::{IdentifyController, IdentifyNamespace, LbaFormat};

/// Size of any Identify data structure
pub const IDENTIFY_LEN: usize = 4096;

/// ONCS bit 6: Timestamp feature
pub const ONCS_TIMESTAMP: u16 = 1 << 6;

quick_error! {
	#[derive(Debug, Clone, PartialEq)]
	pub enum Error {
		Truncated(what: &'static str, len: usize) {
			display("{} data is {} bytes long, expected {}", what, len, IDENTIFY_LEN)
		}
	}
}
