/*!
Parsers for SCSI replies.

* [`inquiry`](inquiry/index.html): standard INQUIRY data
* [`vpd`](vpd/index.html): Vital Product Data pages, one decoder per page
* [`sense`](sense/index.html): fixed and descriptor sense data
*/

pub mod export;
pub mod inquiry;
pub mod sense;
pub mod vpd;
