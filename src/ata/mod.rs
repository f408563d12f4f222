/*!
Just enough of ATA to decode what SCSI/ATA Translation puts into the ATA Information VPD page.
*/

pub mod id;
