#![cfg_attr(feature = "cargo-clippy", allow(print_with_newline))]

#![warn(
	missing_debug_implementations,
	trivial_casts,
	trivial_numeric_casts,
	unsafe_code,
	unstable_features,
	unused_import_braces,
	unused_qualifications,
)]

extern crate inq;

#[macro_use]
extern crate clap;
use clap::{
	App,
	AppSettings,
	Arg,
};

extern crate serde_json;
extern crate separator;
extern crate number_prefix;
extern crate nom;

#[macro_use]
extern crate log;
extern crate env_logger;
use log::LevelFilter;
use env_logger::Builder as LogBuilder;

mod hex;
mod subcommands;
use subcommands::SUBCOMMANDS;

fn main() {
	let mut log = LogBuilder::new();

	let args = App::new("inq")
		.about("decodes SCSI INQUIRY, VPD pages and NVMe Identify data; plays SCSI commands through NVMe translation layer")
		.version(crate_version!())
		.setting(AppSettings::SubcommandRequired)
		.subcommands(SUBCOMMANDS.iter().map(|subcommand| subcommand.subcommand()))
		.arg(Arg::with_name("debug")
			.short("d")
			.long("debug")
			.multiple(true)
			.global(true)
			.help("Verbose output: set once to log actions, twice to also show decoding details\ncan also be set though env_logger's RUST_LOG env")
		)
		.get_matches();

	if let Ok(var) = std::env::var("RUST_LOG") {
		log.parse_filters(&var);
	}
	// -d takes precedence over RUST_LOG
	log.filter(Some("inq"), {
		use self::LevelFilter::*;
		match args.occurrences_of("debug") {
			0 => Warn,
			1 => Info,
			_ => Debug,
		}
	});
	log.init();

	let (subcommand, sargs) = args.subcommand();
	// clap does not allow subcommands that do not exist
	match (subcommands::find(subcommand), sargs) {
		(Some(subcommand), Some(sargs)) => subcommand.run(sargs),
		_ => unreachable!(),
	}
}
