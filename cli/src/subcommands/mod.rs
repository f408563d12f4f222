pub(crate) mod vpd;
pub(crate) mod nvme;
pub(crate) mod sntl;

use clap::{App, Arg, ArgMatches};

use std::fs::File;
use std::io::{self, Read};

use crate::hex;

pub trait Subcommand: Sync {
	fn subcommand(&self) -> App<'static, 'static>;
	fn run(&self, args: &ArgMatches);
}

pub static SUBCOMMANDS: [&dyn Subcommand; 3] = [
	&vpd::Vpd {},
	&nvme::Nvme {},
	&sntl::Sntl {},
];

pub fn find(name: &str) -> Option<&'static dyn Subcommand> {
	SUBCOMMANDS.iter().cloned().find(|s| s.subcommand().get_name() == name)
}

pub fn arg_json() -> Arg<'static, 'static> {
	Arg::with_name("json")
		.long("json")
		.help("Export data in JSON")
}

pub fn arg_inhex() -> Arg<'static, 'static> {
	Arg::with_name("inhex")
		.short("H")
		.long("inhex")
		.help("Input files are hex dumps rather than binary")
}

/// Reads the whole `path` (or stdin for `-`), decoding hex dumps if `inhex` is set
pub fn read_input(path: &str, inhex: bool) -> Result<Vec<u8>, String> {
	let mut data = vec![];
	let res = if path == "-" {
		io::stdin().read_to_end(&mut data)
	} else {
		File::open(path).and_then(|mut f| f.read_to_end(&mut data))
	};
	res.map_err(|e| format!("{}: {}", path, e))?;

	if inhex {
		let text = String::from_utf8_lossy(&data);
		hex::parse(&text).map_err(|e| format!("{}: {}", path, e))
	} else {
		Ok(data)
	}
}

/// Prints `err` and exits with status 1
pub fn die<T>(err: String) -> T {
	eprint!("{}\n", err);
	::std::process::exit(1);
}
