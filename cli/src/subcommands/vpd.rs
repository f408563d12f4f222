use inq::scsi::data::{inquiry, vpd};
use inq::utils::hexdump;

use clap::{App, Arg, ArgMatches, SubCommand};
use serde_json;

use super::{Subcommand, arg_json, arg_inhex, read_input, die};
use crate::hex::parse_int;

/// Page code from either a number or a page acronym (`sn`, `di`, …)
fn page_code(s: &str) -> Result<u8, String> {
	if let Some(info) = vpd::PAGES.iter().find(|p| p.acronym == s) {
		return Ok(info.page);
	}
	match parse_int(s) {
		Ok(page) if page <= 0xff => Ok(page as u8),
		Ok(page) => Err(format!("page code 0x{:x} is out of range", page)),
		Err(_) => Err(format!("{}: neither page code nor known page acronym", s)),
	}
}

fn standard(data: &[u8], args: &ArgMatches) {
	let inq = inquiry::parse(data).unwrap_or_else(|e| die(format!("standard INQUIRY: {}", e)));

	if args.is_present("json") {
		print!("{}\n", serde_json::to_string(&inq).unwrap_or_else(|e| die(format!("{}", e))));
	} else if args.is_present("export") {
		for line in inquiry::export(&inq) {
			print!("{}\n", line);
		}
	} else if args.is_present("hex-dump") {
		print!("{}", hexdump(data));
	} else {
		print!("{}", inquiry::decode(&inq).text());
	}
}

pub struct Vpd {}
impl Subcommand for Vpd {
	fn subcommand(&self) -> App<'static, 'static> {
		SubCommand::with_name("vpd")
			.about("Decodes standard INQUIRY response or VPD page")
			.arg(Arg::with_name("page")
				.short("p")
				.long("page")
				.takes_value(true)
				.help("VPD page (number or acronym); 'auto' takes it from the response header\nif not set, input is a standard INQUIRY response")
			)
			.arg(Arg::with_name("supported")
				.long("supported")
				.takes_value(true)
				.value_name("FILE")
				.help("Supported VPD Pages response (page 00h) to check the page against")
			)
			.arg(Arg::with_name("force")
				.short("f")
				.long("force")
				.help("Decode the page even if it is not listed as supported")
			)
			.arg(Arg::with_name("hex-dump")
				.short("x")
				.long("hex-dump")
				.help("Hex dump instead of decoding")
			)
			.arg(Arg::with_name("export")
				.short("u")
				.long("export")
				.conflicts_with("json")
				.help("Print KEY=value lines, the way udev rules expect them")
			)
			.arg(arg_json())
			.arg(arg_inhex())
			.arg(Arg::with_name("input")
				.default_value("-")
				.help("File with the response ('-' for stdin)")
			)
	}

	fn run(&self, args: &ArgMatches) {
		let inhex = args.is_present("inhex");
		let data = read_input(args.value_of("input").unwrap_or("-"), inhex).unwrap_or_else(die);

		let page = match args.value_of("page") {
			None => return standard(&data, args),
			Some("auto") => match data.get(1) {
				Some(&page) => page,
				None => die(format!("{}-byte response has no page code", data.len())),
			},
			Some(s) => page_code(s).unwrap_or_else(die),
		};

		let supported = args.value_of("supported").map(|path| {
			let sv = read_input(path, inhex).unwrap_or_else(die);
			sv.get(4 ..).map(|pages| pages.to_vec()).unwrap_or_default()
		});
		let opts = vpd::DecodeOptions {
			supported,
			force: args.is_present("force"),
			hex: args.is_present("hex-dump"),
			export: args.is_present("export"),
		};

		let rep = vpd::decode(page, &data, &opts).unwrap_or_else(|e| {
			die(format!("VPD page 0x{:02x}: {}", page, e))
		});
		if args.is_present("json") {
			print!("{}\n", serde_json::to_string(&rep).unwrap_or_else(|e| die(format!("{}", e))));
		} else {
			print!("{}", rep.text());
		}
	}
}
