use inq::scsi::DEFAULT_ALLOC;
use inq::scsi::data::{inquiry, vpd};
use inq::sntl::Sntl as Translator;
use inq::report::Report;
use inq::utils::hexdump;

use clap::{App, Arg, ArgMatches, SubCommand};
use serde_json;

use super::{Subcommand, arg_json, arg_inhex, read_input, die};
use crate::hex;

/// Decodes INQUIRY responses; other commands are only dumped
fn decode(cdb: &[u8], resp: &[u8]) -> Option<Report> {
	if cdb[0] != 0x12 || resp.is_empty() {
		return None;
	}
	let res = if cdb[1] & 1 != 0 {
		vpd::decode(cdb[2], resp, &Default::default())
	} else {
		inquiry::parse(resp).map(|inq| inquiry::decode(&inq))
	};
	match res {
		Ok(rep) => Some(rep),
		Err(e) => {
			warn!("cannot decode response: {}", e);
			None
		},
	}
}

pub struct Sntl {}
impl Subcommand for Sntl {
	fn subcommand(&self) -> App<'static, 'static> {
		SubCommand::with_name("sntl")
			.about("Responds to a SCSI command the way SCSI to NVMe translation layer does")
			.arg(Arg::with_name("ctl")
				.long("ctl")
				.takes_value(true)
				.required(true)
				.value_name("FILE")
				.help("Identify Controller data")
			)
			.arg(Arg::with_name("ns")
				.long("ns")
				.takes_value(true)
				.value_name("FILE")
				.help("Identify Namespace data")
			)
			.arg(Arg::with_name("nsid")
				.long("nsid")
				.takes_value(true)
				.default_value("1")
				.help("Namespace ID the translation layer is attached to")
			)
			.arg(Arg::with_name("pdt")
				.long("pdt")
				.takes_value(true)
				.default_value("0")
				.help("Peripheral device type to report (0 for disk, 0xd for enclosure)")
			)
			.arg(Arg::with_name("dout")
				.long("dout")
				.takes_value(true)
				.value_name("HEX")
				.help("Data-out buffer (MODE SELECT parameter list)")
			)
			.arg(Arg::with_name("alloc")
				.long("alloc")
				.takes_value(true)
				.help("Data-in buffer size")
			)
			.arg(Arg::with_name("dsense")
				.long("dsense")
				.help("Report sense data in descriptor format")
			)
			.arg(Arg::with_name("decode")
				.long("decode")
				.help("Decode INQUIRY responses instead of dumping them")
			)
			.arg(arg_json())
			.arg(arg_inhex())
			.arg(Arg::with_name("cdb")
				.required(true)
				.multiple(true)
				.help("CDB bytes in hex, e.g. '12 01 83 00 ff 00'")
			)
	}

	fn run(&self, args: &ArgMatches) {
		let inhex = args.is_present("inhex");
		let ctl = read_input(args.value_of("ctl").unwrap_or("-"), inhex).unwrap_or_else(die);
		let ns = args.value_of("ns").map(|path| read_input(path, inhex).unwrap_or_else(die));

		let int = |name: &str| {
			args.value_of(name).map(|s| hex::parse_int(s).unwrap_or_else(die))
		};
		let pdt = int("pdt").unwrap_or(0);
		if pdt > 0x1f {
			die::<()>(format!("peripheral device type 0x{:x} is out of range", pdt));
		}
		let nsid = int("nsid").unwrap_or(1) as u32;
		let alloc = int("alloc").map(|a| a as usize).unwrap_or(DEFAULT_ALLOC);

		let cdb_text = args.values_of("cdb").map(|v| v.collect::<Vec<_>>().join(" ")).unwrap_or_default();
		let cdb = hex::parse(&cdb_text).unwrap_or_else(|e| die(format!("CDB: {}", e)));
		let dout = args.value_of("dout")
			.map(|s| hex::parse(s).unwrap_or_else(|e| die(format!("data-out: {}", e))))
			.unwrap_or_default();

		let mut sntl = Translator::new(&ctl, ns.as_ref().map(|ns| ns.as_slice()), pdt as u8).with_nsid(nsid);
		sntl.state_mut().dsense = args.is_present("dsense");

		info!("executing {:02x?}, {} bytes out, {} bytes in", cdb, dout.len(), alloc);
		match sntl.execute(&cdb, &dout, alloc) {
			Ok(resp) => {
				let rep = if args.is_present("decode") || args.is_present("json") { decode(&cdb, &resp) } else { None };
				match rep {
					Some(ref rep) if args.is_present("json") => {
						print!("{}\n", serde_json::to_string(rep).unwrap_or_else(|e| die(e.to_string())));
					},
					Some(rep) => print!("{}", rep.text()),
					None => print!("{}", hexdump(&resp)),
				}
			},
			Err(info) => {
				let sense = info.to_sense(sntl.state().dsense);
				if args.is_present("json") {
					print!("{}\n", serde_json::to_string(&info).unwrap_or_else(|e| die(e.to_string())));
				} else {
					print!("{}\n", info);
					print!("Sense data:\n{}", hexdump(&sense));
				}
				::std::process::exit(1);
			},
		}
	}
}
