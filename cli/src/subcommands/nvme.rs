use inq::nvme::{IdentifyController, IdentifyNamespace};
use inq::report::Report;

use clap::{App, Arg, ArgMatches, SubCommand};
use serde_json;

use separator::Separatable;
use number_prefix::{decimal_prefix, binary_prefix, Standalone, Prefixed};

use super::{Subcommand, arg_json, arg_inhex, read_input, die};

fn print_capacity(ns: &IdentifyNamespace) {
	let lbaf = match ns.lba_format(ns.flbas_index() as usize) {
		Some(lbaf) => lbaf,
		None => return,
	};
	let capacity = match lbaf.data_size().and_then(|size| ns.nsze().checked_mul(size)) {
		Some(capacity) => capacity,
		None => return,
	};

	print!("\n");
	print!("Capacity: {} bytes\n", capacity.separated_string());
	print!("          ({}, {})\n",
		match decimal_prefix(capacity as f32) {
			Prefixed(p, x) => format!("{:.1} {}B", x, p),
			Standalone(x)  => format!("{} bytes", x),
		},
		match binary_prefix(capacity as f32) {
			Prefixed(p, x) => format!("{:.1} {}B", x, p),
			Standalone(x)  => format!("{} bytes", x),
		},
	);
}

pub struct Nvme {}
impl Subcommand for Nvme {
	fn subcommand(&self) -> App<'static, 'static> {
		SubCommand::with_name("nvme")
			.about("Decodes NVMe Identify Controller (and Identify Namespace) data")
			.arg(Arg::with_name("ns")
				.long("ns")
				.takes_value(true)
				.value_name("FILE")
				.help("Identify Namespace data")
			)
			.arg(arg_json())
			.arg(arg_inhex())
			.arg(Arg::with_name("ctl")
				.default_value("-")
				.help("File with Identify Controller data ('-' for stdin)")
			)
	}

	fn run(&self, args: &ArgMatches) {
		let inhex = args.is_present("inhex");
		let ctl_data = read_input(args.value_of("ctl").unwrap_or("-"), inhex).unwrap_or_else(die);
		let ns_data = args.value_of("ns").map(|path| read_input(path, inhex).unwrap_or_else(die));

		let ctl = IdentifyController::new(&ctl_data).unwrap_or_else(|e| die(e.to_string()));
		let ns = ns_data.as_ref().map(|data| {
			IdentifyNamespace::new(data).unwrap_or_else(|e| die(e.to_string()))
		});

		let mut rep = Report::new();
		rep.nest("controller", ctl.decode());
		if let Some(ref ns) = ns {
			rep.nest("namespace", ns.decode());
		}

		if args.is_present("json") {
			print!("{}\n", serde_json::to_string(&rep).unwrap_or_else(|e| die(e.to_string())));
			return;
		}

		print!("{}", rep.text());
		if let Some(ref ns) = ns {
			print_capacity(ns);
		}
	}
}
