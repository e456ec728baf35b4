use std::io::Write;

mod commands;
mod input;
mod os_release;

use commands::{Command, Context};

const USAGE: &str = "Usage: dissector [options] <bundles|resolve|sources|image|list> [roots...]

Roots are bundle, package or image names. They are also read from stdin when it is a pipe.";

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased verbosity");
		opts.optopt(  "V", "release",    "Release version to inspect, detected from os-release when omitted", "VERSION");
		opts.optopt(  "c", "config",     "JSON config file", "FILE");
		opts.optopt(  "d", "data-dir",   "Directory downloads and caches are kept in", "DIR");
		opts.optopt(  "u", "bundles-url","Base URL of the bundle release archives", "URL");
		opts.optopt(  "r", "repo-url",   "Base URL of the release repository", "URL");
		opts.optopt(  "g", "graph",      "Resolve with a dependency graph description instead of the package database", "FILE");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { eprintln!("Unable to parse options: {}", e); std::process::exit(2) }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage(USAGE));
			return;
		}

		parsed_options
	};

	let level = if parsed_options.opt_present("v") { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	match run(&parsed_options) {
		Ok(lines) => {
			let stdout = std::io::stdout();
			let mut out = stdout.lock();
			for line in lines {
				if writeln!(out, "{}", line).is_err() {
					/* Reader went away */
					return;
				}
			}
		},
		Err(e) => {
			log::error!("{}", e);
			std::process::exit(1);
		},
	}
}

fn run(parsed_options: &getopts::Matches) -> Result<Vec<String>, Error> {
	let command = match parsed_options.free.first() {
		Some(c) => c.parse::<Command>()?,
		None => return Err(Error::MissingCommand),
	};
	let roots = input::read_roots(&parsed_options.free[1..])?;

	let context = Context {
		config: build_config(parsed_options)?,
		graph: parsed_options.opt_str("g").map(std::path::PathBuf::from),
	};
	log::debug!("Running {:?} against release {}", command, context.config.version());

	commands::run(command, &context, &roots)
}

/// Config from the file given with `-c`, otherwise defaults for the selected release, then command line overrides.
fn build_config(parsed_options: &getopts::Matches) -> Result<dissector::Config, Error> {
	let release = match parsed_options.opt_str("V") {
		Some(v) => Some(v.parse::<u32>().map_err(|_| Error::InvalidArgument(format!("release version `{}`", v)))?),
		None => None,
	};

	let mut config = match parsed_options.opt_str("c") {
		Some(path) => dissector::Config::load_from_file(path)?,
		None => match release {
			Some(v) => dissector::Config::new(v),
			None => dissector::Config::new(os_release::installed_version(os_release::OS_RELEASE_PATH)?),
		},
	};

	if let Some(v) = release {
		config.set_version(v);
	}
	if let Some(dir) = parsed_options.opt_str("d") {
		config.set_data_dir(dir);
	}
	if let Some(url) = parsed_options.opt_str("u") {
		config.set_bundles_url(url);
	}
	if let Some(url) = parsed_options.opt_str("r") {
		config.set_repo_url(url);
	}

	Ok(config)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Dissector(#[from] dissector::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("No command given, see --help")]
	MissingCommand,
	#[error("Missing argument: {0}")]
	MissingArgument(&'static str),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Unknown command `{0}`, see --help")]
	UnknownCommand(String),
	#[error("A release version must be given with --release when not running on Clear Linux OS")]
	VersionUnknown,
}
