#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	serde::Serialize,
	std::{
		error::Error,
		io::{self, BufReader, Write},
		process::ExitCode,
	},
	t3mask_scanner::{
		initLogging,
		mask::{Geometry, MaskHeader},
		reader::maskFileSize,
		stdoutRaw, toml_toStringPretty,
	},
};

fn main() -> ExitCode {
	initLogging();
	if let Err(err) = run() {
		log::error!("{err}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}

fn run() -> Result<(), Box<dyn Error>> {
	#[derive(Serialize)]
	struct Dump {
		fileSize: usize,
		header: MaskHeader,
		geometry: Geometry,
	}
	let header = MaskHeader::read(&mut BufReader::new(io::stdin().lock()))?;
	let geometry = Geometry::of(&header)?;
	let dump = Dump { fileSize: maskFileSize(&geometry), header, geometry };
	stdoutRaw().write_all(toml_toStringPretty(&dump)?.as_bytes())?;
	Ok(())
}
