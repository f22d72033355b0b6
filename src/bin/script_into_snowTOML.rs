#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	clap::Parser,
	std::{
		io::{self, Write},
		path::PathBuf,
		process::ExitCode,
	},
	t3mask_scanner::{initLogging, snow::readSnowSelection, toml_toStringPretty},
};

fn main() -> ExitCode {
	initLogging();
	#[derive(Parser)]
	struct Args {
		/// Previously generated `TextureMap.galaxy`
		script: PathBuf,
	}
	let Args { script } = Args::parse();
	let Some(snow) = readSnowSelection(&script) else {
		log::warn!("no snow selection recorded in {}", script.display());
		return ExitCode::FAILURE;
	};
	let toml = match toml_toStringPretty(&snow) {
		Ok(toml) => toml,
		Err(err) => {
			log::error!("{err}");
			return ExitCode::FAILURE;
		}
	};
	if let Err(err) = io::stdout().lock().write_all(toml.as_bytes()) {
		log::error!("{err}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}
