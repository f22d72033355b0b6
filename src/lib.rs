#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

pub mod dominant;
pub mod error;
pub mod layer;
pub mod mask;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod raster;
pub mod reader;
pub mod script;
pub mod settings;
pub mod snow;

/// Paint layers stored in every mask file.
pub const LAYER_COUNT: usize = 8;

use {
	serde::ser,
	std::{
		ffi::OsString,
		fs::{self, File},
		io::{self, BufWriter},
		path::Path,
	},
};

pub fn initLogging() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
		.format_timestamp_millis()
		.init();
}

/// Writes through a sibling `.partial` file and renames it over `path` only once `write` succeeded.
pub fn writeAtomically(
	path: &Path,
	write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> io::Result<()> {
	let partialPath = {
		let mut name = path.file_name().map_or_else(OsString::new, OsString::from);
		name.push(".partial");
		path.with_file_name(name)
	};
	let result = File::create(&partialPath).and_then(|file| {
		let mut file = BufWriter::new(file);
		write(&mut file)?;
		file.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
	});
	match result.and_then(|()| fs::rename(&partialPath, path)) {
		Ok(()) => Ok(()),
		Err(err) => {
			_ = fs::remove_file(&partialPath);
			Err(err)
		}
	}
}

pub fn toml_toStringPretty<T: ?Sized + ser::Serialize>(value: &T) -> Result<String, toml::ser::Error> {
	let mut string = String::with_capacity(128);
	value.serialize((&mut toml::ser::Serializer::pretty(&mut string)).pretty_array(false))?;
	Ok(string)
}

#[cfg(unix)]
pub fn stdoutRaw() -> File {
	use std::os::unix::io::FromRawFd;
	unsafe { File::from_raw_fd(1) }
}

#[cfg(windows)]
pub fn stdoutRaw() -> File {
	use std::os::windows::io::{AsRawHandle, FromRawHandle};
	unsafe { File::from_raw_handle(io::stdout().as_raw_handle()) }
}
