use {
	crate::{
		dominant::SnowSelection,
		script::{SNOW_INDEX_KEY, SNOW_VALUE_KEY},
	},
	memchr::memmem,
	std::{
		fs::File,
		io::{self, BufRead, BufReader},
		path::Path,
	},
};

/// Recovers the snow selection persisted in the header of a previously written script.
/// Every failure, including a missing file, is a miss rather than an error.
pub fn readSnowSelection(path: &Path) -> Option<SnowSelection> {
	let recovered = File::open(path)
		.and_then(|file| readLeadingLines(BufReader::new(file)))
		.map_err(|err| log::debug!("no snow selection from {}: {err}", path.display()))
		.ok()
		.and_then(|lines| parseSnowSelection(&lines));
	match recovered {
		Some(snow) => log::debug!("recovered {snow:?} from {}", path.display()),
		None => log::debug!("{} holds no snow selection", path.display()),
	}
	recovered
}

fn readLeadingLines(mut reader: impl BufRead) -> io::Result<[String; 3]> {
	let mut lines = <[String; 3]>::default();
	for line in &mut lines {
		if reader.read_line(line)? == 0 {
			break;
		}
	}
	Ok(lines)
}

/// Line 1 is ignored, line 2 must carry `snow_index=` and line 3 `snow_value=`.
pub fn parseSnowSelection(lines: &[String; 3]) -> Option<SnowSelection> {
	let index = findInteger(&lines[1], SNOW_INDEX_KEY)?;
	let threshold = findInteger(&lines[2], SNOW_VALUE_KEY)?;
	let layer = if index < 0 { None } else { Some(index) };
	SnowSelection::new(layer, threshold).map_err(|err| log::debug!("ignoring persisted snow selection: {err}")).ok()
}

fn findInteger(line: &str, key: &str) -> Option<i64> {
	let start = memmem::find(line.as_bytes(), key.as_bytes())? + key.len();
	let rest = &line[start..];
	let digitsEnd = rest
		.char_indices()
		.find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
		.map_or(rest.len(), |(i, _)| i);
	rest[..digitsEnd].parse().ok()
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{layer::LayerGrid, mask::MaskHeader, reader::Mask, script::ScriptEncoder, LAYER_COUNT},
		std::fs,
	};

	fn lines(text: &str) -> Option<SnowSelection> {
		readLeadingLines(text.as_bytes()).ok().and_then(|lines| parseSnowSelection(&lines))
	}

	#[test]
	fn reads_back_what_the_script_encoder_persists() {
		let header = MaskHeader { version: 0, unknown: 0, width: 64, height: 64 };
		let mask = Mask::new(header, vec![LayerGrid::filled(64, 64, 0); LAYER_COUNT]).unwrap();
		for snow in [SnowSelection::new(Some(4), 12).unwrap(), SnowSelection::new(None, 7).unwrap()] {
			assert_eq!(lines(&ScriptEncoder::new(&mask, snow).header()), Some(snow));
		}
	}

	#[test]
	fn tolerates_surrounding_text_and_crlf() {
		assert_eq!(
			lines("\r\n// snow_index=2 (slot)\r\n//snow_value=9\r\nstring[64] tm;\r\n"),
			Some(SnowSelection::new(Some(2), 9).unwrap())
		);
	}

	#[test]
	fn misses_when_patterns_are_out_of_place() {
		assert_eq!(lines("// snow_index=2\n// snow_value=9\n\n"), None);
		assert_eq!(lines("\n// snow_value=9\n// snow_index=2\n"), None);
		assert_eq!(lines("\n// snow_index=2\n"), None);
		assert_eq!(lines(""), None);
	}

	#[test]
	fn misses_on_out_of_range_values() {
		assert_eq!(lines("\n// snow_index=8\n// snow_value=9\n"), None);
		assert_eq!(lines("\n// snow_index=1\n// snow_value=16\n"), None);
		assert_eq!(lines("\n// snow_index=x\n// snow_value=3\n"), None);
	}

	#[test]
	fn missing_file_is_a_miss() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(readSnowSelection(&dir.path().join("TextureMap.galaxy")), None);
		fs::write(dir.path().join("short.galaxy"), "\n").unwrap();
		assert_eq!(readSnowSelection(&dir.path().join("short.galaxy")), None);
	}
}
