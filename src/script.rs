use {
	crate::{
		dominant::SnowSelection,
		error::EncodeError,
		pool::WorkerPool,
		progress::{ProgressEvent, ProgressReporter},
		reader::Mask,
		writeAtomically,
	},
	const_format::concatcp,
	core::{fmt::Write as _, ops::Range},
	std::{
		io::Write,
		path::Path,
		sync::atomic::{AtomicUsize, Ordering},
		time::Instant,
	},
};

/// Longest string literal the script language accepts; wider rows are split once.
pub const CHUNK_WIDTH: usize = 1024;
pub const ARRAY_NAME: &str = "tm";
pub const SNOW_INDEX_KEY: &str = "snow_index=";
pub const SNOW_VALUE_KEY: &str = "snow_value=";
const FOOTER: &str = "}\n";
const INIT_FUNCTION: &str = "void initTextureMap() {\n";
const SNOW_INDEX_COMMENT: &str = concatcp!("// ", SNOW_INDEX_KEY);
const SNOW_VALUE_COMMENT: &str = concatcp!("// ", SNOW_VALUE_KEY);

/// Splits `0..height` into `parts` contiguous ranges. The first `height % parts`
/// ranges take one extra row so every row is covered exactly once.
pub fn rowPartitions(height: usize, parts: usize) -> Vec<Range<usize>> {
	let parts = parts.max(1);
	let (base, extra) = (height / parts, height % parts);
	let mut start = 0;
	(0..parts)
		.map(|i| {
			let end = start + base + usize::from(i < extra);
			let range = start..end;
			start = end;
			range
		})
		.collect()
}

pub struct ScriptEncoder<'a> {
	mask: &'a Mask,
	snow: SnowSelection,
}

impl<'a> ScriptEncoder<'a> {
	pub fn new(mask: &'a Mask, snow: SnowSelection) -> Self {
		Self { mask, snow }
	}

	/// Leading blank line, the two persisted snow comments, the array declaration and
	/// the opening of the init function.
	pub fn header(&self) -> String {
		format!(
			"\n{SNOW_INDEX_COMMENT}{}\n{SNOW_VALUE_COMMENT}{}\nstring[{}] {ARRAY_NAME};\n{INIT_FUNCTION}",
			self.snow.persistedIndex(),
			self.snow.threshold,
			self.mask.height(),
		)
	}

	pub fn encodeRow(&self, buffer: &mut String, y: usize) -> Result<(), EncodeError> {
		let width = self.mask.width();
		let firstChunk = width.min(CHUNK_WIDTH);
		_ = write!(buffer, "{ARRAY_NAME}[{y}]=");
		self.encodeChunk(buffer, y, 0..firstChunk)?;
		if width > firstChunk {
			buffer.push_str("\n+");
			self.encodeChunk(buffer, y, firstChunk..width)?;
		}
		buffer.push_str(";\n");
		Ok(())
	}

	fn encodeChunk(&self, buffer: &mut String, y: usize, columns: Range<usize>) -> Result<(), EncodeError> {
		buffer.push('"');
		for x in columns {
			let layerId =
				self.mask.dominantLayerAt(self.snow, x, y).ok_or(EncodeError::NoDominantLayer { x, y })?;
			buffer.push(char::from(b'0' + layerId));
		}
		buffer.push('"');
		Ok(())
	}

	pub fn encodeRows(&self, rows: Range<usize>) -> Result<String, EncodeError> {
		let mut buffer = String::with_capacity(rows.len() * (self.mask.width() + 24));
		for y in rows {
			self.encodeRow(&mut buffer, y)?;
		}
		Ok(buffer)
	}

	/// The complete script; row partitions are encoded on the pool and joined in order.
	pub fn encode(&self, pool: &WorkerPool, progress: &ProgressReporter) -> Result<String, EncodeError> {
		let partitions = rowPartitions(self.mask.height(), pool.workerCount());
		log::debug!("encoding {} rows in {} partitions", self.mask.height(), partitions.len());
		let (done, total) = (AtomicUsize::new(0), self.mask.height());
		let sections = pool.parallelMap(partitions, |_, rows| {
			let rowCount = rows.len();
			let section = self.encodeRows(rows)?;
			let done = done.fetch_add(rowCount, Ordering::Relaxed) + rowCount;
			progress.report(ProgressEvent::RowsEncoded { done, total });
			Ok::<_, EncodeError>(section)
		})?;
		let mut script = self.header();
		script.reserve(sections.iter().map(String::len).sum::<usize>() + FOOTER.len());
		for section in &sections {
			script.push_str(section);
		}
		script.push_str(FOOTER);
		Ok(script)
	}
}

/// Encodes the whole script before touching `path`, so a failure leaves any previous file intact.
pub fn writeScript(
	path: &Path,
	mask: &Mask,
	snow: SnowSelection,
	pool: &WorkerPool,
	progress: &ProgressReporter,
) -> Result<(), EncodeError> {
	let started = Instant::now();
	let script = ScriptEncoder::new(mask, snow).encode(pool, progress)?;
	writeAtomically(path, |file| file.write_all(script.as_bytes()))?;
	log::info!("wrote {} ({} bytes) in {:.2?}", path.display(), script.len(), started.elapsed());
	Ok(())
}
