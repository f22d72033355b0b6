use {
	crate::{
		dominant::{dominantLayer, LayerId, SnowSelection},
		error::{DecodeError, FormatError, MaskError},
		layer::{decodeLayer, encodeLayer, LayerGrid},
		mask::{Geometry, MaskHeader, HEADER_LEN},
		pool::WorkerPool,
		progress::{DecodeProgress, ProgressReporter},
		LAYER_COUNT,
	},
	std::{
		fs::File,
		io::{self, BufReader, Read, Write},
		path::Path,
		time::Instant,
	},
};

/// A fully decoded mask. Immutable once built; encoders borrow it.
#[derive(Debug)]
pub struct Mask {
	header: MaskHeader,
	geometry: Geometry,
	layers: Vec<LayerGrid>,
}

impl Mask {
	/// Assembles a mask from already decoded grids, one per layer in layer order.
	pub fn new(header: MaskHeader, layers: Vec<LayerGrid>) -> Result<Self, FormatError> {
		header.validate()?;
		let geometry = Geometry::of(&header)?;
		let fits = |layer: &LayerGrid| [layer.width(), layer.height()] == [geometry.width(), geometry.height()];
		if layers.len() != LAYER_COUNT || !layers.iter().all(fits) {
			return Err(FormatError::LayerShape { width: geometry.width(), height: geometry.height() });
		}
		Ok(Self { header, geometry, layers })
	}

	/// Like [`Mask::read`], but a file shorter than its header claims fails before any layer is read.
	pub fn open(path: impl AsRef<Path>, pool: &WorkerPool, progress: &ProgressReporter) -> Result<Self, MaskError> {
		let path = path.as_ref();
		log::info!("reading {}", path.display());
		let file = File::open(path)?;
		let fileSize = file.metadata()?.len();
		let mut reader = BufReader::new(file);
		let header = MaskHeader::read(&mut reader)?;
		let expected = maskFileSize(&Geometry::of(&header)?) as u64;
		if fileSize < expected {
			return Err(truncated(format!("{} holds {fileSize} bytes, the header needs {expected}", path.display())).into());
		}
		if fileSize > expected {
			log::warn!("{}: ignoring {} trailing bytes", path.display(), fileSize - expected);
		}
		Self::readLayers(reader, header, pool, progress)
	}

	/// Reads the header and all layer buffers, then decodes the layers in parallel.
	/// The reader is dropped before decoding starts.
	pub fn read(mut reader: impl Read, pool: &WorkerPool, progress: &ProgressReporter) -> Result<Self, MaskError> {
		let header = MaskHeader::read(&mut reader)?;
		Self::readLayers(reader, header, pool, progress)
	}

	fn readLayers(
		mut reader: impl Read,
		header: MaskHeader,
		pool: &WorkerPool,
		progress: &ProgressReporter,
	) -> Result<Self, MaskError> {
		let geometry = Geometry::of(&header)?;
		log::info!(
			"mask v{} {}x{}, {} tiles of {} bytes per layer",
			header.version,
			header.width,
			header.height,
			geometry.blockCount,
			geometry.layerByteSize
		);
		let mut buffers = Vec::with_capacity(LAYER_COUNT);
		for layerId in 0..LAYER_COUNT {
			// sized by the bytes present, not by the header
			let mut buffer = Vec::new();
			reader.by_ref().take(geometry.layerByteSize as u64).read_to_end(&mut buffer)?;
			if buffer.len() < geometry.layerByteSize {
				let message = format!("layer {layerId} holds {} of {} bytes", buffer.len(), geometry.layerByteSize);
				return Err(truncated(message).into());
			}
			buffers.push(buffer);
		}
		drop(reader);

		let (started, tiles) = (Instant::now(), DecodeProgress::new(progress, LAYER_COUNT * geometry.blockCount));
		let layers = pool.parallelMap(buffers, |layerId, bytes| {
			let grid = decodeLayer(&geometry, &bytes, &tiles).map_err(|source| match source {
				DecodeError::Cancelled => MaskError::Cancelled,
				source => MaskError::DecodeWorker { layer: layerId, source },
			})?;
			log::debug!("layer {layerId} decoded");
			Ok::<_, MaskError>(grid)
		})?;
		log::info!("decoded {LAYER_COUNT} layers in {:.2?}", started.elapsed());
		Ok(Self { header, geometry, layers })
	}

	pub fn header(&self) -> &MaskHeader {
		&self.header
	}

	pub fn geometry(&self) -> &Geometry {
		&self.geometry
	}

	pub fn layers(&self) -> &[LayerGrid] {
		&self.layers
	}

	#[inline(always)]
	pub fn width(&self) -> usize {
		self.geometry.width()
	}

	#[inline(always)]
	pub fn height(&self) -> usize {
		self.geometry.height()
	}

	#[inline(always)]
	pub fn dominantLayerAt(&self, snow: SnowSelection, x: usize, y: usize) -> Option<LayerId> {
		dominantLayer(&self.layers, snow, x, y)
	}
}

/// Writes `mask` in the on-disk layout `Mask::read` expects.
pub fn writeMask(writer: &mut impl Write, mask: &Mask) -> io::Result<()> {
	mask.header.write(writer)?;
	for layer in &mask.layers {
		writer.write_all(&encodeLayer(&mask.geometry, layer))?;
	}
	writer.flush()
}

fn truncated(message: String) -> io::Error {
	io::Error::new(io::ErrorKind::UnexpectedEof, message)
}

/// Size of a complete mask file with the given geometry.
pub fn maskFileSize(geometry: &Geometry) -> usize {
	HEADER_LEN + LAYER_COUNT * geometry.layerByteSize
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{mask::MAX_SIDE, progress::CancelToken},
		std::fs,
		rand::{rngs::StdRng, Rng, SeedableRng},
	};

	fn randomMask(size: u32, seed: u64) -> Mask {
		let mut rng = StdRng::seed_from_u64(seed);
		let layers = (0..LAYER_COUNT)
			.map(|_| LayerGrid::fromFn(size as _, size as _, |_, _| rng.gen_range(0..=15)))
			.collect();
		Mask::new(MaskHeader { version: 2, unknown: 0, width: size, height: size }, layers).unwrap()
	}

	fn encoded(mask: &Mask) -> Vec<u8> {
		let mut bytes = Vec::new();
		writeMask(&mut bytes, mask).unwrap();
		assert_eq!(bytes.len(), maskFileSize(mask.geometry()));
		bytes
	}

	#[test]
	fn reads_back_every_layer_in_order() {
		let mask = randomMask(128, 1);
		let pool = WorkerPool::new(Some(3)).unwrap();
		let read = Mask::read(encoded(&mask).as_slice(), &pool, &ProgressReporter::silent()).unwrap();
		assert_eq!(read.header(), mask.header());
		assert_eq!(read.layers(), mask.layers());
	}

	#[test]
	fn truncated_layer_data_is_an_io_error() {
		let bytes = encoded(&randomMask(64, 2));
		let pool = WorkerPool::new(Some(2)).unwrap();
		let err = Mask::read(&bytes[..bytes.len() - 1], &pool, &ProgressReporter::silent()).unwrap_err();
		assert!(matches!(err, MaskError::Io(ref io) if io.kind() == io::ErrorKind::UnexpectedEof), "{err}");
	}

	#[test]
	fn header_claiming_more_data_than_present_fails_cleanly() {
		let mut bytes = Vec::new();
		MaskHeader { version: 1, unknown: 0, width: MAX_SIDE, height: MAX_SIDE }.write(&mut bytes).unwrap();
		bytes.extend_from_slice(&[0x11; 100]);
		let pool = WorkerPool::new(Some(2)).unwrap();
		let err = Mask::read(bytes.as_slice(), &pool, &ProgressReporter::silent()).unwrap_err();
		assert!(matches!(err, MaskError::Io(ref io) if io.kind() == io::ErrorKind::UnexpectedEof), "{err}");

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("t3TextureMasks");
		fs::write(&path, &bytes).unwrap();
		let err = Mask::open(&path, &pool, &ProgressReporter::silent()).unwrap_err();
		assert!(matches!(err, MaskError::Io(ref io) if io.kind() == io::ErrorKind::UnexpectedEof), "{err}");
	}

	#[test]
	fn header_past_the_size_limit_is_a_format_error() {
		let mut bytes = Vec::new();
		MaskHeader { version: 1, unknown: 0, width: 1 << 20, height: 1 << 20 }.write(&mut bytes).unwrap();
		let pool = WorkerPool::new(Some(2)).unwrap();
		let err = Mask::read(bytes.as_slice(), &pool, &ProgressReporter::silent()).unwrap_err();
		assert!(matches!(err, MaskError::Format(FormatError::TooLarge { .. })), "{err}");
	}

	#[test]
	fn open_reads_a_complete_file_and_tolerates_trailing_bytes() {
		let mask = randomMask(64, 5);
		let mut bytes = encoded(&mask);
		bytes.extend_from_slice(b"tail");
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("t3TextureMasks");
		fs::write(&path, &bytes).unwrap();
		let read = Mask::open(&path, &WorkerPool::new(Some(2)).unwrap(), &ProgressReporter::silent()).unwrap();
		assert_eq!(read.layers(), mask.layers());
	}

	#[test]
	fn bad_magic_fails_before_any_layer_is_read() {
		let mut bytes = encoded(&randomMask(64, 3));
		bytes[0] = b'X';
		let pool = WorkerPool::new(Some(2)).unwrap();
		let err = Mask::read(bytes.as_slice(), &pool, &ProgressReporter::silent()).unwrap_err();
		assert!(matches!(err, MaskError::Format(FormatError::BadMagic { .. })));
	}

	#[test]
	fn cancellation_aborts_the_whole_read() {
		let bytes = encoded(&randomMask(128, 4));
		let (pool, cancel) = (WorkerPool::new(Some(2)).unwrap(), CancelToken::default());
		cancel.cancel();
		let reporter = ProgressReporter::silent().withCancel(cancel);
		assert!(matches!(Mask::read(bytes.as_slice(), &pool, &reporter), Err(MaskError::Cancelled)));
	}

	#[test]
	fn rejects_grids_that_do_not_fit_the_header() {
		let header = MaskHeader { version: 0, unknown: 0, width: 64, height: 64 };
		assert!(Mask::new(header, vec![LayerGrid::filled(64, 64, 0); 7]).is_err());
		assert!(Mask::new(header, vec![LayerGrid::filled(128, 128, 0); LAYER_COUNT]).is_err());
	}
}
