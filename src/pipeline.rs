use {
	crate::{
		dominant::{SnowSelection, SnowSelectionError},
		error::{EncodeError, MaskError},
		pool::WorkerPool,
		progress::ProgressReporter,
		raster::writePreview,
		reader::Mask,
		script::writeScript,
		settings::{Settings, SnowSettings},
		snow::readSnowSelection,
	},
	std::{
		path::{Path, PathBuf},
		time::Instant,
	},
	thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ScanError {
	#[error(transparent)]
	Mask(#[from] MaskError),

	#[error("encoding failed: {0}")]
	Encode(#[from] EncodeError),
}

/// Snow request given on the command line; `disable` wins over `layer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnowOverride {
	pub layer: Option<u8>,
	pub threshold: Option<u8>,
	pub disable: bool,
}

/// Resolves layer and threshold independently: command line, then settings,
/// then whatever the previous script recorded, then no snow layer.
pub fn resolveSnowSelection(
	cli: SnowOverride,
	settings: SnowSettings,
	recovered: Option<SnowSelection>,
) -> Result<SnowSelection, SnowSelectionError> {
	let layer = if cli.disable {
		None
	} else {
		cli.layer.or(settings.layer).or_else(|| recovered.and_then(|snow| snow.layer))
	};
	let threshold = cli
		.threshold
		.or(settings.threshold)
		.or_else(|| recovered.map(|snow| snow.threshold))
		.unwrap_or(SnowSelection::NONE.threshold);
	SnowSelection::new(layer.map(i64::from), i64::from(threshold))
}

/// One scan of a map directory: mask in, script (and optionally preview) out.
#[derive(Clone, Debug)]
pub struct ScanJob {
	pub maskPath: PathBuf,
	pub scriptPath: PathBuf,
	pub previewPath: Option<PathBuf>,
	pub snow: SnowSelection,
}

impl ScanJob {
	/// Paths follow the map directory layout; the preview lands in the working directory.
	pub fn forMapDir(
		mapDir: &Path,
		settings: &Settings,
		cli: SnowOverride,
		preview: bool,
	) -> Result<Self, SnowSelectionError> {
		let scriptPath = mapDir.join(&settings.files.script);
		let snow = resolveSnowSelection(cli, settings.snow, readSnowSelection(&scriptPath))?;
		Ok(Self {
			maskPath: mapDir.join(&settings.files.mask),
			scriptPath,
			previewPath: preview.then(|| PathBuf::from(&settings.files.preview)),
			snow,
		})
	}

	/// Nothing is written unless the whole mask decoded.
	pub fn run(&self, pool: &WorkerPool, progress: &ProgressReporter) -> Result<Mask, ScanError> {
		let started = Instant::now();
		log::info!("snow selection: {:?}", self.snow);
		let mask = Mask::open(&self.maskPath, pool, progress)?;
		writeScript(&self.scriptPath, &mask, self.snow, pool, progress)?;
		if let Some(previewPath) = &self.previewPath {
			writePreview(previewPath, &mask, self.snow, pool)?;
		}
		log::info!("scan finished in {:.2?}", started.elapsed());
		Ok(mask)
	}
}
