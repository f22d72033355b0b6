use {
	crate::{dominant::SnowSelection, error::EncodeError, pool::WorkerPool, reader::Mask, writeAtomically},
	png::{BitDepth, ColorType},
	rayon::prelude::*,
	std::{io::Write, path::Path, time::Instant},
};

/// Gray step between consecutive layer ids; layer 7 ends up at 56.
pub const LAYER_GRAY_STEP: u8 = 8;

/// One gray byte per cell, top output row holding the highest `y`.
pub fn rasterize(mask: &Mask, snow: SnowSelection, pool: &WorkerPool) -> Result<Vec<u8>, EncodeError> {
	let (width, height) = (mask.width(), mask.height());
	let mut pixels = vec![0; width * height];
	pool.install(|| {
		pixels.par_chunks_mut(width).enumerate().try_for_each(|(row, pixels)| {
			let y = height - 1 - row;
			for (x, pixel) in pixels.iter_mut().enumerate() {
				let layerId = mask.dominantLayerAt(snow, x, y).ok_or(EncodeError::NoDominantLayer { x, y })?;
				*pixel = layerId * LAYER_GRAY_STEP;
			}
			Ok::<_, EncodeError>(())
		})
	})?;
	Ok(pixels)
}

pub fn writePng(writer: impl Write, width: usize, height: usize, pixels: &[u8]) -> Result<(), EncodeError> {
	let mut png = png::Encoder::new(writer, width as _, height as _);
	png.set_color(ColorType::Grayscale);
	png.set_depth(BitDepth::Eight);
	png.write_header()?.write_image_data(pixels)?;
	Ok(())
}

pub fn writePreview(path: &Path, mask: &Mask, snow: SnowSelection, pool: &WorkerPool) -> Result<(), EncodeError> {
	let started = Instant::now();
	let pixels = rasterize(mask, snow, pool)?;
	let mut encoded = Vec::new();
	writePng(&mut encoded, mask.width(), mask.height(), &pixels)?;
	writeAtomically(path, |file| file.write_all(&encoded))?;
	log::info!("wrote preview {} in {:.2?}", path.display(), started.elapsed());
	Ok(())
}
