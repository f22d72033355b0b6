#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	array_macro::array,
	clap::{value_parser, Parser},
	rand::{rngs::StdRng, Rng, SeedableRng},
	std::{error::Error, io::BufWriter, process::ExitCode},
	t3mask_scanner::{
		initLogging,
		layer::LayerGrid,
		mask::{MaskHeader, BLOCK_SIZE},
		reader::{writeMask, Mask},
		stdoutRaw, LAYER_COUNT,
	},
};

/*
	Writes a valid mask file to stdout. Every layer is a few soft blobs plus noise,
	so the dominant layer map comes out patchy rather than salt and pepper.
*/
fn main() -> ExitCode {
	initLogging();
	#[derive(Parser)]
	struct Args {
		/// Blocks per axis, each 64 cells wide
		#[clap(long, default_value_t = 4, value_parser = value_parser!(u32).range(1..=64))]
		blocks: u32,

		#[clap(long, default_value_t = 0)]
		seed: u64,

		#[clap(long, default_value_t = 1)]
		version: u32,
	}
	let Args { blocks, seed, version } = Args::parse();
	let size = blocks * BLOCK_SIZE as u32;
	let rng = &mut StdRng::seed_from_u64(seed);

	let extent = size as f32;
	let layers = array![_layerId => {
		let blobs: Vec<[f32; 3]> = (0..3)
			.map(|_| [rng.gen_range(0.0..extent), rng.gen_range(0.0..extent), rng.gen_range(8.0..extent / 2.0)])
			.collect();
		LayerGrid::fromFn(size as _, size as _, |x, y| {
			let strength = blobs
				.iter()
				.map(|&[cx, cy, radius]| 1.0 - ((x as f32 - cx).hypot(y as f32 - cy) / radius).min(1.0))
				.fold(0.0_f32, f32::max);
			(strength * 13.0) as u8 + rng.gen_range(0..=2)
		})
	}; LAYER_COUNT];

	let written = Mask::new(MaskHeader { version, unknown: 0, width: size, height: size }, layers.into())
		.map_err(Box::<dyn Error>::from)
		.and_then(|mask| writeMask(&mut BufWriter::new(stdoutRaw()), &mask).map_err(Box::<dyn Error>::from));
	if let Err(err) = written {
		log::error!("{err}");
		return ExitCode::FAILURE;
	}
	log::info!("{size}x{size} mask written, seed {seed}");
	ExitCode::SUCCESS
}
