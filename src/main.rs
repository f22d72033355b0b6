#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	clap::{value_parser, Parser},
	indicatif::{ProgressBar, ProgressStyle},
	std::{
		any::Any,
		error::Error,
		path::PathBuf,
		process::ExitCode,
		sync::mpsc::Receiver,
		thread::{self, JoinHandle},
	},
	t3mask_scanner::{
		initLogging,
		pipeline::{ScanJob, SnowOverride},
		pool::WorkerPool,
		progress::{ProgressEvent, ProgressReporter},
		settings::Settings,
		LAYER_COUNT,
	},
};

/// Turns a map's texture masks into the `TextureMap.galaxy` initializer script.
#[derive(Parser)]
struct Args {
	/// Map directory holding `t3TextureMasks`
	mapDir: PathBuf,

	/// Layer treated as snow
	#[clap(long, value_parser = value_parser!(u8).range(0..(LAYER_COUNT as i64)), conflicts_with = "noSnow")]
	snowLayer: Option<u8>,

	/// Snow only competes above this intensity
	#[clap(long, value_parser = value_parser!(u8).range(1..=15))]
	snowThreshold: Option<u8>,

	/// Ignore any configured or previously recorded snow layer
	#[clap(long)]
	noSnow: bool,

	/// Also write the grayscale PNG preview
	#[clap(long)]
	preview: bool,

	/// Worker threads, defaults to the available parallelism
	#[clap(long)]
	workers: Option<usize>,

	/// Settings file, defaults to `t3mask.toml` in the working directory when present
	#[clap(long)]
	config: Option<PathBuf>,

	/// No progress bar
	#[clap(long, short)]
	quiet: bool,
}

fn main() -> ExitCode {
	initLogging();
	match run(Args::parse()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			log::error!("{err}");
			ExitCode::FAILURE
		}
	}
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
	let Args { mapDir, snowLayer, snowThreshold, noSnow, preview, workers, config, quiet } = args;
	let settings = Settings::discover(config.as_deref(), &std::env::current_dir()?)?;
	let maskPath = mapDir.join(&settings.files.mask);
	if !maskPath.is_file() {
		return Err(format!("{} is not a map directory: {} is missing", mapDir.display(), maskPath.display()).into());
	}
	if !mapDir.join(&settings.files.terrain).is_file() {
		log::warn!("{} has no {}", mapDir.display(), settings.files.terrain);
	}

	let job = ScanJob::forMapDir(
		&mapDir,
		&settings,
		SnowOverride { layer: snowLayer, threshold: snowThreshold, disable: noSnow },
		preview || settings.preview,
	)?;
	let pool = WorkerPool::new(workers.or(settings.workers))?;

	let (reporter, events) = ProgressReporter::channel(1024);
	let progressBar = thread::spawn(move || showProgress(&events, quiet));
	let result = job.run(&pool, &reporter);
	drop(reporter);
	joinProgress(progressBar);
	result?;
	Ok(())
}

/// A panicked progress bar is logged; the scan result stands.
fn joinProgress(progressBar: JoinHandle<()>) {
	if let Err(panic) = progressBar.join() {
		log::warn!("progress bar thread panicked: {}", panicMessage(&*panic));
	}
}

fn panicMessage(panic: &(dyn Any + Send)) -> &str {
	panic
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| panic.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("no message")
}

fn showProgress(events: &Receiver<ProgressEvent>, quiet: bool) {
	const STEPS: u64 = 1000;
	let bar = if quiet { ProgressBar::hidden() } else { ProgressBar::new(STEPS) };
	bar.set_style(
		ProgressStyle::default_bar()
			.template("[{bar:40.cyan/blue}] {percent}% {msg}")
			.unwrap_or_else(|_| ProgressStyle::default_bar())
			.progress_chars("▉▊▋▌▍▎▏ "),
	);
	for event in events {
		bar.set_message(match event {
			ProgressEvent::TilesDecoded { .. } => "decoding layers",
			ProgressEvent::RowsEncoded { .. } => "encoding rows",
		});
		bar.set_position(bar.position().max((event.fraction() * STEPS as f32) as u64));
	}
	bar.finish_and_clear();
}
