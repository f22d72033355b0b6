use {
	crate::error::DecodeError,
	std::sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		mpsc::{self, Receiver, SyncSender},
		Arc,
	},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
	TilesDecoded { done: usize, total: usize },
	RowsEncoded { done: usize, total: usize },
}

impl ProgressEvent {
	/// Fraction of the whole scan, decoding being the first half.
	pub fn fraction(&self) -> f32 {
		match *self {
			Self::TilesDecoded { done, total } => done as f32 / total.max(1) as f32 * 0.5,
			Self::RowsEncoded { done, total } => 0.5 + done as f32 / total.max(1) as f32 * 0.5,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn isCancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Lossy sink for progress events plus the cancellation flag workers poll.
#[derive(Debug, Default)]
pub struct ProgressReporter {
	sender: Option<SyncSender<ProgressEvent>>,
	cancel: CancelToken,
}

impl ProgressReporter {
	pub fn silent() -> Self {
		Self::default()
	}

	pub fn channel(bound: usize) -> (Self, Receiver<ProgressEvent>) {
		let (sender, receiver) = mpsc::sync_channel(bound);
		(Self { sender: Some(sender), cancel: CancelToken::default() }, receiver)
	}

	#[must_use]
	pub fn withCancel(self, cancel: CancelToken) -> Self {
		Self { cancel, ..self }
	}

	pub fn report(&self, event: ProgressEvent) {
		if let Some(sender) = &self.sender {
			// a full channel only drops an intermediate event
			_ = sender.try_send(event);
		}
	}

	pub fn isCancelled(&self) -> bool {
		self.cancel.isCancelled()
	}
}

/// Tile counter shared by all layer decoders of one read.
pub struct DecodeProgress<'a> {
	reporter: &'a ProgressReporter,
	done: AtomicUsize,
	total: usize,
}

impl<'a> DecodeProgress<'a> {
	pub fn new(reporter: &'a ProgressReporter, total: usize) -> Self {
		Self { reporter, done: AtomicUsize::new(0), total }
	}

	pub fn tileDecoded(&self) -> Result<(), DecodeError> {
		let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
		self.reporter.report(ProgressEvent::TilesDecoded { done, total: self.total });
		if self.reporter.isCancelled() {
			return Err(DecodeError::Cancelled);
		}
		Ok(())
	}

	pub fn done(&self) -> usize {
		self.done.load(Ordering::Relaxed)
	}
}
