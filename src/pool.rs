use {
	core::num::NonZeroUsize,
	rayon::{prelude::*, ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder},
	std::thread,
};

/// Bounded worker pool shared by layer decoding and script encoding.
pub struct WorkerPool {
	pool: ThreadPool,
}

impl WorkerPool {
	/// `None` or zero sizes the pool to the available parallelism.
	pub fn new(workers: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
		let workers = workers
			.filter(|&workers| workers > 0)
			.unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get));
		let pool = ThreadPoolBuilder::new()
			.num_threads(workers)
			.thread_name(|i| format!("t3mask-worker-{i}"))
			.build()?;
		log::debug!("worker pool with {workers} threads");
		Ok(Self { pool })
	}

	pub fn workerCount(&self) -> usize {
		self.pool.current_num_threads()
	}

	/// Runs every task on the pool; results come back in task order, the first error wins.
	pub fn parallelMap<T, R, E>(
		&self,
		tasks: Vec<T>,
		task: impl Fn(usize, T) -> Result<R, E> + Sync + Send,
	) -> Result<Vec<R>, E>
	where
		T: Send,
		R: Send,
		E: Send,
	{
		self.pool.install(|| tasks.into_par_iter().enumerate().map(|(i, input)| task(i, input)).collect())
	}

	pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
		self.pool.install(op)
	}
}
