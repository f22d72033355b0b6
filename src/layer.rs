use {
	crate::{
		error::DecodeError,
		mask::{Geometry, BLOCK_SIZE, TILE_BYTE_SIZE},
		progress::DecodeProgress,
	},
	core::ops::Index,
};

/// Dense row-major grid of 4-bit intensities for one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerGrid {
	width: usize,
	height: usize,
	cells: Box<[u8]>,
}

impl LayerGrid {
	pub fn filled(width: usize, height: usize, value: u8) -> Self {
		Self { width, height, cells: vec![value & 0x0F; width * height].into_boxed_slice() }
	}

	pub fn fromFn(width: usize, height: usize, mut cell: impl FnMut(usize, usize) -> u8) -> Self {
		let mut grid = Self::filled(width, height, 0);
		for (i, value) in grid.cells.iter_mut().enumerate() {
			*value = cell(i % width, i / width) & 0x0F;
		}
		grid
	}

	#[inline(always)]
	pub fn width(&self) -> usize {
		self.width
	}

	#[inline(always)]
	pub fn height(&self) -> usize {
		self.height
	}

	#[inline(always)]
	pub fn get(&self, x: usize, y: usize) -> u8 {
		self.cells[y * self.width + x]
	}

	pub fn set(&mut self, x: usize, y: usize, value: u8) {
		self.cells[y * self.width + x] = value & 0x0F;
	}

	pub fn row(&self, y: usize) -> &[u8] {
		&self.cells[y * self.width..][..self.width]
	}
}

impl Index<(usize, usize)> for LayerGrid {
	type Output = u8;

	#[inline(always)]
	fn index(&self, (x, y): (usize, usize)) -> &u8 {
		&self.cells[y * self.width + x]
	}
}

/*
	Tile-major packing:

	tiles follow each other row-major over the blocks grid; inside a tile the 64 cell rows
	(stored as 8 lines of 8 rows) follow each other, 32 bytes per row.
	The high nibble of a byte is the even column, the low nibble the odd one.
*/
pub fn decodeLayer(
	geometry: &Geometry,
	bytes: &[u8],
	progress: &DecodeProgress<'_>,
) -> Result<LayerGrid, DecodeError> {
	if bytes.len() != geometry.layerByteSize {
		return Err(DecodeError::BufferSize { expected: geometry.layerByteSize, got: bytes.len() });
	}
	let (width, blocksX) = (geometry.width(), geometry.blocks.x as usize);
	let mut grid = LayerGrid::filled(width, geometry.height(), 0);
	for (block, tile) in bytes.chunks_exact(TILE_BYTE_SIZE).enumerate() {
		let (x0, y0) = ((block % blocksX) * BLOCK_SIZE, (block / blocksX) * BLOCK_SIZE);
		for (row, packed) in tile.chunks_exact(BLOCK_SIZE / 2).enumerate() {
			let cells = &mut grid.cells[(y0 + row) * width + x0..][..BLOCK_SIZE];
			for (pair, &byte) in cells.chunks_exact_mut(2).zip(packed) {
				pair[0] = byte >> 4;
				pair[1] = byte & 0x0F;
			}
		}
		progress.tileDecoded()?;
	}
	Ok(grid)
}

/// Inverse of [`decodeLayer`].
pub fn encodeLayer(geometry: &Geometry, grid: &LayerGrid) -> Vec<u8> {
	let blocksX = geometry.blocks.x as usize;
	let mut bytes = Vec::with_capacity(geometry.layerByteSize);
	for block in 0..geometry.blockCount {
		let (x0, y0) = ((block % blocksX) * BLOCK_SIZE, (block / blocksX) * BLOCK_SIZE);
		for row in 0..BLOCK_SIZE {
			let cells = &grid.row(y0 + row)[x0..][..BLOCK_SIZE];
			bytes.extend(cells.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));
		}
	}
	bytes
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			mask::MaskHeader,
			progress::{CancelToken, ProgressReporter},
		},
		rand::{rngs::StdRng, Rng, SeedableRng},
	};

	fn geometry(size: u32) -> Geometry {
		Geometry::of(&MaskHeader { version: 0, unknown: 0, width: size, height: size }).unwrap()
	}

	fn decode(geometry: &Geometry, bytes: &[u8]) -> Result<LayerGrid, DecodeError> {
		let reporter = ProgressReporter::silent();
		decodeLayer(geometry, bytes, &DecodeProgress::new(&reporter, geometry.blockCount))
	}

	#[test]
	fn splits_bytes_into_high_then_low_nibble() {
		let geometry = geometry(64);
		let grid = decode(&geometry, &vec![0x3C; geometry.layerByteSize]).unwrap();
		assert!(grid.row(0).chunks(2).all(|pair| pair == [0x3, 0xC]));
		assert!(grid.row(63).chunks(2).all(|pair| pair == [0x3, 0xC]));
	}

	#[test]
	fn places_tiles_row_major_over_the_blocks_grid() {
		let geometry = geometry(128);
		let mut bytes = vec![0; geometry.layerByteSize];
		for (block, tile) in bytes.chunks_exact_mut(TILE_BYTE_SIZE).enumerate() {
			tile.fill((block as u8 + 1) * 0x11);
		}
		// line 2, sub-row 5 of tile 3, bytes 10 and 11
		let rowStart = 3 * TILE_BYTE_SIZE + (2 * 8 + 5) * 32;
		bytes[rowStart + 10] = 0xAB;
		let grid = decode(&geometry, &bytes).unwrap();
		assert_eq!((grid[(0, 0)], grid[(64, 0)], grid[(0, 64)], grid[(127, 127)]), (1, 2, 3, 4));
		assert_eq!((grid[(64 + 20, 64 + 21)], grid[(64 + 21, 64 + 21)]), (0xA, 0xB));
		assert_eq!(grid[(64 + 22, 64 + 21)], 4);
	}

	#[test]
	fn round_trips_random_grids() {
		let mut rng = StdRng::seed_from_u64(0x7E57);
		for size in [64, 192] {
			let geometry = geometry(size);
			let grid = LayerGrid::fromFn(size as _, size as _, |_, _| rng.gen_range(0..=15));
			let bytes = encodeLayer(&geometry, &grid);
			assert_eq!(bytes.len(), geometry.layerByteSize);
			assert_eq!(decode(&geometry, &bytes).unwrap(), grid);
		}
	}

	#[test]
	fn rejects_wrong_buffer_size() {
		let geometry = geometry(64);
		let err = decode(&geometry, &[0; 100]).unwrap_err();
		assert!(matches!(err, DecodeError::BufferSize { expected: 2048, got: 100 }));
	}

	#[test]
	fn stops_after_the_tile_that_observed_cancellation() {
		let geometry = geometry(128);
		let cancel = CancelToken::default();
		cancel.cancel();
		let reporter = ProgressReporter::silent().withCancel(cancel);
		let progress = DecodeProgress::new(&reporter, geometry.blockCount);
		let err = decodeLayer(&geometry, &vec![0; geometry.layerByteSize], &progress).unwrap_err();
		assert!(matches!(err, DecodeError::Cancelled));
		assert_eq!(progress.done(), 1);
	}
}
