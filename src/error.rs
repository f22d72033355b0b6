use {
	crate::{
		mask::{BLOCK_SIZE, HEADER_LEN, MAGIC, MAX_SIDE},
		LAYER_COUNT,
	},
	std::io,
	thiserror::Error,
};

#[derive(Debug, Error)]
pub enum FormatError {
	#[error("bad magic: expected \"{}\", got \"{}\"", MAGIC.escape_ascii(), .got.escape_ascii())]
	BadMagic { got: [u8; 4] },

	#[error("header truncated: need {} bytes, have {have}", HEADER_LEN)]
	TruncatedHeader { have: usize },

	#[error("{axis} of {value} is not a positive multiple of {}", BLOCK_SIZE)]
	BadDimension { axis: &'static str, value: u32 },

	#[error("non-square mask {width}x{height}: block rows are counted from the width")]
	NonSquare { width: u32, height: u32 },

	#[error("mask {width}x{height} exceeds the {}x{} limit", MAX_SIDE, MAX_SIDE)]
	TooLarge { width: u32, height: u32 },

	#[error("expected {} layers of {width}x{height} cells", LAYER_COUNT)]
	LayerShape { width: usize, height: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("layer buffer holds {got} bytes, expected {expected}")]
	BufferSize { expected: usize, got: usize },

	#[error("decode cancelled")]
	Cancelled,
}

#[derive(Debug, Error)]
pub enum MaskError {
	#[error("invalid mask format: {0}")]
	Format(#[from] FormatError),

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("layer {layer} failed to decode: {source}")]
	DecodeWorker {
		layer: usize,
		#[source]
		source: DecodeError,
	},

	#[error("mask read cancelled")]
	Cancelled,
}

#[derive(Debug, Error)]
pub enum EncodeError {
	#[error("no layer competes for cell ({x}, {y})")]
	NoDominantLayer { x: usize, y: usize },

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("PNG error: {0}")]
	Png(#[from] png::EncodingError),
}
