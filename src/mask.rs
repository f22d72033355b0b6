use {
	crate::error::{FormatError, MaskError},
	byteorder::{ReadBytesExt, WriteBytesExt, LE},
	glam::UVec2,
	serde::Serialize,
	std::io::{self, Read, Write},
};

pub const MAGIC: [u8; 4] = *b"MASK";
pub const HEADER_LEN: usize = 64;
const RESERVED_LEN: usize = 11 * 4;

/// Cells per tile edge.
pub const BLOCK_SIZE: usize = 64;
/// Packed bytes per tile, two cells per byte.
pub const TILE_BYTE_SIZE: usize = BLOCK_SIZE * BLOCK_SIZE / 2;
/// Widest mask accepted; 32 MiB of packed cells per layer.
pub const MAX_SIDE: u32 = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MaskHeader {
	pub version: u32,
	pub unknown: u32,
	pub width: u32,
	pub height: u32,
}

impl MaskHeader {
	/// Reads exactly `HEADER_LEN` bytes and validates magic and dimensions.
	pub fn read(reader: &mut impl Read) -> Result<Self, MaskError> {
		let mut bytes = Vec::with_capacity(HEADER_LEN);
		reader.take(HEADER_LEN as _).read_to_end(&mut bytes)?;
		if bytes.len() < HEADER_LEN {
			return Err(FormatError::TruncatedHeader { have: bytes.len() }.into());
		}
		Ok(Self::parse(&bytes)?)
	}

	fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
		let mut cursor = io::Cursor::new(bytes);
		let mut magic = [0; 4];
		// the slice is HEADER_LEN long, so none of these reads can run dry
		cursor.read_exact(&mut magic).map_err(|_| FormatError::TruncatedHeader { have: bytes.len() })?;
		if magic != MAGIC {
			return Err(FormatError::BadMagic { got: magic });
		}
		let mut fields = [0_u32; 4];
		cursor
			.read_u32_into::<LE>(&mut fields)
			.map_err(|_| FormatError::TruncatedHeader { have: bytes.len() })?;
		let [version, unknown, width, height] = fields;
		let header = Self { version, unknown, width, height };
		header.validate()?;
		Ok(header)
	}

	/// Dimensions on the block grid, square, and small enough for `Geometry::of`.
	pub fn validate(&self) -> Result<(), FormatError> {
		for (axis, value) in [("width", self.width), ("height", self.height)] {
			if value == 0 || value as usize % BLOCK_SIZE != 0 {
				return Err(FormatError::BadDimension { axis, value });
			}
		}
		if self.width != self.height {
			return Err(FormatError::NonSquare { width: self.width, height: self.height });
		}
		Geometry::of(self)?;
		Ok(())
	}

	pub fn write(&self, writer: &mut impl Write) -> io::Result<()> {
		writer.write_all(&MAGIC)?;
		for field in [self.version, self.unknown, self.width, self.height] {
			writer.write_u32::<LE>(field)?;
		}
		writer.write_all(&[0; RESERVED_LEN])
	}
}

/// Tile layout derived from a validated header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Geometry {
	pub size: UVec2,
	pub blocks: UVec2,
	pub blockCount: usize,
	pub layerByteSize: usize,
}

impl Geometry {
	pub fn of(header: &MaskHeader) -> Result<Self, FormatError> {
		let tooLarge = || FormatError::TooLarge { width: header.width, height: header.height };
		if header.width > MAX_SIDE || header.height > MAX_SIDE {
			return Err(tooLarge());
		}
		// Both tile counts come from the width; existing mask files are laid out this way.
		let blocksPerAxis = header.width as usize / BLOCK_SIZE;
		let blockCount = blocksPerAxis.checked_mul(blocksPerAxis).ok_or_else(tooLarge)?;
		Ok(Self {
			size: UVec2::new(header.width, header.height),
			blocks: UVec2::splat(header.width / BLOCK_SIZE as u32),
			blockCount,
			layerByteSize: blockCount.checked_mul(TILE_BYTE_SIZE).ok_or_else(tooLarge)?,
		})
	}

	#[inline(always)]
	pub fn width(&self) -> usize {
		self.size.x as _
	}

	#[inline(always)]
	pub fn height(&self) -> usize {
		self.size.y as _
	}
}
