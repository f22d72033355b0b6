use {
	crate::{layer::LayerGrid, LAYER_COUNT},
	core::ops::RangeInclusive,
	serde::{Deserialize, Serialize},
	thiserror::Error,
};

pub type LayerId = u8;

pub const SNOW_THRESHOLD_RANGE: RangeInclusive<u8> = 1..=15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnowSelectionError {
	#[error("snow layer {0} is out of range 0..8")]
	Layer(i64),

	#[error("snow threshold {0} is out of range 1..=15")]
	Threshold(i64),
}

/// Which layer counts as snow, and how strong it must be before it competes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowSelection {
	pub layer: Option<LayerId>,
	pub threshold: u8,
}

impl Default for SnowSelection {
	fn default() -> Self {
		Self::NONE
	}
}

impl SnowSelection {
	pub const NONE: Self = Self { layer: None, threshold: *SNOW_THRESHOLD_RANGE.start() };

	pub fn new(layer: Option<i64>, threshold: i64) -> Result<Self, SnowSelectionError> {
		let layer = layer
			.map(|layer| {
				LayerId::try_from(layer)
					.ok()
					.filter(|&layerId| usize::from(layerId) < LAYER_COUNT)
					.ok_or(SnowSelectionError::Layer(layer))
			})
			.transpose()?;
		let threshold = u8::try_from(threshold)
			.ok()
			.filter(|threshold| SNOW_THRESHOLD_RANGE.contains(threshold))
			.ok_or(SnowSelectionError::Threshold(threshold))?;
		Ok(Self { layer, threshold })
	}

	/// Value written to the `snow_index=` script comment; -1 stands for no snow layer.
	pub fn persistedIndex(&self) -> i64 {
		self.layer.map_or(-1, i64::from)
	}

	#[inline(always)]
	fn excludes(&self, layerId: LayerId, value: u8) -> bool {
		self.layer == Some(layerId) && value <= self.threshold
	}
}

/// Strongest layer at `(x, y)`; ties keep the lower id, and the snow layer only
/// competes above its threshold. `None` when no layer competes at all.
pub fn dominantLayer(layers: &[LayerGrid], snow: SnowSelection, x: usize, y: usize) -> Option<LayerId> {
	let mut best: Option<(LayerId, u8)> = None;
	for (layerId, layer) in (0..).zip(layers) {
		let value = layer.get(x, y);
		if snow.excludes(layerId, value) {
			continue;
		}
		if best.map_or(true, |(_, bestValue)| value > bestValue) {
			best = Some((layerId, value));
		}
	}
	best.map(|(layerId, _)| layerId)
}

#[cfg(test)]
mod tests {
	use {super::*, array_macro::array};

	fn layers(values: [u8; LAYER_COUNT]) -> Vec<LayerGrid> {
		values.iter().map(|&value| LayerGrid::filled(64, 64, value)).collect()
	}

	#[test]
	fn picks_the_strongest_layer() {
		let layers = layers([2, 2, 2, 9, 2, 2, 2, 2]);
		assert_eq!(dominantLayer(&layers, SnowSelection::NONE, 0, 0), Some(3));
		assert_eq!(dominantLayer(&layers, SnowSelection::NONE, 63, 63), Some(3));
	}

	#[test]
	fn ties_keep_the_lowest_layer() {
		assert_eq!(dominantLayer(&layers([1, 5, 0, 5, 5, 2, 2, 2]), SnowSelection::NONE, 7, 7), Some(1));
		assert_eq!(dominantLayer(&layers([0; LAYER_COUNT]), SnowSelection::NONE, 7, 7), Some(0));
		let snow = SnowSelection::new(Some(0), 1).unwrap();
		assert_eq!(dominantLayer(&layers([0; LAYER_COUNT]), snow, 7, 7), Some(1));
		assert_eq!(dominantLayer(&layers([0, 0, 0, 0, 0, 0, 0, 1]), SnowSelection::NONE, 7, 7), Some(7));
	}

	#[test]
	fn snow_at_or_below_threshold_never_wins() {
		let snow = SnowSelection::new(Some(3), 10).unwrap();
		for value in 0..=10 {
			let layers = layers([2, 2, 2, value, 2, 2, 2, 2]);
			assert_eq!(dominantLayer(&layers, snow, 0, 0), Some(0), "snow value {value}");
		}
	}

	#[test]
	fn snow_above_threshold_competes_normally() {
		let snow = SnowSelection::new(Some(3), 10).unwrap();
		assert_eq!(dominantLayer(&layers([2, 2, 2, 11, 2, 2, 2, 2]), snow, 0, 0), Some(3));
		assert_eq!(dominantLayer(&layers([12, 2, 2, 11, 2, 2, 2, 2]), snow, 0, 0), Some(0));
		assert_eq!(dominantLayer(&layers([11, 2, 2, 11, 2, 2, 2, 2]), snow, 0, 0), Some(0));
	}

	#[test]
	fn lone_snow_layer_below_threshold_has_no_winner() {
		let snow = SnowSelection::new(Some(0), 15).unwrap();
		assert_eq!(dominantLayer(&[LayerGrid::filled(64, 64, 15)], snow, 0, 0), None);
	}

	#[test]
	fn repeated_calls_agree() {
		let layers: Vec<_> =
			array![layerId => LayerGrid::fromFn(64, 64, |x, y| ((x * 7 + y * 3 + layerId * 5) % 16) as u8); LAYER_COUNT]
				.into();
		let snow = SnowSelection::new(Some(5), 6).unwrap();
		for (x, y) in [(0, 0), (13, 40), (63, 1)] {
			let first = dominantLayer(&layers, snow, x, y);
			assert!(first.is_some());
			assert!((0..4).all(|_| dominantLayer(&layers, snow, x, y) == first));
		}
	}

	#[test]
	fn validates_selection_ranges() {
		assert_eq!(SnowSelection::new(Some(8), 5), Err(SnowSelectionError::Layer(8)));
		assert_eq!(SnowSelection::new(Some(-1), 5), Err(SnowSelectionError::Layer(-1)));
		assert_eq!(SnowSelection::new(None, 0), Err(SnowSelectionError::Threshold(0)));
		assert_eq!(SnowSelection::new(None, 16), Err(SnowSelectionError::Threshold(16)));
		assert_eq!(SnowSelection::new(Some(7), 15).unwrap().persistedIndex(), 7);
		assert_eq!(SnowSelection::NONE.persistedIndex(), -1);
		assert_eq!(SnowSelectionError::Layer(9).to_string(), "snow layer 9 is out of range 0..8");
	}
}
