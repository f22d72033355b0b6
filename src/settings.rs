use {
	crate::dominant::{SnowSelection, SnowSelectionError},
	serde::{Deserialize, Serialize},
	std::{
		fs, io,
		path::{Path, PathBuf},
	},
	thiserror::Error,
};

pub const SETTINGS_FILE_NAME: &str = "t3mask.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("{}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("{}: {source}", .path.display())]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid snow selection: {0}")]
	InvalidSnow(#[from] SnowSelectionError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub workers: Option<usize>,
	pub preview: bool,
	pub snow: SnowSettings,
	pub files: FileNames,
}

/// Either field may be left out and filled from another source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnowSettings {
	pub layer: Option<u8>,
	pub threshold: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileNames {
	pub mask: String,
	pub terrain: String,
	pub script: String,
	pub preview: String,
}

impl Default for FileNames {
	fn default() -> Self {
		Self {
			mask: "t3TextureMasks".into(),
			terrain: "t3Terrain.xml".into(),
			script: "TextureMap.galaxy".into(),
			preview: "TextureMapPreview.png".into(),
		}
	}
}

impl Settings {
	pub fn load(path: &Path) -> Result<Self, SettingsError> {
		let text = fs::read_to_string(path).map_err(|source| SettingsError::Io { path: path.into(), source })?;
		let settings: Self = toml::from_str(&text).map_err(|source| SettingsError::Toml { path: path.into(), source })?;
		settings.validate()?;
		log::debug!("settings loaded from {}", path.display());
		Ok(settings)
	}

	/// `explicit` must exist; otherwise `t3mask.toml` in `dir` is used when present.
	pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SettingsError> {
		match explicit {
			Some(path) => Self::load(path),
			None => {
				let path = dir.join(SETTINGS_FILE_NAME);
				if path.is_file() {
					Self::load(&path)
				} else {
					Ok(Self::default())
				}
			}
		}
	}

	fn validate(&self) -> Result<(), SettingsError> {
		let SnowSettings { layer, threshold } = self.snow;
		SnowSelection::new(
			layer.map(i64::from),
			threshold.map_or(i64::from(SnowSelection::NONE.threshold), i64::from),
		)?;
		Ok(())
	}
}
