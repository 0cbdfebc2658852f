//! JSON file-backed [`SettingsStore`] for standalone deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	settings::{Settings, SettingsError, SettingsFuture, SettingsStore},
};

/// Reads settings from a JSON file on every load so external edits are picked up by the next
/// drain cycle; saves replace the file atomically.
#[derive(Clone, Debug)]
pub struct FileSettings {
	path: PathBuf,
	write_guard: Arc<Mutex<()>>,
}
impl FileSettings {
	/// Opens a store at the provided path, creating parent directories when missing.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_guard: Default::default() })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_snapshot(path: &Path) -> Result<Settings, SettingsError> {
		if !path.exists() {
			return Ok(Settings::default());
		}

		let bytes = fs::read(path).map_err(|e| SettingsError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Settings::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| SettingsError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), SettingsError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| SettingsError::Backend {
				message: format!("Failed to create settings directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
		let _guard = self.write_guard.lock();

		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(settings).map_err(|e| SettingsError::Serialization {
				message: format!("Failed to serialize settings: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| SettingsError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| SettingsError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| SettingsError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| SettingsError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SettingsStore for FileSettings {
	fn load(&self) -> SettingsFuture<'_, Settings> {
		Box::pin(async move { Self::read_snapshot(&self.path) })
	}

	fn save(&self, settings: Settings) -> SettingsFuture<'_, ()> {
		Box::pin(async move { self.persist(&settings) })
	}
}
