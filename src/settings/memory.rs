//! Thread-safe in-memory [`SettingsStore`] implementation for embedding and tests.

// self
use crate::{
	_prelude::*,
	settings::{Settings, SettingsError, SettingsFuture, SettingsStore},
};

/// Settings backend that keeps the snapshot in-process.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings(Arc<RwLock<Settings>>);
impl MemorySettings {
	/// Creates a store seeded with `settings`.
	pub fn new(settings: Settings) -> Self {
		Self(Arc::new(RwLock::new(settings)))
	}

	/// Returns a copy of the current snapshot without going through the async contract.
	pub fn snapshot(&self) -> Settings {
		self.0.read().clone()
	}

	/// Mutates the snapshot in place.
	pub fn update(&self, f: impl FnOnce(&mut Settings)) {
		f(&mut self.0.write());
	}
}
impl SettingsStore for MemorySettings {
	fn load(&self) -> SettingsFuture<'_, Settings> {
		let settings = self.snapshot();

		Box::pin(async move { Ok::<_, SettingsError>(settings) })
	}

	fn save(&self, settings: Settings) -> SettingsFuture<'_, ()> {
		let inner = self.0.clone();

		Box::pin(async move {
			*inner.write() = settings;

			Ok(())
		})
	}
}
