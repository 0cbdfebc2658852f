//! Settings contracts and built-in settings stores.
//!
//! [`Settings`] mirrors the extension's synced key-value storage. The request queue reads it at
//! the start of every drain cycle to learn the current requests-per-minute budget, and the
//! analyzer reads it before each provider call for credentials and the model name.

pub mod file;
pub mod memory;
pub mod secret;

pub use file::FileSettings;
pub use memory::MemorySettings;
pub use secret::ApiKey;

// std
use std::{num::NonZeroU32, time::Duration as StdDuration};
// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Boxed future returned by [`SettingsStore`] operations.
pub type SettingsFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, SettingsError>> + 'a + Send>>;

/// Key-value settings source consulted by the queue and the analyzer.
pub trait SettingsStore
where
	Self: Send + Sync,
{
	/// Reads the current settings snapshot.
	fn load(&self) -> SettingsFuture<'_, Settings>;

	/// Replaces the stored settings.
	fn save(&self, settings: Settings) -> SettingsFuture<'_, ()>;
}

/// Error type produced by [`SettingsStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SettingsError {
	/// Stored settings could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// User-facing configuration as persisted by the options page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	/// Provider API key.
	pub api_key: Option<ApiKey>,
	/// Provider base URL (e.g. `https://generativelanguage.googleapis.com/v1beta`).
	pub base_url: Option<String>,
	/// Model identifier passed to the provider.
	pub model: Option<String>,
	/// Raw requests-per-minute budget; sanitized through [`RatePerMinute::from_setting`].
	#[serde(deserialize_with = "lenient_rate_limit")]
	pub rate_limit: Option<i64>,
	/// Master switch toggled from the options page or the keyboard command.
	pub extension_enabled: bool,
	/// Load posts automatically when a profile page opens.
	pub auto_load: bool,
}
impl Settings {
	/// Sanitized request budget derived from [`Settings::rate_limit`].
	pub fn rate_per_minute(&self) -> RatePerMinute {
		RatePerMinute::from_setting(self.rate_limit)
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			api_key: None,
			base_url: None,
			model: None,
			rate_limit: None,
			extension_enabled: true,
			auto_load: false,
		}
	}
}

/// Positive requests-per-minute budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RatePerMinute(NonZeroU32);
impl RatePerMinute {
	/// Budget used when the setting is missing or invalid.
	pub const DEFAULT: Self = Self(NonZeroU32::MIN.saturating_add(59));

	/// Builds a budget, returning `None` for zero.
	pub const fn new(per_minute: u32) -> Option<Self> {
		match NonZeroU32::new(per_minute) {
			Some(value) => Some(Self(value)),
			None => None,
		}
	}

	/// Sanitizes a raw setting: missing, non-positive, or out-of-range values fall back to
	/// [`RatePerMinute::DEFAULT`].
	pub fn from_setting(raw: Option<i64>) -> Self {
		raw.and_then(|value| u32::try_from(value).ok())
			.and_then(Self::new)
			.unwrap_or(Self::DEFAULT)
	}

	/// Requests allowed per minute.
	pub const fn get(self) -> u32 {
		self.0.get()
	}

	/// Minimum spacing between two dispatch starts (`60000 / rate` milliseconds).
	pub fn min_interval(self) -> StdDuration {
		StdDuration::from_nanos(60_000_000_000 / u64::from(self.get()))
	}
}
impl Default for RatePerMinute {
	fn default() -> Self {
		Self::DEFAULT
	}
}
impl Display for RatePerMinute {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/min", self.get())
	}
}

// Options pages historically stored the rate as a number or a numeric string; anything else is
// treated as unset.
fn lenient_rate_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<serde_json::Value>::deserialize(deserializer)?;
	let parsed = match value {
		Some(serde_json::Value::Number(number)) =>
			number.as_i64().or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
		Some(serde_json::Value::String(text)) => text.trim().parse::<i64>().ok(),
		_ => None,
	};

	Ok(parsed)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn invalid_rates_fall_back_to_default() {
		assert_eq!(RatePerMinute::from_setting(None), RatePerMinute::DEFAULT);
		assert_eq!(RatePerMinute::from_setting(Some(0)), RatePerMinute::DEFAULT);
		assert_eq!(RatePerMinute::from_setting(Some(-5)), RatePerMinute::DEFAULT);
		assert_eq!(RatePerMinute::from_setting(Some(i64::MAX)), RatePerMinute::DEFAULT);
		assert_eq!(RatePerMinute::from_setting(Some(600)).get(), 600);
	}

	#[test]
	fn min_interval_matches_rate() {
		assert_eq!(RatePerMinute::DEFAULT.min_interval(), StdDuration::from_secs(1));
		assert_eq!(
			RatePerMinute::from_setting(Some(600)).min_interval(),
			StdDuration::from_millis(100)
		);
		assert_eq!(
			RatePerMinute::from_setting(Some(7)).min_interval(),
			StdDuration::from_nanos(8_571_428_571)
		);
	}

	#[test]
	fn settings_default_enables_extension() {
		let settings = Settings::default();

		assert!(settings.extension_enabled);
		assert!(!settings.auto_load);
		assert_eq!(settings.rate_per_minute(), RatePerMinute::DEFAULT);
	}

	#[test]
	fn settings_deserialize_leniently() {
		let settings: Settings = serde_json::from_str(
			r#"{"apiKey":"k","baseUrl":"https://api.example.com/v1","rateLimit":"30"}"#,
		)
		.expect("Settings with a string rate should deserialize.");

		assert_eq!(settings.rate_limit, Some(30));
		assert_eq!(settings.api_key, Some(ApiKey::new("k")));
		assert!(settings.extension_enabled);

		let settings: Settings = serde_json::from_str(r#"{"rateLimit":"fast"}"#)
			.expect("Settings with a garbage rate should still deserialize.");

		assert_eq!(settings.rate_limit, None);
		assert_eq!(settings.rate_per_minute(), RatePerMinute::DEFAULT);

		let settings: Settings = serde_json::from_str(r#"{"rateLimit":12.9}"#)
			.expect("Settings with a fractional rate should deserialize.");

		assert_eq!(settings.rate_limit, Some(12));
	}

	#[test]
	fn settings_error_converts_into_service_error_with_source() {
		let settings_error = SettingsError::Backend { message: "storage unreachable".into() };
		let error: Error = settings_error.clone().into();

		assert!(matches!(error, Error::Settings(_)));
		assert!(error.to_string().contains("storage unreachable"));

		let source = StdError::source(&error)
			.expect("Service error should expose the original settings error as its source.");

		assert_eq!(source.to_string(), settings_error.to_string());
	}
}
