//! Background service for LLM-powered profile analysis.
//!
//! Scraped posts and comments are cached per user, and every provider call goes through one
//! rate-limited, cancellable FIFO queue.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod analyzer;
pub mod error;
pub mod http;
pub mod ids;
pub mod obs;
pub mod profile;
pub mod provider;
pub mod queue;
pub mod settings;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		analyzer::Analyzer,
		http::ReqwestHttpClient,
		ids::{OriginTag, Username},
		settings::{MemorySettings, Settings, SettingsStore},
	};

	/// Analyzer type alias used by reqwest-backed integration tests.
	pub type ReqwestTestAnalyzer = Analyzer<ReqwestHttpClient>;

	/// Builds settings pointing at `base_url` with a test key/model and the given rate.
	pub fn test_settings(base_url: &str, rate_limit: Option<i64>) -> Settings {
		Settings {
			api_key: Some("test-api-key".into()),
			base_url: Some(base_url.to_owned()),
			model: Some("test-model".into()),
			rate_limit,
			..Settings::default()
		}
	}

	/// Constructs an [`Analyzer`] backed by in-memory settings and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_analyzer(settings: Settings) -> (ReqwestTestAnalyzer, Arc<MemorySettings>) {
		let settings_backend = Arc::new(MemorySettings::new(settings));
		let store: Arc<dyn SettingsStore> = settings_backend.clone();
		let analyzer = Analyzer::with_http_client(store, ReqwestHttpClient::default());

		(analyzer, settings_backend)
	}

	/// Parses a username fixture.
	pub fn username(value: &str) -> Username {
		Username::new(value).expect("Username fixture should be valid.")
	}

	/// Builds an origin tag fixture.
	pub fn tag(value: &str) -> OriginTag {
		OriginTag::new(value)
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
