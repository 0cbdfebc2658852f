//! Keys for the profile cache and the queue's cancellation groups.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Why a string cannot name a profile.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum UsernameError {
	/// Nothing left after trimming the `u/` prefix.
	#[error("Username cannot be empty.")]
	Empty,
	/// The name cannot appear as a single profile path segment.
	#[error("Username cannot contain {ch:?}.")]
	InvalidChar {
		/// First offending character.
		ch: char,
	},
}

/// Profile owner whose posts and comments are analyzed, stored without the `u/` prefix.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);
impl Username {
	/// Accepts `name`, `u/name`, or `/u/name`.
	pub fn new(value: impl Into<String>) -> Result<Self, UsernameError> {
		let value = value.into();
		let name = value.trim_start_matches('/');
		let name = name.strip_prefix("u/").unwrap_or(name);

		if name.is_empty() {
			return Err(UsernameError::Empty);
		}
		if let Some(ch) = name.chars().find(|ch| *ch == '/' || ch.is_whitespace()) {
			return Err(UsernameError::InvalidChar { ch });
		}

		Ok(Self(if name.len() == value.len() { value } else { name.to_owned() }))
	}

	/// Extracts the owner from a profile page path such as `/user/<name>/submitted/`.
	pub fn from_profile_path(path: &str) -> Option<Self> {
		let rest = path.strip_prefix("/user/").or_else(|| path.strip_prefix("/u/"))?;

		Self::new(rest.split('/').next()?).ok()
	}
}
impl Deref for Username {
	type Target = str;

	fn deref(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Username {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Username {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl TryFrom<String> for Username {
	type Error = UsernameError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<Username> for String {
	fn from(value: Username) -> Self {
		value.0
	}
}
impl FromStr for Username {
	type Err = UsernameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Username {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Username(u/{})", self.0)
	}
}
impl Display for Username {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Opaque grouping key (usually a browser tab) used for bulk cancellation.
///
/// Any string is a valid tag; two tags match only when they are byte-for-byte equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginTag(String);
impl OriginTag {
	/// Wraps an arbitrary caller-chosen key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Tag for a browser tab id.
	pub fn tab(id: u64) -> Self {
		Self(format!("tab-{id}"))
	}

	/// Returns the raw key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl From<String> for OriginTag {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for OriginTag {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl From<u64> for OriginTag {
	fn from(id: u64) -> Self {
		Self::tab(id)
	}
}
impl AsRef<str> for OriginTag {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for OriginTag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
