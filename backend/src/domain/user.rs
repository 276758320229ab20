//! User identity and profile model.
//!
//! Identity issuance is external: the collector only ever sees a display name
//! (and optionally a handle or avatar). The [`UserId`] is derived from that
//! display name so repeated sightings land on the same profile.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for display-name derived user identifiers.
const USER_NAMESPACE: Uuid = Uuid::from_u128(0x5d1c_9a0e_4f3b_4c7a_9d2e_7b81_c6a0_f3e4);

/// Maximum accepted display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Validation errors for user identifiers and sightings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
}

/// Stable user identifier.
///
/// # Examples
/// ```
/// use curation::domain::UserId;
///
/// let a = UserId::from_display_name("Ada Lovelace").expect("valid");
/// let b = UserId::from_display_name("  ada lovelace ").expect("valid");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Derive the identifier for a display name.
    ///
    /// The name is trimmed and lower-cased before hashing.
    pub fn from_display_name(display_name: &str) -> Result<Self, UserValidationError> {
        let normalized = normalize_display_name(display_name)?.to_lowercase();
        Ok(Self(Uuid::new_v5(&USER_NAMESPACE, normalized.as_bytes())))
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn normalize_display_name(display_name: &str) -> Result<&str, UserValidationError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyDisplayName);
    }
    if trimmed.chars().count() > DISPLAY_NAME_MAX {
        return Err(UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX,
        });
    }
    Ok(trimmed)
}

/// Lower-case, hyphen separated handle built from a display name.
///
/// Runs of characters that are not ASCII alphanumerics collapse into a single
/// hyphen; leading and trailing hyphens are dropped.
pub fn slugify(display_name: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    let mut pending_hyphen = false;
    for ch in display_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// A sighting of a user as reported alongside an ingestion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSighting {
    pub display_name: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl ProfileSighting {
    /// Sighting carrying only a display name.
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            handle: None,
            avatar_url: None,
        }
    }

    /// Resolve the sighting into a profile observed at `seen_at`.
    pub fn into_profile(self, seen_at: DateTime<Utc>) -> Result<UserProfile, UserValidationError> {
        let user_id = UserId::from_display_name(&self.display_name)?;
        let display_name = normalize_display_name(&self.display_name)?.to_owned();
        let handle = self
            .handle
            .map(|handle| handle.trim().to_owned())
            .filter(|handle| !handle.is_empty())
            .unwrap_or_else(|| slugify(&display_name));
        let avatar_url = self
            .avatar_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());

        Ok(UserProfile {
            user_id,
            handle,
            display_name,
            avatar_url,
            bio: None,
            last_active: seen_at,
        })
    }
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub handle: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub last_active: DateTime<Utc>,
}

impl UserProfile {
    /// Whether `query` occurs in the handle or display name, ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.handle.to_lowercase().contains(&needle)
            || self.display_name.to_lowercase().contains(&needle)
    }
}
