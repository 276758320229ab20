//! Page request parameters and response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, CursorError};

/// Normalized page request: an optional cursor and a clamped limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    cursor: Option<String>,
    limit: usize,
}

impl PageParams {
    /// Build page parameters, falling back to `default_limit` and clamping the
    /// limit to `1..=max_limit`.
    ///
    /// Blank cursors are treated as absent.
    #[must_use]
    pub fn new(
        cursor: Option<String>,
        requested_limit: Option<usize>,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        let ceiling = max_limit.max(1);
        let limit = requested_limit.unwrap_or(default_limit).clamp(1, ceiling);
        let cursor = cursor.filter(|token| !token.trim().is_empty());
        Self { cursor, limit }
    }

    /// The opaque cursor token, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Decode the cursor into its ordering key.
    ///
    /// # Errors
    ///
    /// Propagates [`CursorError`] when the token is malformed.
    pub fn decode_cursor<K>(&self) -> Result<Option<K>, CursorError>
    where
        K: Serialize + DeserializeOwned,
    {
        self.cursor
            .as_deref()
            .map(|token| Cursor::<K>::decode(token).map(Cursor::into_key))
            .transpose()
    }

    /// Maximum number of items to return.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// One page of results plus the cursor for the following page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from a window of up to `limit + 1` ordered items.
    ///
    /// When the window holds more than `limit` items the surplus is dropped
    /// and a cursor is minted from the last retained item.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when the key cannot be encoded.
    pub fn from_window<K, F>(mut window: Vec<T>, limit: usize, key_of: F) -> Result<Self, CursorError>
    where
        K: Serialize + DeserializeOwned,
        F: Fn(&T) -> K,
    {
        if window.len() <= limit {
            return Ok(Self {
                items: window,
                next_cursor: None,
            });
        }

        window.truncate(limit);
        let next_cursor = window
            .last()
            .map(|last| Cursor::new(key_of(last)).encode())
            .transpose()?;
        Ok(Self {
            items: window,
            next_cursor,
        })
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Cursor for the next page, if more items exist.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }
}
