//! Opaque cursor encoding.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised while encoding or decoding a cursor token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not valid URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding {
        /// Decoder failure description.
        message: String,
    },
    /// The decoded payload does not match the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Deserializer failure description.
        message: String,
    },
    /// The key could not be serialized.
    #[error("cursor key could not be serialized: {message}")]
    Serialize {
        /// Serializer failure description.
        message: String,
    },
}

/// Position marker wrapping the ordering key of the last item on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap an ordering key.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the ordering key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor and return the ordering key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K> Cursor<K>
where
    K: Serialize + DeserializeOwned,
{
    /// Encode the cursor as an opaque token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when the key cannot be represented
    /// as JSON.
    pub fn encode(&self) -> Result<String, CursorError> {
        let payload = serde_json::to_vec(&self.key).map_err(|err| CursorError::Serialize {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    /// Decode a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Encoding`] for non-base64 input and
    /// [`CursorError::Payload`] when the payload does not describe a `K`.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    //! Cursor encoding regression coverage.
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct RankKey {
        rank: u8,
        id: String,
    }

    #[rstest]
    fn encoded_cursor_is_url_safe() {
        let cursor = Cursor::new(RankKey {
            rank: 4,
            id: "gid://shop/Product/1?x=y".to_owned(),
        });

        let token = cursor.encode().expect("encode");

        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        let decoded = Cursor::<RankKey>::decode(&token).expect("decode");
        assert_eq!(decoded, cursor);
    }

    #[rstest]
    #[case("!!not-base64!!")]
    #[case("%%%")]
    fn garbage_tokens_are_rejected(#[case] token: &str) {
        let error = Cursor::<RankKey>::decode(token).expect_err("invalid token");
        assert!(matches!(error, CursorError::Encoding { .. }));
    }

    #[rstest]
    fn mismatched_payload_is_rejected() {
        let token = Cursor::new(42_u32).encode().expect("encode");
        let error = Cursor::<RankKey>::decode(&token).expect_err("wrong shape");
        assert!(matches!(error, CursorError::Payload { .. }));
    }
}
