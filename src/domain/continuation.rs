//! Continuation tokens for segmented queries
//!
//! A token marks where the next segment of a query starts. Tokens are opaque
//! to callers but round-trip through text so paging can resume across
//! requests or processes:
//!
//! ```
//! use stowage::domain::continuation::ContinuationToken;
//!
//! let token = ContinuationToken::new("events-1", Some("0042".to_string()));
//! let text = token.to_text();
//! let parsed = ContinuationToken::from_text(&text).unwrap();
//! assert_eq!(parsed, Some(token));
//! ```

use crate::domain::errors::StowageError;
use crate::domain::result::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resume point of a segmented query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContinuationToken {
    /// Partition key of the first entity of the next segment
    pub next_partition_key: String,

    /// Row key of the first entity of the next segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_row_key: Option<String>,
}

impl ContinuationToken {
    /// Creates a token pointing at the given key
    pub fn new(next_partition_key: impl Into<String>, next_row_key: Option<String>) -> Self {
        Self {
            next_partition_key: next_partition_key.into(),
            next_row_key,
        }
    }

    /// Encodes the token as URL-safe base64 of its JSON form
    pub fn to_text(&self) -> String {
        // Serializing two strings cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Parses a token produced by [`to_text`](Self::to_text)
    ///
    /// Blank input means "start from the beginning" and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the text is not a valid token.
    pub fn from_text(text: &str) -> Result<Option<Self>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let bytes = URL_SAFE_NO_PAD.decode(text)?;
        let token: ContinuationToken = serde_json::from_slice(&bytes).map_err(|e| {
            StowageError::Serialization(format!("Invalid continuation token: {e}"))
        })?;
        Ok(Some(token))
    }

    /// Parses an optional token text, treating `None` like blank text
    pub fn from_optional_text(text: Option<&str>) -> Result<Option<Self>> {
        match text {
            Some(text) => Self::from_text(text),
            None => Ok(None),
        }
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let token = ContinuationToken::new("pk", Some("row/with spaces".to_string()));
        let parsed = ContinuationToken::from_text(&token.to_text()).unwrap();
        assert_eq!(parsed, Some(token));
    }

    #[test]
    fn test_text_is_url_safe() {
        let token = ContinuationToken::new("??>>", Some("~~~".to_string()));
        let text = token.to_text();
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_blank_text_is_no_token() {
        assert_eq!(ContinuationToken::from_text("").unwrap(), None);
        assert_eq!(ContinuationToken::from_text("   ").unwrap(), None);
        assert_eq!(ContinuationToken::from_optional_text(None).unwrap(), None);
    }

    #[test]
    fn test_invalid_text_fails() {
        assert!(ContinuationToken::from_text("not base64!").is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"plain");
        assert!(ContinuationToken::from_text(&not_json).is_err());
    }

    #[test]
    fn test_json_shape() {
        let token = ContinuationToken::new("p", None);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"NextPartitionKey":"p"}"#);
    }
}
