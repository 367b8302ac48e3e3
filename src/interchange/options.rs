//! Codec configuration.

use serde::{Deserialize, Serialize};

/// What to do with fields a decoder does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownFieldPolicy {
    /// Skip them, logging at `warn`. Keeps older readers working on newer documents.
    #[default]
    Ignore,
    /// Fail with [`InterchangeError::UnknownField`](super::InterchangeError::UnknownField).
    Reject,
}

/// Options shared by both codecs.
///
/// Loadable from a host's JSON configuration:
///
/// ```json
/// { "unknownFields": "reject", "failsafe": false, "validate": true, "pretty": true }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodecOptions {
    pub unknown_fields: UnknownFieldPolicy,
    /// Log and skip identifiables and elements that fail to decode.
    pub failsafe: bool,
    /// Run the validation overlay after decode.
    pub validate: bool,
    /// Indent output.
    pub pretty: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Ignore,
            failsafe: false,
            validate: true,
            pretty: true,
        }
    }
}

impl CodecOptions {
    /// Reject unknown fields.
    pub fn strict() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
            ..Self::default()
        }
    }

    /// Skip broken elements instead of failing.
    pub fn failsafe() -> Self {
        Self {
            failsafe: true,
            ..Self::default()
        }
    }
}
