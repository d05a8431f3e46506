//! # Format Detection
//!
//! Classifies a canonical request object as Indy-style
//! (attribute/predicate-based) or DIF-style (input-descriptor-based). The
//! format signal is frequently inside a base64 attachment rather than on the
//! envelope, so detection re-checks the decoded attachment payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::normalize;

/// The semantic format of a presentation request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RequestFormat {
    /// Attribute/predicate-based request restricted by credential-definition
    /// ids.
    Indy,

    /// Descriptor-based request naming required `credentialSubject` fields
    /// and schema URIs.
    Dif,
}

impl std::fmt::Display for RequestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Indy => write!(f, "indy"),
            Self::Dif => write!(f, "dif"),
        }
    }
}

/// Classify a canonical request object.
///
/// Rules, first match wins:
/// 1. a `formats` array element whose `format` string contains `"dif"`
///    (case-insensitive);
/// 2. `presentation_definition` or `input_descriptors` present, on the object
///    or inside its decoded attachment payload;
/// 3. `requested_attributes` or `requested_predicates` present, same
///    attachment re-check;
/// 4. otherwise the format is unsupported.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if no rule matches, or
/// [`Error::Decode`] if an attachment payload cannot be decoded while
/// re-checking.
pub fn detect(request: &Value) -> Result<RequestFormat, Error> {
    if has_dif_format_entry(request) {
        return Ok(RequestFormat::Dif);
    }

    // the signal may be on the object itself or inside its attachment
    let payload = normalize::decode_attachment(request)?;
    let candidates = [Some(request), payload.as_ref()];

    for candidate in candidates.into_iter().flatten() {
        if candidate.get("presentation_definition").is_some()
            || candidate.get("input_descriptors").is_some()
        {
            return Ok(RequestFormat::Dif);
        }
    }
    for candidate in candidates.into_iter().flatten() {
        if candidate.get("requested_attributes").is_some()
            || candidate.get("requested_predicates").is_some()
        {
            return Ok(RequestFormat::Indy);
        }
    }

    Err(Error::UnsupportedFormat)
}

// A `formats` array entry naming a DIF format string identifies the request
// regardless of attachment contents.
fn has_dif_format_entry(request: &Value) -> bool {
    let Some(formats) = request.get("formats").and_then(Value::as_array) else {
        return false;
    };
    formats.iter().any(|entry| {
        entry
            .get("format")
            .and_then(Value::as_str)
            .is_some_and(|f| f.to_lowercase().contains("dif"))
    })
}
