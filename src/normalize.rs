//! # Request Normalization
//!
//! A proof request arrives inside a loosely structured exchange record: the
//! request may sit at the top level, under one of several envelope aliases,
//! or base64-encoded inside a DIDComm-style attachment. This module extracts
//! a single canonical JSON request object from any of those shapes, making
//! the extraction order an explicit contract rather than implicit
//! fallthrough.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use serde_json::Value;

use crate::error::Error;

/// Envelope field names a request may be nested under, tried in order.
const REQUEST_ALIASES: [&str; 4] =
    ["presentation_request", "pres_request", "proof_request", "request"];

/// Attachment field carrying the request as an array of attachment objects.
const ATTACHMENT_FIELD: &str = "request_presentations~attach";

/// Extract the canonical request object from an exchange record.
///
/// Locates the request under known envelope aliases (falling back to the
/// record itself when it is a non-empty object), then unwraps and decodes an
/// attachment if one is present.
///
/// # Errors
///
/// Returns [`Error::MissingRequest`] if no candidate object can be found, and
/// [`Error::Decode`] if an attachment payload fails base64 or JSON decoding.
pub fn normalize(record: &Value) -> Result<Value, Error> {
    let located = locate(record)?;

    match decode_attachment(located)? {
        Some(payload) => Ok(payload),
        None => Ok(located.clone()),
    }
}

/// Locate the candidate request object within the record.
///
/// Tries each known alias in order; if none is present, the record itself is
/// the candidate, but only when it is a non-empty JSON object - an empty or
/// non-object record carries no request.
///
/// # Errors
///
/// Returns [`Error::MissingRequest`] when no candidate exists.
pub fn locate(record: &Value) -> Result<&Value, Error> {
    let Some(obj) = record.as_object() else {
        return Err(Error::MissingRequest);
    };

    for alias in REQUEST_ALIASES {
        if let Some(candidate) = obj.get(alias) {
            if candidate.is_object() {
                tracing::debug!("request located under alias `{alias}`");
                return Ok(candidate);
            }
        }
    }

    if obj.is_empty() {
        return Err(Error::MissingRequest);
    }
    Ok(record)
}

/// Unwrap and decode the first `request_presentations~attach` attachment, if
/// the object carries one.
///
/// Inline structured content (`data.json`, or a bare `json` field) is used
/// verbatim; a base64 payload (`data.base64` / `base64`) is decoded then
/// JSON-parsed.
///
/// # Errors
///
/// Returns [`Error::Decode`] when a base64 payload cannot be decoded or the
/// decoded bytes are not valid JSON. Decoding failure is reported, never
/// swallowed.
pub fn decode_attachment(request: &Value) -> Result<Option<Value>, Error> {
    let Some(attachments) = request.get(ATTACHMENT_FIELD).and_then(Value::as_array) else {
        return Ok(None);
    };
    let Some(attachment) = attachments.first() else {
        return Ok(None);
    };

    // attachment content may be nested under `data` or sit on the element
    let content = attachment.get("data").unwrap_or(attachment);

    if let Some(json) = content.get("json") {
        return Ok(Some(json.clone()));
    }
    if let Some(b64) = content.get("base64").and_then(Value::as_str) {
        let bytes = decode_base64(b64)?;
        let payload: Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))?;
        return Ok(Some(payload));
    }

    Ok(None)
}

// Attachments in the wild use both the padded-standard and unpadded-url
// alphabets; accept either.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, Error> {
    if let Ok(bytes) = Base64::decode_vec(encoded) {
        return Ok(bytes);
    }
    Base64UrlUnpadded::decode_vec(encoded).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn direct_request() {
        let record = json!({"requested_attributes": {"a1": {"name": "name"}}});
        let normalized = normalize(&record).expect("should normalize");
        assert_eq!(normalized, record);
    }

    #[test]
    fn aliased_request() {
        let inner = json!({"requested_attributes": {}});
        let record = json!({"presentation_request": inner, "state": "request-received"});
        let normalized = normalize(&record).expect("should normalize");
        assert_eq!(normalized, inner);
    }

    #[test]
    fn inline_attachment() {
        let inner = json!({"input_descriptors": []});
        let record = json!({
            "request": {
                "request_presentations~attach": [{"data": {"json": inner}}]
            }
        });
        let normalized = normalize(&record).expect("should normalize");
        assert_eq!(normalized, inner);
    }

    #[test]
    fn base64_attachment() {
        let inner = json!({"requested_attributes": {}});
        let encoded = Base64::encode_string(inner.to_string().as_bytes());
        let record = json!({
            "pres_request": {
                "request_presentations~attach": [{"data": {"base64": encoded}}]
            }
        });
        let normalized = normalize(&record).expect("should normalize");
        assert_eq!(normalized, inner);
    }

    #[test]
    fn url_unpadded_attachment() {
        let inner = json!({"requested_predicates": {}});
        let encoded = Base64UrlUnpadded::encode_string(inner.to_string().as_bytes());
        let record = json!({
            "request_presentations~attach": [{"data": {"base64": encoded}}]
        });
        let normalized = normalize(&record).expect("should normalize");
        assert_eq!(normalized, inner);
    }

    #[test]
    fn invalid_base64_is_reported() {
        let record = json!({
            "request_presentations~attach": [{"data": {"base64": "!!not base64!!"}}]
        });
        let err = normalize(&record).expect_err("should fail");
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn undecodable_json_is_reported() {
        let encoded = Base64::encode_string(b"not json at all");
        let record = json!({
            "request_presentations~attach": [{"data": {"base64": encoded}}]
        });
        let err = normalize(&record).expect_err("should fail");
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn empty_record_is_missing() {
        let err = normalize(&json!({})).expect_err("should fail");
        assert!(matches!(err, Error::MissingRequest));
        let err = normalize(&json!(null)).expect_err("should fail");
        assert!(matches!(err, Error::MissingRequest));
    }
}
