//! # Credential Index
//!
//! Stored-credential listings are heterogeneous: Indy-style flat attribute
//! records and W3C records nested under various envelope keys, with several
//! alias spellings for the same identifier. This module performs the one-time
//! normalization pass into a closed union so downstream matching is
//! exhaustive and alias handling lives in exactly one place.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier aliases, tried in order, resolved once at index-build time.
const ID_ALIASES: [&str; 5] = ["referent", "credential_id", "cred_id", "record_id", "id"];

/// Envelope keys a credential payload may be nested under, tried in order.
const PAYLOAD_ALIASES: [&str; 2] = ["cred_value", "credential"];

/// A stored credential in canonical form. `credential_id` is the single
/// identifier used downstream when building a presentation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoredCredential {
    /// An Indy-format credential: flat attribute names bound to a credential
    /// definition.
    Indy(IndyCredential),

    /// A W3C-format credential: typed, with named subject fields.
    W3c(W3cCredential),
}

impl StoredCredential {
    /// The credential's stable identifier.
    #[must_use]
    pub fn credential_id(&self) -> &str {
        match self {
            Self::Indy(cred) => &cred.credential_id,
            Self::W3c(cred) => &cred.credential_id,
        }
    }
}

/// Canonical form of an Indy-format stored credential.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndyCredential {
    /// Stable identifier, resolved from the record's id aliases.
    pub credential_id: String,

    /// Credential definition the credential was issued under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,

    /// Schema the credential conforms to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Attribute names carried by the credential, lower-cased.
    pub attribute_names: BTreeSet<String>,
}

/// Canonical form of a W3C-format stored credential.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct W3cCredential {
    /// Stable identifier, resolved from the record's id aliases.
    pub credential_id: String,

    /// Credential types, lower-cased.
    pub types: BTreeSet<String>,

    /// Field names present in the credential subject, lower-cased.
    pub subject_fields: BTreeSet<String>,

    /// The credential issuer.
    pub issuer: String,
}

/// Normalize a sequence of raw stored-credential records.
///
/// Records that yield neither an attribute set nor a subject/type set, or
/// that carry no resolvable identifier, are dropped with a warning; a bad
/// record never fails the whole build.
#[must_use]
pub fn build(records: &[Value]) -> Vec<StoredCredential> {
    let mut index = vec![];

    for record in records {
        match normalize_record(record) {
            Some(credential) => index.push(credential),
            None => tracing::warn!("dropping unrecognized credential record: {record}"),
        }
    }

    index
}

fn normalize_record(record: &Value) -> Option<StoredCredential> {
    let credential_id = resolve_id(record)?;
    let payload = resolve_payload(record);

    if let Some(attrs) = payload.get("attrs").or_else(|| payload.get("attributes")) {
        let attribute_names = object_keys(attrs)?;
        return Some(StoredCredential::Indy(IndyCredential {
            credential_id,
            cred_def_id: string_field(payload, record, "cred_def_id"),
            schema_id: string_field(payload, record, "schema_id"),
            attribute_names,
        }));
    }

    let subject = payload
        .get("credentialSubject")
        .or_else(|| payload.get("subject"))
        .and_then(object_keys);
    let types = type_set(payload);

    if subject.is_none() && types.is_none() {
        return None;
    }

    Some(StoredCredential::W3c(W3cCredential {
        credential_id,
        types: types.unwrap_or_default(),
        subject_fields: subject.unwrap_or_default(),
        issuer: issuer_of(payload),
    }))
}

// Resolve the stable identifier from the record's alias spellings.
fn resolve_id(record: &Value) -> Option<String> {
    ID_ALIASES
        .iter()
        .find_map(|alias| record.get(alias).and_then(Value::as_str))
        .map(String::from)
}

// Resolve the credential payload: `cred_value.credential`, `cred_value`,
// `credential`, then the record itself.
fn resolve_payload(record: &Value) -> &Value {
    if let Some(nested) =
        record.get("cred_value").and_then(|v| v.get("credential")).filter(|v| v.is_object())
    {
        return nested;
    }
    for alias in PAYLOAD_ALIASES {
        if let Some(payload) = record.get(alias).filter(|v| v.is_object()) {
            return payload;
        }
    }
    record
}

fn object_keys(value: &Value) -> Option<BTreeSet<String>> {
    value.as_object().map(|obj| obj.keys().map(|k| k.to_lowercase()).collect())
}

fn type_set(payload: &Value) -> Option<BTreeSet<String>> {
    let types = payload.get("type").or_else(|| payload.get("@type"))?;
    match types {
        Value::Array(entries) => Some(
            entries.iter().filter_map(Value::as_str).map(str::to_lowercase).collect(),
        ),
        Value::String(single) => Some(BTreeSet::from([single.to_lowercase()])),
        _ => None,
    }
}

// Issuer may be a plain string or an object with an `id`.
fn issuer_of(payload: &Value) -> String {
    payload
        .get("issuer")
        .and_then(|issuer| {
            issuer.as_str().or_else(|| issuer.get("id").and_then(Value::as_str))
        })
        .unwrap_or_default()
        .to_string()
}

fn string_field(payload: &Value, record: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .or_else(|| record.get(key))
        .and_then(Value::as_str)
        .map(String::from)
}
