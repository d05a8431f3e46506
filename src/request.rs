//! # Proof Request Model
//!
//! The typed, canonical form of a presentation request. Exactly one variant
//! is populated after parsing; raw input that cannot be normalized or
//! classified never produces a `ProofRequest`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detect::{self, RequestFormat};
use crate::error::Error;
use crate::normalize;

/// A canonical, typed presentation request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ProofRequest {
    /// Attribute/predicate-based request.
    Indy {
        /// Requested attributes, keyed by referent.
        requested_attributes: BTreeMap<String, AttributeRequirement>,

        /// Requested predicates, keyed by referent.
        requested_predicates: BTreeMap<String, PredicateRequirement>,
    },

    /// Descriptor-based request.
    Dif {
        /// Input descriptors, in declaration order.
        input_descriptors: Vec<InputDescriptor>,
    },
}

impl ProofRequest {
    /// Parse a proof-exchange record into a typed request: normalization,
    /// format detection and typed extraction in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequest`], [`Error::Decode`] or
    /// [`Error::UnsupportedFormat`] per the normalization and detection
    /// contracts.
    pub fn from_record(record: &Value) -> Result<Self, Error> {
        // classify before unwrapping the attachment: the format signal may
        // sit on the envelope (`formats`) rather than inside the payload
        let located = normalize::locate(record)?;
        let format = detect::detect(located)?;
        tracing::debug!("request classified as {format}");

        let canonical = match normalize::decode_attachment(located)? {
            Some(payload) => payload,
            None => located.clone(),
        };

        match format {
            RequestFormat::Indy => Ok(parse_indy(&canonical)),
            RequestFormat::Dif => Ok(parse_dif(&canonical)),
        }
    }

    /// The semantic format of this request.
    #[must_use]
    pub const fn format(&self) -> RequestFormat {
        match self {
            Self::Indy { .. } => RequestFormat::Indy,
            Self::Dif { .. } => RequestFormat::Dif,
        }
    }

    /// The ids of every requirement in the request: attribute referents
    /// followed by predicate referents for Indy, descriptor ids for DIF.
    #[must_use]
    pub fn requirement_ids(&self) -> Vec<String> {
        match self {
            Self::Indy { requested_attributes, requested_predicates } => requested_attributes
                .keys()
                .chain(requested_predicates.keys())
                .cloned()
                .collect(),
            Self::Dif { input_descriptors } => {
                input_descriptors.iter().map(|d| d.id.clone()).collect()
            }
        }
    }
}

/// One requested attribute group: a set of attribute names that must be
/// disclosed together, optionally restricted to specific credential
/// definitions.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AttributeRequirement {
    /// Attribute names to disclose. Raw requests carry either a single
    /// `name` or a `names` array; both parse into this list.
    pub names: Vec<String>,

    /// Acceptable credential sources. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
}

/// One requested predicate over an integer attribute.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PredicateRequirement {
    /// The attribute the predicate applies to.
    pub name: String,

    /// Comparison operator.
    pub p_type: PredicateType,

    /// Comparison bound.
    pub p_value: i64,

    /// Acceptable credential sources. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
}

/// Predicate comparison operators.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PredicateType {
    /// Greater than or equal.
    #[serde(rename = ">=")]
    GreaterEqual,

    /// Less than or equal.
    #[serde(rename = "<=")]
    LessEqual,

    /// Greater than.
    #[serde(rename = ">")]
    Greater,

    /// Less than.
    #[serde(rename = "<")]
    Less,
}

/// A restriction on acceptable credential sources for a requirement.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Restriction {
    /// Required credential definition id, if any. Other restriction keys
    /// are ignored rather than rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
}

/// A DIF input descriptor reduced to the constraints this engine matches on.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct InputDescriptor {
    /// Descriptor id, unique within the request.
    pub id: String,

    /// Human-friendly name, if provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Why the data is being requested, if provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Acceptable credential schema URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_uris: Vec<String>,

    /// Fields that must be present in the credential subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<FieldPath>,
}

/// A parsed JSONPath-like field reference, as a sequence of path segments,
/// e.g. `["credentialSubject", "givenName"]`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    /// Parse a JSONPath-like expression into path segments. Handles the
    /// leading `$`, dot notation and bracket notation (quoted or not).
    #[must_use]
    pub fn parse(expr: &str) -> Self {
        let mut segments = vec![];
        let trimmed = expr.trim().trim_start_matches('$');

        for part in trimmed.split('.') {
            if part.is_empty() {
                continue;
            }
            // bracket segments may trail a dotted segment: vc[0]['name']
            let mut rest = part;
            if let Some(open) = rest.find('[') {
                let head = &rest[..open];
                if !head.is_empty() {
                    segments.push(head.to_string());
                }
                rest = &rest[open..];
                for bracketed in rest.split('[') {
                    let Some(inner) = bracketed.strip_suffix(']') else {
                        continue;
                    };
                    let inner = inner.trim_matches(|c| c == '\'' || c == '"');
                    if !inner.is_empty() {
                        segments.push(inner.to_string());
                    }
                }
            } else {
                segments.push(rest.to_string());
            }
        }

        Self(segments)
    }

    /// The final path segment, the field name matched against credential
    /// subjects.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

// Extract an Indy request from the canonical object. Detection has already
// established the shape; absent maps simply parse empty.
fn parse_indy(canonical: &Value) -> ProofRequest {
    let requested_attributes = canonical
        .get("requested_attributes")
        .and_then(Value::as_object)
        .map(|attrs| {
            attrs
                .iter()
                .map(|(referent, raw)| (referent.clone(), parse_attribute(raw)))
                .collect()
        })
        .unwrap_or_default();

    let requested_predicates = canonical
        .get("requested_predicates")
        .and_then(Value::as_object)
        .map(|preds| {
            preds
                .iter()
                .filter_map(|(referent, raw)| {
                    parse_predicate(raw).map(|p| (referent.clone(), p))
                })
                .collect()
        })
        .unwrap_or_default();

    ProofRequest::Indy { requested_attributes, requested_predicates }
}

fn parse_attribute(raw: &Value) -> AttributeRequirement {
    // a single `name` or a `names` array, both accepted
    let names = raw.get("names").and_then(Value::as_array).map_or_else(
        || {
            raw.get("name")
                .and_then(Value::as_str)
                .map(|n| vec![n.to_string()])
                .unwrap_or_default()
        },
        |names| names.iter().filter_map(Value::as_str).map(String::from).collect(),
    );

    AttributeRequirement { names, restrictions: parse_restrictions(raw) }
}

fn parse_predicate(raw: &Value) -> Option<PredicateRequirement> {
    let name = raw.get("name").and_then(Value::as_str)?.to_string();
    let p_type = raw
        .get("p_type")
        .cloned()
        .and_then(|t| serde_json::from_value::<PredicateType>(t).ok())?;
    let p_value = raw.get("p_value").and_then(Value::as_i64)?;

    Some(PredicateRequirement { name, p_type, p_value, restrictions: parse_restrictions(raw) })
}

fn parse_restrictions(raw: &Value) -> Vec<Restriction> {
    raw.get("restrictions").and_then(Value::as_array).map_or_else(Vec::new, |entries| {
        entries
            .iter()
            .map(|entry| Restriction {
                cred_def_id: entry
                    .get("cred_def_id")
                    .and_then(Value::as_str)
                    .map(String::from),
            })
            .collect()
    })
}

// Extract a DIF request. Descriptors may sit under `presentation_definition`
// or at the top level.
fn parse_dif(canonical: &Value) -> ProofRequest {
    let descriptors = canonical
        .get("presentation_definition")
        .and_then(|pd| pd.get("input_descriptors"))
        .or_else(|| canonical.get("input_descriptors"))
        .and_then(Value::as_array);

    let input_descriptors = descriptors.map_or_else(Vec::new, |list| {
        list.iter().filter_map(parse_descriptor).collect()
    });

    ProofRequest::Dif { input_descriptors }
}

fn parse_descriptor(raw: &Value) -> Option<InputDescriptor> {
    let id = raw.get("id").and_then(Value::as_str)?.to_string();

    Some(InputDescriptor {
        id,
        name: raw.get("name").and_then(Value::as_str).map(String::from),
        purpose: raw.get("purpose").and_then(Value::as_str).map(String::from),
        schema_uris: parse_schema_uris(raw),
        required_fields: parse_required_fields(raw),
    })
}

// PE `schema` entries are objects with a `uri`, or bare strings.
fn parse_schema_uris(raw: &Value) -> Vec<String> {
    raw.get("schema").and_then(Value::as_array).map_or_else(Vec::new, |entries| {
        entries
            .iter()
            .filter_map(|entry| {
                entry
                    .get("uri")
                    .and_then(Value::as_str)
                    .or_else(|| entry.as_str())
                    .map(String::from)
            })
            .collect()
    })
}

// Each constraint field carries an ordered list of JSONPath alternatives;
// the first expression identifies the field.
fn parse_required_fields(raw: &Value) -> Vec<FieldPath> {
    raw.get("constraints")
        .and_then(|c| c.get("fields"))
        .and_then(Value::as_array)
        .map_or_else(Vec::new, |fields| {
            fields
                .iter()
                .filter_map(|field| {
                    field
                        .get("path")
                        .and_then(Value::as_array)
                        .and_then(|paths| paths.first())
                        .and_then(Value::as_str)
                        .map(FieldPath::parse)
                })
                .collect()
        })
}
