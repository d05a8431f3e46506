//! # Presentation Specification
//!
//! Turns a fully-satisfied [`MatchResult`] into the structure submitted back
//! to the verifier, naming which stored credential satisfies which
//! requirement. The builder refuses empty and unsatisfied selections: an
//! empty presentation is never submitted silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::matcher::MatchResult;
use crate::request::ProofRequest;

/// A submittable presentation specification, mirroring the request format.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PresentationSpec {
    /// Indy-style specification.
    Indy {
        /// Disclosed attributes, keyed by referent.
        requested_attributes: BTreeMap<String, RequestedAttribute>,

        /// Proved predicates, keyed by referent.
        requested_predicates: BTreeMap<String, RequestedPredicate>,

        /// Self-attested values. Always empty: self-attestation is out of
        /// scope for this engine.
        self_attested_attributes: BTreeMap<String, String>,
    },

    /// DIF-style specification.
    Dif {
        /// Chosen credential record per descriptor id.
        record_ids: BTreeMap<String, String>,
    },
}

/// One disclosed attribute entry in an Indy specification.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestedAttribute {
    /// The credential disclosing the attribute(s).
    pub cred_id: String,

    /// Whether the attribute value is revealed to the verifier.
    pub revealed: bool,
}

/// One predicate entry in an Indy specification.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestedPredicate {
    /// The credential proving the predicate.
    pub cred_id: String,
}

impl PresentationSpec {
    /// Build a presentation specification from a match result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySelection`] when no assignments were made, and
    /// [`Error::Unsatisfiable`] (carrying the unmatched ids) when any
    /// requirement is still unsatisfied.
    pub fn build(request: &ProofRequest, result: &MatchResult) -> Result<Self, Error> {
        if result.assignments.is_empty() {
            return Err(Error::EmptySelection);
        }
        if !result.is_satisfied() {
            return Err(Error::Unsatisfiable(result.unsatisfied.iter().cloned().collect()));
        }

        match request {
            ProofRequest::Indy { requested_attributes, requested_predicates } => {
                let mut attributes = BTreeMap::new();
                for referent in requested_attributes.keys() {
                    let cred_id = assigned(result, referent)?;
                    attributes
                        .insert(referent.clone(), RequestedAttribute { cred_id, revealed: true });
                }

                let mut predicates = BTreeMap::new();
                for referent in requested_predicates.keys() {
                    let cred_id = assigned(result, referent)?;
                    predicates.insert(referent.clone(), RequestedPredicate { cred_id });
                }

                Ok(Self::Indy {
                    requested_attributes: attributes,
                    requested_predicates: predicates,
                    self_attested_attributes: BTreeMap::new(),
                })
            }
            ProofRequest::Dif { input_descriptors } => {
                let mut record_ids = BTreeMap::new();
                for descriptor in input_descriptors {
                    record_ids.insert(descriptor.id.clone(), assigned(result, &descriptor.id)?);
                }
                Ok(Self::Dif { record_ids })
            }
        }
    }
}

// A requirement with no assignment at build time is unsatisfied, even if the
// caller handed over a result with an inconsistent `unsatisfied` set.
fn assigned(result: &MatchResult, id: &str) -> Result<String, Error> {
    result
        .assignments
        .get(id)
        .cloned()
        .ok_or_else(|| Error::Unsatisfiable(vec![id.to_string()]))
}
