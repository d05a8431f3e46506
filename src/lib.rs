//! # Presentation Matching & Proof Building
//!
//! A credential holder receiving a proof/presentation request must decide,
//! without server-side help, which of its stored verifiable credentials
//! satisfy the request, and must assemble a protocol-correct presentation
//! specification to submit. Two incompatible request formats exist in the
//! wild: an attribute/predicate-based format ("Indy-style") restricting
//! requirements to credential-definition ids, and a descriptor-based format
//! ("DIF-style") naming required `credentialSubject` fields and schema URIs.
//! Either may arrive as direct JSON, wrapped in an envelope, or
//! base64-encoded inside an attachment.
//!
//! This crate is the engine between those inputs and the agent that submits
//! the presentation:
//!
//! 1. [`normalize`] - extract a canonical request object from an
//!    arbitrarily-nested/encoded exchange record;
//! 2. [`detect`] - classify the request as Indy or DIF;
//! 3. [`request`] - the typed [`ProofRequest`] model and its parsing;
//! 4. [`index`] - normalize heterogeneous stored-credential records into a
//!    closed [`StoredCredential`] union;
//! 5. [`matcher`] - assign credentials to requirements, producing a
//!    [`MatchResult`];
//! 6. [`presentation`] - build the submittable [`PresentationSpec`].
//!
//! The engine is a pure function of its inputs: no I/O, no persistence, no
//! shared mutable state. It is safely re-invocable for interactive
//! re-selection - a human override is a pre-seeded partial assignment map
//! passed back into [`matcher::match_request`].
//!
//! Cryptographic proof generation/verification, wallet lifecycle, DIDComm
//! connections and transport all belong to external collaborators.

pub mod detect;
pub mod error;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod presentation;
pub mod request;

use std::collections::BTreeMap;

use serde_json::Value;

pub use crate::detect::RequestFormat;
pub use crate::error::Error;
pub use crate::index::{IndyCredential, StoredCredential, W3cCredential};
pub use crate::matcher::{match_request, MatchResult};
pub use crate::presentation::PresentationSpec;
pub use crate::request::{
    AttributeRequirement, FieldPath, InputDescriptor, PredicateRequirement, PredicateType,
    ProofRequest, Restriction,
};

/// One matching pass over raw collaborator inputs: normalize and parse the
/// exchange record, index the credential records, and match.
///
/// The returned [`MatchResult`] is handed to the UI for display/override; a
/// satisfied result is turned into a spec with [`PresentationSpec::build`].
///
/// # Errors
///
/// Returns [`Error::MissingRequest`], [`Error::Decode`] or
/// [`Error::UnsupportedFormat`] when the record yields no usable request.
/// An unsatisfiable request is not an error here - it is reported through
/// `MatchResult::unsatisfied` so the caller can display precisely which
/// requirements lack a credential.
pub fn prepare(
    record: &Value, credential_records: &[Value],
    overrides: Option<&BTreeMap<String, String>>,
) -> Result<(ProofRequest, MatchResult), Error> {
    let request = ProofRequest::from_record(record)?;
    let credentials = index::build(credential_records);
    let result = match_request(&request, &credentials, overrides);
    Ok((request, result))
}
