//! # Credential Matching
//!
//! Matches a typed [`ProofRequest`] against the normalized credential index,
//! producing a [`MatchResult`] the UI collaborator can display and override
//! before a presentation is built. Matching is greedy and deterministic: for
//! a fixed request and credential ordering the result is always the same, and
//! re-running on the same inputs is idempotent.

pub mod dif;
pub mod indy;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::index::StoredCredential;
use crate::request::ProofRequest;

/// The outcome of one matching pass.
///
/// Invariants: `assignments` keys and `unsatisfied` are disjoint, their union
/// is exactly the request's requirement ids, and every assignment key refers
/// to a requirement that existed in the request.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchResult {
    /// Chosen credential per requirement: referent or descriptor id →
    /// credential id.
    pub assignments: BTreeMap<String, String>,

    /// Requirements no credential could satisfy.
    pub unsatisfied: BTreeSet<String>,
}

impl MatchResult {
    /// True when every requirement received an assignment.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied.is_empty()
    }
}

/// Match a request against the credential index.
///
/// `overrides` pre-seeds assignments chosen by a human during interactive
/// re-selection: seeded requirements are not re-matched, and override keys
/// naming no requirement in the request are dropped. Requirements are
/// processed in full - matching never aborts early, so `unsatisfied` is
/// always complete.
#[must_use]
pub fn match_request(
    request: &ProofRequest, index: &[StoredCredential],
    overrides: Option<&BTreeMap<String, String>>,
) -> MatchResult {
    let requirement_ids = request.requirement_ids();

    // seed human overrides, keeping only keys the request knows about
    let mut assignments: BTreeMap<String, String> = overrides
        .map(|seed| {
            seed.iter()
                .filter(|(id, _)| requirement_ids.iter().any(|r| r == *id))
                .map(|(id, cred)| (id.clone(), cred.clone()))
                .collect()
        })
        .unwrap_or_default();

    let mut unsatisfied = BTreeSet::new();

    match request {
        ProofRequest::Indy { requested_attributes, requested_predicates } => {
            for (referent, requirement) in requested_attributes {
                if assignments.contains_key(referent) {
                    continue;
                }
                match indy::match_names(&requirement.names, &requirement.restrictions, index) {
                    Some(cred_id) => {
                        assignments.insert(referent.clone(), cred_id.to_string());
                    }
                    None => {
                        unsatisfied.insert(referent.clone());
                    }
                }
            }
            for (referent, predicate) in requested_predicates {
                if assignments.contains_key(referent) {
                    continue;
                }
                let names = std::slice::from_ref(&predicate.name);
                match indy::match_names(names, &predicate.restrictions, index) {
                    Some(cred_id) => {
                        assignments.insert(referent.clone(), cred_id.to_string());
                    }
                    None => {
                        unsatisfied.insert(referent.clone());
                    }
                }
            }
        }
        ProofRequest::Dif { input_descriptors } => {
            for descriptor in input_descriptors {
                if assignments.contains_key(&descriptor.id) {
                    continue;
                }
                match dif::match_descriptor(descriptor, index) {
                    Some(cred_id) => {
                        assignments.insert(descriptor.id.clone(), cred_id.to_string());
                    }
                    None => {
                        unsatisfied.insert(descriptor.id.clone());
                    }
                }
            }
        }
    }

    tracing::debug!(
        assigned = assignments.len(),
        unsatisfied = unsatisfied.len(),
        "matching complete"
    );

    MatchResult { assignments, unsatisfied }
}
