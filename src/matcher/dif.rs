//! # Descriptor Matching (DIF)
//!
//! Greedy first-match assignment of W3C credentials to input descriptors.
//! This is a one-pass search with no reassignment: when two descriptors could
//! only be jointly satisfied by swapping their greedy picks, the second is
//! reported unsatisfied. That first-match contract is deliberate; a maximum
//! bipartite matching over the descriptor/credential graph is a possible
//! stricter variant, not the default behavior.

use crate::index::StoredCredential;
use crate::request::InputDescriptor;

/// Schema URIs containing this substring act as a wildcard matching every
/// W3C credential.
const WILDCARD_TYPE: &str = "verifiablecredential";

/// Find the first W3C credential satisfying an input descriptor.
///
/// Priority order:
/// 1. the descriptor names schema URIs and a candidate's types intersect
///    them (a URI containing `"verifiablecredential"` matches any candidate);
/// 2. the descriptor names required fields and every field's last path
///    segment is present in the candidate's subject (case-insensitive);
/// 3. the descriptor is unconstrained: first available W3C credential.
#[must_use]
pub fn match_descriptor<'a>(
    descriptor: &InputDescriptor, index: &'a [StoredCredential],
) -> Option<&'a str> {
    if !descriptor.schema_uris.is_empty() {
        if let Some(cred_id) = match_types(descriptor, index) {
            return Some(cred_id);
        }
    }
    if !descriptor.required_fields.is_empty() {
        return match_fields(descriptor, index);
    }
    if descriptor.schema_uris.is_empty() {
        // unconstrained descriptor: any W3C credential will do
        return w3c_entries(index).next().map(|cred| cred.credential_id.as_str());
    }

    None
}

fn match_types<'a>(
    descriptor: &InputDescriptor, index: &'a [StoredCredential],
) -> Option<&'a str> {
    let uris: Vec<String> = descriptor.schema_uris.iter().map(|u| u.to_lowercase()).collect();
    let wildcard = uris.iter().any(|uri| uri.contains(WILDCARD_TYPE));

    w3c_entries(index)
        .find(|cred| wildcard || uris.iter().any(|uri| cred.types.contains(uri)))
        .map(|cred| cred.credential_id.as_str())
}

fn match_fields<'a>(
    descriptor: &InputDescriptor, index: &'a [StoredCredential],
) -> Option<&'a str> {
    w3c_entries(index)
        .find(|cred| {
            descriptor.required_fields.iter().all(|field| {
                field
                    .leaf()
                    .is_some_and(|leaf| cred.subject_fields.contains(&leaf.to_lowercase()))
            })
        })
        .map(|cred| cred.credential_id.as_str())
}

fn w3c_entries(
    index: &[StoredCredential],
) -> impl Iterator<Item = &crate::index::W3cCredential> {
    index.iter().filter_map(|candidate| match candidate {
        StoredCredential::W3c(cred) => Some(cred),
        StoredCredential::Indy(_) => None,
    })
}
