//! # Attribute Matching (Indy)
//!
//! Greedy first-match search for attribute and predicate requirements.
//! Restriction matches take priority over attribute coverage, and a chosen
//! credential stays eligible for later referents: a single credential may
//! satisfy multiple requirements, mirroring single-credential multi-attribute
//! disclosure.

use crate::index::StoredCredential;
use crate::request::Restriction;

/// Find the first credential satisfying a named requirement.
///
/// Priority order:
/// 1. a `cred_def_id` restriction equals a candidate's `cred_def_id`;
/// 2. fallback, when no restriction is present or none matched: an Indy
///    candidate whose attribute names cover all requirement names
///    (case-insensitive).
#[must_use]
pub fn match_names<'a>(
    names: &[String], restrictions: &[Restriction], index: &'a [StoredCredential],
) -> Option<&'a str> {
    if let Some(cred_id) = match_restrictions(restrictions, index) {
        return Some(cred_id);
    }
    match_coverage(names, index)
}

// Exact credential-definition match, the strongest signal in the request.
fn match_restrictions<'a>(
    restrictions: &[Restriction], index: &'a [StoredCredential],
) -> Option<&'a str> {
    let required: Vec<&str> =
        restrictions.iter().filter_map(|r| r.cred_def_id.as_deref()).collect();
    if required.is_empty() {
        return None;
    }

    index.iter().find_map(|candidate| {
        let StoredCredential::Indy(cred) = candidate else {
            return None;
        };
        let cred_def_id = cred.cred_def_id.as_deref()?;
        required.contains(&cred_def_id).then_some(cred.credential_id.as_str())
    })
}

// Attribute-coverage fallback: the candidate must carry every requested name.
fn match_coverage<'a>(names: &[String], index: &'a [StoredCredential]) -> Option<&'a str> {
    index.iter().find_map(|candidate| {
        let StoredCredential::Indy(cred) = candidate else {
            return None;
        };
        names
            .iter()
            .all(|name| cred.attribute_names.contains(&name.to_lowercase()))
            .then_some(cred.credential_id.as_str())
    })
}
