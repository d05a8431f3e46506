//! # Engine Errors
//!
//! This module defines the errors returned across the matching pipeline. Every
//! failure is a typed result surfaced to the caller; the engine never submits
//! a partial presentation and never logs-and-continues past an error.

/// Matching pipeline error codes.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An attachment payload could not be base64- or JSON-decoded. Carries
    /// the underlying decode message so the caller can surface it verbatim.
    #[error("unable to decode request attachment: {0}")]
    Decode(String),

    /// No request object could be located anywhere in the exchange record.
    #[error("no proof request found in exchange record")]
    MissingRequest,

    /// A request was located but matches neither the Indy nor the DIF shape.
    #[error("request matches neither Indy nor DIF presentation format")]
    UnsupportedFormat,

    /// Matching completed but one or more requirements have no matching
    /// credential. Carries the unmatched referents/descriptor ids.
    #[error("request cannot be satisfied: no credential matches {}", .0.join(", "))]
    Unsatisfiable(Vec<String>),

    /// The presentation builder was invoked with zero assignments.
    #[error("no credentials selected for presentation")]
    EmptySelection,
}

impl Error {
    /// The ids of requirements that could not be matched, when the error is
    /// [`Error::Unsatisfiable`]. Lets the UI collaborator render the
    /// unsatisfied set without string parsing.
    #[must_use]
    pub fn unmatched(&self) -> &[String] {
        match self {
            Self::Unsatisfiable(ids) => ids,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unsatisfiable_message() {
        let err = Error::Unsatisfiable(vec!["attr_1".into(), "d2".into()]);
        assert_eq!(
            err.to_string(),
            "request cannot be satisfied: no credential matches attr_1, d2"
        );
        assert_eq!(err.unmatched(), &["attr_1".to_string(), "d2".to_string()]);
    }

    #[test]
    fn unmatched_empty_for_other_errors() {
        assert!(Error::MissingRequest.unmatched().is_empty());
    }
}
