//! End-to-end scenarios: raw exchange record + raw credential listings in,
//! match result and presentation spec out.

use std::collections::BTreeMap;

use base64ct::{Base64, Encoding};
use presentation_match::{
    detect, index, match_request, normalize, prepare, Error, PresentationSpec, ProofRequest,
    RequestFormat,
};
use rstest::rstest;
use serde_json::{json, Value};

fn indy_credential_records() -> Vec<Value> {
    vec![json!({
        "referent": "c1",
        "cred_def_id": "WgWxqztrNooG92RXvxSTWv:3:CL:20:tag",
        "attrs": {"name": "Alice", "age": "30"}
    })]
}

#[test]
fn single_attribute_match() {
    let record = json!({
        "requested_attributes": {"a1": {"names": ["name"], "restrictions": []}}
    });

    let (_, result) = prepare(&record, &indy_credential_records(), None).expect("should match");

    assert_eq!(result.assignments, BTreeMap::from([("a1".to_string(), "c1".to_string())]));
    assert!(result.unsatisfied.is_empty());
}

#[test]
fn missing_attribute_is_unsatisfied() {
    let record = json!({
        "requested_attributes": {"a1": {"names": ["name"], "restrictions": []}}
    });
    let credentials = vec![json!({"credential_id": "c1", "attrs": {"age": "30"}})];

    let (request, result) = prepare(&record, &credentials, None).expect("should run");

    assert!(result.assignments.is_empty());
    assert_eq!(result.unsatisfied.iter().collect::<Vec<_>>(), vec!["a1"]);

    // an unsatisfied result never builds a spec
    let err = PresentationSpec::build(&request, &result).expect_err("should refuse");
    assert!(matches!(err, Error::EmptySelection));
}

#[test]
fn dif_field_match_is_case_insensitive() {
    let record = json!({
        "input_descriptors": [{
            "id": "d1",
            "constraints": {"fields": [{"path": ["$.credentialSubject.givenName"]}]}
        }]
    });
    let credentials = vec![json!({
        "id": "c1",
        "credential": {
            "type": ["VerifiableCredential"],
            "issuer": "did:example:gov",
            "credentialSubject": {"givenname": "Alice", "familyname": "Ng"}
        }
    })];

    let (request, result) = prepare(&record, &credentials, None).expect("should match");

    assert_eq!(result.assignments["d1"], "c1");
    let spec = PresentationSpec::build(&request, &result).expect("should build");
    let PresentationSpec::Dif { record_ids } = spec else {
        panic!("expected DIF spec");
    };
    assert_eq!(record_ids["d1"], "c1");
}

#[test]
fn base64_attachment_detects_indy() {
    let inner = json!({"requested_attributes": {}});
    let encoded = Base64::encode_string(inner.to_string().as_bytes());
    let record = json!({
        "request_presentations~attach": [{"data": {"base64": encoded}}]
    });

    let canonical = normalize::normalize(&record).expect("should normalize");
    assert_eq!(detect::detect(&canonical).expect("should detect"), RequestFormat::Indy);
}

#[test]
fn unrecognized_record_is_missing_request() {
    let err = prepare(&json!({}), &[], None).expect_err("should fail");
    assert!(matches!(err, Error::MissingRequest));
}

#[test]
fn round_trip_decode_matches_direct_classification() {
    let direct = json!({
        "presentation_definition": {"input_descriptors": [{"id": "d1"}]}
    });
    let encoded = Base64::encode_string(direct.to_string().as_bytes());
    let wrapped = json!({
        "presentation_request": {
            "request_presentations~attach": [{"data": {"base64": encoded}}]
        }
    });

    let direct_format = detect::detect(&direct).expect("should detect");
    let canonical = normalize::normalize(&wrapped).expect("should normalize");
    let wrapped_format = detect::detect(&canonical).expect("should detect");
    assert_eq!(direct_format, wrapped_format);

    // and the typed parse agrees end to end
    let from_direct = ProofRequest::from_record(&direct).expect("should parse");
    let from_wrapped = ProofRequest::from_record(&wrapped).expect("should parse");
    assert_eq!(from_direct, from_wrapped);
}

#[test]
fn restriction_precedence_over_coverage() {
    // both credentials carry the requested attribute; the one matching the
    // cred_def_id restriction wins even though it appears second
    let record = json!({
        "requested_attributes": {
            "a1": {
                "names": ["name"],
                "restrictions": [{"cred_def_id": "def:restricted"}]
            }
        }
    });
    let credentials = vec![
        json!({"referent": "by-coverage", "cred_def_id": "def:other", "attrs": {"name": "x"}}),
        json!({"referent": "by-restriction", "cred_def_id": "def:restricted", "attrs": {"name": "x"}}),
    ];

    let (_, result) = prepare(&record, &credentials, None).expect("should match");
    assert_eq!(result.assignments["a1"], "by-restriction");
}

#[test]
fn matching_is_deterministic_and_idempotent() {
    let record = json!({
        "requested_attributes": {
            "a1": {"names": ["name"]},
            "a2": {"names": ["age"]}
        },
        "requested_predicates": {
            "p1": {"name": "age", "p_type": ">=", "p_value": 18}
        }
    });
    let credentials = vec![
        json!({"referent": "c1", "attrs": {"name": "Alice", "age": "30"}}),
        json!({"referent": "c2", "attrs": {"age": "30"}}),
    ];

    let request = ProofRequest::from_record(&record).expect("should parse");
    let idx = index::build(&credentials);

    let first = match_request(&request, &idx, None);
    let second = match_request(&request, &idx, None);
    assert_eq!(first, second);

    // the same credential satisfies multiple referents: no backtracking
    assert_eq!(first.assignments["a1"], "c1");
    assert_eq!(first.assignments["a2"], "c1");
    assert_eq!(first.assignments["p1"], "c1");
}

#[test]
fn empty_index_yields_all_unsatisfied() {
    let record = json!({
        "input_descriptors": [
            {"id": "d1", "constraints": {"fields": [{"path": ["$.credentialSubject.x"]}]}},
            {"id": "d2"}
        ]
    });

    let (request, result) = prepare(&record, &[], None).expect("should run");

    assert!(result.assignments.is_empty());
    assert_eq!(result.unsatisfied.len(), request.requirement_ids().len());
}

#[test]
fn override_then_rebuild() {
    // interactive re-selection: the human swaps the greedy pick for another
    // credential, then matching is re-run with the override seeded
    let record = json!({
        "requested_attributes": {"a1": {"names": ["name"]}}
    });
    let credentials = vec![
        json!({"referent": "c1", "attrs": {"name": "Alice"}}),
        json!({"referent": "c2", "attrs": {"name": "Alice", "age": "30"}}),
    ];

    let (request, first) = prepare(&record, &credentials, None).expect("should match");
    assert_eq!(first.assignments["a1"], "c1");

    let overrides = BTreeMap::from([("a1".to_string(), "c2".to_string())]);
    let (_, second) = prepare(&record, &credentials, Some(&overrides)).expect("should match");
    assert_eq!(second.assignments["a1"], "c2");

    let spec = PresentationSpec::build(&request, &second).expect("should build");
    let PresentationSpec::Indy { requested_attributes, .. } = spec else {
        panic!("expected Indy spec");
    };
    assert_eq!(requested_attributes["a1"].cred_id, "c2");
}

#[rstest]
#[case(json!({"proof_request": {"requested_predicates": {}}}), RequestFormat::Indy)]
#[case(json!({"pres_request": {"input_descriptors": []}}), RequestFormat::Dif)]
#[case(
    json!({"formats": [{"format": "dif/presentation-exchange/definitions@v1.0"}],
           "request_presentations~attach": [{"data": {"json": {}}}]}),
    RequestFormat::Dif
)]
fn envelope_aliases_classify(#[case] record: Value, #[case] expected: RequestFormat) {
    let request = ProofRequest::from_record(&record).expect("should parse");
    assert_eq!(request.format(), expected);
}

#[rstest]
#[case("referent")]
#[case("credential_id")]
#[case("cred_id")]
#[case("record_id")]
#[case("id")]
fn credential_id_aliases_resolve(#[case] alias: &str) {
    let credentials = vec![json!({alias: "stable-id", "attrs": {"name": "x"}})];
    let idx = index::build(&credentials);
    assert_eq!(idx[0].credential_id(), "stable-id");
}

#[test]
fn descriptors_may_share_a_credential() {
    // baseline greedy contract: each descriptor is matched independently in
    // declaration order, and a credential already chosen for one descriptor
    // stays eligible for the next
    let record = json!({
        "input_descriptors": [
            {"id": "d1"},
            {"id": "d2", "constraints": {"fields": [{"path": ["$.credentialSubject.degree"]}]}}
        ]
    });
    let credentials = vec![json!({
        "id": "only",
        "credential": {
            "type": ["VerifiableCredential"],
            "credentialSubject": {"degree": "BSc"}
        }
    })];

    let (_, result) = prepare(&record, &credentials, None).expect("should run");
    assert_eq!(result.assignments["d1"], "only");
    assert_eq!(result.assignments["d2"], "only");
    assert!(result.is_satisfied());
}
