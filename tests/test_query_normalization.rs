//! Query normalizer behavior through the public API

use civiclens::config::QueryConfig;
use civiclens::error::QueryRejection;
use civiclens::query::{QueryIntent, QueryNormalizer};

fn normalizer() -> QueryNormalizer {
    QueryNormalizer::new(&QueryConfig::default()).unwrap()
}

#[test]
fn test_identifier_spellings_share_one_canonical_form() {
    let n = normalizer();
    let forms = ["hr 1234", "H.R. 1234", "HR-1234", "h.r.1234", "House Bill 1234"];

    for form in forms {
        let q = n.normalize(form).unwrap();
        assert_eq!(q.canonical, "HR-1234", "{form}");
        assert_eq!(q.identifiers, vec!["HR-1234"], "{form}");
    }
}

#[test]
fn test_other_identifier_families() {
    let n = normalizer();
    assert_eq!(n.normalize("eo 14001").unwrap().identifiers, vec!["EO-14001"]);
    assert_eq!(
        n.normalize("Executive Order 14001").unwrap().identifiers,
        vec!["EO-14001"]
    );
    assert_eq!(n.normalize("s 567").unwrap().identifiers, vec!["S-567"]);
    assert_eq!(
        n.normalize("S-2556-119").unwrap().identifiers,
        vec!["S-2556-119"]
    );
    assert_eq!(
        n.normalize("h.j.res. 7").unwrap().identifiers,
        vec!["HJRES-7"]
    );
}

#[test]
fn test_chamber_words_and_possessives_are_not_identifiers() {
    let n = normalizer();
    assert!(n
        .normalize("senate 2025 appropriations")
        .unwrap()
        .identifiers
        .is_empty());
    assert!(n
        .normalize("Trump's 2 executive orders")
        .unwrap()
        .identifiers
        .is_empty());
    assert_eq!(
        n.normalize("house resolution 5").unwrap().identifiers,
        vec!["HRES-5"]
    );
}

#[test]
fn test_conversational_phrase_extraction() {
    let q = normalizer()
        .normalize("what can you tell me about the big beautiful bill?")
        .unwrap();

    assert!(q.conversational);
    assert_eq!(q.phrase, "big beautiful bill");
    assert_eq!(q.effective_text(), "big beautiful bill");
    assert_eq!(q.raw, "what can you tell me about the big beautiful bill?");
    assert!(q.key_phrases.contains(&"big beautiful bill".to_string()));
}

#[test]
fn test_stop_words_never_empty_the_query() {
    let q = normalizer().normalize("the and of").unwrap();
    assert!(!q.terms.is_empty());
    assert!(!q.canonical.is_empty());
}

#[test]
fn test_rejections() {
    let n = normalizer();
    assert_eq!(n.normalize("  \t "), Err(QueryRejection::Empty));
    assert!(matches!(
        n.normalize(&"x".repeat(501)),
        Err(QueryRejection::TooLong { length: 501, max: 500 })
    ));
    assert!(n.normalize(&"x".repeat(500)).is_ok());
    assert!(matches!(
        n.normalize("<script>alert(1)</script>"),
        Err(QueryRejection::Blocked { .. })
    ));
}

#[test]
fn test_intents() {
    let n = normalizer();
    assert!(n
        .normalize("who sponsored the laken riley act")
        .unwrap()
        .has_intent(QueryIntent::Sponsor));
    assert!(n
        .normalize("has HR 1 passed")
        .unwrap()
        .has_intent(QueryIntent::Status));
    assert!(n
        .normalize("tell me about farm credit")
        .unwrap()
        .has_intent(QueryIntent::Overview));
}

#[test]
fn test_normalization_is_pure() {
    let n = normalizer();
    let a = n.normalize("Tell me about H.R. 1 and \"tax relief\"").unwrap();
    let b = n.normalize("Tell me about H.R. 1 and \"tax relief\"").unwrap();
    assert_eq!(a, b);
    assert!(a.key_phrases.contains(&"tax relief".to_string()));
}
