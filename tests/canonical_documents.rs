use difference::{Changeset, Difference};
use serde_json::json;
use trust_framework_vc::hash::digest;
use trust_framework_vc::{canonicalize, ErrorKind, LinkedDataDocument};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn document(json: serde_json::Value) -> LinkedDataDocument {
    LinkedDataDocument::try_from(&json).unwrap()
}

fn assert_same_lines(found: &str, expected: &str) {
    if found != expected {
        let changes = Changeset::new(expected, found, "\n");
        for diff in changes.diffs {
            match diff {
                Difference::Same(_) => {}
                Difference::Add(line) => eprintln!("+{line}"),
                Difference::Rem(line) => eprintln!("-{line}"),
            }
        }
        panic!("canonical form mismatch");
    }
}

fn organisation() -> serde_json::Value {
    json!({
        "@context": {
            "@base": "https://dawex.com",
            "gax-participant": "https://w3id.org/gaia-x/participant#"
        },
        "@id": "./organisations/1",
        "@type": "LegalPerson",
        "gax-participant:name": "Mercat",
        "gax-participant:legalAddress": {
            "gax-participant:locality": "Annecy"
        }
    })
}

#[test]
fn canonical_form_of_a_document() {
    init_logger();
    let canonical = canonicalize(&document(organisation())).unwrap();
    assert_same_lines(
        canonical.as_str(),
        "<https://dawex.com/organisations/1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://dawex.com/LegalPerson> .\n\
         <https://dawex.com/organisations/1> <https://w3id.org/gaia-x/participant#legalAddress> _:c0 .\n\
         <https://dawex.com/organisations/1> <https://w3id.org/gaia-x/participant#name> \"Mercat\" .\n\
         _:c0 <https://w3id.org/gaia-x/participant#locality> \"Annecy\" .",
    );
    assert_eq!(canonical.lines().count(), 4);
}

#[test]
fn layouts_of_one_graph_share_a_digest() {
    init_logger();
    let reference = digest(&canonicalize(&document(organisation())).unwrap());

    let expanded = document(json!({
        "https://w3id.org/gaia-x/participant#legalAddress": [{
            "https://w3id.org/gaia-x/participant#locality": { "@value": "Annecy" }
        }],
        "https://w3id.org/gaia-x/participant#name": ["Mercat"],
        "@type": ["https://dawex.com/LegalPerson"],
        "@id": "https://dawex.com/organisations/1"
    }));
    assert_eq!(digest(&canonicalize(&expanded).unwrap()), reference);

    let relabeled = document(json!({
        "@context": {
            "@base": "https://dawex.com/organisations/",
            "gp": "https://w3id.org/gaia-x/participant#"
        },
        "@id": "1",
        "@type": "../LegalPerson",
        "gp:legalAddress": {
            "@id": "_:address",
            "gp:locality": "Annecy"
        },
        "gp:name": "Mercat"
    }));
    assert_eq!(digest(&canonicalize(&relabeled).unwrap()), reference);
}

#[test]
fn value_changes_change_the_digest() {
    init_logger();
    let reference = digest(&canonicalize(&document(organisation())).unwrap());

    let mut typed = organisation();
    typed["gax-participant:name"] = json!({
        "@value": "Mercat",
        "@language": "ca"
    });
    assert_ne!(digest(&canonicalize(&document(typed)).unwrap()), reference);

    let mut numeric = organisation();
    numeric["gax-participant:name"] = json!(1);
    assert_ne!(digest(&canonicalize(&document(numeric)).unwrap()), reference);
}

#[test]
fn blank_nodes_are_relabeled_in_a_stable_order() {
    init_logger();
    let addresses = |first: &str, second: &str| {
        document(json!({
            "@context": {
                "gax-participant": "https://w3id.org/gaia-x/participant#"
            },
            "@id": "https://dawex.com/organisations/1",
            "gax-participant:address": [
                { "gax-participant:locality": first },
                { "gax-participant:locality": second }
            ]
        }))
    };
    let a = canonicalize(&addresses("Annecy", "Barcelona")).unwrap();
    let b = canonicalize(&addresses("Barcelona", "Annecy")).unwrap();
    assert_same_lines(a.as_str(), b.as_str());
    assert!(a.lines().any(|line| line.starts_with("_:c0 ")));
    assert!(a.lines().any(|line| line.starts_with("_:c1 ")));
    assert!(!a.as_str().contains("_:b"));

    let mut sorted: Vec<&str> = a.lines().collect();
    sorted.sort_unstable();
    assert_eq!(sorted, a.lines().collect::<Vec<_>>());
}

#[test]
fn undeclared_prefix() {
    init_logger();
    let mut doc = organisation();
    doc["@context"]
        .as_object_mut()
        .unwrap()
        .remove("gax-participant");
    let err = LinkedDataDocument::try_from(&doc)
        .and_then(|doc| canonicalize(&doc))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpandableDocument);
}
