use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use serde_json::Value as JsonValue;

use crate::error::Error;
use crate::jsonld::{expand_term, Context, LinkedDataDocument, Node, Value};
use crate::namespace::SERVICE_DESCRIPTION;
use crate::projector::DATE_TIME_FORMAT;

// ********************************************
// * Credential proofs
// * https://w3c-ccg.github.io/lds-jws2020/
// ********************************************

pub const JSON_WEB_SIGNATURE_2020: &str = "JsonWebSignature2020";
pub const DEFAULT_PROOF_PURPOSE: &str = "assertionMethod";

/// Term of the proof predicate. A proof is written under `sd:proof` and found under any key
/// that expands to the same IRI.
pub const PROOF_TERM: &str = "proof";

/// Proof attached to a signed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub type_: String,
    pub created: DateTime<Utc>,
    pub proof_purpose: String,
    pub verification_method: String,
    /// Detached compact JWS over the credential digest.
    pub jws: String,
}

impl Proof {
    pub fn new(
        created: DateTime<Utc>,
        proof_purpose: impl Into<String>,
        verification_method: impl Into<String>,
        jws: impl Into<String>,
    ) -> Self {
        Self {
            type_: JSON_WEB_SIGNATURE_2020.to_string(),
            created,
            proof_purpose: proof_purpose.into(),
            verification_method: verification_method.into(),
            jws: jws.into(),
        }
    }

    /// Proof node, with `sd:` keys in stable order.
    pub fn to_node(&self) -> Node {
        let sd = |term: &str| SERVICE_DESCRIPTION.compact(term);
        Node::new()
            .with_property(sd("type"), Value::string(&self.type_))
            .with_property(
                sd("created"),
                Value::string(self.created.format(DATE_TIME_FORMAT).to_string()),
            )
            .with_property(sd("proofPurpose"), Value::string(&self.proof_purpose))
            .with_property(
                sd("verificationMethod"),
                Value::string(&self.verification_method),
            )
            .with_property(sd("jws"), Value::string(&self.jws))
    }
}

/// Key of `node` that expands to `iri` in `context`. Keys that do not expand never match.
fn find_key<'a>(node: &'a Node, context: &Context, iri: &str) -> Result<Option<&'a str>, Error> {
    let mut found = node
        .properties()
        .map(|(key, _)| key)
        .filter(|key| expand_term(key, context).map_or(false, |expanded| expanded == iri));
    match (found.next(), found.next()) {
        (Some(first), Some(second)) => Err(Error::malformed(format!(
            "{first} and {second} both expand to {iri}"
        ))),
        (first, _) => Ok(first),
    }
}

fn proof_text<'a>(node: &'a Node, context: &Context, term: &str) -> Result<&'a str, Error> {
    let iri = SERVICE_DESCRIPTION.expand(term);
    let key = find_key(node, context, &iri)?.ok_or_else(|| {
        Error::malformed(format!("Missing {}", SERVICE_DESCRIPTION.compact(term)))
    })?;
    match node.get(key) {
        Some(Value::String(value)) => Ok(value),
        _ => Err(Error::malformed(format!("{key} must be a string"))),
    }
}

impl Proof {
    /// Read a proof node whose keys are expanded against `context`.
    pub fn from_node(node: &Node, context: &Context) -> Result<Self, Error> {
        let context = match &node.context {
            Some(local) => context.merge(local),
            None => context.clone(),
        };
        let jws = proof_text(node, &context, "jws")?;
        let type_ = proof_text(node, &context, "type")?;
        if type_ != JSON_WEB_SIGNATURE_2020 {
            return Err(Error::malformed(format!("Unsupported proof type {type_}")));
        }
        let created = proof_text(node, &context, "created")?;
        let created = DateTime::parse_from_rfc3339(created)
            .map_err(|e| Error::malformed(format!("Invalid proof creation time {created}: {e}")))?
            .with_timezone(&Utc);
        Ok(Self {
            type_: type_.to_string(),
            created,
            proof_purpose: proof_text(node, &context, "proofPurpose")?.to_string(),
            verification_method: proof_text(node, &context, "verificationMethod")?.to_string(),
            jws: jws.to_string(),
        })
    }
}

impl TryFrom<&Node> for Proof {
    type Error = Error;
    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        let context =
            Context::new().with_prefix(SERVICE_DESCRIPTION.prefix, SERVICE_DESCRIPTION.iri);
        Self::from_node(node, &context)
    }
}

/// A credential document together with its proof.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    /// The credential, without proof.
    pub credential: LinkedDataDocument,
    pub proof: Proof,
}

impl SignedDocument {
    pub fn new(credential: LinkedDataDocument, proof: Proof) -> Self {
        Self { credential, proof }
    }

    /// The credential with the proof node attached under `sd:proof`.
    pub fn to_document(&self) -> LinkedDataDocument {
        let mut document = self.credential.clone();
        if document.context.get(SERVICE_DESCRIPTION.prefix).is_none() {
            document
                .context
                .insert(SERVICE_DESCRIPTION.prefix, SERVICE_DESCRIPTION.iri);
        }
        document.root.insert(
            SERVICE_DESCRIPTION.compact(PROOF_TERM),
            Value::Node(self.proof.to_node()),
        );
        document
    }

    pub fn to_json(&self) -> JsonValue {
        self.to_document().to_json()
    }

    /// Split a signed document into the credential and its proof. The proof is looked up by
    /// its expanded predicate, whatever prefix the document uses for it.
    pub fn split(mut document: LinkedDataDocument) -> Result<Self, Error> {
        let context = match &document.root.context {
            Some(local) => document.context.merge(local),
            None => document.context.clone(),
        };
        let key = find_key(&document.root, &context, &SERVICE_DESCRIPTION.expand(PROOF_TERM))?
            .map(str::to_string)
            .ok_or_else(|| Error::malformed("Missing proof"))?;
        let proof = match document.root.remove(&key) {
            Some(Value::Node(node)) => Proof::from_node(&node, &context)?,
            Some(Value::Array(_)) => {
                return Err(Error::malformed("Multiple proofs are not supported"))
            }
            _ => return Err(Error::malformed(format!("{key} must be a node"))),
        };
        Ok(Self {
            credential: document,
            proof,
        })
    }
}

impl TryFrom<&JsonValue> for SignedDocument {
    type Error = Error;
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        Self::split(LinkedDataDocument::try_from(value)?)
    }
}

impl FromStr for SignedDocument {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(LinkedDataDocument::from_str(s)?)
    }
}

impl fmt::Display for SignedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl serde::Serialize for SignedDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn sd_context() -> Context {
        Context::new().with_prefix("sd", "https://www.w3.org/2018/credentials/v1")
    }

    fn proof() -> Proof {
        Proof::new(
            Utc.with_ymd_and_hms(2022, 7, 28, 15, 16, 1).unwrap(),
            DEFAULT_PROOF_PURPOSE,
            "https://dawex.com/api/jwks",
            "eyJhbGciOiJQUzI1NiJ9..c2ln",
        )
    }

    #[test]
    fn attach_and_split() {
        let credential = LinkedDataDocument::new(
            Context::new().with_base("https://dawex.com"),
            Node::new().with_id("./organisations/1").with_type("VerifiableCredential"),
        );
        let signed = SignedDocument::new(credential.clone(), proof());
        let json = signed.to_json();
        assert_eq!(
            json,
            json!({
                "@context": {
                    "@base": "https://dawex.com",
                    "sd": "https://www.w3.org/2018/credentials/v1"
                },
                "@id": "./organisations/1",
                "@type": "VerifiableCredential",
                "sd:proof": {
                    "sd:type": "JsonWebSignature2020",
                    "sd:created": "2022-07-28T15:16:01Z",
                    "sd:proofPurpose": "assertionMethod",
                    "sd:verificationMethod": "https://dawex.com/api/jwks",
                    "sd:jws": "eyJhbGciOiJQUzI1NiJ9..c2ln"
                }
            })
        );
        let proof_keys: Vec<&String> = json["sd:proof"].as_object().unwrap().keys().collect();
        assert_eq!(
            proof_keys,
            [
                "sd:type",
                "sd:created",
                "sd:proofPurpose",
                "sd:verificationMethod",
                "sd:jws"
            ]
        );

        let split = SignedDocument::from_str(&signed.to_string()).unwrap();
        assert_eq!(split.proof, proof());
        assert_eq!(split.credential.root, credential.root);
    }

    #[test]
    fn malformed_proofs() {
        let missing = json!({"@id": "urn:a"});
        let err = SignedDocument::try_from(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSignature);

        let mut proof_node = proof().to_node();
        proof_node.remove("sd:jws");
        let document = LinkedDataDocument::new(
            sd_context(),
            Node::new().with_property("sd:proof", Value::Node(proof_node)),
        );
        let err = SignedDocument::split(document).unwrap_err();
        assert_eq!(err.to_string(), "Malformed signature: Missing sd:jws");

        let mut other_type = proof();
        other_type.type_ = "RsaSignature2018".to_string();
        let document = LinkedDataDocument::new(
            sd_context(),
            Node::new().with_property("sd:proof", Value::Node(other_type.to_node())),
        );
        let err = SignedDocument::split(document).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSignature);

        let twice = LinkedDataDocument::new(
            sd_context(),
            Node::new()
                .with_property("sd:proof", Value::Node(proof().to_node()))
                .with_property(
                    "https://www.w3.org/2018/credentials/v1proof",
                    Value::Node(proof().to_node()),
                ),
        );
        let err = SignedDocument::split(twice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSignature);

        let other_namespace = LinkedDataDocument::new(
            Context::new().with_prefix("sd", "https://example.org/vocab#"),
            Node::new().with_property("sd:proof", Value::Node(proof().to_node())),
        );
        let err = SignedDocument::split(other_namespace).unwrap_err();
        assert_eq!(err.to_string(), "Malformed signature: Missing proof");
    }

    #[test]
    fn proof_under_another_prefix() {
        let json = json!({
            "@context": {
                "cred": "https://www.w3.org/2018/credentials/v1"
            },
            "@id": "urn:a",
            "cred:proof": {
                "cred:type": "JsonWebSignature2020",
                "cred:created": "2022-07-28T15:16:01Z",
                "https://www.w3.org/2018/credentials/v1proofPurpose": "assertionMethod",
                "cred:verificationMethod": "https://dawex.com/api/jwks",
                "cred:jws": "eyJhbGciOiJQUzI1NiJ9..c2ln"
            }
        });
        let split = SignedDocument::try_from(&json).unwrap();
        assert_eq!(split.proof, proof());
        assert!(split.credential.root.get("cred:proof").is_none());

        let absolute = json!({
            "@id": "urn:a",
            "https://www.w3.org/2018/credentials/v1proof": {
                "@context": { "sd": "https://www.w3.org/2018/credentials/v1" },
                "sd:type": "JsonWebSignature2020",
                "sd:created": "2022-07-28T15:16:01Z",
                "sd:proofPurpose": "assertionMethod",
                "sd:verificationMethod": "https://dawex.com/api/jwks",
                "sd:jws": "eyJhbGciOiJQUzI1NiJ9..c2ln"
            }
        });
        assert_eq!(SignedDocument::try_from(&absolute).unwrap().proof, proof());
    }
}
