//! Linked-data proofs: signing and verifying credentials.

use chrono::prelude::*;
use serde_json::Value as JsonValue;

use crate::error::Error;
use crate::hash::digest;
use crate::jsonld::LinkedDataDocument;
use crate::jwk::JWK;
use crate::jws;
use crate::key::VerificationKey;
use crate::projector::{FormatProvider, LinkedDataObject, Projector};
use crate::urdna2015::{CanonicalizationOptions, Canonicalizer};
use crate::vc::{Proof, SignedDocument, DEFAULT_PROOF_PURPOSE, JSON_WEB_SIGNATURE_2020};

/// Options for creating a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOptions {
    /// URI locating the public key set.
    pub verification_method: String,
    pub proof_purpose: String,
    /// Creation time; the current time, truncated to seconds, when unset.
    pub created: Option<DateTime<Utc>>,
    pub canonicalization: CanonicalizationOptions,
}

impl ProofOptions {
    pub fn new(verification_method: impl Into<String>) -> Self {
        Self {
            verification_method: verification_method.into(),
            ..Default::default()
        }
    }
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            verification_method: String::new(),
            proof_purpose: DEFAULT_PROOF_PURPOSE.to_string(),
            created: None,
            canonicalization: CanonicalizationOptions::default(),
        }
    }
}

pub trait ProofSuite {
    fn sign(
        document: &LinkedDataDocument,
        options: &ProofOptions,
        key: &JWK,
    ) -> Result<Proof, Error>;
    fn verify(
        proof: &Proof,
        document: &LinkedDataDocument,
        key: &VerificationKey,
        options: &CanonicalizationOptions,
    ) -> Result<bool, Error>;
}

pub struct LinkedDataProofs {}
impl LinkedDataProofs {
    // https://w3c-ccg.github.io/ld-proofs/#proof-algorithm
    pub fn sign(
        document: &LinkedDataDocument,
        options: &ProofOptions,
        key: &JWK,
    ) -> Result<Proof, Error> {
        JsonWebSignature2020::sign(document, options, key)
    }

    // https://w3c-ccg.github.io/ld-proofs/#proof-verification-algorithm
    pub fn verify(
        proof: &Proof,
        document: &LinkedDataDocument,
        key: &VerificationKey,
        options: &CanonicalizationOptions,
    ) -> Result<bool, Error> {
        match proof.type_.as_str() {
            JSON_WEB_SIGNATURE_2020 => JsonWebSignature2020::verify(proof, document, key, options),
            other => Err(Error::malformed(format!("Unsupported proof type {other}"))),
        }
    }
}

/// Canonicalize `document` and digest the canonical form.
pub fn document_digest(
    document: &LinkedDataDocument,
    options: &CanonicalizationOptions,
) -> Result<String, Error> {
    let canonical = Canonicalizer::new(*options).canonicalize(document)?;
    log::debug!(
        "canonicalized document into {} statements",
        canonical.lines().count()
    );
    let hash = digest(&canonical);
    log::debug!("document digest {}", hash);
    Ok(hash)
}

fn now() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now)
}

/// <https://w3c-ccg.github.io/lds-jws2020/>
pub struct JsonWebSignature2020 {}
impl ProofSuite for JsonWebSignature2020 {
    fn sign(
        document: &LinkedDataDocument,
        options: &ProofOptions,
        key: &JWK,
    ) -> Result<Proof, Error> {
        let hash = document_digest(document, &options.canonicalization)?;
        let jws = jws::sign(&hash, key)?;
        log::debug!("signed document digest");
        Ok(Proof::new(
            options.created.unwrap_or_else(now),
            options.proof_purpose.clone(),
            options.verification_method.clone(),
            jws,
        ))
    }

    fn verify(
        proof: &Proof,
        document: &LinkedDataDocument,
        key: &VerificationKey,
        options: &CanonicalizationOptions,
    ) -> Result<bool, Error> {
        let hash = document_digest(document, options)?;
        let valid = jws::verify(&proof.jws, &hash, key)?;
        log::debug!("proof verified: {}", valid);
        Ok(valid)
    }
}

/// Project, canonicalize, digest and sign `credential`.
///
/// The proof is stamped with the current time and the `assertionMethod` purpose.
pub fn generate_proof<F: FormatProvider>(
    credential: &dyn LinkedDataObject,
    projector: &Projector<F>,
    verification_method: &str,
    key: &JWK,
) -> Result<Proof, Error> {
    generate_proof_with(
        credential,
        projector,
        key,
        &ProofOptions::new(verification_method),
    )
}

pub fn generate_proof_with<F: FormatProvider>(
    credential: &dyn LinkedDataObject,
    projector: &Projector<F>,
    key: &JWK,
    options: &ProofOptions,
) -> Result<Proof, Error> {
    let document = projector.project(credential)?;
    log::debug!("projected credential {:?}", document.root.id);
    LinkedDataProofs::sign(&document, options, key)
}

/// Sign `credential` and attach the proof.
pub fn sign_credential<F: FormatProvider>(
    credential: &dyn LinkedDataObject,
    projector: &Projector<F>,
    verification_method: &str,
    key: &JWK,
) -> Result<SignedDocument, Error> {
    sign_credential_with(
        credential,
        projector,
        key,
        &ProofOptions::new(verification_method),
    )
}

pub fn sign_credential_with<F: FormatProvider>(
    credential: &dyn LinkedDataObject,
    projector: &Projector<F>,
    key: &JWK,
    options: &ProofOptions,
) -> Result<SignedDocument, Error> {
    let document = projector.project(credential)?;
    log::debug!("projected credential {:?}", document.root.id);
    let proof = LinkedDataProofs::sign(&document, options, key)?;
    Ok(SignedDocument::new(document, proof))
}

/// Check the proof of a signed document.
///
/// `Ok(false)` means the signature does not match the document; a document that has no
/// proof, or whose proof cannot be parsed, is an error.
pub fn verify_proof(signed: &JsonValue, key: &VerificationKey) -> Result<bool, Error> {
    let signed = SignedDocument::try_from(signed)?;
    log::debug!("split proof from credential {:?}", signed.credential.root.id);
    verify_signed_document(&signed, key, &CanonicalizationOptions::default())
}

pub fn verify_signed_document(
    signed: &SignedDocument,
    key: &VerificationKey,
    options: &CanonicalizationOptions,
) -> Result<bool, Error> {
    LinkedDataProofs::verify(&signed.proof, &signed.credential, key, options)
}
