//! Issuance and verification of linked-data Verifiable Credentials.
//!
//! A credential is a typed Rust value (see [`credential`]) described by a static table of
//! namespace-qualified attributes. Signing it runs the proof pipeline:
//!
//! 1. the [`Projector`] turns the value into a [`LinkedDataDocument`];
//! 2. the [`Canonicalizer`] expands the document into RDF statements and serializes them
//!    in URDNA2015 canonical N-Quads form;
//! 3. the canonical form is hashed with SHA-256;
//! 4. the lowercase hex digest is signed as a detached, unencoded (`b64: false`) PS256
//!    JSON Web Signature, which becomes the `sd:jws` of the attached [`Proof`].
//!
//! Verification splits the proof off a signed document, runs the same canonicalization and
//! checks the signature with a [`VerificationKey`]: a JWK, a raw RSA public key or an
//! X.509 certificate.
//!
//! # Basic Usage
//!
//! ```no_run
//! use trust_framework_vc::credential::{credential_projector, OrganisationVerifiableCredential};
//! use trust_framework_vc::{ldp, VerificationKey, JWK};
//!
//! # fn main() -> Result<(), trust_framework_vc::Error> {
//! let private_key = rsa::RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048)?;
//! let key = JWK::from(&private_key).with_key_id("https://dawex.com/api/jwks");
//! let credential: OrganisationVerifiableCredential = serde_json::from_value(serde_json::json!({
//!     "id": "62b573deb33e417edcb34",
//!     "issuer": "62b573deb33e417ed",
//!     "issuanceDate": "2022-07-28T15:16:01Z",
//!     "credentialSubject": {
//!         "id": "62b573deb33e417e",
//!         "name": "Mercat de la Boqueria",
//!         "registrationNumber": "AB-1234-YZ",
//!         "headquarterAddress": { "locality": "Barcelona", "countryName": "ESP" },
//!         "legalAddress": { "locality": "Barcelona", "countryName": "ESP" }
//!     }
//! }))?;
//! let projector = credential_projector("https://dawex.com");
//!
//! let signed = ldp::sign_credential(
//!     &credential,
//!     &projector,
//!     "https://dawex.com/api/jwks",
//!     &key,
//! )?;
//! let valid = ldp::verify_proof(&signed.to_json(), &VerificationKey::from(&key))?;
//! assert!(valid);
//! # Ok(())
//! # }
//! ```

pub mod credential;
pub mod error;
pub mod hash;
pub mod jsonld;
pub mod jwk;
pub mod jws;
pub mod key;
pub mod ldp;
pub mod namespace;
pub mod projector;
pub mod rdf;
pub mod urdna2015;
pub mod vc;

pub use error::{Error, ErrorKind};
pub use jsonld::LinkedDataDocument;
pub use jwk::{JwkSet, JWK};
pub use key::VerificationKey;
pub use ldp::{
    generate_proof, generate_proof_with, sign_credential, verify_proof, ProofOptions,
};
pub use namespace::{Namespace, NamespaceRegistry};
pub use projector::{
    Attribute, DefaultFormatProvider, Field, FormatProvider, LinkedDataObject, Projector,
    TypeDescriptor,
};
pub use urdna2015::{canonicalize, CanonicalForm, CanonicalizationOptions, Canonicalizer};
pub use vc::{Proof, SignedDocument};
