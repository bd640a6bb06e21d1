//! Format names used by the credential schemas, and their usual templates.

use crate::namespace::NamespaceRegistry;
use crate::projector::{DefaultFormatProvider, Projector};

pub const DATA_PRODUCT_COPYRIGHT_OWNED_BY: &str = "DATA_PRODUCT_COPYRIGHT_OWNED_BY";
pub const DATA_PRODUCT_CREDENTIAL_SUBJECT: &str = "DATA_PRODUCT_CREDENTIAL_SUBJECT";
pub const DATA_PRODUCT_ISSUER: &str = "DATA_PRODUCT_ISSUER";
pub const DATA_PRODUCT_PROVIDED_BY: &str = "DATA_PRODUCT_PROVIDED_BY";
pub const DATA_PRODUCT_VERIFIABLE_CREDENTIAL: &str = "DATA_PRODUCT_VERIFIABLE_CREDENTIAL";
pub const ORGANISATION_CREDENTIAL_SUBJECT: &str = "ORGANISATION_CREDENTIAL_SUBJECT";
pub const ORGANISATION_ISSUER: &str = "ORGANISATION_ISSUER";
pub const ORGANISATION_VERIFIABLE_CREDENTIAL: &str = "ORGANISATION_VERIFIABLE_CREDENTIAL";

pub const DEFAULT_BASE_IRI: &str = "https://dawex.com";

/// Templates resolving credential identifiers relative to the base IRI.
pub fn default_formats() -> DefaultFormatProvider {
    DefaultFormatProvider::new()
        .with_format(
            ORGANISATION_VERIFIABLE_CREDENTIAL,
            "./organisations/%s/verifiableCredential",
        )
        .with_format(ORGANISATION_CREDENTIAL_SUBJECT, "./organisations/%s")
        .with_format(ORGANISATION_ISSUER, "./organisations/%s")
        .with_format(
            DATA_PRODUCT_VERIFIABLE_CREDENTIAL,
            "./organisations/%s/dataproducts/%s/verifiableCredential",
        )
        .with_format(DATA_PRODUCT_ISSUER, "./organisations/%s")
        .with_format(DATA_PRODUCT_CREDENTIAL_SUBJECT, "./dataproducts/%s")
        .with_format(
            DATA_PRODUCT_PROVIDED_BY,
            "./organisations/%s/verifiableCredential",
        )
        .with_format(
            DATA_PRODUCT_COPYRIGHT_OWNED_BY,
            "./organisations/%s/verifiableCredential",
        )
}

/// Projector over the default namespaces and templates, with `base_iri` as `@base`.
pub fn credential_projector(base_iri: impl Into<String>) -> Projector {
    Projector::new(NamespaceRegistry::default(), default_formats()).with_base_iri(base_iri)
}
