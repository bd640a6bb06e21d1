//! Namespace prefixes used by credential documents.
//!
//! Credentials are written with compact `prefix:term` keys. The registry is the single
//! table mapping those prefixes to absolute IRIs; it is immutable and handed explicitly to
//! the [projector](crate::projector::Projector) and, optionally, to the
//! [canonicalizer](crate::urdna2015::Canonicalizer).

/// A namespace prefix and the IRI it abbreviates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: &'static str,
    pub iri: &'static str,
}

impl Namespace {
    pub const fn new(prefix: &'static str, iri: &'static str) -> Self {
        Self { prefix, iri }
    }

    /// Compact key for `term` in this namespace, e.g. `sd:issuer`.
    pub fn compact(&self, term: &str) -> String {
        format!("{}:{}", self.prefix, term)
    }

    /// Absolute IRI for `term` in this namespace.
    pub fn expand(&self, term: &str) -> String {
        format!("{}{}", self.iri, term)
    }
}

pub const DAWEX: Namespace = Namespace::new("dw", "https://dawex.com/schemas/dataoffering#");
pub const GAX_PARTICIPANT: Namespace =
    Namespace::new("gax-participant", "https://w3id.org/gaia-x/participant#");
pub const GAX_RESOURCE: Namespace =
    Namespace::new("gax-resource", "https://www.w3id.org/gaia-x/resource#");
pub const GAX_SERVICE: Namespace =
    Namespace::new("gax-service", "https://w3id.org/gaia-x/service#");
// No trailing separator: terms are appended directly to the context IRI.
pub const SERVICE_DESCRIPTION: Namespace =
    Namespace::new("sd", "https://www.w3.org/2018/credentials/v1");
pub const W3_SECURITY: Namespace = Namespace::new("w3sec", "https://w3id.org/security#");

const DEFAULT_NAMESPACES: &[Namespace] = &[
    DAWEX,
    GAX_PARTICIPANT,
    GAX_RESOURCE,
    GAX_SERVICE,
    SERVICE_DESCRIPTION,
    W3_SECURITY,
];

/// Immutable prefix to IRI table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
}

impl NamespaceRegistry {
    /// Registry over the given namespaces.
    ///
    /// When a prefix appears twice, the first entry wins.
    pub fn new(namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        let mut registry: Vec<Namespace> = Vec::new();
        for namespace in namespaces {
            if registry.iter().all(|ns| ns.prefix != namespace.prefix) {
                registry.push(namespace);
            }
        }
        Self {
            namespaces: registry,
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.prefix == prefix)
    }

    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.get(namespace.prefix) == Some(namespace)
    }

    /// Absolute IRI for a `prefix`/`term` pair, if the prefix is registered.
    pub fn expand(&self, prefix: &str, term: &str) -> Option<String> {
        self.get(prefix).map(|ns| ns.expand(term))
    }

    /// Namespaces in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Position of a prefix in registration order.
    pub(crate) fn position(&self, prefix: &str) -> Option<usize> {
        self.namespaces.iter().position(|ns| ns.prefix == prefix)
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACES.iter().copied())
    }
}
