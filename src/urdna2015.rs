//! RDF Dataset Canonicalization (URDNA2015).
//!
//! <https://www.w3.org/TR/rdf-canon/>
//!
//! Canonical blank node labels use the `_:c` prefix (`_:c0`, `_:c1`, ...). The canonical
//! form is the sorted, deduplicated N-Quads lines joined with `\n`, without a terminator
//! after the last line.

use std::collections::BTreeMap as Map;
use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::hash::sha256_hex;
use crate::jsonld::{Context, LinkedDataDocument, Node, Value};
use crate::namespace::NamespaceRegistry;
use crate::rdf::{BlankIdPosition, BlankNodeLabel, DataSet, Statement};

pub const CANONICAL_PREFIX: &str = "_:c";
const TEMPORARY_PREFIX: &str = "_:b";

/// Largest group of related blank nodes with equal hashes that is searched by permutation.
pub const DEFAULT_MAX_PERMUTATION_GROUP: usize = 8;
/// Upper bound on Hash N-Degree Quads invocations for a single dataset.
pub const DEFAULT_MAX_HASH_N_DEGREE_CALLS: usize = 100_000;

/// Bounds on the tie-breaking search.
///
/// Exceeding either bound fails the canonicalization; a partial labeling is never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizationOptions {
    pub max_permutation_group: usize,
    pub max_hash_n_degree_calls: usize,
}

impl Default for CanonicalizationOptions {
    fn default() -> Self {
        Self {
            max_permutation_group: DEFAULT_MAX_PERMUTATION_GROUP,
            max_hash_n_degree_calls: DEFAULT_MAX_HASH_N_DEGREE_CALLS,
        }
    }
}

/// Canonical N-Quads serialization of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.split('\n').filter(|line| !line.is_empty())
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes linked-data documents and datasets.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer<'a> {
    options: CanonicalizationOptions,
    registry: Option<&'a NamespaceRegistry>,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(options: CanonicalizationOptions) -> Self {
        Self {
            options,
            registry: None,
        }
    }

    /// Refuse documents whose contexts bind a registered prefix to a different IRI.
    pub fn with_registry(mut self, registry: &'a NamespaceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn options(&self) -> &CanonicalizationOptions {
        &self.options
    }

    pub fn canonicalize(&self, document: &LinkedDataDocument) -> Result<CanonicalForm, Error> {
        if let Some(registry) = self.registry {
            check_context(&document.context, registry)?;
            check_node_contexts(&document.root, registry)?;
        }
        let dataset = document.to_dataset()?;
        self.canonicalize_dataset(&dataset)
    }

    pub fn canonicalize_dataset(&self, dataset: &DataSet) -> Result<CanonicalForm, Error> {
        let normalized = normalize(dataset, &self.options)?;
        Ok(CanonicalForm(normalized.to_nquads_vec().join("\n")))
    }
}

/// Canonicalize a document with the default bounds.
pub fn canonicalize(document: &LinkedDataDocument) -> Result<CanonicalForm, Error> {
    Canonicalizer::default().canonicalize(document)
}

fn check_context(context: &Context, registry: &NamespaceRegistry) -> Result<(), Error> {
    for (prefix, iri) in context.prefixes() {
        if let Some(namespace) = registry.get(prefix) {
            if namespace.iri != iri {
                return Err(Error::unexpandable(format!(
                    "Prefix {prefix} is bound to {iri} instead of {}",
                    namespace.iri
                )));
            }
        }
    }
    Ok(())
}

fn check_node_contexts(node: &Node, registry: &NamespaceRegistry) -> Result<(), Error> {
    if let Some(context) = &node.context {
        check_context(context, registry)?;
    }
    node.properties()
        .try_for_each(|(_, value)| check_value_contexts(value, registry))
}

fn check_value_contexts(value: &Value, registry: &NamespaceRegistry) -> Result<(), Error> {
    match value {
        Value::Node(node) => check_node_contexts(node, registry),
        Value::Array(values) | Value::List(values) => values
            .iter()
            .try_for_each(|value| check_value_contexts(value, registry)),
        _ => Ok(()),
    }
}

/// <https://www.w3.org/TR/rdf-canon/#dfn-identifier-issuer>
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    pub identifier_prefix: String,
    pub identifier_counter: u64,
    /// `(issued, existing)` pairs in issuance order.
    pub issued_identifiers_list: Vec<(String, String)>,
}

impl IdentifierIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            identifier_prefix: prefix.to_string(),
            identifier_counter: 0,
            issued_identifiers_list: Vec::new(),
        }
    }

    pub fn find_issued_identifier(&self, existing_identifier: &str) -> Option<&str> {
        self.issued_identifiers_list
            .iter()
            .find(|(_, existing_id)| existing_id == existing_identifier)
            .map(|(issued_identifier, _)| issued_identifier.as_str())
    }

    /// <https://www.w3.org/TR/rdf-canon/#issue-identifier-algorithm>
    pub fn issue_identifier(&mut self, existing_identifier: &str) -> String {
        // 1
        if let Some(id) = self.find_issued_identifier(existing_identifier) {
            return id.to_string();
        }
        // 2
        let issued_identifier = format!("{}{}", self.identifier_prefix, self.identifier_counter);
        // 3
        self.issued_identifiers_list
            .push((issued_identifier.clone(), existing_identifier.to_string()));
        // 4
        self.identifier_counter += 1;
        // 5
        issued_identifier
    }
}

#[derive(Debug, Clone)]
pub struct HashNDegreeQuadsOutput {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

/// <https://www.w3.org/TR/rdf-canon/#canon-state>
struct NormalizationState<'a> {
    blank_node_to_quads: Map<&'a str, Vec<&'a Statement>>,
    hash_to_blank_nodes: Map<String, Vec<&'a str>>,
    canonical_issuer: IdentifierIssuer,
    first_degree_hashes: HashMap<&'a str, String>,
    options: CanonicalizationOptions,
    hash_n_degree_calls: usize,
}

impl<'a> NormalizationState<'a> {
    /// <https://www.w3.org/TR/rdf-canon/#hash-1d-quads>
    fn hash_first_degree_quads(&mut self, reference_blank_node_identifier: &'a str) -> String {
        if let Some(hash) = self.first_degree_hashes.get(reference_blank_node_identifier) {
            return hash.clone();
        }
        // 1
        let mut nquads: Vec<String> = Vec::new();
        // 2, 3
        if let Some(quads) = self.blank_node_to_quads.get(reference_blank_node_identifier) {
            for quad in quads {
                // 3.1
                let mut quad: Statement = (*quad).clone();
                // 3.1.1
                for label in quad.blank_node_components_mut() {
                    // 3.1.1.1
                    *label = if label.0 == reference_blank_node_identifier {
                        BlankNodeLabel("_:a".to_string())
                    } else {
                        BlankNodeLabel("_:z".to_string())
                    };
                }
                nquads.push(String::from(&quad));
            }
        }
        // 4
        nquads.sort();
        // 5
        let hash = sha256_hex(nquads.join("").as_bytes());
        self.first_degree_hashes
            .insert(reference_blank_node_identifier, hash.clone());
        hash
    }

    /// <https://www.w3.org/TR/rdf-canon/#hash-related-blank-node>
    fn hash_related_blank_node(
        &mut self,
        related: &'a str,
        quad: &Statement,
        issuer: &IdentifierIssuer,
        position: BlankIdPosition,
    ) -> String {
        // 1
        let identifier = match self
            .canonical_issuer
            .find_issued_identifier(related)
            .or_else(|| issuer.find_issued_identifier(related))
        {
            Some(id) => id.to_string(),
            None => self.hash_first_degree_quads(related),
        };
        // 2
        let mut input = position.into_char().to_string();
        // 3
        if position != BlankIdPosition::Graph {
            input.push_str(&quad.predicate.to_string());
        }
        // 4
        input.push_str(&identifier);
        // 5
        sha256_hex(input.as_bytes())
    }

    /// <https://www.w3.org/TR/rdf-canon/#hash-nd-quads>
    fn hash_n_degree_quads(
        &mut self,
        identifier: &'a str,
        issuer: &IdentifierIssuer,
    ) -> Result<HashNDegreeQuadsOutput, Error> {
        self.hash_n_degree_calls += 1;
        if self.hash_n_degree_calls > self.options.max_hash_n_degree_calls {
            return Err(Error::CanonicalizationFailed(format!(
                "More than {} Hash N-Degree Quads invocations",
                self.options.max_hash_n_degree_calls
            )));
        }
        let mut issuer = issuer.clone();
        // 1
        let mut hash_to_related_blank_nodes: Map<String, Vec<&'a str>> = Map::new();
        // 2
        let quads = self
            .blank_node_to_quads
            .get(identifier)
            .cloned()
            .unwrap_or_default();
        // 3
        for quad in quads {
            // 3.1
            for (component, position) in quad.blank_node_components_with_position() {
                if component.0 != identifier {
                    // 3.1.1
                    let hash =
                        self.hash_related_blank_node(&component.0, quad, &issuer, position);
                    // 3.1.2
                    hash_to_related_blank_nodes
                        .entry(hash)
                        .or_default()
                        .push(&component.0);
                }
            }
        }
        // 4
        let mut data_to_hash = String::new();
        // 5
        for (related_hash, blank_node_list) in hash_to_related_blank_nodes {
            // 5.1
            data_to_hash.push_str(&related_hash);
            if blank_node_list.len() > self.options.max_permutation_group {
                return Err(Error::CanonicalizationFailed(format!(
                    "{} related blank nodes share hash {related_hash}, more than the {} that can be permuted",
                    blank_node_list.len(),
                    self.options.max_permutation_group
                )));
            }
            // 5.2
            let mut chosen_path = String::new();
            // 5.3
            let mut chosen_issuer = None;
            // 5.4
            'permutations: for permutation in permute::permutations_of(&blank_node_list) {
                // 5.4.1
                let mut issuer_copy = issuer.clone();
                // 5.4.2
                let mut path = String::new();
                // 5.4.3
                let mut recursion_list = Vec::new();
                // 5.4.4
                for &related in permutation {
                    if let Some(canonical_identifier) =
                        self.canonical_issuer.find_issued_identifier(related)
                    {
                        // 5.4.4.1
                        path.push_str(canonical_identifier);
                    } else {
                        // 5.4.4.2.1
                        if issuer_copy.find_issued_identifier(related).is_none() {
                            recursion_list.push(related);
                        }
                        // 5.4.4.2.2
                        path.push_str(&issuer_copy.issue_identifier(related));
                    }
                    // 5.4.4.3
                    if chosen_issuer.is_some() && path.len() >= chosen_path.len() && path > chosen_path {
                        continue 'permutations;
                    }
                }
                // 5.4.5
                for related in recursion_list {
                    // 5.4.5.1
                    let result = self.hash_n_degree_quads(related, &issuer_copy)?;
                    // 5.4.5.2
                    path.push_str(&issuer_copy.issue_identifier(related));
                    // 5.4.5.3
                    path.push('<');
                    path.push_str(&result.hash);
                    path.push('>');
                    // 5.4.5.4
                    issuer_copy = result.issuer;
                    // 5.4.5.5
                    if chosen_issuer.is_some() && path.len() >= chosen_path.len() && path > chosen_path {
                        continue 'permutations;
                    }
                }
                // 5.4.6
                if chosen_issuer.is_none() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
            }
            // 5.5
            data_to_hash.push_str(&chosen_path);
            // 5.6
            issuer = chosen_issuer.ok_or_else(|| {
                Error::CanonicalizationFailed(format!(
                    "No permutation chosen for related hash {related_hash}"
                ))
            })?;
        }
        // 6
        Ok(HashNDegreeQuadsOutput {
            hash: sha256_hex(data_to_hash.as_bytes()),
            issuer,
        })
    }
}

/// Relabel the blank nodes of a dataset canonically.
///
/// <https://www.w3.org/TR/rdf-canon/#canon-algorithm>
pub fn normalize(dataset: &DataSet, options: &CanonicalizationOptions) -> Result<DataSet, Error> {
    // 1
    let mut state = NormalizationState {
        blank_node_to_quads: Map::new(),
        hash_to_blank_nodes: Map::new(),
        canonical_issuer: IdentifierIssuer::new(CANONICAL_PREFIX),
        first_degree_hashes: HashMap::new(),
        options: *options,
        hash_n_degree_calls: 0,
    };
    // 2
    for quad in dataset.statements() {
        // 2.1
        for blank_node_identifier in quad.blank_node_components() {
            let quads = state
                .blank_node_to_quads
                .entry(blank_node_identifier.0.as_str())
                .or_default();
            if !quads.iter().any(|q| std::ptr::eq(*q, quad)) {
                quads.push(quad);
            }
        }
    }
    log::trace!(
        "canonicalizing {} statements with {} blank nodes",
        dataset.len(),
        state.blank_node_to_quads.len()
    );
    // 3
    let identifiers: Vec<&str> = state.blank_node_to_quads.keys().copied().collect();
    for identifier in identifiers {
        // 3.1
        let hash = state.hash_first_degree_quads(identifier);
        // 3.2
        state
            .hash_to_blank_nodes
            .entry(hash)
            .or_default()
            .push(identifier);
    }
    // 4
    // First degree hashes never depend on issued identifiers, so a single pass over the
    // hashes in code point order assigns every uniquely hashed blank node.
    let mut tied_groups = Vec::new();
    for identifier_list in state.hash_to_blank_nodes.values() {
        // 4.1
        match identifier_list.as_slice() {
            [identifier] => {
                // 4.2
                state.canonical_issuer.issue_identifier(identifier);
            }
            _ => tied_groups.push(identifier_list.clone()),
        }
    }
    log::trace!("{} groups of blank nodes need n-degree hashing", tied_groups.len());
    // 5
    for identifier_list in tied_groups {
        // 5.1
        let mut hash_path_list: Vec<HashNDegreeQuadsOutput> = Vec::new();
        // 5.2
        for identifier in identifier_list {
            // 5.2.1
            if state
                .canonical_issuer
                .find_issued_identifier(identifier)
                .is_some()
            {
                continue;
            }
            // 5.2.2
            let mut temporary_issuer = IdentifierIssuer::new(TEMPORARY_PREFIX);
            // 5.2.3
            temporary_issuer.issue_identifier(identifier);
            // 5.2.4
            hash_path_list.push(state.hash_n_degree_quads(identifier, &temporary_issuer)?);
        }
        // 5.3
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            // 5.3.1
            for (_, existing_identifier) in &result.issuer.issued_identifiers_list {
                state.canonical_issuer.issue_identifier(existing_identifier);
            }
        }
    }
    // 6
    let mut normalized = DataSet::new();
    for quad in dataset.statements() {
        let mut quad_copy = quad.clone();
        for label in quad_copy.blank_node_components_mut() {
            let canonical_identifier = state
                .canonical_issuer
                .find_issued_identifier(&label.0)
                .ok_or_else(|| {
                    Error::CanonicalizationFailed(format!(
                        "No canonical identifier issued for {}",
                        label.0
                    ))
                })?;
            *label = BlankNodeLabel(canonical_identifier.to_string());
        }
        normalized.add_statement(quad_copy);
    }
    Ok(normalized)
}
