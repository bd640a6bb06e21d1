//! Linked-data documents and their expansion into RDF statements.
//!
//! Only the part of JSON-LD that credential documents use is supported: a context made of
//! `@base` and prefix to IRI entries, compact `prefix:term` keys, `@id`, `@type`, value
//! objects, `@list`, and nested node objects. Remote contexts, `@vocab` and term
//! definitions are rejected rather than guessed at.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use serde_json::{Map, Number, Value as JsonValue};
use url::Url;

use crate::error::Error;
use crate::rdf::{
    BlankNodeLabel, DataSet, IRIRef, Literal, Object, Statement, Subject, RDF_FIRST, RDF_NIL,
    RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER,
};

pub const AT_BASE: &str = "@base";
pub const AT_CONTEXT: &str = "@context";
pub const AT_GRAPH: &str = "@graph";
pub const AT_ID: &str = "@id";
pub const AT_INCLUDED: &str = "@included";
pub const AT_INDEX: &str = "@index";
pub const AT_LANGUAGE: &str = "@language";
pub const AT_LIST: &str = "@list";
pub const AT_NEST: &str = "@nest";
pub const AT_REVERSE: &str = "@reverse";
pub const AT_SET: &str = "@set";
pub const AT_TYPE: &str = "@type";
pub const AT_VALUE: &str = "@value";
pub const AT_VERSION: &str = "@version";
pub const AT_VOCAB: &str = "@vocab";

pub fn is_keyword(string: &str) -> bool {
    matches!(
        string,
        AT_BASE
            | AT_CONTEXT
            | AT_GRAPH
            | AT_ID
            | AT_INCLUDED
            | AT_INDEX
            | AT_LANGUAGE
            | AT_LIST
            | AT_NEST
            | AT_REVERSE
            | AT_SET
            | AT_TYPE
            | AT_VALUE
            | AT_VERSION
            | AT_VOCAB
    )
}

/// Schemes accepted as absolute IRIs without a `//` authority part.
///
/// Anything else of the form `a:b` is read as a compact IRI, so that a missing prefix
/// declaration is reported instead of silently producing an IRI with a bogus scheme.
const OPAQUE_IRI_SCHEMES: &[&str] = &["urn", "did", "mailto", "tag", "data"];

/// Whether `string` is an absolute IRI usable as-is in a statement.
pub fn is_iri(string: &str) -> bool {
    if string
        .chars()
        .any(|c| matches!(c, '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
    {
        return false;
    }
    let (scheme, rest) = match string.split_once(':') {
        Some(parts) => parts,
        None => return false,
    };
    if !(rest.starts_with("//") || OPAQUE_IRI_SCHEMES.contains(&scheme)) {
        return false;
    }
    Url::parse(string).is_ok()
}

/// Document-level mapping from namespace prefixes to IRIs, plus an optional base IRI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub base: Option<String>,
    prefixes: Vec<(String, String)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.insert(prefix, iri);
        self
    }

    /// Declare a prefix, replacing any previous declaration in place.
    pub fn insert(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        let prefix = prefix.into();
        let iri = iri.into();
        match self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = iri,
            None => self.prefixes.push((prefix, iri)),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, iri)| iri.as_str())
    }

    /// Declared prefixes in declaration order.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, iri)| (p.as_str(), iri.as_str()))
    }

    /// `local` layered over `self`: local declarations win.
    pub fn merge(&self, local: &Context) -> Context {
        let mut merged = self.clone();
        if local.base.is_some() {
            merged.base = local.base.clone();
        }
        for (prefix, iri) in local.prefixes() {
            merged.insert(prefix, iri);
        }
        merged
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        if let Some(base) = &self.base {
            map.insert(AT_BASE.to_string(), JsonValue::String(base.clone()));
        }
        for (prefix, iri) in self.prefixes() {
            map.insert(prefix.to_string(), JsonValue::String(iri.to_string()));
        }
        JsonValue::Object(map)
    }

    fn add_json_definitions(&mut self, value: &JsonValue) -> Result<(), Error> {
        match value {
            JsonValue::Object(map) => {
                for (key, definition) in map {
                    match (key.as_str(), definition) {
                        (AT_BASE, JsonValue::String(base)) => self.base = Some(base.clone()),
                        (AT_BASE, JsonValue::Null) => self.base = None,
                        (AT_VERSION, _) => {}
                        (AT_VOCAB, _) => {
                            return Err(Error::unexpandable("@vocab is not supported"))
                        }
                        (key, _) if is_keyword(key) => {
                            return Err(Error::unexpandable(format!(
                                "Unsupported context keyword {key}"
                            )))
                        }
                        (prefix, JsonValue::String(iri)) => self.insert(prefix, iri.as_str()),
                        (prefix, JsonValue::Object(term)) => match term.get(AT_ID) {
                            Some(JsonValue::String(iri)) if term.len() == 1 => {
                                self.insert(prefix, iri.as_str())
                            }
                            _ => {
                                return Err(Error::unexpandable(format!(
                                    "Unsupported term definition for {prefix}"
                                )))
                            }
                        },
                        (prefix, _) => {
                            return Err(Error::unexpandable(format!(
                                "Invalid namespace declaration for {prefix}"
                            )))
                        }
                    }
                }
                Ok(())
            }
            JsonValue::Array(contexts) => {
                for context in contexts {
                    self.add_json_definitions(context)?;
                }
                Ok(())
            }
            JsonValue::String(url) => Err(Error::unexpandable(format!(
                "Remote context {url} cannot be resolved"
            ))),
            _ => Err(Error::unexpandable("Invalid @context")),
        }
    }
}

impl TryFrom<&JsonValue> for Context {
    type Error = Error;
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        let mut context = Context::new();
        context.add_json_definitions(value)?;
        Ok(context)
    }
}

/// A value reachable from a node property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Number(Number),
    Boolean(bool),
    /// `{"@value": ..., "@type": ...}`
    Typed { value: String, datatype: String },
    /// `{"@value": ..., "@language": ...}`
    LangString { value: String, language: String },
    /// `{"@id": ...}`
    Reference(String),
    Node(Node),
    /// JSON array: an unordered set of values.
    Array(Vec<Value>),
    /// `{"@list": [...]}`: an ordered RDF collection.
    List(Vec<Value>),
}

/// Node object of a linked-data document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub context: Option<Context>,
    pub id: Option<String>,
    pub types: Vec<String>,
    properties: Vec<(String, Value)>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.types.push(type_.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a property, replacing a previous value for the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(index).1)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        if let Some(context) = &self.context {
            map.insert(AT_CONTEXT.to_string(), context.to_json());
        }
        self.write_json(&mut map);
        JsonValue::Object(map)
    }

    fn write_json(&self, map: &mut Map<String, JsonValue>) {
        if let Some(id) = &self.id {
            map.insert(AT_ID.to_string(), JsonValue::String(id.clone()));
        }
        match self.types.as_slice() {
            [] => {}
            [type_] => {
                map.insert(AT_TYPE.to_string(), JsonValue::String(type_.clone()));
            }
            types => {
                map.insert(
                    AT_TYPE.to_string(),
                    types.iter().cloned().map(JsonValue::String).collect(),
                );
            }
        }
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.to_json());
        }
    }
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Typed { value, datatype } => {
                let mut map = Map::new();
                map.insert(AT_VALUE.to_string(), JsonValue::String(value.clone()));
                map.insert(AT_TYPE.to_string(), JsonValue::String(datatype.clone()));
                JsonValue::Object(map)
            }
            Value::LangString { value, language } => {
                let mut map = Map::new();
                map.insert(AT_VALUE.to_string(), JsonValue::String(value.clone()));
                map.insert(AT_LANGUAGE.to_string(), JsonValue::String(language.clone()));
                JsonValue::Object(map)
            }
            Value::Reference(id) => {
                let mut map = Map::new();
                map.insert(AT_ID.to_string(), JsonValue::String(id.clone()));
                JsonValue::Object(map)
            }
            Value::Node(node) => node.to_json(),
            Value::Array(values) => values.iter().map(Value::to_json).collect(),
            Value::List(values) => {
                let mut map = Map::new();
                map.insert(
                    AT_LIST.to_string(),
                    values.iter().map(Value::to_json).collect(),
                );
                JsonValue::Object(map)
            }
        }
    }
}

fn expect_string<'a>(value: &'a JsonValue, keyword: &str) -> Result<&'a str, Error> {
    value
        .as_str()
        .ok_or_else(|| Error::unexpandable(format!("{keyword} must be a string")))
}

fn value_object(map: &Map<String, JsonValue>) -> Result<Value, Error> {
    let value = map.get(AT_VALUE).unwrap_or(&JsonValue::Null);
    for key in map.keys() {
        if !matches!(key.as_str(), AT_VALUE | AT_TYPE | AT_LANGUAGE | AT_INDEX) {
            return Err(Error::unexpandable(format!(
                "Unexpected {key} in value object"
            )));
        }
    }
    match (map.get(AT_TYPE), map.get(AT_LANGUAGE)) {
        (Some(_), Some(_)) => Err(Error::unexpandable(
            "Value object cannot carry both @type and @language",
        )),
        (Some(datatype), None) => {
            let datatype = expect_string(datatype, AT_TYPE)?.to_string();
            let value = match value {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                _ => return Err(Error::unexpandable("Invalid typed @value")),
            };
            Ok(Value::Typed { value, datatype })
        }
        (None, Some(language)) => Ok(Value::LangString {
            value: expect_string(value, AT_VALUE)?.to_string(),
            language: expect_string(language, AT_LANGUAGE)?.to_string(),
        }),
        (None, None) => match value {
            JsonValue::Object(_) | JsonValue::Array(_) => {
                Err(Error::unexpandable("Invalid @value"))
            }
            value => Value::try_from(value),
        },
    }
}

impl TryFrom<&JsonValue> for Value {
    type Error = Error;
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        Ok(match value {
            JsonValue::Null => Value::Null,
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Array(values) => Value::Array(
                values
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(map) if map.contains_key(AT_VALUE) => value_object(map)?,
            JsonValue::Object(map) if map.contains_key(AT_LIST) => {
                if map.len() != 1 {
                    return Err(Error::unexpandable("@list object cannot carry other keys"));
                }
                match Value::try_from(&map[AT_LIST])? {
                    Value::Array(items) => Value::List(items),
                    item => Value::List(vec![item]),
                }
            }
            JsonValue::Object(map) if map.len() == 1 && map.contains_key(AT_ID) => {
                Value::Reference(expect_string(&map[AT_ID], AT_ID)?.to_string())
            }
            JsonValue::Object(_) => Value::Node(Node::try_from(value)?),
        })
    }
}

impl TryFrom<&JsonValue> for Node {
    type Error = Error;
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::unexpandable("Node must be a JSON object"))?;
        let mut node = Node::new();
        for (key, value) in map {
            match key.as_str() {
                AT_CONTEXT => node.context = Some(Context::try_from(value)?),
                AT_ID => node.id = Some(expect_string(value, AT_ID)?.to_string()),
                AT_TYPE => match value {
                    JsonValue::String(t) => node.types.push(t.clone()),
                    JsonValue::Array(types) => {
                        for t in types {
                            node.types.push(expect_string(t, AT_TYPE)?.to_string());
                        }
                    }
                    _ => return Err(Error::unexpandable("@type must be a string or array")),
                },
                key if is_keyword(key) => {
                    return Err(Error::unexpandable(format!(
                        "Unsupported keyword {key} in node object"
                    )))
                }
                key => node.insert(key, Value::try_from(value)?),
            }
        }
        Ok(node)
    }
}

/// A linked-data document: a context and a root node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedDataDocument {
    pub context: Context,
    pub root: Node,
}

impl LinkedDataDocument {
    pub fn new(context: Context, root: Node) -> Self {
        Self { context, root }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert(AT_CONTEXT.to_string(), self.context.to_json());
        self.root.write_json(&mut map);
        JsonValue::Object(map)
    }

    /// Expand the document into a dataset.
    ///
    /// Nodes without `@id` become blank nodes labelled `_:b0`, `_:b1`, ... in document order.
    pub fn to_dataset(&self) -> Result<DataSet, Error> {
        let mut expander = Expander::default();
        expander.expand_node(&self.root, &self.context)?;
        log::trace!(
            "expanded document into {} statements",
            expander.dataset.len()
        );
        Ok(expander.dataset)
    }
}

impl TryFrom<&JsonValue> for LinkedDataDocument {
    type Error = Error;
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        let mut root = Node::try_from(value)?;
        let context = root.context.take().unwrap_or_default();
        Ok(Self { context, root })
    }
}

impl FromStr for LinkedDataDocument {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: JsonValue = serde_json::from_str(s)?;
        Self::try_from(&value)
    }
}

impl serde::Serialize for LinkedDataDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Default)]
struct Expander {
    dataset: DataSet,
    blank_node_counter: usize,
    // `_:` identifiers found in the document, relabelled to avoid clashing with fresh ones
    named_blank_nodes: HashMap<String, BlankNodeLabel>,
}

impl Expander {
    fn fresh_blank_node(&mut self) -> BlankNodeLabel {
        let label = BlankNodeLabel(format!("_:b{}", self.blank_node_counter));
        self.blank_node_counter += 1;
        label
    }

    fn named_blank_node(&mut self, id: &str) -> BlankNodeLabel {
        if let Some(label) = self.named_blank_nodes.get(id) {
            return label.clone();
        }
        let label = self.fresh_blank_node();
        self.named_blank_nodes.insert(id.to_string(), label.clone());
        label
    }

    fn node_reference(&mut self, id: &str, context: &Context) -> Result<Subject, Error> {
        if id.starts_with("_:") {
            return Ok(Subject::BlankNodeLabel(self.named_blank_node(id)));
        }
        Ok(Subject::IRIRef(IRIRef(expand_iri(id, context)?)))
    }

    fn expand_node(&mut self, node: &Node, context: &Context) -> Result<Subject, Error> {
        let context = match &node.context {
            Some(local) => Cow::Owned(context.merge(local)),
            None => Cow::Borrowed(context),
        };
        let subject = match &node.id {
            Some(id) => self.node_reference(id, &context)?,
            None => Subject::BlankNodeLabel(self.fresh_blank_node()),
        };
        for type_ in &node.types {
            let type_iri = expand_iri(type_, &context)?;
            self.dataset.add_statement(Statement::new(
                subject.clone(),
                RDF_TYPE,
                Object::IRIRef(IRIRef(type_iri)),
            ));
        }
        for (key, value) in node.properties() {
            let predicate = expand_term(key, &context)?;
            self.expand_property(&subject, &predicate, value, &context)?;
        }
        Ok(subject)
    }

    fn expand_property(
        &mut self,
        subject: &Subject,
        predicate: &str,
        value: &Value,
        context: &Context,
    ) -> Result<(), Error> {
        match value {
            Value::Array(values) => {
                for value in values {
                    self.expand_property(subject, predicate, value, context)?;
                }
            }
            Value::List(values) => {
                let head = self.expand_list(values, context)?;
                self.dataset
                    .add_statement(Statement::new(subject.clone(), predicate, head));
            }
            value => {
                if let Some(object) = self.expand_object(value, context)? {
                    self.dataset
                        .add_statement(Statement::new(subject.clone(), predicate, object));
                }
            }
        }
        Ok(())
    }

    fn expand_list(&mut self, values: &[Value], context: &Context) -> Result<Object, Error> {
        let mut objects = Vec::with_capacity(values.len());
        for value in values {
            if let Value::Array(_) | Value::List(_) = value {
                return Err(Error::unexpandable("Nested lists are not supported"));
            }
            if let Some(object) = self.expand_object(value, context)? {
                objects.push(object);
            }
        }
        let labels: Vec<BlankNodeLabel> = objects.iter().map(|_| self.fresh_blank_node()).collect();
        for (i, object) in objects.into_iter().enumerate() {
            let cell = Subject::BlankNodeLabel(labels[i].clone());
            self.dataset
                .add_statement(Statement::new(cell.clone(), RDF_FIRST, object));
            let rest = match labels.get(i + 1) {
                Some(next) => Object::BlankNodeLabel(next.clone()),
                None => Object::IRIRef(IRIRef(RDF_NIL.to_string())),
            };
            self.dataset
                .add_statement(Statement::new(cell, RDF_REST, rest));
        }
        Ok(match labels.into_iter().next() {
            Some(head) => Object::BlankNodeLabel(head),
            None => Object::IRIRef(IRIRef(RDF_NIL.to_string())),
        })
    }

    fn expand_object(&mut self, value: &Value, context: &Context) -> Result<Option<Object>, Error> {
        let object = match value {
            Value::Null => return Ok(None),
            Value::String(s) => Object::Literal(Literal::string(s.as_str())),
            Value::Number(n) => Object::Literal(number_literal(n)?),
            Value::Boolean(b) => Object::Literal(Literal::typed(b.to_string(), XSD_BOOLEAN)),
            Value::Typed { value, datatype } => {
                Object::Literal(Literal::typed(value.as_str(), expand_iri(datatype, context)?))
            }
            Value::LangString { value, language } => {
                Object::Literal(Literal::lang_tagged(value.as_str(), language.as_str()))
            }
            Value::Reference(id) => match self.node_reference(id, context)? {
                Subject::IRIRef(iri) => Object::IRIRef(iri),
                Subject::BlankNodeLabel(label) => Object::BlankNodeLabel(label),
            },
            Value::Node(node) => match self.expand_node(node, context)? {
                Subject::IRIRef(iri) => Object::IRIRef(iri),
                Subject::BlankNodeLabel(label) => Object::BlankNodeLabel(label),
            },
            Value::Array(_) | Value::List(_) => {
                return Err(Error::unexpandable("Unexpected nested array"))
            }
        };
        Ok(Some(object))
    }
}

/// Expand a compact property key to an absolute IRI.
pub(crate) fn expand_term(key: &str, context: &Context) -> Result<String, Error> {
    if is_keyword(key) || key.starts_with('@') {
        return Err(Error::unexpandable(format!(
            "Keyword {key} cannot be used as a property"
        )));
    }
    match key.split_once(':') {
        Some(("_", _)) => Err(Error::unexpandable(format!(
            "Blank node {key} cannot be used as a property"
        ))),
        Some(_) => expand_iri(key, context),
        None => Err(Error::unexpandable(format!(
            "Term {key} has no namespace prefix"
        ))),
    }
}

/// Expand an `@id`, `@type` or datatype value to an absolute IRI: compact IRIs through the
/// context prefixes, absolute IRIs as they are, anything else against `@base`.
fn expand_iri(value: &str, context: &Context) -> Result<String, Error> {
    if let Some((prefix, suffix)) = value.split_once(':') {
        if !suffix.starts_with("//") {
            if let Some(namespace) = context.get(prefix) {
                let iri = format!("{namespace}{suffix}");
                if !is_iri(&iri) {
                    return Err(Error::unexpandable(format!(
                        "Prefix {prefix} does not expand {value} to an absolute IRI"
                    )));
                }
                return Ok(iri);
            }
        }
        if is_iri(value) {
            return Ok(value.to_string());
        }
        if !suffix.starts_with("//") && !prefix.contains(['/', '?', '#']) {
            return Err(Error::unexpandable(format!(
                "No namespace declared for prefix {prefix} in {value}"
            )));
        }
    }
    let base = context.base.as_deref().ok_or_else(|| {
        Error::unexpandable(format!("Relative IRI {value} without @base"))
    })?;
    let base = Url::parse(base)
        .map_err(|e| Error::unexpandable(format!("Invalid @base {base}: {e}")))?;
    let resolved = base
        .join(value)
        .map_err(|e| Error::unexpandable(format!("Unable to resolve {value}: {e}")))?;
    Ok(resolved.to_string())
}

fn number_literal(number: &Number) -> Result<Literal, Error> {
    if let Some(i) = number.as_i64() {
        return Ok(Literal::typed(i.to_string(), XSD_INTEGER));
    }
    if let Some(u) = number.as_u64() {
        return Ok(Literal::typed(u.to_string(), XSD_INTEGER));
    }
    let f = number
        .as_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| Error::unexpandable(format!("Invalid number {number}")))?;
    if f.fract() == 0.0 && f.abs() < 1e21 {
        let integer = if f == 0.0 {
            "0".to_string()
        } else {
            format!("{f:.0}")
        };
        return Ok(Literal::typed(integer, XSD_INTEGER));
    }
    Ok(Literal::typed(canonical_double(f), XSD_DOUBLE))
}

/// Canonical `xsd:double` lexical form, e.g. `1.5E0`, `1.0E-1`.
fn canonical_double(f: f64) -> String {
    let formatted = format!("{f:.15e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let mut mantissa = mantissa.trim_end_matches('0').to_string();
    if mantissa.ends_with('.') {
        mantissa.push('0');
    }
    format!("{mantissa}E{exponent}")
}
