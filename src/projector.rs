//! Projection of typed credential objects into linked-data documents.
//!
//! A type taking part in a credential implements [`LinkedDataObject`]: it names its static
//! [`TypeDescriptor`] and pairs each of its [`Attribute`] constants with the current field
//! value. The [`Projector`] walks that table, enforces mandatory attributes, formats
//! identifiers through a [`FormatProvider`] and produces the document context from the
//! namespaces actually used.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Number;

use crate::error::Error;
use crate::jsonld::{is_iri, Context, LinkedDataDocument, Node, Value, AT_ID};
use crate::namespace::{Namespace, NamespaceRegistry};

/// Timestamp layout of projected date-time values.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Static description of a credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// `@type` values, compact or relative.
    pub types: &'static [&'static str],
    /// Whether a root document of this type declares `@base` in its context.
    pub add_base_context: bool,
}

/// Static description of one field of a credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub term: &'static str,
    pub namespace: Option<Namespace>,
    pub mandatory: bool,
    /// Name of the format template applied to the value.
    pub format: Option<&'static str>,
}

impl Attribute {
    /// The `@id` of the node.
    pub const fn id() -> Self {
        Self {
            term: AT_ID,
            namespace: None,
            mandatory: false,
            format: None,
        }
    }

    pub const fn new(namespace: Namespace, term: &'static str) -> Self {
        Self {
            term,
            namespace: Some(namespace),
            mandatory: false,
            format: None,
        }
    }

    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub const fn formatted(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    /// Document key: `prefix:term`, or the bare term for keywords.
    pub fn key(&self) -> String {
        match &self.namespace {
            Some(namespace) => namespace.compact(self.term),
            None => self.term.to_string(),
        }
    }

    pub fn is_id(&self) -> bool {
        self.namespace.is_none() && self.term == AT_ID
    }
}

/// Value of an attribute on a particular object.
#[derive(Clone)]
pub enum Field<'a> {
    Absent,
    Text(&'a str),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Object(&'a dyn LinkedDataObject),
    List(Vec<Field<'a>>),
    /// Several template arguments forming one identifier.
    Composite(Vec<&'a str>),
}

impl<'a> Field<'a> {
    pub fn texts(values: &'a [String]) -> Self {
        Field::List(values.iter().map(|v| Field::Text(v)).collect())
    }

    pub fn object<T: LinkedDataObject>(value: &'a T) -> Self {
        Field::Object(value)
    }

    pub fn objects<T: LinkedDataObject>(values: &'a [T]) -> Self {
        Field::List(values.iter().map(|v| Field::Object(v)).collect())
    }

    /// Absent values, and collections with nothing in them.
    pub fn is_empty(&self) -> bool {
        match self {
            Field::Absent => true,
            Field::List(items) => items.iter().all(Field::is_empty),
            Field::Composite(parts) => parts.is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Absent => write!(f, "Absent"),
            Field::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Field::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Field::Double(d) => f.debug_tuple("Double").field(d).finish(),
            Field::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Field::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Field::Object(o) => f.debug_tuple("Object").field(&o.type_descriptor().types).finish(),
            Field::List(items) => f.debug_tuple("List").field(items).finish(),
            Field::Composite(parts) => f.debug_tuple("Composite").field(parts).finish(),
        }
    }
}

impl<'a> From<&'a str> for Field<'a> {
    fn from(value: &'a str) -> Self {
        Field::Text(value)
    }
}

impl<'a> From<&'a String> for Field<'a> {
    fn from(value: &'a String) -> Self {
        Field::Text(value)
    }
}

impl From<i64> for Field<'_> {
    fn from(value: i64) -> Self {
        Field::Integer(value)
    }
}

impl From<f64> for Field<'_> {
    fn from(value: f64) -> Self {
        Field::Double(value)
    }
}

impl From<bool> for Field<'_> {
    fn from(value: bool) -> Self {
        Field::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Field<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Field::DateTime(value)
    }
}

impl<'a, T: Into<Field<'a>>> From<Option<T>> for Field<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Absent, Into::into)
    }
}

/// A typed object that can be projected into a linked-data node.
pub trait LinkedDataObject {
    fn type_descriptor(&self) -> &'static TypeDescriptor;

    /// Every attribute of the type with its value on this object, in document order.
    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)>;
}

/// Resolves format names to templates.
pub trait FormatProvider {
    fn get_format(&self, name: &str) -> Option<&str>;
}

/// Format provider backed by a map of templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultFormatProvider {
    formats: HashMap<String, String>,
}

impl DefaultFormatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template: `%s` marks a substitution point, `%%` a literal percent sign.
    pub fn set_format(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.formats.insert(name.into(), template.into());
    }

    pub fn with_format(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.set_format(name, template);
        self
    }
}

impl FormatProvider for DefaultFormatProvider {
    fn get_format(&self, name: &str) -> Option<&str> {
        self.formats.get(name).map(String::as_str)
    }
}

impl<P: FormatProvider + ?Sized> FormatProvider for &P {
    fn get_format(&self, name: &str) -> Option<&str> {
        (**self).get_format(name)
    }
}

/// Substitute `args` into a printf-style template.
pub fn apply_template(template: &str, args: &[&str]) -> Result<String, Error> {
    let invalid = |reason: String| Error::InvalidTemplate {
        template: template.to_string(),
        reason,
    };
    let mut output = String::with_capacity(template.len());
    let mut args_iter = args.iter();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => output.push('%'),
            Some('s') => match args_iter.next() {
                Some(arg) => output.push_str(arg),
                None => {
                    return Err(invalid(format!(
                        "more substitution points than the {} arguments supplied",
                        args.len()
                    )))
                }
            },
            Some(other) => return Err(invalid(format!("unsupported conversion %{other}"))),
            None => return Err(invalid("dangling %".to_string())),
        }
    }
    if args_iter.next().is_some() {
        return Err(invalid(format!(
            "fewer substitution points than the {} arguments supplied",
            args.len()
        )));
    }
    Ok(output)
}

/// Turns [`LinkedDataObject`]s into [`LinkedDataDocument`]s.
#[derive(Debug, Clone)]
pub struct Projector<F = DefaultFormatProvider> {
    registry: NamespaceRegistry,
    formats: F,
    base_iri: Option<String>,
}

impl<F: FormatProvider> Projector<F> {
    pub fn new(registry: NamespaceRegistry, formats: F) -> Self {
        Self {
            registry,
            formats,
            base_iri: None,
        }
    }

    /// Base IRI declared as `@base` by types asking for it.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    pub fn formats(&self) -> &F {
        &self.formats
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref()
    }

    /// Project `object` into a document whose context declares exactly the namespaces used.
    pub fn project(&self, object: &dyn LinkedDataObject) -> Result<LinkedDataDocument, Error> {
        let mut used = BTreeSet::new();
        let root = self.project_node(object, &mut used)?;
        let mut context = Context::new();
        if object.type_descriptor().add_base_context {
            if let Some(base) = &self.base_iri {
                context.base = Some(base.clone());
            }
        }
        for (position, namespace) in self.registry.iter().enumerate() {
            if used.contains(&position) {
                context.insert(namespace.prefix, namespace.iri);
            }
        }
        Ok(LinkedDataDocument::new(context, root))
    }

    fn project_node(
        &self,
        object: &dyn LinkedDataObject,
        used: &mut BTreeSet<usize>,
    ) -> Result<Node, Error> {
        let mut node = Node::new();
        for type_ in object.type_descriptor().types {
            if let Some((prefix, _)) = type_.split_once(':') {
                match self.registry.position(prefix) {
                    Some(position) => {
                        used.insert(position);
                    }
                    None if is_iri(type_) => {}
                    None => {
                        return Err(Error::unexpandable(format!(
                            "Namespace {prefix} of type {type_} is not registered"
                        )))
                    }
                }
            }
            node.types.push(type_.to_string());
        }
        for (attribute, field) in object.attributes() {
            if field.is_empty() {
                if attribute.mandatory {
                    return Err(Error::MissingMandatoryField {
                        field: attribute.key(),
                    });
                }
                continue;
            }
            if attribute.is_id() {
                node.id = Some(match &field {
                    Field::Text(value) => self.format(attribute, &[*value])?,
                    Field::Composite(parts) => self.format(attribute, parts)?,
                    other => {
                        return Err(Error::unexpandable(format!(
                            "@id must be text, found {other:?}"
                        )))
                    }
                });
                continue;
            }
            if let Some(namespace) = &attribute.namespace {
                if !self.registry.contains(namespace) {
                    return Err(Error::unexpandable(format!(
                        "Namespace {} of {} is not registered",
                        namespace.prefix,
                        attribute.key()
                    )));
                }
                if let Some(position) = self.registry.position(namespace.prefix) {
                    used.insert(position);
                }
            }
            let value = self.project_value(attribute, &field, used)?;
            node.insert(attribute.key(), value);
        }
        log::trace!(
            "projected {:?} node with {} properties",
            object.type_descriptor().types,
            node.properties().count()
        );
        Ok(node)
    }

    fn project_value(
        &self,
        attribute: &Attribute,
        field: &Field<'_>,
        used: &mut BTreeSet<usize>,
    ) -> Result<Value, Error> {
        Ok(match field {
            Field::Absent => Value::Null,
            Field::Text(value) => Value::String(self.format(attribute, &[*value])?),
            Field::Composite(parts) => Value::String(self.format(attribute, parts)?),
            Field::Integer(i) => Value::Number(Number::from(*i)),
            Field::Double(d) => Value::Number(Number::from_f64(*d).ok_or_else(|| {
                Error::unexpandable(format!("{} is not a finite number", attribute.key()))
            })?),
            Field::Boolean(b) => Value::Boolean(*b),
            Field::DateTime(dt) => Value::String(dt.format(DATE_TIME_FORMAT).to_string()),
            Field::Object(object) => Value::Node(self.project_node(*object, used)?),
            Field::List(items) => Value::Array(
                items
                    .iter()
                    .filter(|item| !item.is_empty())
                    .map(|item| self.project_value(attribute, item, used))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn format(&self, attribute: &Attribute, args: &[&str]) -> Result<String, Error> {
        match attribute
            .format
            .and_then(|name| self.formats.get_format(name))
        {
            Some(template) => apply_template(template, args),
            None => Ok(args.join("/")),
        }
    }
}

impl Default for Projector<DefaultFormatProvider> {
    fn default() -> Self {
        Self::new(NamespaceRegistry::default(), DefaultFormatProvider::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{DAWEX, GAX_SERVICE, SERVICE_DESCRIPTION};
    use chrono::TimeZone;
    use serde_json::json;

    struct Shelf {
        id: String,
        label: Option<String>,
        capacity: i64,
        books: Vec<Book>,
    }

    struct Book {
        isbn: Vec<String>,
        title: String,
        weight: Option<f64>,
        published: DateTime<Utc>,
    }

    const SHELF: TypeDescriptor = TypeDescriptor {
        types: &["Shelf"],
        add_base_context: true,
    };
    const BOOK: TypeDescriptor = TypeDescriptor {
        types: &["gax-service:Book", "Book"],
        add_base_context: true,
    };

    const SHELF_ID: Attribute = Attribute::id().formatted("SHELF");
    const SHELF_LABEL: Attribute = Attribute::new(DAWEX, "label");
    const SHELF_CAPACITY: Attribute = Attribute::new(DAWEX, "capacity").mandatory();
    const SHELF_BOOKS: Attribute = Attribute::new(SERVICE_DESCRIPTION, "books");
    const BOOK_ID: Attribute = Attribute::id().formatted("BOOK");
    const BOOK_TITLE: Attribute = Attribute::new(DAWEX, "title").mandatory();
    const BOOK_WEIGHT: Attribute = Attribute::new(DAWEX, "weight");
    const BOOK_PUBLISHED: Attribute = Attribute::new(DAWEX, "published");

    impl LinkedDataObject for Shelf {
        fn type_descriptor(&self) -> &'static TypeDescriptor {
            &SHELF
        }

        fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
            vec![
                (&SHELF_ID, Field::from(&self.id)),
                (&SHELF_LABEL, Field::from(self.label.as_deref())),
                (&SHELF_CAPACITY, Field::from(self.capacity)),
                (&SHELF_BOOKS, Field::objects(&self.books)),
            ]
        }
    }

    impl LinkedDataObject for Book {
        fn type_descriptor(&self) -> &'static TypeDescriptor {
            &BOOK
        }

        fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
            vec![
                (
                    &BOOK_ID,
                    Field::Composite(self.isbn.iter().map(String::as_str).collect()),
                ),
                (&BOOK_TITLE, Field::from(&self.title)),
                (&BOOK_WEIGHT, Field::from(self.weight)),
                (&BOOK_PUBLISHED, Field::from(self.published)),
            ]
        }
    }

    fn shelf() -> Shelf {
        Shelf {
            id: "s1".to_string(),
            label: None,
            capacity: 12,
            books: vec![Book {
                isbn: vec!["978".to_string(), "0261102385".to_string()],
                title: "The Lord of the Rings".to_string(),
                weight: Some(1.5),
                published: Utc.with_ymd_and_hms(1954, 7, 29, 0, 0, 0).unwrap(),
            }],
        }
    }

    fn projector() -> Projector {
        let formats = DefaultFormatProvider::new()
            .with_format("SHELF", "./shelves/%s")
            .with_format("BOOK", "./books/%s-%s");
        Projector::new(NamespaceRegistry::default(), formats).with_base_iri("https://example.org")
    }

    #[test]
    fn project_nested_objects() {
        let document = projector().project(&shelf()).unwrap();
        assert_eq!(
            document.to_json(),
            json!({
                "@context": {
                    "@base": "https://example.org",
                    "dw": "https://dawex.com/schemas/dataoffering#",
                    "gax-service": "https://w3id.org/gaia-x/service#",
                    "sd": "https://www.w3.org/2018/credentials/v1"
                },
                "@id": "./shelves/s1",
                "@type": "Shelf",
                "dw:capacity": 12,
                "sd:books": [{
                    "@id": "./books/978-0261102385",
                    "@type": ["gax-service:Book", "Book"],
                    "dw:title": "The Lord of the Rings",
                    "dw:weight": 1.5,
                    "dw:published": "1954-07-29T00:00:00Z"
                }]
            })
        );
        // context declarations are in registry order
        let prefixes: Vec<&str> = document.context.prefixes().map(|(p, _)| p).collect();
        assert_eq!(prefixes, ["dw", "gax-service", "sd"]);
    }

    #[test]
    fn missing_mandatory_field() {
        let mut shelf = shelf();
        shelf.books[0].title.clear();
        // empty text is still a value
        assert!(projector().project(&shelf).is_ok());

        struct Untitled;
        const UNTITLED: TypeDescriptor = TypeDescriptor {
            types: &["Untitled"],
            add_base_context: false,
        };
        impl LinkedDataObject for Untitled {
            fn type_descriptor(&self) -> &'static TypeDescriptor {
                &UNTITLED
            }
            fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
                vec![
                    (&BOOK_TITLE, Field::from(None::<&str>)),
                    (&SHELF_BOOKS, Field::List(vec![])),
                ]
            }
        }
        let err = projector().project(&Untitled).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MissingMandatoryField);
        assert_eq!(err.to_string(), "Missing mandatory field: dw:title");
    }

    #[test]
    fn empty_mandatory_collection_is_missing() {
        struct Crate {
            items: Vec<String>,
        }
        const CRATE: TypeDescriptor = TypeDescriptor {
            types: &["Crate"],
            add_base_context: false,
        };
        const ITEMS: Attribute = Attribute::new(GAX_SERVICE, "items").mandatory();
        impl LinkedDataObject for Crate {
            fn type_descriptor(&self) -> &'static TypeDescriptor {
                &CRATE
            }
            fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
                vec![(&ITEMS, Field::texts(&self.items))]
            }
        }
        let err = projector().project(&Crate { items: vec![] }).unwrap_err();
        assert!(matches!(err, Error::MissingMandatoryField { field } if field == "gax-service:items"));

        let document = projector()
            .project(&Crate {
                items: vec!["b".to_string(), "a".to_string()],
            })
            .unwrap();
        // no @base: the type does not ask for it
        assert_eq!(
            document.to_json(),
            json!({
                "@context": {"gax-service": "https://w3id.org/gaia-x/service#"},
                "@type": "Crate",
                "gax-service:items": ["b", "a"]
            })
        );
    }

    #[test]
    fn unregistered_format_joins_arguments() {
        let projector: Projector = Projector::default();
        let document = projector.project(&shelf()).unwrap();
        assert_eq!(document.root.id.as_deref(), Some("s1"));
        assert!(document.context.base.is_none());
        match document.root.get("sd:books") {
            Some(Value::Array(books)) => match &books[0] {
                Value::Node(book) => assert_eq!(book.id.as_deref(), Some("978/0261102385")),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn template_arity_mismatch() {
        let formats = DefaultFormatProvider::new()
            .with_format("SHELF", "./shelves/%s")
            .with_format("BOOK", "./books/%s");
        let projector = Projector::new(NamespaceRegistry::default(), formats);
        assert!(matches!(
            projector.project(&shelf()),
            Err(Error::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn unregistered_namespace() {
        let registry = NamespaceRegistry::new([DAWEX, SERVICE_DESCRIPTION]);
        let projector = Projector::new(registry, DefaultFormatProvider::new());
        let err = projector.project(&shelf()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnexpandableDocument);
    }

    #[test]
    fn non_finite_double() {
        let mut shelf = shelf();
        shelf.books[0].weight = Some(f64::NAN);
        let err = projector().project(&shelf).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnexpandableDocument);
    }

    #[test]
    fn templates() {
        assert_eq!(
            apply_template("./organisations/%s/dataproducts/%s", &["o", "d"]).unwrap(),
            "./organisations/o/dataproducts/d"
        );
        assert_eq!(apply_template("100%% %s", &["sure"]).unwrap(), "100% sure");
        assert_eq!(apply_template("plain", &[]).unwrap(), "plain");
        assert!(apply_template("%s/%s", &["one"]).is_err());
        assert!(apply_template("%s", &["one", "two"]).is_err());
        assert!(apply_template("%d", &["1"]).is_err());
        assert!(apply_template("trailing %", &[]).is_err());
    }
}
