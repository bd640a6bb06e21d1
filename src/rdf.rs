use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::str::FromStr;

use crate::error::Error;

// https://www.w3.org/TR/rdf-canon/
// https://www.w3.org/TR/n-quads/#terminals

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const LANG_STRING_IRI_STR: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// <https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset>
///
/// Statements form a set: adding a statement already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    statements: Vec<Statement>,
}

/// <https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-triple>, optionally in a named graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Object,
    pub graph_label: Option<GraphLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Predicate {
    IRIRef(IRIRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Object {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphLabel {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IRIRef(pub String);

/// Blank node label including its `_:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNodeLabel(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    String {
        string: StringLiteral,
    },
    Typed {
        string: StringLiteral,
        type_: IRIRef,
    },
    LangTagged {
        string: StringLiteral,
        lang: Lang,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringLiteral(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lang(pub String);

/// Where a blank node occurs in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlankIdPosition {
    Subject,
    Object,
    Graph,
}

impl BlankIdPosition {
    pub fn into_char(self) -> char {
        match self {
            Self::Subject => 's',
            Self::Object => 'o',
            Self::Graph => 'g',
        }
    }
}

impl Literal {
    /// Plain (`xsd:string`) literal.
    pub fn string(string: impl Into<String>) -> Self {
        Literal::String {
            string: StringLiteral(string.into()),
        }
    }

    /// Typed literal. An `xsd:string` datatype collapses to a plain literal, since both
    /// serialize identically.
    pub fn typed(string: impl Into<String>, type_: impl Into<String>) -> Self {
        let type_ = type_.into();
        if type_ == XSD_STRING {
            return Self::string(string);
        }
        Literal::Typed {
            string: StringLiteral(string.into()),
            type_: IRIRef(type_),
        }
    }

    pub fn lang_tagged(string: impl Into<String>, lang: impl Into<String>) -> Self {
        Literal::LangTagged {
            string: StringLiteral(string.into()),
            lang: Lang(lang.into()),
        }
    }
}

impl Statement {
    pub fn new(subject: Subject, predicate: impl Into<String>, object: Object) -> Self {
        Self {
            subject,
            predicate: Predicate::IRIRef(IRIRef(predicate.into())),
            object,
            graph_label: None,
        }
    }

    pub fn blank_node_components(&self) -> Vec<&BlankNodeLabel> {
        self.blank_node_components_with_position()
            .into_iter()
            .map(|(label, _position)| label)
            .collect()
    }

    pub fn blank_node_components_with_position(&self) -> Vec<(&BlankNodeLabel, BlankIdPosition)> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(label) = &self.subject {
            labels.push((label, BlankIdPosition::Subject));
        }
        if let Object::BlankNodeLabel(label) = &self.object {
            labels.push((label, BlankIdPosition::Object));
        }
        if let Some(GraphLabel::BlankNodeLabel(label)) = &self.graph_label {
            labels.push((label, BlankIdPosition::Graph));
        }
        labels
    }

    pub fn blank_node_components_mut(&mut self) -> Vec<&mut BlankNodeLabel> {
        let mut labels: Vec<&mut BlankNodeLabel> = Vec::new();
        if let Subject::BlankNodeLabel(label) = &mut self.subject {
            labels.push(label);
        }
        if let Object::BlankNodeLabel(label) = &mut self.object {
            labels.push(label);
        }
        if let Some(GraphLabel::BlankNodeLabel(label)) = &mut self.graph_label {
            labels.push(label);
        }
        labels
    }
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_statement(&mut self, statement: Statement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Sorted N-Quads lines, without line terminators.
    pub fn to_nquads_vec(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        lines.sort();
        lines.dedup();
        lines
    }

    /// N-Quads document: sorted lines, each terminated by `\n`.
    pub fn to_nquads(&self) -> String {
        self.to_nquads_vec()
            .into_iter()
            .map(|line| line + "\n")
            .collect()
    }
}

impl FromIterator<Statement> for DataSet {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut dataset = DataSet::new();
        for statement in iter {
            dataset.add_statement(statement);
        }
        dataset
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph_label) = &self.graph_label {
            write!(f, " {graph_label}")?;
        }
        f.write_str(" .")
    }
}

/// N-Quads line including its `\n` terminator.
impl From<&Statement> for String {
    fn from(statement: &Statement) -> String {
        format!("{statement}\n")
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IRIRef(iri) => iri.fmt(f),
            Self::BlankNodeLabel(label) => label.fmt(f),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IRIRef(iri) => iri.fmt(f),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IRIRef(iri) => iri.fmt(f),
            Self::BlankNodeLabel(label) => label.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IRIRef(iri) => iri.fmt(f),
            Self::BlankNodeLabel(label) => label.fmt(f),
        }
    }
}

impl fmt::Display for IRIRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(self.0.len() + 2);
        out.push('<');
        for c in self.0.chars() {
            match c {
                '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                    out.push_str(&format!("\\u{:04X}", u32::from(c)))
                }
                _ => out.push(c),
            }
        }
        out.push('>');
        f.write_str(&out)
    }
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // estimate size of escaped string
        let mut out = String::with_capacity(self.0.len() + 6);
        out.push('"');
        for c in self.0.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        f.write_str(&out)
    }
}

impl fmt::Display for BlankNodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Escaping not needed: labels are generated, never taken from documents
        f.write_str(&self.0)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String { string } => string.fmt(f),
            Self::Typed { string, type_ } if type_.0 == XSD_STRING => string.fmt(f),
            Self::Typed { string, type_ } => write!(f, "{string}^^{type_}"),
            Self::LangTagged { string, lang } => write!(f, "{string}@{lang}"),
        }
    }
}

fn parse_error(expected: &str) -> Error {
    Error::unexpandable(format!("Expected {expected} in N-Quads statement"))
}

fn parse_uchar(chars: &mut Peekable<Chars>, len: usize) -> Result<char, Error> {
    let escaped: String = chars.take(len).collect();
    u32::from_str_radix(&escaped, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| parse_error("unicode escape"))
}

fn parse_iri_ref(chars: &mut Peekable<Chars>) -> Result<IRIRef, Error> {
    let mut out = String::new();
    if chars.next() != Some('<') {
        return Err(parse_error("IRI reference"));
    }
    while let Some(c) = chars.next() {
        match c {
            '>' => return Ok(IRIRef(out)),
            '\\' => {
                let c = match chars.next() {
                    Some('u') => parse_uchar(chars, 4)?,
                    Some('U') => parse_uchar(chars, 8)?,
                    _ => return Err(parse_error("IRI reference")),
                };
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Err(parse_error("IRI reference"))
}

fn parse_string_literal_quote(chars: &mut Peekable<Chars>) -> Result<StringLiteral, Error> {
    let mut string = String::new();
    if chars.next() != Some('"') {
        return Err(parse_error("literal"));
    }
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(StringLiteral(string)),
            '\\' => {
                let c = match chars.next() {
                    Some('u') => parse_uchar(chars, 4)?,
                    Some('U') => parse_uchar(chars, 8)?,
                    Some('t') => '\t',
                    Some('b') => '\x08',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('f') => '\x0c',
                    Some('"') => '"',
                    Some('\'') => '\'',
                    Some('\\') => '\\',
                    _ => return Err(parse_error("literal")),
                };
                string.push(c);
            }
            _ => string.push(c),
        }
    }
    Err(parse_error("literal"))
}

fn parse_lang(chars: &mut Peekable<Chars>) -> Result<Lang, Error> {
    let mut lang = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' {
            lang.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if lang.is_empty() || lang.starts_with('-') || lang.ends_with('-') {
        return Err(parse_error("language tag"));
    }
    Ok(Lang(lang))
}

fn parse_literal(chars: &mut Peekable<Chars>) -> Result<Literal, Error> {
    let string = parse_string_literal_quote(chars)?;
    match chars.peek() {
        Some(' ') | Some('\t') | None => Ok(Literal::String { string }),
        Some('^') => {
            chars.next();
            if chars.next() != Some('^') {
                return Err(parse_error("datatype"));
            }
            let type_ = parse_iri_ref(chars)?;
            Ok(Literal::typed(string.0, type_.0))
        }
        Some('@') => {
            chars.next();
            let lang = parse_lang(chars)?;
            Ok(Literal::LangTagged { string, lang })
        }
        _ => Err(parse_error("literal")),
    }
}

fn parse_blank_node_label(chars: &mut Peekable<Chars>) -> Result<BlankNodeLabel, Error> {
    if chars.next() != Some('_') || chars.next() != Some(':') {
        return Err(parse_error("blank node label"));
    }
    let mut out = String::from("_:");
    while let Some(&c) = chars.peek() {
        if c == ' ' || c == '\t' {
            break;
        }
        out.push(c);
        chars.next();
    }
    if out.len() == 2 {
        return Err(parse_error("blank node label"));
    }
    Ok(BlankNodeLabel(out))
}

fn parse_subject(chars: &mut Peekable<Chars>) -> Result<Subject, Error> {
    match chars.peek() {
        Some('<') => Ok(Subject::IRIRef(parse_iri_ref(chars)?)),
        Some('_') => Ok(Subject::BlankNodeLabel(parse_blank_node_label(chars)?)),
        _ => Err(parse_error("subject")),
    }
}

fn parse_object(chars: &mut Peekable<Chars>) -> Result<Object, Error> {
    match chars.peek() {
        Some('"') => Ok(Object::Literal(parse_literal(chars)?)),
        Some('<') => Ok(Object::IRIRef(parse_iri_ref(chars)?)),
        Some('_') => Ok(Object::BlankNodeLabel(parse_blank_node_label(chars)?)),
        _ => Err(parse_error("object")),
    }
}

fn parse_graph_label(chars: &mut Peekable<Chars>) -> Result<Option<GraphLabel>, Error> {
    match chars.peek() {
        Some('<') => Ok(Some(GraphLabel::IRIRef(parse_iri_ref(chars)?))),
        Some('_') => Ok(Some(GraphLabel::BlankNodeLabel(parse_blank_node_label(
            chars,
        )?))),
        Some(_) => Err(parse_error("graph label")),
        None => Ok(None),
    }
}

fn ignore_whitespace(chars: &mut Peekable<Chars>) {
    while let Some(c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            _ => break,
        }
    }
}

impl FromStr for Statement {
    type Err = Error;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end();
        let body = line
            .strip_suffix('.')
            .ok_or_else(|| parse_error("terminating '.'"))?
            .trim_end();
        let mut chars = body.chars().peekable();
        let subject = parse_subject(&mut chars)?;
        ignore_whitespace(&mut chars);
        let predicate = Predicate::IRIRef(parse_iri_ref(&mut chars)?);
        ignore_whitespace(&mut chars);
        let object = parse_object(&mut chars)?;
        ignore_whitespace(&mut chars);
        let graph_label = parse_graph_label(&mut chars)?;
        ignore_whitespace(&mut chars);
        if chars.next().is_some() {
            return Err(parse_error("end of statement"));
        }
        Ok(Self {
            subject,
            predicate,
            object,
            graph_label,
        })
    }
}

/// Parses an N-Quads document; blank lines are skipped.
impl FromStr for DataSet {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.lines()
            .filter(|line| !line.trim().is_empty())
            .map(Statement::from_str)
            .collect()
    }
}
