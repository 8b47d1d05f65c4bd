//! Declarations of record shapes and closed variant domains.
//!
//! A `Schema` is the static half of the variant model: it says which record
//! shapes exist, what kind each field has, and which shapes make up each
//! closed domain. Patterns are checked against it before any value is
//! evaluated.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;
use crate::value::{Shaped, Value};

// ──────────────────────────────────────────────
// Field kinds and record declarations
// ──────────────────────────────────────────────

/// Declared kind of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Decimal,
    Text,
    /// A nested record of exactly this shape.
    Record(String),
    List(Box<FieldKind>),
    /// Any member of the named closed domain.
    Variant(String),
}

impl FieldKind {
    pub fn list(element: FieldKind) -> FieldKind {
        FieldKind::List(Box::new(element))
    }

    /// Whether a literal value can ever be equal to a value of this kind.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Int, Value::Int(_))
            | (FieldKind::Decimal, Value::Decimal(_))
            | (FieldKind::Text, Value::Text(_)) => true,
            (FieldKind::Record(shape), Value::Record { shape: s, .. }) => shape == s,
            (FieldKind::List(elem), Value::List(items)) => items.iter().all(|i| elem.admits(i)),
            // Domain membership is checked separately; any record may be a member.
            (FieldKind::Variant(_), Value::Record { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => write!(f, "Bool"),
            FieldKind::Int => write!(f, "Int"),
            FieldKind::Decimal => write!(f, "Decimal"),
            FieldKind::Text => write!(f, "Text"),
            FieldKind::Record(shape) => write!(f, "{}", shape),
            FieldKind::List(elem) => write!(f, "List<{}>", elem),
            FieldKind::Variant(domain) => write!(f, "one of {}", domain),
        }
    }
}

/// A record shape: its name and the kind of each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
    pub shape: String,
    pub fields: BTreeMap<String, FieldKind>,
}

impl RecordDecl {
    pub fn new(shape: impl Into<String>) -> Self {
        RecordDecl {
            shape: shape.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }
}

// ──────────────────────────────────────────────
// Closed variant domains
// ──────────────────────────────────────────────

/// One member of a closed domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Member {
    Shape(String),
    Absent,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Shape(shape) => write!(f, "{}", shape),
            Member::Absent => write!(f, "Absent"),
        }
    }
}

/// A closed set of record shapes, optionally including the absent marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDomain {
    pub name: String,
    pub shapes: Vec<String>,
    pub allows_absent: bool,
}

impl VariantDomain {
    pub fn new(name: impl Into<String>) -> Self {
        VariantDomain {
            name: name.into(),
            shapes: Vec::new(),
            allows_absent: false,
        }
    }

    pub fn member(mut self, shape: impl Into<String>) -> Self {
        self.shapes.push(shape.into());
        self
    }

    pub fn with_absent(mut self) -> Self {
        self.allows_absent = true;
        self
    }

    pub fn contains_shape(&self, shape: &str) -> bool {
        self.shapes.iter().any(|s| s == shape)
    }

    /// Every member in declaration order, the absent marker last.
    pub fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self.shapes.iter().cloned().map(Member::Shape).collect();
        if self.allows_absent {
            members.push(Member::Absent);
        }
        members
    }

    /// Members that are present values (everything except `Absent`).
    pub fn present_members(&self) -> Vec<Member> {
        self.shapes.iter().cloned().map(Member::Shape).collect()
    }
}

// ──────────────────────────────────────────────
// Schema
// ──────────────────────────────────────────────

/// The set of record shapes and domains a matcher is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    records: BTreeMap<String, RecordDecl>,
    domains: BTreeMap<String, VariantDomain>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Build a schema from the declarations of one closed variant type.
    pub fn for_variant<T: ClosedVariant>() -> Result<Schema, ConfigError> {
        let mut schema = Schema::new();
        T::declare(&mut schema)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Declare a record shape. Re-declaring an identical shape is a no-op,
    /// so domains that share records can each declare them.
    pub fn declare_record(&mut self, decl: RecordDecl) -> Result<(), ConfigError> {
        match self.records.get(&decl.shape) {
            Some(existing) if *existing == decl => Ok(()),
            Some(_) => Err(ConfigError::ConflictingDeclaration { name: decl.shape }),
            None => {
                self.records.insert(decl.shape.clone(), decl);
                Ok(())
            }
        }
    }

    pub fn declare_domain(&mut self, domain: VariantDomain) -> Result<(), ConfigError> {
        match self.domains.get(&domain.name) {
            Some(existing) if *existing == domain => Ok(()),
            Some(_) => Err(ConfigError::ConflictingDeclaration { name: domain.name }),
            None => {
                self.domains.insert(domain.name.clone(), domain);
                Ok(())
            }
        }
    }

    pub fn record(&self, shape: &str) -> Option<&RecordDecl> {
        self.records.get(shape)
    }

    pub fn domain(&self, name: &str) -> Option<&VariantDomain> {
        self.domains.get(name)
    }

    /// Check that every reference between declarations resolves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for decl in self.records.values() {
            for kind in decl.fields.values() {
                self.validate_kind(&decl.shape, kind)?;
            }
        }
        for domain in self.domains.values() {
            for shape in &domain.shapes {
                if !self.records.contains_key(shape) {
                    return Err(ConfigError::UndeclaredReference {
                        owner: domain.name.clone(),
                        target: shape.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_kind(&self, owner: &str, kind: &FieldKind) -> Result<(), ConfigError> {
        let missing = match kind {
            FieldKind::Record(shape) if !self.records.contains_key(shape) => Some(shape),
            FieldKind::Variant(domain) if !self.domains.contains_key(domain) => Some(domain),
            FieldKind::List(elem) => return self.validate_kind(owner, elem),
            _ => None,
        };
        match missing {
            Some(target) => Err(ConfigError::UndeclaredReference {
                owner: owner.to_string(),
                target: target.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ──────────────────────────────────────────────
// Value conformance
// ──────────────────────────────────────────────

/// Where and how a value departs from its declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonconformance {
    /// Dotted path from the top-level shape, e.g. `Directory.children[2].size`.
    pub path: String,
    pub message: String,
}

impl Nonconformance {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Nonconformance {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Nonconformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Schema {
    /// Check a record value against its declaration, recursively: every
    /// declared field present, no undeclared fields, each field of its
    /// declared kind. Integers are accepted where decimals are declared.
    pub fn conform(&self, value: &Value) -> Result<(), Nonconformance> {
        match value {
            Value::Record { shape, fields } => self.conform_fields(shape, fields, shape),
            other => Err(Nonconformance::new(
                "",
                format!("expected a record, got {}", other.type_name()),
            )),
        }
    }

    fn conform_kind(&self, value: &Value, kind: &FieldKind, path: &str) -> Result<(), Nonconformance> {
        match (kind, value) {
            (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Int, Value::Int(_))
            | (FieldKind::Decimal, Value::Decimal(_) | Value::Int(_))
            | (FieldKind::Text, Value::Text(_)) => Ok(()),
            (FieldKind::Record(expected), Value::Record { shape, fields }) => {
                if shape != expected {
                    return Err(Nonconformance::new(
                        path,
                        format!("expected {}, got {}", expected, shape),
                    ));
                }
                self.conform_fields(shape, fields, path)
            }
            (FieldKind::List(elem), Value::List(items)) => {
                items.iter().enumerate().try_for_each(|(i, item)| {
                    self.conform_kind(item, elem, &format!("{}[{}]", path, i))
                })
            }
            (FieldKind::Variant(domain), Value::Absent)
                if self.domains.get(domain).is_some_and(|d| d.allows_absent) =>
            {
                Ok(())
            }
            (FieldKind::Variant(domain), Value::Record { shape, fields }) => {
                if !self.domains.get(domain).is_some_and(|d| d.contains_shape(shape)) {
                    return Err(Nonconformance::new(
                        path,
                        format!("shape '{}' is not a member of {}", shape, domain),
                    ));
                }
                self.conform_fields(shape, fields, path)
            }
            (kind, value) => Err(Nonconformance::new(
                path,
                format!("expected {}, got {}", kind, value.type_name()),
            )),
        }
    }

    fn conform_fields(
        &self,
        shape: &str,
        fields: &BTreeMap<String, Value>,
        path: &str,
    ) -> Result<(), Nonconformance> {
        let decl = self
            .records
            .get(shape)
            .ok_or_else(|| Nonconformance::new(path, format!("undeclared shape '{}'", shape)))?;
        for (name, kind) in &decl.fields {
            let field_path = format!("{}.{}", path, name);
            match fields.get(name) {
                Some(value) => self.conform_kind(value, kind, &field_path)?,
                None => return Err(Nonconformance::new(field_path, "missing field")),
            }
        }
        if let Some(extra) = fields.keys().find(|name| !decl.fields.contains_key(*name)) {
            return Err(Nonconformance::new(
                format!("{}.{}", path, extra),
                format!("field not declared on {}", shape),
            ));
        }
        Ok(())
    }
}

/// A typed closed variant: knows its domain name and how to declare it.
pub trait ClosedVariant: Shaped {
    /// Name of the domain this type lowers into.
    const DOMAIN: &'static str;

    /// Declare the domain and every record shape reachable from it.
    fn declare(schema: &mut Schema) -> Result<(), ConfigError>;
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .declare_record(
                RecordDecl::new("File")
                    .field("name", FieldKind::Text)
                    .field("size", FieldKind::Int),
            )
            .unwrap();
        schema
            .declare_record(
                RecordDecl::new("Directory")
                    .field("name", FieldKind::Text)
                    .field("children", FieldKind::list(FieldKind::Variant("Node".into()))),
            )
            .unwrap();
        schema
            .declare_domain(VariantDomain::new("Node").member("File").member("Directory"))
            .unwrap();
        schema
    }

    #[test]
    fn recursive_schema_validates() {
        assert_eq!(tree_schema().validate(), Ok(()));
    }

    #[test]
    fn identical_redeclaration_is_accepted() {
        let mut schema = tree_schema();
        let again = RecordDecl::new("File")
            .field("name", FieldKind::Text)
            .field("size", FieldKind::Int);
        assert_eq!(schema.declare_record(again), Ok(()));
    }

    #[test]
    fn conflicting_redeclaration_is_rejected() {
        let mut schema = tree_schema();
        let other = RecordDecl::new("File").field("name", FieldKind::Text);
        assert_eq!(
            schema.declare_record(other),
            Err(ConfigError::ConflictingDeclaration {
                name: "File".to_string()
            })
        );
    }

    #[test]
    fn undeclared_member_is_reported() {
        let mut schema = Schema::new();
        schema
            .declare_domain(VariantDomain::new("Payment").member("Card"))
            .unwrap();
        assert_eq!(
            schema.validate(),
            Err(ConfigError::UndeclaredReference {
                owner: "Payment".to_string(),
                target: "Card".to_string(),
            })
        );
    }

    #[test]
    fn undeclared_nested_record_is_reported() {
        let mut schema = Schema::new();
        schema
            .declare_record(RecordDecl::new("Usage").field("resource", FieldKind::Record("Resource".into())))
            .unwrap();
        assert!(matches!(
            schema.validate(),
            Err(ConfigError::UndeclaredReference { target, .. }) if target == "Resource"
        ));
    }

    #[test]
    fn members_list_absent_last() {
        let domain = VariantDomain::new("Billing").member("Usage").with_absent();
        assert_eq!(
            domain.members(),
            vec![Member::Shape("Usage".into()), Member::Absent]
        );
        assert_eq!(domain.present_members(), vec![Member::Shape("Usage".into())]);
    }

    #[test]
    fn kind_admits_literals() {
        assert!(FieldKind::Text.admits(&Value::from("EU")));
        assert!(!FieldKind::Text.admits(&Value::Int(1)));
        assert!(!FieldKind::Int.admits(&Value::Absent));
        assert!(FieldKind::list(FieldKind::Int).admits(&Value::List(vec![Value::Int(1)])));
    }

    fn file(name: &str, size: Value) -> Value {
        Value::record("File", [("name", Value::from(name)), ("size", size)])
    }

    #[test]
    fn conforming_tree_is_accepted() {
        let tree = Value::record(
            "Directory",
            [
                ("name", Value::from("root")),
                (
                    "children",
                    Value::List(vec![file("a", Value::Int(1)), file("b", Value::Int(2))]),
                ),
            ],
        );
        assert_eq!(tree_schema().conform(&tree), Ok(()));
    }

    #[test]
    fn missing_field_is_located() {
        let broken = Value::record("File", [("name", Value::from("a"))]);
        assert_eq!(
            tree_schema().conform(&broken),
            Err(Nonconformance::new("File.size", "missing field"))
        );
    }

    #[test]
    fn wrongly_typed_nested_field_is_located() {
        let tree = Value::record(
            "Directory",
            [
                ("name", Value::from("root")),
                (
                    "children",
                    Value::List(vec![file("a", Value::Int(1)), file("b", Value::from("big"))]),
                ),
            ],
        );
        let err = tree_schema().conform(&tree).unwrap_err();
        assert_eq!(err.path, "Directory.children[1].size");
        assert_eq!(err.to_string(), "Directory.children[1].size: expected Int, got Text");
    }

    #[test]
    fn non_member_child_and_extra_field_are_rejected() {
        let stray = Value::record("Symlink", [("target", Value::from("/"))]);
        let dir = Value::record(
            "Directory",
            [("name", Value::from("d")), ("children", Value::List(vec![stray]))],
        );
        let err = tree_schema().conform(&dir).unwrap_err();
        assert_eq!(err.path, "Directory.children[0]");

        let extra = Value::record(
            "File",
            [
                ("name", Value::from("a")),
                ("size", Value::Int(1)),
                ("owner", Value::from("root")),
            ],
        );
        let err = tree_schema().conform(&extra).unwrap_err();
        assert_eq!(err.path, "File.owner");
    }

    #[test]
    fn kind_display() {
        assert_eq!(
            FieldKind::list(FieldKind::Variant("Node".into())).to_string(),
            "List<one of Node>"
        );
    }
}
