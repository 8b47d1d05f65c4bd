//! Recursive size aggregation over a file tree.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use shapecase_core::{
    ClosedVariant, ConfigError, FieldKind, Pattern, RecordDecl, Schema, Shaped, Value,
    VariantDomain,
};
use shapecase_eval::{MatchError, Matcher, MatcherBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileNode {
    File { name: String, size: i64 },
    Directory { name: String, children: Vec<FileNode> },
}

impl FileNode {
    pub fn file(name: impl Into<String>, size: i64) -> Self {
        FileNode::File {
            name: name.into(),
            size,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<FileNode>) -> Self {
        FileNode::Directory {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileNode::File { name, .. } | FileNode::Directory { name, .. } => name,
        }
    }
}

impl Shaped for FileNode {
    fn to_value(&self) -> Value {
        match self {
            FileNode::File { name, size } => Value::record(
                "File",
                [("name", Value::from(name.as_str())), ("size", Value::Int(*size))],
            ),
            FileNode::Directory { name, children } => Value::record(
                "Directory",
                [
                    ("name", Value::from(name.as_str())),
                    (
                        "children",
                        Value::List(children.iter().map(Shaped::to_value).collect()),
                    ),
                ],
            ),
        }
    }
}

impl ClosedVariant for FileNode {
    const DOMAIN: &'static str = "FileNode";

    fn declare(schema: &mut Schema) -> Result<(), ConfigError> {
        schema.declare_record(
            RecordDecl::new("File")
                .field("name", FieldKind::Text)
                .field("size", FieldKind::Int),
        )?;
        schema.declare_record(
            RecordDecl::new("Directory")
                .field("name", FieldKind::Text)
                .field("children", FieldKind::list(FieldKind::Variant(Self::DOMAIN.into()))),
        )?;
        schema.declare_domain(VariantDomain::new(Self::DOMAIN).member("File").member("Directory"))
    }
}

/// Sums file sizes. A directory's size is the sum of its children's, so an
/// empty directory is 0.
#[derive(Debug)]
pub struct SizeAggregator {
    matcher: Matcher<i64>,
}

impl SizeAggregator {
    pub fn new() -> Result<Self, ConfigError> {
        let matcher = MatcherBuilder::for_variant::<FileNode>()?
            .rule("file", Pattern::record("File").bind("size", "size"))
            .then(|b, _| b.int("size"))
            .rule("directory", Pattern::record("Directory").bind("children", "children"))
            .then(|b, m| {
                b.list("children")?
                    .iter()
                    .try_fold(0i64, |total, child| -> Result<i64, MatchError> {
                        let size = m.evaluate(child)?;
                        total
                            .checked_add(size)
                            .ok_or_else(|| MatchError::overflow(format!("{} + {}", total, size)))
                    })
            })
            .build()?;
        Ok(SizeAggregator { matcher })
    }

    pub fn total_size(&self, node: &FileNode) -> Result<i64, MatchError> {
        self.matcher.evaluate_shaped(node)
    }

    pub fn matcher(&self) -> &Matcher<i64> {
        &self.matcher
    }
}

static DEFAULT_AGGREGATOR: OnceLock<Result<SizeAggregator, ConfigError>> = OnceLock::new();

/// Total size of all files under `node`.
pub fn total_size(node: &FileNode) -> Result<i64, MatchError> {
    let aggregator = DEFAULT_AGGREGATOR
        .get_or_init(SizeAggregator::new)
        .as_ref()
        .map_err(|e| MatchError::Config(e.clone()))?;
    aggregator.total_size(node)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
