//! # Compiled Schema Nodes
//!
//! The typed representation the compiler produces for each schema
//! (sub)document. Nodes live in an arena owned by
//! [`CompiledSchema`](crate::compiler::CompiledSchema) and refer to their
//! children by [`NodeId`], so a subschema reached through several `$ref`s,
//! or through recursion, exists once.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Number, Value};

use crate::draft::Draft;
use crate::pattern::Pattern;

/// Index of a node in its schema's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One compiled schema.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// Accepts every instance: the boolean schema `true`.
    Accept,
    /// Rejects every instance: `false`.
    Reject {
        /// `<document uri>#<pointer>` of the `false` schema.
        location: String,
    },
    /// A constraint set.
    Rules(Box<Rules>),
}

impl SchemaNode {
    /// Location of the schema this node was compiled from, if it has one.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Accept => None,
            Self::Reject { location } => Some(location),
            Self::Rules(rules) => Some(&rules.location),
        }
    }
}

/// The primitive types of the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl JsonType {
    /// Parse a `type` keyword entry.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "string" => Self::String,
            "integer" => Self::Integer,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    /// The most specific type of `value`, as its literal reads.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if jval_core::number::is_integer_literal(n) => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether `value` is an instance of this type under `draft`.
    pub fn matches(&self, value: &Value, draft: Draft) -> bool {
        match (self, value) {
            (Self::Null, Value::Null)
            | (Self::Boolean, Value::Bool(_))
            | (Self::Number, Value::Number(_))
            | (Self::String, Value::String(_))
            | (Self::Array, Value::Array(_))
            | (Self::Object, Value::Object(_)) => true,
            (Self::Integer, Value::Number(n)) => {
                if draft.strict_integers() {
                    jval_core::number::is_integer_literal(n)
                } else {
                    jval_core::number::is_integral(n)
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `items`.
#[derive(Debug, Clone, Default)]
pub enum Items {
    #[default]
    None,
    /// One schema for every element.
    Single(NodeId),
    /// Positional schemas.
    Tuple(Vec<NodeId>),
}

/// `additionalItems` / `additionalProperties`.
#[derive(Debug, Clone, Copy, Default)]
pub enum Additional {
    #[default]
    Allowed,
    Forbidden,
    Schema(NodeId),
}

/// One entry of `dependencies`.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Property form: these properties must also be present.
    Properties(Vec<String>),
    /// Schema form: the whole object must also match.
    Schema(NodeId),
}

/// `if` / `then` / `else`.
#[derive(Debug, Clone, Copy)]
pub struct Condition {
    pub if_: NodeId,
    pub then_: Option<NodeId>,
    pub else_: Option<NodeId>,
}

/// A numeric bound. `exclusive` comes from the draft-04 boolean modifiers;
/// draft-06/07 numeric exclusive bounds are stored separately.
#[derive(Debug, Clone)]
pub struct Bound {
    pub limit: Number,
    pub exclusive: bool,
}

/// The resolved constraint set of one schema object.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    /// `<document uri>#<pointer>`.
    pub location: String,
    pub draft: Draft,

    pub types: Option<Vec<JsonType>>,
    pub enumeration: Option<Vec<Value>>,
    pub constant: Option<Value>,

    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub format: Option<String>,

    pub items: Items,
    pub additional_items: Additional,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<NodeId>,

    pub properties: HashMap<String, NodeId>,
    pub pattern_properties: Vec<(Pattern, NodeId)>,
    pub additional_properties: Additional,
    pub required: Vec<String>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: Vec<(String, Dependency)>,
    pub property_names: Option<NodeId>,

    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub not: Option<NodeId>,
    pub condition: Option<Condition>,

    /// Keywords with no validation semantics, kept verbatim.
    pub annotations: Map<String, Value>,
}

impl Rules {
    /// Child nodes applied to the instance itself rather than to a part of
    /// it. A cycle through these edges never terminates.
    pub fn in_place_children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        children.extend(&self.all_of);
        children.extend(&self.any_of);
        children.extend(&self.one_of);
        children.extend(self.not);
        if let Some(condition) = &self.condition {
            children.push(condition.if_);
            children.extend(condition.then_);
            children.extend(condition.else_);
        }
        for (_, dependency) in &self.dependencies {
            if let Dependency::Schema(id) = dependency {
                children.push(*id);
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_matching_by_draft() {
        assert!(JsonType::Integer.matches(&json!(1), Draft::Draft4));
        assert!(!JsonType::Integer.matches(&json!(1.0), Draft::Draft4));
        assert!(JsonType::Integer.matches(&json!(1.0), Draft::Draft7));
        assert!(!JsonType::Integer.matches(&json!(1.5), Draft::Draft7));
        assert!(JsonType::Number.matches(&json!(1), Draft::Draft4));
    }

    #[test]
    fn integer_literal_beyond_u64_is_an_integer() {
        let huge = jval_core::decode("100000000000000000000").unwrap();
        assert!(JsonType::Integer.matches(&huge, Draft::Draft4));
        assert!(JsonType::Integer.matches(&huge, Draft::Draft7));
        assert_eq!(JsonType::of(&huge), JsonType::Integer);
    }

    #[test]
    fn type_of_literal() {
        assert_eq!(JsonType::of(&json!(3)), JsonType::Integer);
        assert_eq!(JsonType::of(&json!(3.0)), JsonType::Number);
        assert_eq!(JsonType::of(&json!(null)), JsonType::Null);
        assert_eq!(JsonType::from_name("object"), Some(JsonType::Object));
        assert_eq!(JsonType::from_name("any"), None);
    }

    #[test]
    fn in_place_children_cover_combinators() {
        let rules = Rules {
            all_of: vec![NodeId(1)],
            not: Some(NodeId(2)),
            condition: Some(Condition {
                if_: NodeId(3),
                then_: None,
                else_: Some(NodeId(4)),
            }),
            dependencies: vec![
                ("a".into(), Dependency::Properties(vec!["b".into()])),
                ("c".into(), Dependency::Schema(NodeId(5))),
            ],
            properties: HashMap::from([("x".to_string(), NodeId(6))]),
            ..Rules::default()
        };
        let ids: Vec<usize> = rules.in_place_children().into_iter().map(NodeId::index).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
    }
}
