//! # Schema Compiler
//!
//! Walks a schema document once and produces a [`CompiledSchema`]: an
//! arena of typed [`SchemaNode`]s with every `$ref` already resolved to a
//! [`NodeId`].
//!
//! ## Reference Resolution
//!
//! References resolve against the base URI in effect at their location,
//! which starts at the document's URI and is changed by `$id` (`id` in
//! draft-04). A resolved reference names a document plus a JSON Pointer
//! into it. Documents are found, in order, among:
//!
//! 1. subschemas registered by `$id` (including plain-name anchors such as
//!    `#node`),
//! 2. documents already loaded,
//! 3. the [`SchemaLoader`], for external documents.
//!
//! ## Cycles
//!
//! Nodes are memoized by (document, pointer) before their children are
//! compiled, so recursion through `properties`, `items` and the like
//! compiles to a back edge in the arena. That recursion is bounded by the
//! instance. Two kinds of cycle are not, and are rejected:
//!
//! - `$ref` hops that lead back to themselves without reaching a schema
//!   object, detected while resolving;
//! - loops through edges that re-apply a schema to the same instance
//!   (`allOf`, `anyOf`, `oneOf`, `not`, `if`/`then`/`else`, schema-form
//!   `dependencies`), detected on the finished arena.

use std::collections::HashMap;
use std::sync::Arc;

use jval_core::JsonPointer;
use serde_json::{Map, Number, Value};
use url::Url;

use crate::config::ValidatorOptions;
use crate::draft::Draft;
use crate::engine::Engine;
use crate::error::SchemaError;
use crate::format::KNOWN_FORMATS;
use crate::loader::SchemaLoader;
use crate::node::{
    Additional, Bound, Condition, Dependency, Items, JsonType, NodeId, Rules, SchemaNode,
};
use crate::pattern::Pattern;
use crate::result::ValidationError;

/// Base URI for schemas compiled from a bare value.
pub const ANONYMOUS_SCHEMA_URI: &str = "mem:///schema.json";

// ---------------------------------------------------------------------------
// CompiledSchema
// ---------------------------------------------------------------------------

/// An immutable, fully resolved schema, shareable across threads.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    draft: Draft,
    uri: Url,
    validate_formats: bool,
}

impl CompiledSchema {
    /// Compile a schema value with default options and no loader. External
    /// references fail to resolve.
    pub fn from_value(schema: Value) -> Result<Self, SchemaError> {
        Compiler::default().compile_value(schema)
    }

    /// Validate an already decoded instance.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in discovery order.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<ValidationError>> {
        let errors = Engine::new(self).validate(instance);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Pass/fail only; stops at the first violation.
    pub fn is_valid(&self, instance: &Value) -> bool {
        Engine::new(self).is_valid(instance)
    }

    /// Draft of the root document.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Base URI of the root document.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node with the given id.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn validates_formats(&self) -> bool {
        self.validate_formats
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles schema documents into [`CompiledSchema`]s.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    loader: Option<&'a SchemaLoader>,
    default_draft: Draft,
    validate_formats: bool,
}

impl Default for Compiler<'_> {
    fn default() -> Self {
        Self {
            loader: None,
            default_draft: Draft::default(),
            validate_formats: true,
        }
    }
}

impl<'a> Compiler<'a> {
    /// A compiler configured from validator options.
    pub fn from_options(options: &ValidatorOptions) -> Self {
        Self {
            loader: None,
            default_draft: options.default_draft,
            validate_formats: options.validate_formats,
        }
    }

    /// Load external `$ref` targets through `loader`.
    pub fn with_loader(mut self, loader: &'a SchemaLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Draft for documents without a recognized `$schema`.
    pub fn default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    /// Whether the compiled schema checks `format`.
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// Compile `schema`, known by [`ANONYMOUS_SCHEMA_URI`].
    pub fn compile_value(&self, schema: Value) -> Result<CompiledSchema, SchemaError> {
        let uri = Url::parse(ANONYMOUS_SCHEMA_URI).map_err(|e| SchemaError::UnresolvableRef {
            reference: ANONYMOUS_SCHEMA_URI.to_string(),
            base: String::new(),
            reason: e.to_string(),
        })?;
        self.compile(schema, uri)
    }

    /// Compile the document `schema` whose base URI is `uri`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Malformed`], [`SchemaError::InvalidPattern`],
    /// [`SchemaError::UnresolvableRef`] and [`SchemaError::RefCycle`], or any
    /// load error of an external reference target.
    pub fn compile(&self, schema: Value, mut uri: Url) -> Result<CompiledSchema, SchemaError> {
        uri.set_fragment(None);
        let draft = Draft::detect(&schema).unwrap_or(self.default_draft);

        let mut build = Build {
            loader: self.loader,
            default_draft: self.default_draft,
            documents: Vec::new(),
            resources: HashMap::new(),
            memo: HashMap::new(),
            nodes: Vec::new(),
            ref_chain: Vec::new(),
        };
        let doc = build.add_document(uri.clone(), schema, draft);
        let root = build.compile_at(doc, JsonPointer::root())?;

        let nodes: Vec<SchemaNode> = build
            .nodes
            .into_iter()
            .map(|node| node.unwrap_or(SchemaNode::Accept))
            .collect();
        check_in_place_cycles(&nodes)?;

        tracing::debug!(
            uri = %uri,
            draft = %draft,
            nodes = nodes.len(),
            documents = build.documents.len(),
            "schema compiled"
        );
        Ok(CompiledSchema {
            nodes,
            root,
            draft,
            uri,
            validate_formats: self.validate_formats,
        })
    }
}

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

struct Document {
    uri: Url,
    value: Arc<Value>,
    draft: Draft,
}

struct Build<'a> {
    loader: Option<&'a SchemaLoader>,
    default_draft: Draft,
    documents: Vec<Document>,
    /// Absolute URI (document URI, `$id`, or `uri#anchor`) to location.
    resources: HashMap<String, (usize, JsonPointer)>,
    memo: HashMap<(usize, JsonPointer), NodeId>,
    /// `None` while a node's children are being compiled.
    nodes: Vec<Option<SchemaNode>>,
    /// Locations of consecutive `$ref` hops being resolved.
    ref_chain: Vec<String>,
}

impl Build<'_> {
    fn add_document(&mut self, uri: Url, value: Value, draft: Draft) -> usize {
        let index = self.documents.len();
        let value = Arc::new(value);
        self.documents.push(Document {
            uri: uri.clone(),
            value: Arc::clone(&value),
            draft,
        });
        self.resources
            .insert(uri.to_string(), (index, JsonPointer::root()));
        self.register_ids(index, &value, &JsonPointer::root(), &uri);
        index
    }

    /// Record every `$id` in a document so references can find the
    /// subschema before anything is compiled.
    fn register_ids(&mut self, doc: usize, value: &Value, pointer: &JsonPointer, base: &Url) {
        let Value::Object(map) = value else {
            return;
        };
        if map.contains_key("$ref") {
            return;
        }
        let draft = self.documents[doc].draft;
        let mut base = base.clone();
        if let Some(joined) = map
            .get(draft.id_keyword())
            .and_then(Value::as_str)
            .and_then(|id| base.join(id).ok())
        {
            match joined.fragment() {
                Some(anchor) if !anchor.is_empty() && !anchor.starts_with('/') => {
                    self.resources
                        .entry(joined.to_string())
                        .or_insert_with(|| (doc, pointer.clone()));
                }
                _ => {
                    let mut resource = joined;
                    resource.set_fragment(None);
                    self.resources
                        .entry(resource.to_string())
                        .or_insert_with(|| (doc, pointer.clone()));
                    base = resource;
                }
            }
        }

        for (keyword, child) in map {
            let here = pointer.child(keyword.as_str());
            match keyword.as_str() {
                "items" | "allOf" | "anyOf" | "oneOf" if child.is_array() => {
                    if let Value::Array(items) = child {
                        for (i, item) in items.iter().enumerate() {
                            self.register_ids(doc, item, &here.child(i.to_string()), &base);
                        }
                    }
                }
                "items" | "additionalItems" | "additionalProperties" | "contains"
                | "propertyNames" | "not" | "if" | "then" | "else" => {
                    self.register_ids(doc, child, &here, &base);
                }
                "definitions" | "properties" | "patternProperties" | "dependencies" => {
                    if let Value::Object(members) = child {
                        for (name, member) in members {
                            self.register_ids(doc, member, &here.child(name.as_str()), &base);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn location(&self, doc: usize, pointer: &JsonPointer) -> String {
        format!("{}#{}", self.documents[doc].uri, pointer.to_uri_fragment())
    }

    /// Base URI in effect at `pointer`.
    fn base_for(&self, doc: usize, pointer: &JsonPointer) -> Url {
        let document = &self.documents[doc];
        let id_keyword = document.draft.id_keyword();
        let mut base = document.uri.clone();
        for prefix in pointer.prefixes() {
            let Some(Value::Object(map)) = prefix.resolve(&document.value) else {
                continue;
            };
            if map.contains_key("$ref") {
                continue;
            }
            if let Some(joined) = map
                .get(id_keyword)
                .and_then(Value::as_str)
                .and_then(|id| base.join(id).ok())
            {
                base = joined;
            }
        }
        base.set_fragment(None);
        base
    }

    fn resolve_ref(
        &mut self,
        doc: usize,
        pointer: &JsonPointer,
        reference: &str,
    ) -> Result<(usize, JsonPointer), SchemaError> {
        let base = self.base_for(doc, pointer);
        let unresolvable = |reason: String| SchemaError::UnresolvableRef {
            reference: reference.to_string(),
            base: base.to_string(),
            reason,
        };

        let target = base.join(reference).map_err(|e| unresolvable(e.to_string()))?;
        let mut resource = target.clone();
        resource.set_fragment(None);

        let (resource_doc, resource_pointer) = match self.resources.get(resource.as_str()) {
            Some(found) => found.clone(),
            None => {
                let loaded = self.load(&resource).map_err(|e| match e {
                    SchemaError::NotFound { .. } | SchemaError::Unreadable { .. } => {
                        unresolvable(e.to_string())
                    }
                    other => other,
                })?;
                (loaded, JsonPointer::root())
            }
        };

        let fragment = target.fragment().unwrap_or("");
        let (target_doc, target_pointer) = if fragment.is_empty() {
            (resource_doc, resource_pointer)
        } else if fragment.starts_with('/') {
            let within = JsonPointer::from_uri_fragment(fragment)
                .map_err(|e| unresolvable(e.to_string()))?;
            (resource_doc, resource_pointer.join(&within))
        } else {
            self.resources
                .get(target.as_str())
                .cloned()
                .ok_or_else(|| unresolvable(format!("no schema declares the anchor #{fragment}")))?
        };

        if target_pointer
            .resolve(&self.documents[target_doc].value)
            .is_none()
        {
            return Err(unresolvable(format!(
                "{} has nothing at #{}",
                self.documents[target_doc].uri,
                target_pointer.to_uri_fragment()
            )));
        }
        Ok((target_doc, target_pointer))
    }

    fn load(&mut self, uri: &Url) -> Result<usize, SchemaError> {
        let loader = self.loader.ok_or_else(|| SchemaError::NotFound {
            identifier: uri.to_string(),
        })?;
        let raw = loader.fetch_uri(uri)?;
        let value = raw.parse()?;
        let draft = Draft::detect(&value).unwrap_or(self.default_draft);
        let index = self.add_document(raw.uri.clone(), value, draft);
        // A locator may answer for a URI with a document known by another.
        self.resources
            .entry(uri.to_string())
            .or_insert_with(|| (index, JsonPointer::root()));
        tracing::debug!(uri = %uri, draft = %draft, "external schema document registered");
        Ok(index)
    }

    fn compile_at(&mut self, doc: usize, pointer: JsonPointer) -> Result<NodeId, SchemaError> {
        let key = (doc, pointer);
        if let Some(&id) = self.memo.get(&key) {
            return Ok(id);
        }
        let (doc, pointer) = key;
        let document = Arc::clone(&self.documents[doc].value);
        let location = self.location(doc, &pointer);
        let schema = pointer
            .resolve(&document)
            .ok_or_else(|| SchemaError::UnresolvableRef {
                reference: location.clone(),
                base: self.documents[doc].uri.to_string(),
                reason: "no such location".to_string(),
            })?;

        if let Some(reference) = schema.as_object().and_then(|map| map.get("$ref")) {
            let reference = reference
                .as_str()
                .ok_or_else(|| malformed(&location, "$ref", "must be a string"))?;
            if let Some(start) = self.ref_chain.iter().position(|hop| *hop == location) {
                let mut chain = self.ref_chain[start..].to_vec();
                chain.push(location);
                return Err(SchemaError::RefCycle { chain });
            }
            self.ref_chain.push(location);
            let (target_doc, target_pointer) = self.resolve_ref(doc, &pointer, reference)?;
            let id = self.compile_at(target_doc, target_pointer)?;
            self.ref_chain.pop();
            self.memo.insert((doc, pointer), id);
            return Ok(id);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(None);
        self.memo.insert((doc, pointer.clone()), id);

        let hops = std::mem::take(&mut self.ref_chain);
        let node = self.compile_node(doc, &pointer, schema, location)?;
        self.ref_chain = hops;

        self.nodes[id.0] = Some(node);
        Ok(id)
    }

    fn compile_node(
        &mut self,
        doc: usize,
        pointer: &JsonPointer,
        schema: &Value,
        location: String,
    ) -> Result<SchemaNode, SchemaError> {
        let draft = self.documents[doc].draft;
        match schema {
            Value::Bool(accept) if draft.allows_boolean_schemas() => Ok(if *accept {
                SchemaNode::Accept
            } else {
                SchemaNode::Reject { location }
            }),
            Value::Object(map) => {
                let rules = self.compile_rules(doc, pointer, map, location, draft)?;
                Ok(SchemaNode::Rules(Box::new(rules)))
            }
            _ => Err(malformed(
                &location,
                "schema",
                if draft.allows_boolean_schemas() {
                    "must be an object or a boolean"
                } else {
                    "must be an object"
                },
            )),
        }
    }

    fn compile_rules(
        &mut self,
        doc: usize,
        pointer: &JsonPointer,
        map: &Map<String, Value>,
        location: String,
        draft: Draft,
    ) -> Result<Rules, SchemaError> {
        let mut rules = Rules {
            location,
            draft,
            ..Rules::default()
        };
        let location = rules.location.clone();
        let bad = |keyword: &str, reason: &str| malformed(&location, keyword, reason);
        let mut exclusive_min_flag = false;
        let mut exclusive_max_flag = false;

        for (keyword, value) in map {
            if !draft.supports(keyword) {
                rules.annotations.insert(keyword.clone(), value.clone());
                continue;
            }
            let here = || pointer.child(keyword.as_str());
            match keyword.as_str() {
                "type" => {
                    rules.types = Some(
                        parse_types(value)
                            .ok_or_else(|| bad(keyword, "must be a type name or a non-empty array of type names"))?,
                    );
                }
                "enum" => {
                    let options = value
                        .as_array()
                        .ok_or_else(|| bad(keyword, "must be an array"))?;
                    rules.enumeration = Some(options.clone());
                }
                "const" => rules.constant = Some(value.clone()),

                "minimum" | "maximum" => {
                    let limit = number(value).ok_or_else(|| bad(keyword, "must be a number"))?;
                    let bound = Some(Bound {
                        limit,
                        exclusive: false,
                    });
                    if keyword == "minimum" {
                        rules.minimum = bound;
                    } else {
                        rules.maximum = bound;
                    }
                }
                "exclusiveMinimum" | "exclusiveMaximum" if draft == Draft::Draft4 => {
                    let flag = value
                        .as_bool()
                        .ok_or_else(|| bad(keyword, "must be a boolean"))?;
                    if keyword == "exclusiveMinimum" {
                        exclusive_min_flag = flag;
                    } else {
                        exclusive_max_flag = flag;
                    }
                }
                "exclusiveMinimum" => {
                    rules.exclusive_minimum =
                        Some(number(value).ok_or_else(|| bad(keyword, "must be a number"))?);
                }
                "exclusiveMaximum" => {
                    rules.exclusive_maximum =
                        Some(number(value).ok_or_else(|| bad(keyword, "must be a number"))?);
                }
                "multipleOf" => {
                    let divisor = number(value)
                        .filter(|n| n.as_f64().is_some_and(|f| f > 0.0))
                        .ok_or_else(|| bad(keyword, "must be a number greater than 0"))?;
                    rules.multiple_of = Some(divisor);
                }

                "minLength" => rules.min_length = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?),
                "maxLength" => rules.max_length = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?),
                "pattern" => {
                    let source = value
                        .as_str()
                        .ok_or_else(|| bad(keyword, "must be a string"))?;
                    rules.pattern = Some(compile_pattern(&location, source)?);
                }
                "format" => {
                    let format = value
                        .as_str()
                        .ok_or_else(|| bad(keyword, "must be a string"))?;
                    if !KNOWN_FORMATS.contains(&format) {
                        tracing::trace!(location = %location, format, "format is not checked");
                    }
                    rules.format = Some(format.to_string());
                }

                "items" => {
                    rules.items = match value {
                        Value::Array(schemas) => Items::Tuple(
                            (0..schemas.len())
                                .map(|i| self.compile_at(doc, here().child(i.to_string())))
                                .collect::<Result<_, _>>()?,
                        ),
                        _ => Items::Single(self.compile_at(doc, here())?),
                    };
                }
                "additionalItems" => {
                    rules.additional_items = self.compile_additional(doc, here(), value, &bad)?;
                }
                "minItems" => rules.min_items = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?),
                "maxItems" => rules.max_items = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?),
                "uniqueItems" => {
                    rules.unique_items = value
                        .as_bool()
                        .ok_or_else(|| bad(keyword, "must be a boolean"))?;
                }
                "contains" => rules.contains = Some(self.compile_at(doc, here())?),

                "properties" => {
                    let members = value
                        .as_object()
                        .ok_or_else(|| bad(keyword, "must be an object"))?;
                    for name in members.keys() {
                        let id = self.compile_at(doc, here().child(name.as_str()))?;
                        rules.properties.insert(name.clone(), id);
                    }
                }
                "patternProperties" => {
                    let members = value
                        .as_object()
                        .ok_or_else(|| bad(keyword, "must be an object"))?;
                    for name in members.keys() {
                        let pattern = compile_pattern(&location, name)?;
                        let id = self.compile_at(doc, here().child(name.as_str()))?;
                        rules.pattern_properties.push((pattern, id));
                    }
                }
                "additionalProperties" => {
                    rules.additional_properties =
                        self.compile_additional(doc, here(), value, &bad)?;
                }
                "required" => {
                    rules.required = string_list(value)
                        .ok_or_else(|| bad(keyword, "must be an array of strings"))?;
                }
                "minProperties" => {
                    rules.min_properties = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?);
                }
                "maxProperties" => {
                    rules.max_properties = Some(count(value).ok_or_else(|| bad(keyword, NON_NEGATIVE))?);
                }
                "dependencies" => {
                    let members = value
                        .as_object()
                        .ok_or_else(|| bad(keyword, "must be an object"))?;
                    for (name, dependency) in members {
                        let dependency = if dependency.is_array() {
                            Dependency::Properties(string_list(dependency).ok_or_else(|| {
                                bad(keyword, "property dependencies must be arrays of strings")
                            })?)
                        } else {
                            Dependency::Schema(self.compile_at(doc, here().child(name.as_str()))?)
                        };
                        rules.dependencies.push((name.clone(), dependency));
                    }
                }
                "propertyNames" => rules.property_names = Some(self.compile_at(doc, here())?),

                "allOf" | "anyOf" | "oneOf" => {
                    let len = value
                        .as_array()
                        .filter(|schemas| !schemas.is_empty())
                        .map(Vec::len)
                        .ok_or_else(|| bad(keyword, "must be a non-empty array of schemas"))?;
                    let ids = (0..len)
                        .map(|i| self.compile_at(doc, here().child(i.to_string())))
                        .collect::<Result<Vec<_>, _>>()?;
                    match keyword.as_str() {
                        "allOf" => rules.all_of = ids,
                        "anyOf" => rules.any_of = ids,
                        _ => rules.one_of = ids,
                    }
                }
                "not" => rules.not = Some(self.compile_at(doc, here())?),
                // Compiled below, once all three are known.
                "if" | "then" | "else" => {}

                _ => {
                    rules.annotations.insert(keyword.clone(), value.clone());
                }
            }
        }

        if let Some(bound) = rules.minimum.as_mut() {
            bound.exclusive = exclusive_min_flag;
        }
        if let Some(bound) = rules.maximum.as_mut() {
            bound.exclusive = exclusive_max_flag;
        }

        if draft.supports("if") && map.contains_key("if") {
            let has_then = map.contains_key("then");
            let has_else = map.contains_key("else");
            if has_then || has_else {
                let if_ = self.compile_at(doc, pointer.child("if"))?;
                let then_ = match has_then {
                    true => Some(self.compile_at(doc, pointer.child("then"))?),
                    false => None,
                };
                let else_ = match has_else {
                    true => Some(self.compile_at(doc, pointer.child("else"))?),
                    false => None,
                };
                rules.condition = Some(Condition { if_, then_, else_ });
            }
        }

        Ok(rules)
    }

    fn compile_additional(
        &mut self,
        doc: usize,
        pointer: JsonPointer,
        value: &Value,
        bad: &dyn Fn(&str, &str) -> SchemaError,
    ) -> Result<Additional, SchemaError> {
        match value {
            Value::Bool(true) => Ok(Additional::Allowed),
            Value::Bool(false) => Ok(Additional::Forbidden),
            Value::Object(_) => Ok(Additional::Schema(self.compile_at(doc, pointer)?)),
            _ => Err(bad(
                pointer.segments().last().map_or("", String::as_str),
                "must be a boolean or a schema",
            )),
        }
    }
}

const NON_NEGATIVE: &str = "must be a non-negative integer";

fn malformed(location: &str, keyword: &str, reason: &str) -> SchemaError {
    SchemaError::Malformed {
        location: location.to_string(),
        keyword: keyword.to_string(),
        reason: reason.to_string(),
    }
}

fn compile_pattern(location: &str, source: &str) -> Result<Pattern, SchemaError> {
    Pattern::new(source).map_err(|e| SchemaError::InvalidPattern {
        location: location.to_string(),
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// A non-negative integer, allowing integral float literals such as `2.0`.
fn count(value: &Value) -> Option<u64> {
    let n = number(value)?;
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn parse_types(value: &Value) -> Option<Vec<JsonType>> {
    match value {
        Value::String(name) => JsonType::from_name(name).map(|t| vec![t]),
        Value::Array(names) if !names.is_empty() => names
            .iter()
            .map(|name| name.as_str().and_then(JsonType::from_name))
            .collect(),
        _ => None,
    }
}

/// Reject loops through edges that re-apply a schema to the same instance.
fn check_in_place_cycles(nodes: &[SchemaNode]) -> Result<(), SchemaError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    fn visit(
        nodes: &[SchemaNode],
        id: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Result<(), SchemaError> {
        marks[id] = Mark::OnPath;
        path.push(id);
        if let SchemaNode::Rules(rules) = &nodes[id] {
            for child in rules.in_place_children() {
                match marks[child.0] {
                    Mark::Done => {}
                    Mark::Unvisited => visit(nodes, child.0, marks, path)?,
                    Mark::OnPath => {
                        let start = path.iter().position(|n| *n == child.0).unwrap_or(0);
                        let chain = path[start..]
                            .iter()
                            .chain(std::iter::once(&child.0))
                            .map(|n| nodes[*n].location().unwrap_or("true").to_string())
                            .collect();
                        return Err(SchemaError::RefCycle { chain });
                    }
                }
            }
        }
        path.pop();
        marks[id] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut path = Vec::new();
    for id in 0..nodes.len() {
        if marks[id] == Mark::Unvisited {
            visit(nodes, id, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MemoryLocator;
    use serde_json::json;

    fn compile(schema: Value) -> Result<CompiledSchema, SchemaError> {
        CompiledSchema::from_value(schema)
    }

    fn rules(schema: &CompiledSchema, id: NodeId) -> &Rules {
        match schema.node(id) {
            SchemaNode::Rules(rules) => rules,
            other => panic!("expected rules, got {other:?}"),
        }
    }

    #[test]
    fn compiles_keywords_into_typed_fields() {
        let schema = compile(json!({
            "type": ["string", "null"],
            "minLength": 2,
            "maxLength": 5.0,
            "pattern": "^a",
            "title": "kept"
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        assert_eq!(root.types, Some(vec![JsonType::String, JsonType::Null]));
        assert_eq!(root.min_length, Some(2));
        assert_eq!(root.max_length, Some(5));
        assert_eq!(root.pattern.as_ref().map(Pattern::as_str), Some("^a"));
        assert_eq!(root.annotations.get("title"), Some(&json!("kept")));
        assert_eq!(root.location, "mem:///schema.json#");
    }

    #[test]
    fn shared_refs_compile_once() {
        let schema = compile(json!({
            "definitions": {"id": {"type": "integer"}},
            "properties": {
                "a": {"$ref": "#/definitions/id"},
                "b": {"$ref": "#/definitions/id"}
            }
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        assert_eq!(root.properties["a"], root.properties["b"]);
        assert_eq!(schema.node_count(), 2);
    }

    #[test]
    fn structural_recursion_is_allowed() {
        let schema = compile(json!({
            "type": "object",
            "properties": {"children": {"type": "array", "items": {"$ref": "#"}}}
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        let children = rules(&schema, root.properties["children"]);
        assert!(matches!(children.items, Items::Single(id) if id == schema.root()));
    }

    #[test]
    fn pure_ref_cycle_rejected() {
        let err = compile(json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"$ref": "#/definitions/a"}
            },
            "$ref": "#/definitions/a"
        }))
        .unwrap_err();
        match err {
            SchemaError::RefCycle { chain } => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain.iter().any(|hop| hop.ends_with("#/definitions/b")));
            }
            other => panic!("expected RefCycle, got {other}"),
        }
    }

    #[test]
    fn in_place_cycle_rejected() {
        let err = compile(json!({"allOf": [{"$ref": "#"}]})).unwrap_err();
        assert!(matches!(err, SchemaError::RefCycle { .. }));

        let err = compile(json!({
            "definitions": {"x": {"anyOf": [{"type": "string"}, {"$ref": "#/definitions/x"}]}},
            "properties": {"p": {"$ref": "#/definitions/x"}}
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::RefCycle { .. }));
    }

    #[test]
    fn ref_siblings_are_ignored() {
        let schema = compile(json!({
            "definitions": {"s": {"type": "string"}},
            "properties": {"a": {"$ref": "#/definitions/s", "type": "integer"}}
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        let a = rules(&schema, root.properties["a"]);
        assert_eq!(a.types, Some(vec![JsonType::String]));
    }

    #[test]
    fn escaped_pointer_fragments() {
        let schema = compile(json!({
            "definitions": {"a/b": {"type": "string"}, "c d": {"type": "null"}, "t~": {"type": "boolean"}},
            "properties": {
                "x": {"$ref": "#/definitions/a~1b"},
                "y": {"$ref": "#/definitions/c%20d"},
                "z": {"$ref": "#/definitions/t~0"}
            }
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        assert_eq!(rules(&schema, root.properties["x"]).types, Some(vec![JsonType::String]));
        assert_eq!(rules(&schema, root.properties["y"]).types, Some(vec![JsonType::Null]));
        assert_eq!(rules(&schema, root.properties["z"]).types, Some(vec![JsonType::Boolean]));
    }

    #[test]
    fn id_anchors_and_embedded_resources() {
        let schema = compile(json!({
            "$id": "http://example.com/root.json",
            "definitions": {
                "named": {"$id": "#named", "type": "string"},
                "nested": {
                    "$id": "nested/item.json",
                    "definitions": {"n": {"type": "number"}},
                    "properties": {"n": {"$ref": "#/definitions/n"}}
                }
            },
            "properties": {
                "a": {"$ref": "#named"},
                "b": {"$ref": "nested/item.json"},
                "c": {"$ref": "http://example.com/nested/item.json#/definitions/n"}
            }
        }))
        .unwrap();
        let root = rules(&schema, schema.root());
        assert_eq!(rules(&schema, root.properties["a"]).types, Some(vec![JsonType::String]));
        let b = rules(&schema, root.properties["b"]);
        assert_eq!(b.properties["n"], root.properties["c"]);
    }

    #[test]
    fn external_refs_through_loader() {
        let locator = MemoryLocator::from_schemas([
            ("main.json", r#"{"properties": {"id": {"$ref": "defs.json#/definitions/id"}}}"#),
            ("defs.json", r#"{"definitions": {"id": {"type": "integer", "minimum": 1}}}"#),
        ])
        .unwrap();
        let loader = SchemaLoader::new(Arc::new(locator));
        let raw = loader.fetch("main.json").unwrap();
        let schema = Compiler::default()
            .with_loader(&loader)
            .compile(raw.parse().unwrap(), raw.uri)
            .unwrap();
        let root = rules(&schema, schema.root());
        let id = rules(&schema, root.properties["id"]);
        assert_eq!(id.location, "mem:///defs.json#/definitions/id");
        assert!(schema.validate(&json!({"id": 0})).is_err());
    }

    #[test]
    fn unresolvable_refs() {
        let err = compile(json!({"$ref": "#/definitions/missing"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableRef { .. }), "{err}");
        let err = compile(json!({"$ref": "#nowhere"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableRef { .. }), "{err}");
        let err = compile(json!({"$ref": "other.json"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableRef { .. }), "{err}");
    }

    #[test]
    fn malformed_keywords() {
        for schema in [
            json!({"type": "text"}),
            json!({"type": []}),
            json!({"minLength": -1}),
            json!({"required": "id"}),
            json!({"multipleOf": 0}),
            json!({"allOf": []}),
            json!({"properties": {"a": 5}}),
            json!({"additionalProperties": "no"}),
            json!({"$ref": 1}),
        ] {
            let err = compile(schema.clone()).unwrap_err();
            assert!(matches!(err, SchemaError::Malformed { .. }), "{schema}: {err}");
        }
    }

    #[test]
    fn invalid_pattern() {
        let err = compile(json!({"pattern": "(a"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { ref pattern, .. } if pattern == "(a"));
        let err = compile(json!({"patternProperties": {"[": {}}})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn draft4_semantics() {
        let schema = compile(json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "minimum": 5,
            "exclusiveMinimum": true,
            "const": 3
        }))
        .unwrap();
        assert_eq!(schema.draft(), Draft::Draft4);
        let root = rules(&schema, schema.root());
        assert!(root.minimum.as_ref().is_some_and(|b| b.exclusive));
        assert!(root.constant.is_none());
        assert!(root.annotations.contains_key("const"));

        let err = compile(json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "properties": {"a": true}
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn boolean_schemas() {
        let schema = compile(json!({"properties": {"no": false, "yes": true}})).unwrap();
        let root = rules(&schema, schema.root());
        assert!(matches!(schema.node(root.properties["no"]), SchemaNode::Reject { .. }));
        assert!(matches!(schema.node(root.properties["yes"]), SchemaNode::Accept));
    }

    #[test]
    fn conditional_requires_branch() {
        let schema = compile(json!({"if": {"type": "string"}})).unwrap();
        assert!(rules(&schema, schema.root()).condition.is_none());
        let schema = compile(json!({"if": {"type": "string"}, "else": {"type": "null"}})).unwrap();
        let condition = rules(&schema, schema.root()).condition;
        assert!(condition.is_some_and(|c| c.then_.is_none() && c.else_.is_some()));
    }
}
