//! # Validation Engine
//!
//! A recursive walk over (instance, schema node, instance path) that
//! appends a [`ValidationError`] to an [`ErrorCollector`] for every
//! violated constraint. Mismatches are data: nothing here panics or
//! returns early through `Err`.
//!
//! ## Order of Checks
//!
//! For each node the `type` check runs first. When it fails, the
//! value-specific checks of that node (enum, const, numeric, string, array
//! and object keywords) are skipped so one wrong value yields one error;
//! combinators still run. Subschemas whose own errors are never reported
//! (`anyOf`, `oneOf`, `not`, `if`, `contains`, `propertyNames`) are
//! evaluated with a fail-fast probe.
//!
//! ## Error Locations
//!
//! Errors point at the instance node that failed. Object-level keywords
//! (`required`, `minProperties`, `maxProperties`, property dependencies)
//! point at the object; `additionalProperties` and `propertyNames` point at
//! the offending member; `additionalItems` at the offending element.

use std::cmp::Ordering;

use jval_core::number::{compare, is_multiple_of};
use jval_core::{encode, escape_segment, first_duplicate, json_equal};
use serde_json::{Map, Number, Value};

use crate::collector::ErrorCollector;
use crate::compiler::CompiledSchema;
use crate::format;
use crate::node::{Additional, Dependency, Items, JsonType, NodeId, Rules, SchemaNode};
use crate::result::{Keyword, ValidationError};

// ---------------------------------------------------------------------------
// Instance paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Segment<'v> {
    Key(&'v str),
    Index(usize),
}

/// Location of the instance node being validated.
#[derive(Debug, Default)]
pub struct InstancePath<'v> {
    segments: Vec<Segment<'v>>,
}

impl<'v> InstancePath<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_key(&mut self, key: &'v str) {
        self.segments.push(Segment::Key(key));
    }

    fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    fn pop(&mut self) {
        self.segments.pop();
    }

    /// JSON Pointer form: `/items/0/name`. The root is `""`.
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Key(key) => out.push_str(&escape_segment(key)),
                Segment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }

    /// Dotted form: `items[0].name`. The root is `""`.
    pub fn property(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            push_property_segment(&mut out, *segment);
        }
        out
    }

    /// Dotted form of a member of the current node.
    fn member_property(&self, key: &str) -> String {
        let mut out = self.property();
        push_property_segment(&mut out, Segment::Key(key));
        out
    }
}

fn push_property_segment(out: &mut String, segment: Segment<'_>) {
    match segment {
        Segment::Key(key) => {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(key);
        }
        Segment::Index(i) => {
            out.push('[');
            out.push_str(&i.to_string());
            out.push(']');
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Validates instances against one compiled schema.
pub struct Engine<'s> {
    schema: &'s CompiledSchema,
}

impl<'s> Engine<'s> {
    pub fn new(schema: &'s CompiledSchema) -> Self {
        Self { schema }
    }

    /// Every violation, in discovery order.
    pub fn validate(&self, instance: &Value) -> Vec<ValidationError> {
        let mut out = ErrorCollector::new();
        self.node(self.schema.root(), instance, &mut InstancePath::new(), &mut out);
        out.into_errors()
    }

    /// Pass/fail with a fail-fast collector.
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut out = ErrorCollector::probe();
        self.node(self.schema.root(), instance, &mut InstancePath::new(), &mut out);
        out.is_empty()
    }

    fn passes<'v>(&self, id: NodeId, instance: &'v Value, path: &mut InstancePath<'v>) -> bool {
        let mut probe = ErrorCollector::probe();
        self.node(id, instance, path, &mut probe);
        probe.is_empty()
    }

    fn node<'v>(
        &self,
        id: NodeId,
        instance: &'v Value,
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        if out.saturated() {
            return;
        }
        match self.schema.node(id) {
            SchemaNode::Accept => {}
            SchemaNode::Reject { location } => out.push(ValidationError::violation(
                path.pointer(),
                path.property(),
                "No value is allowed by a false schema".to_string(),
                Keyword::False,
                location,
            )),
            SchemaNode::Rules(rules) => self.rules(rules, instance, path, out),
        }
    }

    fn rules<'v>(
        &self,
        rules: &Rules,
        instance: &'v Value,
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        if self.type_matches(rules, instance, path, out) {
            self.value_checks(rules, instance, path, out);
            match instance {
                Value::Number(n) => self.number(rules, n, path, out),
                Value::String(s) => self.string(rules, s, path, out),
                Value::Array(items) => self.array(rules, items, path, out),
                Value::Object(map) => self.object(rules, map, path, out),
                Value::Null | Value::Bool(_) => {}
            }
        }
        self.combinators(rules, instance, path, out);
    }

    fn type_matches(
        &self,
        rules: &Rules,
        instance: &Value,
        path: &InstancePath<'_>,
        out: &mut ErrorCollector,
    ) -> bool {
        let Some(types) = &rules.types else {
            return true;
        };
        if types.is_empty() || types.iter().any(|t| t.matches(instance, rules.draft)) {
            return true;
        }
        let expected = types
            .iter()
            .map(|t| with_article(*t))
            .collect::<Vec<_>>()
            .join(" or ");
        fail(
            out,
            path,
            rules,
            Keyword::Type,
            format!("{} value found, but {expected} is required", found_name(instance)),
        );
        false
    }

    fn value_checks(
        &self,
        rules: &Rules,
        instance: &Value,
        path: &InstancePath<'_>,
        out: &mut ErrorCollector,
    ) {
        if let Some(options) = &rules.enumeration {
            if !options.iter().any(|option| json_equal(option, instance)) {
                let listed = encode(&Value::Array(options.clone()));
                fail(
                    out,
                    path,
                    rules,
                    Keyword::Enum,
                    format!("Does not have a value in the enumeration {listed}"),
                );
            }
        }
        if let Some(constant) = &rules.constant {
            if !json_equal(constant, instance) {
                fail(
                    out,
                    path,
                    rules,
                    Keyword::Const,
                    format!("Does not have the constant value {}", encode(constant)),
                );
            }
        }
    }

    fn number(&self, rules: &Rules, n: &Number, path: &InstancePath<'_>, out: &mut ErrorCollector) {
        if let Some(bound) = &rules.minimum {
            let ordering = compare(n, &bound.limit);
            if bound.exclusive && below_or_equal(ordering) {
                let message = format!("Must have a minimum value greater than {}", bound.limit);
                fail(out, path, rules, Keyword::ExclusiveMinimum, message);
            } else if ordering == Some(Ordering::Less) {
                let message = format!("Must have a minimum value of {}", bound.limit);
                fail(out, path, rules, Keyword::Minimum, message);
            }
        }
        if let Some(bound) = &rules.maximum {
            let ordering = compare(n, &bound.limit);
            if bound.exclusive && above_or_equal(ordering) {
                let message = format!("Must have a maximum value less than {}", bound.limit);
                fail(out, path, rules, Keyword::ExclusiveMaximum, message);
            } else if ordering == Some(Ordering::Greater) {
                let message = format!("Must have a maximum value of {}", bound.limit);
                fail(out, path, rules, Keyword::Maximum, message);
            }
        }
        if let Some(limit) = &rules.exclusive_minimum {
            if below_or_equal(compare(n, limit)) {
                let message = format!("Must have a minimum value greater than {limit}");
                fail(out, path, rules, Keyword::ExclusiveMinimum, message);
            }
        }
        if let Some(limit) = &rules.exclusive_maximum {
            if above_or_equal(compare(n, limit)) {
                let message = format!("Must have a maximum value less than {limit}");
                fail(out, path, rules, Keyword::ExclusiveMaximum, message);
            }
        }
        if let Some(divisor) = &rules.multiple_of {
            if !is_multiple_of(n, divisor) {
                fail(out, path, rules, Keyword::MultipleOf, format!("Is not a multiple of {divisor}"));
            }
        }
    }

    fn string(&self, rules: &Rules, s: &str, path: &InstancePath<'_>, out: &mut ErrorCollector) {
        if rules.min_length.is_some() || rules.max_length.is_some() {
            let length = s.chars().count() as u64;
            if let Some(min) = rules.min_length.filter(|min| length < *min) {
                let message = format!("Must be at least {min} characters long");
                fail(out, path, rules, Keyword::MinLength, message);
            }
            if let Some(max) = rules.max_length.filter(|max| length > *max) {
                let message = format!("Must be at most {max} characters long");
                fail(out, path, rules, Keyword::MaxLength, message);
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(s) {
                let message = format!("Does not match the regex pattern {}", pattern.as_str());
                fail(out, path, rules, Keyword::Pattern, message);
            }
        }
        if let Some(name) = &rules.format {
            if self.schema.validates_formats() && !format::conforms(name, s) {
                fail(out, path, rules, Keyword::Format, format!("Invalid {name} \"{s}\""));
            }
        }
    }

    fn array<'v>(
        &self,
        rules: &Rules,
        items: &'v [Value],
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        match &rules.items {
            Items::None => {}
            Items::Single(id) => {
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    self.node(*id, item, path, out);
                    path.pop();
                }
            }
            Items::Tuple(ids) => {
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    match (ids.get(i), rules.additional_items) {
                        (Some(id), _) => self.node(*id, item, path, out),
                        (None, Additional::Allowed) => {}
                        (None, Additional::Schema(id)) => self.node(id, item, path, out),
                        (None, Additional::Forbidden) => {
                            let message = format!(
                                "The item {} is not defined and the definition does not allow additional items",
                                path.property()
                            );
                            fail(out, path, rules, Keyword::AdditionalItems, message);
                        }
                    }
                    path.pop();
                }
            }
        }

        let len = items.len() as u64;
        if let Some(min) = rules.min_items.filter(|min| len < *min) {
            let message = format!("There must be a minimum of {min} items in the array");
            fail(out, path, rules, Keyword::MinItems, message);
        }
        if let Some(max) = rules.max_items.filter(|max| len > *max) {
            let message = format!("There must be a maximum of {max} items in the array");
            fail(out, path, rules, Keyword::MaxItems, message);
        }
        if rules.unique_items {
            if let Some((first, second)) = first_duplicate(items) {
                let message = format!(
                    "There are no duplicates allowed in the array (items {first} and {second} are equal)"
                );
                fail(out, path, rules, Keyword::UniqueItems, message);
            }
        }
        if let Some(id) = rules.contains {
            let mut found = false;
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                found = self.passes(id, item, path);
                path.pop();
                if found {
                    break;
                }
            }
            if !found {
                let message = "No item in the array matches the contains schema".to_string();
                fail(out, path, rules, Keyword::Contains, message);
            }
        }
    }

    fn object<'v>(
        &self,
        rules: &Rules,
        map: &'v Map<String, Value>,
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        for name in &rules.required {
            if !map.contains_key(name) {
                let message = format!("The property {} is required", path.member_property(name));
                fail(out, path, rules, Keyword::Required, message);
            }
        }

        let len = map.len() as u64;
        if let Some(min) = rules.min_properties.filter(|min| len < *min) {
            let message = format!("Must contain a minimum of {min} properties");
            fail(out, path, rules, Keyword::MinProperties, message);
        }
        if let Some(max) = rules.max_properties.filter(|max| len > *max) {
            let message = format!("Must contain no more than {max} properties");
            fail(out, path, rules, Keyword::MaxProperties, message);
        }

        for (key, value) in map {
            path.push_key(key);
            let mut declared = false;
            if let Some(id) = rules.properties.get(key) {
                declared = true;
                self.node(*id, value, path, out);
            }
            for (pattern, id) in &rules.pattern_properties {
                if pattern.is_match(key) {
                    declared = true;
                    self.node(*id, value, path, out);
                }
            }
            if !declared {
                match rules.additional_properties {
                    Additional::Allowed => {}
                    Additional::Schema(id) => self.node(id, value, path, out),
                    Additional::Forbidden => {
                        let message = format!(
                            "The property {} is not defined and the definition does not allow additional properties",
                            path.property()
                        );
                        fail(out, path, rules, Keyword::AdditionalProperties, message);
                    }
                }
            }
            if let Some(id) = rules.property_names {
                let name = Value::String(key.clone());
                if !self.passes(id, &name, &mut InstancePath::new()) {
                    let message =
                        format!("Property name {key} does not match the propertyNames schema");
                    fail(out, path, rules, Keyword::PropertyNames, message);
                }
            }
            path.pop();
        }

        for (name, dependency) in &rules.dependencies {
            if !map.contains_key(name) {
                continue;
            }
            match dependency {
                Dependency::Properties(needed) => {
                    for missing in needed.iter().filter(|p| !map.contains_key(p.as_str())) {
                        let message = format!("{name} depends on {missing}, which is missing");
                        fail(out, path, rules, Keyword::Dependencies, message);
                    }
                }
                Dependency::Schema(id) => {
                    self.object_as_value(*id, map, path, out);
                }
            }
        }
    }

    /// Re-apply a schema to the object being checked.
    fn object_as_value<'v>(
        &self,
        id: NodeId,
        map: &'v Map<String, Value>,
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        // Schema-form dependencies need the object as a `Value`; this clone is
        // the only copy the engine makes of instance data.
        let whole = Value::Object(map.clone());
        let mut errors = ErrorCollector::new();
        self.node(id, &whole, &mut InstancePath::new(), &mut errors);
        let prefix = path.pointer();
        let property = path.property();
        out.extend(errors.into_errors().into_iter().map(|mut e| {
            e.pointer = e.pointer.map(|p| format!("{prefix}{p}"));
            e.property = e.property.map(|p| join_property(&property, &p));
            e
        }));
    }

    fn combinators<'v>(
        &self,
        rules: &Rules,
        instance: &'v Value,
        path: &mut InstancePath<'v>,
        out: &mut ErrorCollector,
    ) {
        for id in &rules.all_of {
            self.node(*id, instance, path, out);
        }

        if !rules.any_of.is_empty() && !rules.any_of.iter().any(|id| self.passes(*id, instance, path)) {
            let message = "Failed to match at least one schema".to_string();
            fail(out, path, rules, Keyword::AnyOf, message);
        }

        if !rules.one_of.is_empty() {
            let matched: Vec<usize> = rules
                .one_of
                .iter()
                .enumerate()
                .filter(|(_, id)| self.passes(**id, instance, path))
                .map(|(i, _)| i)
                .collect();
            match matched.len() {
                1 => {}
                0 => fail(
                    out,
                    path,
                    rules,
                    Keyword::OneOf,
                    "Failed to match exactly one schema: none matched".to_string(),
                ),
                _ => {
                    let listed = matched
                        .iter()
                        .map(usize::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    let message = format!(
                        "Failed to match exactly one schema: more than one matched (subschemas {listed})"
                    );
                    fail(out, path, rules, Keyword::OneOf, message);
                }
            }
        }

        if let Some(id) = rules.not {
            if self.passes(id, instance, path) {
                let message = "Matched a schema which it should not".to_string();
                fail(out, path, rules, Keyword::Not, message);
            }
        }

        if let Some(condition) = rules.condition {
            let branch = if self.passes(condition.if_, instance, path) {
                condition.then_
            } else {
                condition.else_
            };
            if let Some(id) = branch {
                self.node(id, instance, path, out);
            }
        }
    }
}

fn fail(
    out: &mut ErrorCollector,
    path: &InstancePath<'_>,
    rules: &Rules,
    keyword: Keyword,
    message: String,
) {
    if out.saturated() {
        return;
    }
    out.push(ValidationError::violation(
        path.pointer(),
        path.property(),
        message,
        keyword,
        &rules.location,
    ));
}

fn below_or_equal(ordering: Option<Ordering>) -> bool {
    matches!(ordering, Some(Ordering::Less | Ordering::Equal))
}

fn above_or_equal(ordering: Option<Ordering>) -> bool {
    matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
}

fn join_property(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty(), rest.starts_with('[')) {
        (true, _, _) => rest.to_string(),
        (false, true, _) => prefix.to_string(),
        (false, false, true) => format!("{prefix}{rest}"),
        (false, false, false) => format!("{prefix}.{rest}"),
    }
}

fn found_name(value: &Value) -> &'static str {
    match JsonType::of(value) {
        JsonType::Null => "Null",
        JsonType::Boolean => "Boolean",
        JsonType::Object => "Object",
        JsonType::Array => "Array",
        JsonType::Number => "Number",
        JsonType::String => "String",
        JsonType::Integer => "Integer",
    }
}

fn with_article(t: JsonType) -> String {
    match t {
        JsonType::Integer | JsonType::Object | JsonType::Array => format!("an {t}"),
        _ => format!("a {t}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use serde_json::json;

    fn errors(schema: Value, instance: Value) -> Vec<ValidationError> {
        let compiled = CompiledSchema::from_value(schema).unwrap();
        compiled.validate(&instance).err().unwrap_or_default()
    }

    fn single(schema: Value, instance: Value) -> ValidationError {
        let mut all = errors(schema, instance);
        assert_eq!(all.len(), 1, "{all:?}");
        all.remove(0)
    }

    #[test]
    fn type_mismatch_message_and_pointer() {
        let e = single(
            json!({"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}}),
            json!({"id": "abc"}),
        );
        assert_eq!(e.pointer.as_deref(), Some("/id"));
        assert_eq!(e.property.as_deref(), Some("id"));
        assert_eq!(e.constraint, Some(Keyword::Type));
        assert_eq!(e.message, "String value found, but an integer is required");
        assert_eq!(e.schema_path.as_deref(), Some("mem:///schema.json#/properties/id"));
    }

    #[test]
    fn type_mismatch_skips_value_checks() {
        let e = single(json!({"type": "string", "minLength": 3, "enum": ["abc"]}), json!(12));
        assert_eq!(e.constraint, Some(Keyword::Type));
        assert_eq!(e.message, "Integer value found, but a string is required");
    }

    #[test]
    fn multiple_types_listed() {
        let e = single(json!({"type": ["string", "null"]}), json!(1.5));
        assert_eq!(e.message, "Number value found, but a string or a null is required");
    }

    #[test]
    fn integer_accepts_integral_floats() {
        assert!(errors(json!({"type": "integer"}), json!(1.0)).is_empty());
        let draft4 = json!({"$schema": "http://json-schema.org/draft-04/schema#", "type": "integer"});
        assert_eq!(single(draft4.clone(), json!(1.0)).constraint, Some(Keyword::Type));
        let huge = jval_core::decode("100000000000000000000").unwrap();
        assert!(errors(draft4, huge).is_empty());
    }

    #[test]
    fn numeric_bounds() {
        assert_eq!(
            single(json!({"minimum": 5}), json!(4)).message,
            "Must have a minimum value of 5"
        );
        assert!(errors(json!({"minimum": 5}), json!(5.0)).is_empty());
        assert_eq!(
            single(json!({"exclusiveMaximum": 10}), json!(10)).constraint,
            Some(Keyword::ExclusiveMaximum)
        );
        let draft4 = json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "minimum": 5,
            "exclusiveMinimum": true
        });
        assert_eq!(single(draft4, json!(5)).constraint, Some(Keyword::ExclusiveMinimum));
        assert!(errors(json!({"maximum": 18446744073709551615u64}), json!(18446744073709551615u64)).is_empty());
    }

    #[test]
    fn multiple_of() {
        assert!(errors(json!({"multipleOf": 0.1}), json!(0.3)).is_empty());
        assert!(errors(json!({"multipleOf": 3}), json!(9)).is_empty());
        assert!(errors(json!({"multipleOf": 0.01}), json!(1234567.89)).is_empty());
        assert_eq!(
            single(json!({"multipleOf": 0.01}), json!(1234567.891)).constraint,
            Some(Keyword::MultipleOf)
        );
        assert_eq!(single(json!({"multipleOf": 3}), json!(10)).message, "Is not a multiple of 3");
        assert_eq!(
            single(json!({"multipleOf": 1e-300}), json!(1e300)).constraint,
            Some(Keyword::MultipleOf)
        );
    }

    #[test]
    fn string_length_counts_scalar_values() {
        assert!(errors(json!({"maxLength": 2}), json!("é😀")).is_empty());
        assert_eq!(
            single(json!({"minLength": 3}), json!("ab")).message,
            "Must be at least 3 characters long"
        );
    }

    #[test]
    fn pattern_and_format() {
        let e = single(json!({"pattern": "^[a-z]+$"}), json!("ABC"));
        assert_eq!(e.message, "Does not match the regex pattern ^[a-z]+$");
        let e = single(json!({"format": "date"}), json!("2024-13-01"));
        assert_eq!(e.constraint, Some(Keyword::Format));
        assert!(errors(json!({"format": "date"}), json!(20240101)).is_empty());
        let unchecked = Compiler::default()
            .validate_formats(false)
            .compile_value(json!({"format": "date"}))
            .unwrap();
        assert!(unchecked.is_valid(&json!("nope")));
    }

    #[test]
    fn enum_and_const_numeric_equality() {
        assert!(errors(json!({"enum": [1, "a"]}), json!(1.0)).is_empty());
        assert!(errors(json!({"const": {"a": [1]}}), json!({"a": [1.0]})).is_empty());
        let e = single(json!({"enum": ["a", "b"]}), json!("c"));
        assert_eq!(e.message, r#"Does not have a value in the enumeration ["a","b"]"#);
        assert_eq!(single(json!({"const": 2}), json!(3)).constraint, Some(Keyword::Const));
    }

    #[test]
    fn unique_items_numeric_equality() {
        let e = single(json!({"uniqueItems": true}), json!([1, 1.0]));
        assert_eq!(e.constraint, Some(Keyword::UniqueItems));
        assert_eq!(e.pointer.as_deref(), Some(""));
        assert!(errors(json!({"uniqueItems": true}), json!([1, "1", [1], {"a": 1}])).is_empty());
    }

    #[test]
    fn tuple_items_and_additional_items() {
        let schema = json!({"items": [{"type": "string"}, {"type": "integer"}], "additionalItems": false});
        assert!(errors(schema.clone(), json!(["a", 1])).is_empty());
        let e = single(schema.clone(), json!(["a", 1, true]));
        assert_eq!(e.pointer.as_deref(), Some("/2"));
        assert_eq!(e.property.as_deref(), Some("[2]"));
        assert_eq!(e.constraint, Some(Keyword::AdditionalItems));
        let e = single(schema, json!([1]));
        assert_eq!(e.pointer.as_deref(), Some("/0"));
    }

    #[test]
    fn array_sizes_and_contains() {
        assert_eq!(single(json!({"minItems": 2}), json!([1])).constraint, Some(Keyword::MinItems));
        assert_eq!(single(json!({"maxItems": 1}), json!([1, 2])).constraint, Some(Keyword::MaxItems));
        assert!(errors(json!({"contains": {"const": 2}}), json!([1, 2])).is_empty());
        let e = single(json!({"contains": {"const": 2}}), json!([1, 3]));
        assert_eq!(e.constraint, Some(Keyword::Contains));
        assert_eq!(e.pointer.as_deref(), Some(""));
    }

    #[test]
    fn required_points_at_object() {
        let e = single(
            json!({"properties": {"a": {"required": ["b"]}}}),
            json!({"a": {}}),
        );
        assert_eq!(e.pointer.as_deref(), Some("/a"));
        assert_eq!(e.message, "The property a.b is required");
    }

    #[test]
    fn additional_properties_point_at_key() {
        let schema = json!({
            "properties": {"id": {}},
            "patternProperties": {"^x-": {"type": "string"}},
            "additionalProperties": false
        });
        assert!(errors(schema.clone(), json!({"id": 1, "x-note": "n"})).is_empty());
        let e = single(schema.clone(), json!({"id": 1, "extra/key": 2}));
        assert_eq!(e.pointer.as_deref(), Some("/extra~1key"));
        assert_eq!(e.constraint, Some(Keyword::AdditionalProperties));
        let e = single(schema, json!({"x-note": 5}));
        assert_eq!(e.constraint, Some(Keyword::Type));
    }

    #[test]
    fn all_matching_pattern_properties_apply() {
        let schema = json!({"patternProperties": {"^a": {"minLength": 2}, "b$": {"maxLength": 2}}});
        let all = errors(schema, json!({"ab": "xyz", "a": "q"}));
        let kinds: Vec<_> = all.iter().map(|e| e.constraint).collect();
        assert_eq!(kinds, [Some(Keyword::MaxLength), Some(Keyword::MinLength)]);
    }

    #[test]
    fn additional_properties_schema() {
        let e = single(json!({"additionalProperties": {"type": "integer"}}), json!({"n": "x"}));
        assert_eq!(e.pointer.as_deref(), Some("/n"));
        assert_eq!(e.constraint, Some(Keyword::Type));
    }

    #[test]
    fn property_counts_names_and_dependencies() {
        assert_eq!(
            single(json!({"maxProperties": 1}), json!({"a": 1, "b": 2})).constraint,
            Some(Keyword::MaxProperties)
        );
        let e = single(json!({"propertyNames": {"maxLength": 3}}), json!({"long-name": 1}));
        assert_eq!(e.pointer.as_deref(), Some("/long-name"));
        assert_eq!(e.constraint, Some(Keyword::PropertyNames));

        let e = single(json!({"dependencies": {"card": ["billing"]}}), json!({"card": 1}));
        assert_eq!(e.message, "card depends on billing, which is missing");
        assert_eq!(e.pointer.as_deref(), Some(""));

        let schema = json!({"properties": {"o": {"dependencies": {"a": {"required": ["b"]}}}}});
        let e = single(schema.clone(), json!({"o": {"a": 1}}));
        assert_eq!(e.pointer.as_deref(), Some("/o"));
        assert_eq!(e.property.as_deref(), Some("o"));
        assert!(errors(schema, json!({"o": {"b": 1}})).is_empty());
    }

    #[test]
    fn combinators() {
        let e = single(json!({"anyOf": [{"type": "string"}, {"minimum": 5}]}), json!(1));
        assert_eq!(e.constraint, Some(Keyword::AnyOf));

        let e = single(json!({"oneOf": [{"type": "integer"}, {"minimum": 0}]}), json!(3));
        assert_eq!(e.constraint, Some(Keyword::OneOf));
        assert!(e.message.contains("more than one matched"));
        let e = single(json!({"oneOf": [{"type": "string"}, {"type": "null"}]}), json!(3));
        assert!(e.message.contains("none matched"));

        let e = single(json!({"not": {"type": "string"}}), json!("s"));
        assert_eq!(e.message, "Matched a schema which it should not");

        let all = errors(json!({"allOf": [{"minimum": 5}, {"multipleOf": 2}]}), json!(3));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn combinators_run_after_type_mismatch() {
        let all = errors(json!({"type": "string", "not": {"type": "integer"}}), json!(1));
        let kinds: Vec<_> = all.iter().map(|e| e.constraint).collect();
        assert_eq!(kinds, [Some(Keyword::Type), Some(Keyword::Not)]);
    }

    #[test]
    fn conditional() {
        let schema = json!({
            "if": {"properties": {"kind": {"const": "a"}}},
            "then": {"required": ["alpha"]},
            "else": {"required": ["beta"]}
        });
        assert!(errors(schema.clone(), json!({"kind": "a", "alpha": 1})).is_empty());
        assert_eq!(single(schema.clone(), json!({"kind": "a"})).message, "The property alpha is required");
        assert_eq!(single(schema, json!({"kind": "b"})).message, "The property beta is required");
    }

    #[test]
    fn false_schema() {
        let e = single(json!({"properties": {"gone": false}}), json!({"gone": 1}));
        assert_eq!(e.constraint, Some(Keyword::False));
        assert_eq!(e.pointer.as_deref(), Some("/gone"));
    }

    #[test]
    fn recursive_schema_walks_instance() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {"children": {"type": "array", "items": {"$ref": "#"}}}
        });
        let e = single(schema, json!({"name": "root", "children": [{"name": "a"}, {"children": []}]}));
        assert_eq!(e.pointer.as_deref(), Some("/children/1"));
        assert_eq!(e.property.as_deref(), Some("children[1]"));
        assert_eq!(e.message, "The property children[1].name is required");
    }

    #[test]
    fn is_valid_matches_validate() {
        let compiled = CompiledSchema::from_value(json!({"items": {"type": "integer"}})).unwrap();
        assert!(compiled.is_valid(&json!([1, 2])));
        assert!(!compiled.is_valid(&json!([1, "2", "3"])));
        assert_eq!(compiled.validate(&json!([1, "2", "3"])).unwrap_err().len(), 2);
    }

    #[test]
    fn instance_paths() {
        let doc = json!({"a/b": [{"c~d": 1}]});
        let mut path = InstancePath::new();
        let (key, inner) = doc.as_object().unwrap().iter().next().unwrap();
        path.push_key(key);
        path.push_index(0);
        let (inner_key, _) = inner[0].as_object().unwrap().iter().next().unwrap();
        path.push_key(inner_key);
        assert_eq!(path.pointer(), "/a~1b/0/c~0d");
        assert_eq!(path.property(), "a/b[0].c~d");
        path.pop();
        path.pop();
        path.pop();
        assert_eq!(path.pointer(), "");
        assert_eq!(path.property(), "");
    }
}
