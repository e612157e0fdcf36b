#![deny(missing_docs)]

//! # Schema Normalization
//!
//! Rewrites schema nodes to one spelling before anything is gathered:
//!
//! - boolean schemas become objects (`true` is `{}`, `false` is unsatisfiable);
//! - `nullable` / `x-nullable` flags become a `null` entry in the type list, or an
//!   `anyOf` with a `null` branch when there is no `type` to extend;
//! - `const` becomes a single-value `enum` with an inferred `type`.
//!
//! Only schema positions are rewritten: `components/schemas` and every `schema` or
//! `itemSchema` member of the document, plus the subschemas below them.

use serde_json::{json, Map, Value};

/// Keywords holding a single subschema.
const SUBSCHEMA_KEYS: [&str; 3] = ["items", "not", "contains"];
/// Keywords holding a list of subschemas.
const SUBSCHEMA_LISTS: [&str; 4] = ["allOf", "anyOf", "oneOf", "prefixItems"];
/// Keywords holding a map of named subschemas.
const SUBSCHEMA_MAPS: [&str; 3] = ["properties", "$defs", "patternProperties"];

/// Normalizes every schema position of a document tree.
pub(crate) fn normalize_document(root: &mut Value) {
    if let Some(schemas) = root
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(Value::as_object_mut)
    {
        for schema in schemas.values_mut() {
            normalize_schema(schema);
        }
    }
    find_schema_members(root);
}

fn find_schema_members(node: &mut Value) {
    match node {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                match key.as_str() {
                    "schema" | "itemSchema" => normalize_schema(child),
                    // Already handled, and `examples` are not schemas.
                    "schemas" | "example" | "examples" => {}
                    _ => find_schema_members(child),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(find_schema_members),
        _ => {}
    }
}

/// Normalizes one schema node and everything nested below it.
pub(crate) fn normalize_schema(schema: &mut Value) {
    if let Value::Bool(accepts) = schema {
        *schema = boolean_schema(*accepts);
        return;
    }
    let Value::Object(map) = schema else {
        return;
    };

    if let Some(value) = map.remove("const") {
        const_to_enum(map, value);
    }
    let wrapped = nullable_to_type(map);

    for key in SUBSCHEMA_KEYS {
        if let Some(child) = map.get_mut(key) {
            normalize_schema(child);
        }
    }
    for key in SUBSCHEMA_LISTS {
        if let Some(Value::Array(members)) = map.get_mut(key) {
            members.iter_mut().for_each(normalize_schema);
        }
    }
    for key in SUBSCHEMA_MAPS {
        if let Some(Value::Object(children)) = map.get_mut(key) {
            children.values_mut().for_each(normalize_schema);
        }
    }
    // `additionalProperties: false` keeps its boolean meaning.
    if let Some(extra) = map.get_mut("additionalProperties").filter(|v| v.is_object()) {
        normalize_schema(extra);
    }

    if wrapped {
        let inner = Value::Object(std::mem::take(map));
        *schema = json!({ "anyOf": [inner, { "type": "null" }] });
    }
}

fn boolean_schema(accepts: bool) -> Value {
    if accepts {
        Value::Object(Map::new())
    } else {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["__never__"]
        })
    }
}

fn const_to_enum(map: &mut Map<String, Value>, value: Value) {
    if !map.contains_key("type") {
        let inferred = match &value {
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Null => "null",
        };
        map.insert("type".into(), inferred.into());
    }
    map.entry("enum").or_insert_with(|| Value::Array(vec![value]));
}

/// Folds the legacy flags into the type list.
///
/// Returns `true` when the schema has no `type` and must be wrapped in an `anyOf`
/// with a `null` branch instead.
fn nullable_to_type(map: &mut Map<String, Value>) -> bool {
    let flags: Vec<Value> = ["nullable", "x-nullable"]
        .iter()
        .filter_map(|key| map.remove(*key))
        .collect();
    if !flags.iter().any(|v| v.as_bool() == Some(true)) {
        return false;
    }
    let types = match map.get("type") {
        None => return true,
        Some(Value::String(single)) if single.as_str() != "null" => json!([single, "null"]),
        Some(Value::Array(types)) if !types.iter().any(|t| t == "null") => {
            let mut types = types.clone();
            types.push(Value::from("null"));
            Value::Array(types)
        }
        Some(_) => return false,
    };
    map.insert("type".into(), types);
    false
}
