use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types usable as OpenAI strict structured output. Blanket-implemented for every
/// `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema: every object closed (`additionalProperties: false`), every
    /// property listed in `required` (nullable ones included), no `$ref`s.
    fn openai_schema() -> Value {
        let root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let definitions = root
            .get("definitions")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut strict = strictify(root, &definitions);
        if let Value::Object(map) = &mut strict {
            map.remove("definitions");
            map.remove("$schema");
        }
        strict
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// One recursive pass: resolve `$ref`s, unwrap single-element `allOf` wrappers, then
/// close objects and require all their properties.
fn strictify(value: Value, definitions: &Map<String, Value>) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(resolved) = resolve_ref(&map, definitions) {
                return strictify(resolved, definitions);
            }
            if let Some(unwrapped) = unwrap_all_of(&map) {
                return strictify(unwrapped, definitions);
            }

            let mut out: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| {
                    if k == "definitions" {
                        (k, v)
                    } else {
                        (k, strictify(v, definitions))
                    }
                })
                .collect();

            if out.get("type").and_then(Value::as_str) == Some("object") {
                let required: Vec<Value> = out
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect())
                    .unwrap_or_default();
                out.insert("additionalProperties".into(), Value::Bool(false));
                if out.contains_key("properties") {
                    out.insert("required".into(), Value::Array(required));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| strictify(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

fn resolve_ref(map: &Map<String, Value>, definitions: &Map<String, Value>) -> Option<Value> {
    let name = map.get("$ref")?.as_str()?.strip_prefix("#/definitions/")?;
    let target = definitions.get(name)?.clone();
    Some(with_siblings(target, map, "$ref"))
}

/// `{"allOf": [X], "description": ...}` becomes X with the wrapper's sibling keys.
fn unwrap_all_of(map: &Map<String, Value>) -> Option<Value> {
    let [single] = map.get("allOf")?.as_array()?.as_slice() else {
        return None;
    };
    Some(with_siblings(single.clone(), map, "allOf"))
}

/// Copy the wrapper's keys (except `skip`) onto `target` where it lacks them.
fn with_siblings(mut target: Value, wrapper: &Map<String, Value>, skip: &str) -> Value {
    if let Value::Object(inner) = &mut target {
        for (k, v) in wrapper.iter().filter(|(k, _)| k.as_str() != skip) {
            inner.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
    target
}
