//! Element props and the object-merge rules shared by props, state and
//! legacy context.

use serde_json::{Map, Value};

/// Arbitrary key/value properties attached to an element.
pub type Props = Map<String, Value>;

/// Convert a JSON value into props.
///
/// Objects are taken as-is, `null` yields empty props. Any other value is
/// not a valid props object and is dropped with a warning.
pub fn props_from(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        Value::Null => Props::new(),
        other => {
            log::warn!("[props] ignoring non-object props: {other}");
            Props::new()
        }
    }
}

/// Merge a component's default props with the props of one element.
///
/// Element props win on key conflict.
pub fn merge_props(defaults: &Props, props: &Props) -> Props {
    let mut merged = defaults.clone();
    for (key, value) in props {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Shallow-merge `overlay` over `base` into a fresh object.
///
/// Keys of `overlay` win. Non-object operands contribute no keys, so the
/// result is always an object.
pub fn assign(base: &Value, overlay: &Value) -> Value {
    let mut merged = Map::new();
    for source in [base, overlay] {
        if let Value::Object(map) = source {
            for (key, value) in map {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}
