//! Descriptor files on disk.
//!
//! Analysis output is a JSON tree of named values; descriptor names inside
//! the engine are the dot-joined paths through that tree.

use mosaicade_descriptor::FeatureVector;
use serde_json::Value;
use tracing::warn;

/// Flattens a JSON descriptor tree into a feature vector.
///
/// Objects nest with dot-joined names, numbers become scalar descriptors,
/// all-numeric arrays become multi-dimensional descriptors. Strings,
/// booleans, and nulls are dropped.
pub fn vector_from_json(value: &Value) -> FeatureVector {
    let mut vector = FeatureVector::new();
    flatten("", value, &mut vector);
    vector
}

fn flatten(prefix: &str, value: &Value, vector: &mut FeatureVector) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&name, child, vector);
            }
        }
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                vector.insert_scalar(prefix, v);
            }
        }
        Value::Array(items) => {
            let values: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if !values.is_empty() && values.len() == items.len() {
                vector.insert(prefix, values);
            } else if !items.is_empty() {
                warn!(descriptor = prefix, "non-numeric array descriptor, skipping");
            }
        }
        Value::Bool(_) | Value::String(_) | Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_flatten_to_dotted_names() {
        let v = vector_from_json(&json!({
            "pitch": { "mean": 220.0, "var": 12.5 },
            "rhythm": { "bpm": 120.0 }
        }));
        assert_eq!(v.scalar("pitch.mean"), Some(220.0));
        assert_eq!(v.scalar("pitch.var"), Some(12.5));
        assert_eq!(v.scalar("rhythm.bpm"), Some(120.0));
    }

    #[test]
    fn numeric_arrays_become_multidimensional_descriptors() {
        let v = vector_from_json(&json!({ "mfcc": { "mean": [1.0, 2.0, 3.0] } }));
        assert_eq!(v.get("mfcc.mean"), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn non_numeric_leaves_are_dropped() {
        let v = vector_from_json(&json!({
            "metadata": { "version": "2.1", "ok": true },
            "pitch": { "mean": 220.0 }
        }));
        assert_eq!(v.len(), 1);
        assert_eq!(v.scalar("pitch.mean"), Some(220.0));
    }
}
