//! Deterministic JSON serialization.
//!
//! The canonical form sorts object keys ascending, preserves array order,
//! and uses serde_json's number formatting. It is the input to every content
//! hash, so any change to this module changes every object id.

use serde::Serialize;
use serde_json::Value;

use crate::hasher::HashError;

/// Render a JSON value in canonical form.
///
/// Object keys are emitted in ascending byte order regardless of how the
/// value was built; arrays keep their order; strings are escaped per the
/// JSON spec.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Serialize any value and render it canonically.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, HashError> {
    let json = serde_json::to_value(value).map_err(|e| HashError::Serialization(e.to_string()))?;
    Ok(canonical_json(&json))
}

/// Canonical-form structural equality.
///
/// Values that fail to serialize compare unequal.
pub fn deep_equal<T: Serialize, U: Serialize>(a: &T, b: &U) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(va), Ok(vb)) => canonical_json(&va) == canonical_json(&vb),
        _ => false,
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // serde_json's default map is already key-sorted, but the sort
            // here must not depend on that (the preserve_order feature can
            // be switched on by any crate in the build graph).
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!(42)), "42");
        assert_eq!(canonical_json(&json!("hi")), "\"hi\"");
    }

    #[test]
    fn keys_sorted() {
        let v = json!({"zebra": 1, "alpha": 2, "mid": 3});
        assert_eq!(canonical_json(&v), "{\"alpha\":2,\"mid\":3,\"zebra\":1}");
    }

    #[test]
    fn nested_objects_sorted_recursively() {
        let v = json!({"b": {"y": 1, "x": 2}, "a": [3, {"q": 1, "p": 2}]});
        assert_eq!(
            canonical_json(&v),
            "{\"a\":[3,{\"p\":2,\"q\":1}],\"b\":{\"x\":2,\"y\":1}}"
        );
    }

    #[test]
    fn arrays_preserve_order() {
        let v = json!([3, 1, 2]);
        assert_eq!(canonical_json(&v), "[3,1,2]");
    }

    #[test]
    fn string_escapes() {
        let v = json!("line\nquote\"back\\slash");
        assert_eq!(canonical_json(&v), "\"line\\nquote\\\"back\\\\slash\"");
    }

    #[test]
    fn control_char_escapes() {
        let v = json!("\u{01}");
        assert_eq!(canonical_json(&v), "\"\\u0001\"");
    }

    #[test]
    fn deep_equal_ignores_insertion_order() {
        let a = json!({"x": 1, "y": [1, 2]});
        let b = json!({"y": [1, 2], "x": 1});
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn deep_equal_detects_difference() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert!(!deep_equal(&a, &b));
    }

    #[test]
    fn to_canonical_string_on_struct() {
        #[derive(serde::Serialize)]
        struct S {
            b: u32,
            a: u32,
        }
        // Struct field order does not matter: keys come out sorted.
        let s = to_canonical_string(&S { b: 2, a: 1 }).unwrap();
        assert_eq!(s, "{\"a\":1,\"b\":2}");
    }

    proptest! {
        #[test]
        fn insertion_order_never_affects_canonical_form(
            pairs in proptest::collection::vec(("[a-z]{1,8}", -1000i64..1000), 1..12)
        ) {
            let forward: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            let reverse: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            prop_assert_eq!(
                canonical_json(&Value::Object(forward)),
                canonical_json(&Value::Object(reverse))
            );
        }

        #[test]
        fn canonical_form_roundtrips_through_serde(
            pairs in proptest::collection::vec(("[a-z]{1,8}", -1000i64..1000), 0..12)
        ) {
            let map: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            let rendered = canonical_json(&Value::Object(map.clone()));
            let reparsed: Value = serde_json::from_str(&rendered).unwrap();
            prop_assert_eq!(rendered, canonical_json(&reparsed));
        }
    }
}
