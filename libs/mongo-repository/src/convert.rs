//! Record sanitizer for external serialization.
//!
//! Lowers BSON wrapper types to plain JSON values, renames internal keys
//! to their public form, and strips internal/meta fields before a record
//! leaves the process.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use mongodb::bson::Bson;
use serde::Serialize;
use serde_json::{Map, Value};

/// Key-rename rule applied during sanitization.
pub enum Keymap {
    /// Static old-name to new-name mapping.
    Map(HashMap<String, String>),
    /// Dynamic rename; `None` means keep the original key.
    Func(Box<dyn Fn(&str) -> Option<String> + Send + Sync>),
}

impl Keymap {
    fn rename(&self, key: &str) -> Option<String> {
        match self {
            Keymap::Map(map) => map.get(key).cloned(),
            Keymap::Func(func) => func(key),
        }
    }
}

pub struct ConvertOptions {
    /// Dot-paths removed from the output, e.g. `"owner.email"`. Array
    /// elements inherit the path of the array field itself.
    pub exclude: Vec<String>,
    /// Keys whose name starts with one of these prefixes are stripped.
    pub exclude_prefixes: Vec<String>,
    pub keymap: Keymap,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            exclude_prefixes: vec!["_".to_string(), "$".to_string()],
            keymap: Keymap::Map(HashMap::from([("_id".to_string(), "id".to_string())])),
        }
    }
}

impl ConvertOptions {
    pub fn exclude(mut self, paths: &[&str]) -> Self {
        self.exclude = paths.iter().map(|path| path.to_string()).collect();
        self
    }
}

/// Sanitize any serializable value into a plain JSON value.
///
/// ObjectIds become hex strings, Decimal128 becomes a native number
/// (accepting precision loss), datetimes become RFC 3339 strings and
/// binary data becomes base64. Key renames run before prefix stripping,
/// so the default `_id` -> `id` rename survives the underscore strip.
///
/// Infallible: values BSON cannot represent fall back to their plain
/// JSON serialization, and anything unserializable becomes `null`.
pub fn convert_object<T: Serialize>(value: &T, options: &ConvertOptions) -> Value {
    let lowered = match mongodb::bson::to_bson(value) {
        Ok(bson) => lower_bson(bson),
        Err(_) => serde_json::to_value(value).unwrap_or(Value::Null),
    };
    sanitize(lowered, options, &[])
}

/// Lower a BSON tree into JSON-safe values.
fn lower_bson(bson: Bson) -> Value {
    match bson {
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, lower_bson(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(lower_bson).collect()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Decimal128(decimal) => {
            let text = decimal.to_string();
            match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(number) => Value::Number(number),
                None => Value::String(text),
            }
        }
        Bson::DateTime(datetime) => match datetime.try_to_rfc3339_string() {
            Ok(rfc3339) => Value::String(rfc3339),
            Err(_) => Value::Number(datetime.timestamp_millis().into()),
        },
        Bson::Binary(binary) => Value::String(BASE64.encode(&binary.bytes)),
        Bson::String(text) => Value::String(text),
        Bson::Boolean(flag) => Value::Bool(flag),
        Bson::Int32(number) => Value::Number(number.into()),
        Bson::Int64(number) => Value::Number(number.into()),
        Bson::Double(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

fn sanitize(value: Value, options: &ConvertOptions, path: &[String]) -> Value {
    match value {
        Value::Object(fields) => {
            let mut sanitized = Map::new();
            for (key, field) in fields {
                let key = options.keymap.rename(&key).unwrap_or(key);
                if options
                    .exclude_prefixes
                    .iter()
                    .any(|prefix| key.starts_with(prefix.as_str()))
                {
                    continue;
                }

                let mut field_path = path.to_vec();
                field_path.push(key.clone());
                if options.exclude.iter().any(|excluded| {
                    excluded
                        .split('.')
                        .eq(field_path.iter().map(String::as_str))
                }) {
                    continue;
                }

                sanitized.insert(key, sanitize(field, options, &field_path));
            }
            Value::Object(sanitized)
        }
        // Elements share the array field's path.
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize(item, options, path))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use mongodb::bson::{DateTime, Decimal128, doc};
    use serde_json::json;

    #[test]
    fn renames_object_id_to_public_key() {
        let oid = ObjectId::new();
        let record = doc! { "_id": oid, "name": "widget" };

        let output = convert_object(&record, &ConvertOptions::default());

        assert_eq!(output["id"], json!(oid.to_hex()));
        assert_eq!(output["name"], json!("widget"));
        assert!(output.get("_id").is_none());
    }

    #[test]
    fn strips_internal_prefixed_fields() {
        let record = doc! { "_secret": "hidden", "$meta": 1, "name": "visible" };

        let output = convert_object(&record, &ConvertOptions::default());

        assert!(output.get("_secret").is_none());
        assert!(output.get("$meta").is_none());
        assert_eq!(output["name"], json!("visible"));
    }

    #[test]
    fn lowers_decimal_to_number() {
        let decimal: Decimal128 = "19.99".parse().unwrap();
        let record = doc! { "price": decimal };

        let output = convert_object(&record, &ConvertOptions::default());

        assert_eq!(output["price"], json!(19.99));
    }

    #[test]
    fn lowers_datetime_to_rfc3339() {
        let record = doc! { "created_at": DateTime::from_millis(0) };

        let output = convert_object(&record, &ConvertOptions::default());

        assert_eq!(output["created_at"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn sanitizes_nested_documents_and_arrays() {
        let record = doc! {
            "items": [
                { "_id": ObjectId::new(), "_internal": true, "label": "a" },
                { "_id": ObjectId::new(), "label": "b" },
            ],
        };

        let output = convert_object(&record, &ConvertOptions::default());

        let items = output["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        for item in items {
            assert!(item.get("id").is_some());
            assert!(item.get("_internal").is_none());
        }
        assert_eq!(items[0]["label"], json!("a"));
    }

    #[test]
    fn excludes_dot_paths_including_array_elements() {
        let record = doc! {
            "owner": { "name": "ada", "email": "ada@example.com" },
            "items": [{ "label": "a", "cost": 5 }],
        };
        let options = ConvertOptions::default().exclude(&["owner.email", "items.cost"]);

        let output = convert_object(&record, &options);

        assert_eq!(output["owner"]["name"], json!("ada"));
        assert!(output["owner"].get("email").is_none());
        assert!(output["items"][0].get("cost").is_none());
        assert_eq!(output["items"][0]["label"], json!("a"));
    }

    #[test]
    fn function_keymap_renames_dynamically() {
        let record = doc! { "internalName": "x", "other": 1 };
        let options = ConvertOptions {
            keymap: Keymap::Func(Box::new(|key| {
                (key == "internalName").then(|| "name".to_string())
            })),
            ..ConvertOptions::default()
        };

        let output = convert_object(&record, &options);

        assert_eq!(output["name"], json!("x"));
        assert_eq!(output["other"], json!(1));
    }

    #[test]
    fn output_survives_json_round_trip() {
        let record = doc! { "_id": ObjectId::new(), "when": DateTime::now() };

        let output = convert_object(&record, &ConvertOptions::default());

        let text = serde_json::to_string(&output).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, output);
    }
}
