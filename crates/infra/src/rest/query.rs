//! Query-string encoding for `batch` commands.
//!
//! Each batch command is a `method?query` string. The portal parses the query
//! PHP-style, so nested parameters are flattened into bracketed keys:
//! `filter[STAGE_ID]=WON&select[0]=ID`.

use bx24_domain::{Params, RemoteCallRequest};
use serde_json::Value;

/// Flatten parameters into an `application/x-www-form-urlencoded` string.
///
/// `null` values are omitted and booleans are sent as `1`/`0`.
pub fn encode_params(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_value(&mut pairs, urlencoding::encode(key).into_owned(), value);
    }
    pairs.join("&")
}

/// Render one request as a batch command string.
pub fn batch_command(request: &RemoteCallRequest) -> String {
    let query = encode_params(request.params());
    if query.is_empty() {
        request.method().to_string()
    } else {
        format!("{}?{}", request.method(), query)
    }
}

fn push_value(pairs: &mut Vec<String>, prefix: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push(format!("{prefix}={}", u8::from(*flag))),
        Value::Number(number) => pairs.push(format!("{prefix}={number}")),
        Value::String(text) => pairs.push(format!("{prefix}={}", urlencoding::encode(text))),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_value(pairs, format!("{prefix}%5B{index}%5D"), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                push_value(pairs, format!("{prefix}%5B{}%5D", urlencoding::encode(key)), item);
            }
        }
    }
}
