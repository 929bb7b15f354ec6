use mongodb::bson::{oid::ObjectId, Bson, DateTime, Document};
use serde::Serialize;
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::fmt;

pub const ID_FIELD: &str = "_id";
pub const PRICE_FIELD: &str = "price";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A path identifier that has already been checked against the ObjectId
/// format (24 hex characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemId(ObjectId);

impl ItemId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        ObjectId::parse_str(raw)
            .map(ItemId)
            .map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Body returned by the create route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

impl InsertResponse {
    pub fn new(inserted_id: Bson) -> Self {
        Self {
            acknowledged: true,
            inserted_id: to_json(inserted_id),
        }
    }
}

/// Turns a caller-supplied JSON object into the document to insert: fields
/// pass through verbatim, a truthy `price` is coerced to a double and
/// `createdAt` is stamped unless the caller provided it.
pub fn prepare_new_item(body: Map<String, Value>) -> Document {
    let mut item = object_to_document(body);

    if let Some(price) = item.get(PRICE_FIELD).filter(|p| is_truthy(p)) {
        let coerced = coerce_price(price);
        item.insert(PRICE_FIELD, Bson::Double(coerced));
    }

    if !item.contains_key(CREATED_AT_FIELD) {
        item.insert(CREATED_AT_FIELD, Bson::DateTime(DateTime::now()));
    }

    item
}

/// Converts JSON to BSON without Extended JSON interpretation, so an object
/// such as `{"$oid": ".."}` is stored as a plain sub-document. Integers take
/// the narrowest of Int32/Int64 and fall back to Double beyond `i64`.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i)
                    .map(Bson::Int32)
                    .unwrap_or(Bson::Int64(i))
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        Value::Array(values) => Bson::Array(values.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(object_to_document(map)),
    }
}

fn object_to_document(map: Map<String, Value>) -> Document {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.insert(key, json_to_bson(value));
    }
    doc
}

/// Mirrors JavaScript truthiness for the values a JSON body can produce.
fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0 && !n.is_nan(),
        Bson::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Converts a price to a double the way `parseFloat` would: numbers pass
/// through, strings are parsed by leading prefix, anything else is NaN.
pub fn coerce_price(value: &Bson) -> f64 {
    match value {
        Bson::Double(n) => *n,
        Bson::Int32(n) => f64::from(*n),
        Bson::Int64(n) => *n as f64,
        Bson::String(s) => parse_float_prefix(s),
        // String([a, b]) is "a,b", so only the first element can contribute.
        Bson::Array(values) => values.first().map(coerce_price).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Parses the longest leading decimal literal of `input`, ignoring leading
/// whitespace and any trailing garbage. Returns NaN when no digits lead.
pub fn parse_float_prefix(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders a stored value the way JSON clients expect it: ObjectIds as hex
/// strings, datetimes as RFC 3339, non-finite doubles as null.
pub fn to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Double(n) if !n.is_finite() => Value::Null,
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(values) => Value::Array(values.into_iter().map(to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: Document) -> Value {
    Value::Object(doc.into_iter().map(|(k, v)| (k, to_json(v))).collect())
}
