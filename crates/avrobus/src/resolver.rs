//! Schema resolution
//!
//! Picks the Avro schema that describes a value handed to the encoder:
//!
//! - the eight primitive kinds map to schemas built once per encoder
//! - self-describing values bring their own schema
//! - anything else is a caller bug and panics
//!
//! # Example
//!
//! ```rust,ignore
//! use avrobus::resolver::{Datum, SchemaResolver};
//!
//! let resolver = SchemaResolver::new();
//! let datum = Datum::from(42i64);
//! assert_eq!(resolver.resolve(&datum), &apache_avro::Schema::Long);
//! ```

use crate::error::CodecResult;
use apache_avro::types::Value;
use apache_avro::Schema;
use serde::Serialize;

const UNSUPPORTED_TYPE: &str = "unsupported Avro type: supported types are null, boolean, int, \
     long, float, double, string, bytes and self-describing records";

/// A value that carries its own Avro schema
///
/// Implemented by record types; the schema usually lives in a `static` so it
/// outlives every encode call.
///
/// ```rust,ignore
/// static METRIC_SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::parse_str(RAW).unwrap());
///
/// #[derive(Serialize, Deserialize)]
/// struct Metric { id: i64, timings: Vec<i64> }
///
/// impl AvroRecord for Metric {
///     fn schema(&self) -> &Schema { &METRIC_SCHEMA }
/// }
/// ```
pub trait AvroRecord: Serialize {
    fn schema(&self) -> &Schema;
}

/// A value handed to the encoder
#[derive(Debug, Clone, PartialEq)]
pub enum Datum<'a> {
    /// Plain value; its schema is picked from its primitive kind
    Value(Value),
    /// Self-describing value
    Described { schema: &'a Schema, value: Value },
}

impl<'a> Datum<'a> {
    /// Explicit Avro null, framed like any other value
    pub fn null() -> Datum<'static> {
        Datum::Value(Value::Null)
    }

    pub fn described(schema: &'a Schema, value: Value) -> Self {
        Datum::Described { schema, value }
    }

    /// Convert a typed record through serde
    pub fn from_record<R: AvroRecord + ?Sized>(record: &'a R) -> CodecResult<Self> {
        let value = apache_avro::to_value(record)?;
        Ok(Datum::Described {
            schema: record.schema(),
            value,
        })
    }

    pub fn value(&self) -> &Value {
        match self {
            Datum::Value(value) | Datum::Described { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Datum::Value(value) | Datum::Described { value, .. } => value,
        }
    }
}

impl From<Value> for Datum<'static> {
    fn from(value: Value) -> Self {
        Datum::Value(value)
    }
}

impl From<()> for Datum<'static> {
    fn from(_: ()) -> Self {
        Datum::Value(Value::Null)
    }
}

impl From<bool> for Datum<'static> {
    fn from(b: bool) -> Self {
        Datum::Value(Value::Boolean(b))
    }
}

impl From<i32> for Datum<'static> {
    fn from(i: i32) -> Self {
        Datum::Value(Value::Int(i))
    }
}

impl From<i64> for Datum<'static> {
    fn from(l: i64) -> Self {
        Datum::Value(Value::Long(l))
    }
}

impl From<f32> for Datum<'static> {
    fn from(f: f32) -> Self {
        Datum::Value(Value::Float(f))
    }
}

impl From<f64> for Datum<'static> {
    fn from(d: f64) -> Self {
        Datum::Value(Value::Double(d))
    }
}

impl From<String> for Datum<'static> {
    fn from(s: String) -> Self {
        Datum::Value(Value::String(s))
    }
}

impl From<&str> for Datum<'static> {
    fn from(s: &str) -> Self {
        Datum::Value(Value::String(s.to_string()))
    }
}

impl From<Vec<u8>> for Datum<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Datum::Value(Value::Bytes(bytes))
    }
}

impl From<&[u8]> for Datum<'static> {
    fn from(bytes: &[u8]) -> Self {
        Datum::Value(Value::Bytes(bytes.to_vec()))
    }
}

/// The primitive kinds with a precomputed schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null = 0,
    Boolean = 1,
    Int = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    String = 6,
    Bytes = 7,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Null,
        PrimitiveKind::Boolean,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::String,
        PrimitiveKind::Bytes,
    ];

    /// Kind of a plain value, `None` for anything that is not primitive
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(PrimitiveKind::Null),
            Value::Boolean(_) => Some(PrimitiveKind::Boolean),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            Value::String(_) => Some(PrimitiveKind::String),
            Value::Bytes(_) => Some(PrimitiveKind::Bytes),
            _ => None,
        }
    }

    /// Avro type name
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    fn schema(&self) -> Schema {
        match self {
            PrimitiveKind::Null => Schema::Null,
            PrimitiveKind::Boolean => Schema::Boolean,
            PrimitiveKind::Int => Schema::Int,
            PrimitiveKind::Long => Schema::Long,
            PrimitiveKind::Float => Schema::Float,
            PrimitiveKind::Double => Schema::Double,
            PrimitiveKind::String => Schema::String,
            PrimitiveKind::Bytes => Schema::Bytes,
        }
    }
}

/// Table of primitive schemas, read-only after construction
#[derive(Debug, Clone)]
pub struct PrimitiveSchemas {
    schemas: [Schema; 8],
}

impl PrimitiveSchemas {
    pub fn new() -> Self {
        Self {
            schemas: PrimitiveKind::ALL.map(|kind| kind.schema()),
        }
    }

    pub fn get(&self, kind: PrimitiveKind) -> &Schema {
        &self.schemas[kind as usize]
    }
}

impl Default for PrimitiveSchemas {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps values to the schema that describes them
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    primitives: PrimitiveSchemas,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self {
            primitives: PrimitiveSchemas::new(),
        }
    }

    pub fn primitives(&self) -> &PrimitiveSchemas {
        &self.primitives
    }

    /// Schema describing `datum`
    ///
    /// # Panics
    ///
    /// Panics when a plain value is not one of the primitive kinds, e.g. a
    /// record, array or map without a schema of its own. Such a value cannot
    /// be framed and indicates a bug at the call site.
    pub fn resolve<'a>(&'a self, datum: &Datum<'a>) -> &'a Schema {
        match datum {
            Datum::Described { schema, .. } => *schema,
            Datum::Value(value) => match PrimitiveKind::of(value) {
                Some(kind) => self.primitives.get(kind),
                None => panic!("{} (got {:?})", UNSUPPORTED_TYPE, value_kind(value)),
            },
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Record(_) => "record",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Union(_, _) => "union",
        Value::Enum(_, _) => "enum",
        Value::Fixed(_, _) => "fixed",
        _ => "logical type",
    }
}
