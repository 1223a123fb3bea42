//! Value codec shared by both storage backends
//!
//! Scalar values pass through to the preference table's native
//! representation; every other shape is serialized to a structured JSON
//! blob. The secure store always receives the structured byte encoding.
//!
//! No type tag is persisted. Callers must load with the same logical type
//! they saved; a mismatched type yields [`StorageError::DecodingFailed`]
//! wherever the stored shape and the requested one do not overlap.

use serde::de::DeserializeOwned;
use serde::ser::{self, Impossible};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StorageError};

/// Native representation the preference table holds per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Raw or structured byte payload, base64 in the table file.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

/// Encode a value into the representation the preference table stores.
///
/// Booleans, integers fitting `i64`, floats, text, and byte-shaped values
/// take the native scalar path; everything else becomes a structured blob.
pub fn to_raw<T: Serialize>(value: &T) -> Result<RawValue> {
    match value.serialize(ScalarSerializer) {
        Ok(raw) => Ok(raw),
        Err(NotScalar) => Ok(RawValue::Bytes(to_bytes(value)?)),
    }
}

/// Decode a value from its native representation.
pub fn from_raw<T: DeserializeOwned>(raw: &RawValue) -> Result<T> {
    let value = match raw {
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Int(i) => Value::from(*i),
        RawValue::Float(f) => Value::from(*f),
        RawValue::Text(s) => Value::String(s.clone()),
        RawValue::Bytes(bytes) => {
            return match serde_json::from_slice(bytes) {
                Ok(decoded) => Ok(decoded),
                Err(json_err) => {
                    // Raw (non-JSON) payloads can still satisfy byte-shaped targets.
                    let de = serde::de::value::BytesDeserializer::<serde::de::value::Error>::new(
                        bytes,
                    );
                    T::deserialize(de).map_err(|_| StorageError::DecodingFailed(json_err))
                }
            };
        }
    };
    T::deserialize(value).map_err(StorageError::DecodingFailed)
}

/// Structured byte encoding used by the secure store.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(StorageError::EncodingFailed)
}

/// Decode the structured byte encoding.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(StorageError::DecodingFailed)
}

/// Serializer accepting only scalar shapes; compound values bail out so the
/// caller can fall back to the structured encoding.
struct ScalarSerializer;

#[derive(Debug)]
struct NotScalar;

impl std::fmt::Display for NotScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("value is not a native scalar")
    }
}

impl std::error::Error for NotScalar {}

impl ser::Error for NotScalar {
    fn custom<T: std::fmt::Display>(_msg: T) -> Self {
        NotScalar
    }
}

type ScalarResult = std::result::Result<RawValue, NotScalar>;

macro_rules! scalar_int {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> ScalarResult {
                Ok(RawValue::Int(v as i64))
            }
        )*
    };
}

impl ser::Serializer for ScalarSerializer {
    type Ok = RawValue;
    type Error = NotScalar;

    type SerializeSeq = Impossible<RawValue, NotScalar>;
    type SerializeTuple = Impossible<RawValue, NotScalar>;
    type SerializeTupleStruct = Impossible<RawValue, NotScalar>;
    type SerializeTupleVariant = Impossible<RawValue, NotScalar>;
    type SerializeMap = Impossible<RawValue, NotScalar>;
    type SerializeStruct = Impossible<RawValue, NotScalar>;
    type SerializeStructVariant = Impossible<RawValue, NotScalar>;

    fn serialize_bool(self, v: bool) -> ScalarResult {
        Ok(RawValue::Bool(v))
    }

    scalar_int!(
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
    );

    fn serialize_u64(self, v: u64) -> ScalarResult {
        i64::try_from(v).map(RawValue::Int).map_err(|_| NotScalar)
    }

    fn serialize_f32(self, v: f32) -> ScalarResult {
        Ok(RawValue::Float(v as f64))
    }

    fn serialize_f64(self, v: f64) -> ScalarResult {
        Ok(RawValue::Float(v))
    }

    fn serialize_char(self, v: char) -> ScalarResult {
        Ok(RawValue::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> ScalarResult {
        Ok(RawValue::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> ScalarResult {
        Ok(RawValue::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> ScalarResult {
        Err(NotScalar)
    }

    fn serialize_some<T>(self, value: &T) -> ScalarResult
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ScalarSerializer)
    }

    fn serialize_unit(self) -> ScalarResult {
        Err(NotScalar)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ScalarResult {
        Err(NotScalar)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> ScalarResult {
        Err(NotScalar)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> ScalarResult
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ScalarSerializer)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> ScalarResult
    where
        T: ?Sized + Serialize,
    {
        Err(NotScalar)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self::SerializeSeq, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, NotScalar> {
        Err(NotScalar)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, NotScalar> {
        Err(NotScalar)
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
