//! Scalars that clients send either as JSON numbers or as numeric strings.
//!
//! Used from struct fields with `#[serde(default, deserialize_with =
//! "lenient::deserialize_option")]`. A value that cannot be read as the
//! target type is kept as [`Lenient::Invalid`] so validation can report
//! it next to the other field violations instead of failing the whole body.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Value(T),
    Invalid(String),
}

pub trait Scalar: FromStr + Sized {
    fn from_number(number: &Number) -> Option<Self>;
}

impl Scalar for f64 {
    fn from_number(number: &Number) -> Option<Self> {
        number.as_f64()
    }
}

impl Scalar for i64 {
    fn from_number(number: &Number) -> Option<Self> {
        number.as_i64()
    }
}

pub fn deserialize_option<'de, D, T>(d: D) -> Result<Option<Lenient<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Scalar,
{
    let raw = Option::<Value>::deserialize(d)?;

    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => Some(
            T::from_number(&number)
                .map(Lenient::Value)
                .unwrap_or_else(|| Lenient::Invalid(number.to_string())),
        ),
        Some(Value::String(text)) => Some(match text.trim().parse::<T>() {
            Ok(value) => Lenient::Value(value),
            Err(_) => Lenient::Invalid(text),
        }),
        Some(other) => Some(Lenient::Invalid(other.to_string())),
    })
}
