//! Leaf data types: decoding, encoding and conformance checks.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::NodeProps;

/// The data type of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    String,
    /// Signed integer digits.
    Numeric,
    /// Signed digits with an optional decimal sign.
    Decimal,
    /// Digits laid out by the `format` parameter (default `yyyyMMdd`).
    Date,
    /// Digits laid out by the `format` parameter (default `HHmm`).
    Time,
}

impl DataType {
    /// Turn a raw, un-escaped token into the value reported to the sink.
    pub fn decode<'a>(&self, raw: &'a str, decimal_sign: char) -> Cow<'a, str> {
        match self {
            Self::Decimal if decimal_sign != '.' && raw.contains(decimal_sign) => {
                Cow::Owned(raw.replace(decimal_sign, "."))
            }
            _ => Cow::Borrowed(raw),
        }
    }

    /// Inverse of [`DataType::decode`].
    pub fn encode<'a>(&self, value: &'a str, decimal_sign: char) -> Cow<'a, str> {
        match self {
            Self::Decimal if decimal_sign != '.' && value.contains('.') => {
                Cow::Owned(value.replace('.', &decimal_sign.to_string()))
            }
            _ => Cow::Borrowed(value),
        }
    }

    /// Check a decoded value against this type. Returns the reason on failure.
    pub fn check(&self, value: &str, parameters: &IndexMap<String, String>) -> Result<(), String> {
        match self {
            Self::String => Ok(()),
            Self::Numeric => {
                let digits = value.strip_prefix('-').unwrap_or(value);
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err("not a numeric value".to_string())
                }
            }
            Self::Decimal => {
                let unsigned = value.strip_prefix('-').unwrap_or(value);
                let mut parts = unsigned.splitn(2, '.');
                let whole = parts.next().unwrap_or("");
                let fraction = parts.next().unwrap_or("");
                let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
                if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
                    Err("not a decimal value".to_string())
                } else {
                    Ok(())
                }
            }
            Self::Date => check_pattern(value, parameters, "yyyyMMdd"),
            Self::Time => check_pattern(value, parameters, "HHmm"),
        }
    }
}

fn check_pattern(
    value: &str,
    parameters: &IndexMap<String, String>,
    default_format: &str,
) -> Result<(), String> {
    let format = parameters
        .get("format")
        .map(String::as_str)
        .unwrap_or(default_format);
    let width = format.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if value.len() != width || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("does not match format '{format}'"));
    }
    Ok(())
}

/// Check a decoded leaf value against its node's type and length bounds.
pub fn check_value(props: &NodeProps, value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if let Some(min) = props.min_length.filter(|min| length < *min) {
        return Err(format!("length {length} is below the minimum of {min}"));
    }
    if let Some(max) = props.max_length.filter(|max| length > *max) {
        return Err(format!("length {length} exceeds the maximum of {max}"));
    }
    match props.data_type {
        Some(data_type) => data_type.check(value, &props.data_type_parameters),
        None => Ok(()),
    }
}
