use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::lenient::{self, Lenient};
use crate::domain::models::NewPanelRecord;

pub const SERIAL_LENGTH: usize = 16;

pub const DEFAULT_BRANDS: &[&str] = &[
    "tesla",
    "lg",
    "sunpower",
    "panasonic",
    "canadian solar",
    "jinko",
    "trina",
    "longi",
    "sharp",
    "q cells",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerialError {
    #[error("serial must be exactly 16 characters, got {0}")]
    Length(usize),
    #[error("serial must contain only ASCII letters and digits")]
    Charset,
}

/// Panel serial that passed the format rule.
///
/// The same rule applies at registration and when a serial addresses a
/// panel in a URL path; only the resulting status code differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(String);

impl Serial {
    pub fn parse(raw: &str) -> Result<Self, SerialError> {
        let length = raw.chars().count();
        if length != SERIAL_LENGTH {
            return Err(SerialError::Length(length));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SerialError::Charset);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandAllowList {
    brands: BTreeSet<String>,
}

impl BrandAllowList {
    pub fn new<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            brands: brands
                .into_iter()
                .map(|brand| normalize_brand(brand.as_ref()))
                .filter(|brand| !brand.is_empty())
                .collect(),
        }
    }

    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    /// Returns the stored spelling of `raw` when it names an allowed brand.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let normalized = normalize_brand(raw);
        self.brands.get(&normalized).cloned()
    }
}

impl Default for BrandAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_BRANDS)
    }
}

fn normalize_brand(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field,
                message: message.into(),
            }],
        }
    }
}

fn summary(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(ValidationError { violations: self.0 })
        }
    }
}

/// Registration payload as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRegistration {
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient::deserialize_option")]
    pub longitude: Option<Lenient<f64>>,
    #[serde(default, deserialize_with = "lenient::deserialize_option")]
    pub latitude: Option<Lenient<f64>>,
    #[serde(default)]
    pub brand: Option<String>,
}

impl PanelRegistration {
    pub fn validate(&self, brands: &BrandAllowList) -> Result<NewPanelRecord, ValidationError> {
        let mut violations = Violations::default();

        let serial = match self.serial.as_deref() {
            None => {
                violations.push("serial", "serial is required");
                None
            }
            Some(raw) if raw.trim().is_empty() => {
                violations.push("serial", "serial is required");
                None
            }
            Some(raw) => match Serial::parse(raw) {
                Ok(serial) => Some(serial),
                Err(error) => {
                    violations.push("serial", error.to_string());
                    None
                }
            },
        };

        let longitude = coordinate(&mut violations, "longitude", &self.longitude, 180.0);
        let latitude = coordinate(&mut violations, "latitude", &self.latitude, 90.0);

        let brand = match self.brand.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push("brand", "brand is required");
                None
            }
            Some(raw) => {
                let resolved = brands.resolve(raw);
                if resolved.is_none() {
                    violations.push("brand", format!("unknown brand '{raw}'"));
                }
                resolved
            }
        };

        violations.finish(|| NewPanelRecord {
            serial: serial.map(|s| s.0).unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
            latitude: latitude.unwrap_or_default(),
            brand: brand.unwrap_or_default(),
        })
    }
}

fn coordinate(
    violations: &mut Violations,
    field: &'static str,
    raw: &Option<Lenient<f64>>,
    bound: f64,
) -> Option<f64> {
    match raw {
        None => {
            violations.push(field, format!("{field} is required"));
            None
        }
        Some(Lenient::Invalid(text)) => {
            violations.push(field, format!("'{text}' is not a number"));
            None
        }
        Some(Lenient::Value(value)) if !value.is_finite() || value.abs() > bound => {
            violations.push(field, format!("{field} must be within -{bound}..={bound}"));
            None
        }
        Some(Lenient::Value(value)) => Some(*value),
    }
}
