use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::event::{MetricEvent, MetricKind, MetricValue};

/// Field holding the raw metric name.
pub const METRIC_FIELD: &str = "metric";

/// Field holding the metric value.
pub const VALUE_FIELD: &str = "value";

/// Field holding the metric kind: `gauge`, `counter` or `histogram`.
pub const MTYPE_FIELD: &str = "mtype";

/// Field holding the metric tags.
pub const TAGS_FIELD: &str = "tags";

/// Extra structured fields attached to a log call.
///
/// Besides being handed to the base logger, the fields double as a metric side channel: see [`metric_event`].
pub type Fields = IndexMap<String, FieldValue>;

/// A single structured field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A string.
    Str(String),

    /// A signed integer.
    Int(i64),

    /// An unsigned integer.
    UInt(u64),

    /// A floating-point number.
    Float(f64),

    /// A boolean.
    Bool(bool),

    /// A list of strings.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns `true` if the value counts as "set": non-empty strings and lists, non-zero numbers and `true`.
    #[allow(clippy::float_cmp)]
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Str(s) => !s.is_empty(),
            FieldValue::Int(v) => *v != 0,
            FieldValue::UInt(v) => *v != 0,
            FieldValue::Float(v) => *v != 0.0,
            FieldValue::Bool(b) => *b,
            FieldValue::List(l) => !l.is_empty(),
        }
    }

    /// Returns a short name for the value's type.
    pub const fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "integer",
            FieldValue::UInt(_) => "unsigned integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "boolean",
            FieldValue::List(_) => "list",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::List(l) => write!(f, "[{}]", l.join(",")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::UInt(u64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(l: Vec<String>) -> Self {
        FieldValue::List(l)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(l: Vec<&str>) -> Self {
        FieldValue::List(l.into_iter().map(str::to_string).collect())
    }
}

/// Errors for a malformed metric side channel.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    /// The metric name was not a string.
    #[error("metric name must be a string, found {found}")]
    InvalidName {
        /// Type of the value found.
        found: &'static str,
    },

    /// The metric value was not numeric.
    #[error("metric value must be numeric, found `{found}`")]
    InvalidValue {
        /// The value found.
        found: String,
    },

    /// The tags were neither a list nor a single string.
    #[error("metric tags must be a list or a string, found {found}")]
    InvalidTags {
        /// Type of the value found.
        found: &'static str,
    },
}

fn truthy<'a>(fields: &'a Fields, key: &str) -> Option<&'a FieldValue> {
    fields.get(key).filter(|value| value.is_truthy())
}

fn parse_value(value: &FieldValue) -> Result<MetricValue, FieldError> {
    match value {
        FieldValue::Int(v) => Ok(MetricValue::Integer(*v)),
        FieldValue::UInt(v) => Ok(MetricValue::Unsigned(*v)),
        FieldValue::Float(v) => Ok(MetricValue::Float(*v)),
        FieldValue::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(MetricValue::Integer)
                .or_else(|_| s.parse::<f64>().map(MetricValue::Float))
                .map_err(|_| FieldError::InvalidValue { found: s.to_string() })
        }
        other => Err(FieldError::InvalidValue { found: other.to_string() }),
    }
}

fn parse_tags(value: &FieldValue) -> Result<Vec<String>, FieldError> {
    match value {
        FieldValue::List(tags) => Ok(tags.clone()),
        FieldValue::Str(tag) => Ok(vec![tag.clone()]),
        other => Err(FieldError::InvalidTags { found: other.type_name() }),
    }
}

/// Extracts the metric carried by a set of fields, if any.
///
/// A metric is present when the `metric`, `value` and `mtype` fields are all set and truthy. A zero `value` therefore
/// carries no metric. An `mtype` that doesn't name a known [`MetricKind`] carries no metric either.
///
/// # Errors
///
/// If the fields carry a metric but the name, value or tags have the wrong shape, an error is returned describing the
/// malformed field.
pub fn metric_event(fields: &Fields) -> Result<Option<MetricEvent>, FieldError> {
    let (Some(metric), Some(value), Some(mtype)) =
        (truthy(fields, METRIC_FIELD), truthy(fields, VALUE_FIELD), truthy(fields, MTYPE_FIELD))
    else {
        return Ok(None);
    };

    let kind = match mtype {
        FieldValue::Str(name) => MetricKind::from_name(name),
        _ => None,
    };
    let Some(kind) = kind else {
        return Ok(None);
    };

    let name = match metric {
        FieldValue::Str(name) => name.clone(),
        other => return Err(FieldError::InvalidName { found: other.type_name() }),
    };
    let value = parse_value(value)?;
    let tags = fields.get(TAGS_FIELD).map(parse_tags).transpose()?;

    Ok(Some(MetricEvent { name, value, kind, tags, sampling_rate: None }))
}
