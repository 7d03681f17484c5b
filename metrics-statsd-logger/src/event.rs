/// Kind of metric a [`MetricEvent`] is emitted as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// A point-in-time value, sent with the `g` type.
    Gauge,

    /// A tally adjusted by a delta, sent with the `c` type.
    Counter,

    /// A distribution of observed values, sent as a timer with the `ms` type.
    Histogram,
}

impl MetricKind {
    /// Returns the name used for this kind in side-channel fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }

    /// Looks up a kind by its side-channel name.
    ///
    /// Unknown names yield `None` rather than an error: an unrecognized kind is simply not emitted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gauge" => Some(MetricKind::Gauge),
            "counter" => Some(MetricKind::Counter),
            "histogram" => Some(MetricKind::Histogram),
            _ => None,
        }
    }
}

/// A numeric metric value.
///
/// Integers are written without a fractional part, while floating-point values are always written in their shortest
/// round-tripping form with a fractional part or exponent, so `5` and `5.0` stay distinguishable on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    /// A signed integer.
    Integer(i64),

    /// An unsigned integer.
    Unsigned(u64),

    /// A floating-point number.
    Float(f64),
}

impl MetricValue {
    /// Returns `true` if the value can be written to the wire.
    pub fn is_finite(self) -> bool {
        match self {
            MetricValue::Integer(_) | MetricValue::Unsigned(_) => true,
            MetricValue::Float(v) => v.is_finite(),
        }
    }

    pub(crate) fn as_f64(self) -> f64 {
        match self {
            MetricValue::Integer(v) => v as f64,
            MetricValue::Unsigned(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Integer(i64::from(v))
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Integer(v)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Unsigned(u64::from(v))
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Unsigned(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// A single metric to emit.
///
/// Events are transient: they are built and consumed within one call and never queued.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricEvent {
    /// Raw metric name, before qualification.
    pub name: String,

    /// Metric value.
    pub value: MetricValue,

    /// Metric kind.
    pub kind: MetricKind,

    /// Tags to attach when tag mode is enabled.
    pub tags: Option<Vec<String>>,

    /// Sampling rate. Only honored for counters, where an absent rate means the default of `1.0`.
    pub sampling_rate: Option<f64>,
}

impl MetricEvent {
    /// Creates an untagged, unsampled event.
    pub fn new<N, V>(name: N, value: V, kind: MetricKind) -> Self
    where
        N: Into<String>,
        V: Into<MetricValue>,
    {
        MetricEvent { name: name.into(), value: value.into(), kind, tags: None, sampling_rate: None }
    }

    /// Sets the tags of this event.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the sampling rate of this event.
    #[must_use]
    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = Some(sampling_rate);
        self
    }
}
