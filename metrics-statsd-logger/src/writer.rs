use thiserror::Error;

use crate::{event::MetricValue, naming::NamingPolicy};

pub(crate) const SMALLEST_VALID_PAYLOAD: &[u8] = b"a:0|c";

/// Errors that could occur while encoding a datagram.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    /// The raw metric name was empty.
    #[error("metric name is empty")]
    EmptyName,

    /// The value was NaN or infinite.
    #[error("metric value {value} is not finite")]
    NonFiniteValue {
        /// The rejected value.
        value: f64,
    },

    /// The encoded datagram exceeded the maximum payload length.
    #[error("encoded datagram is {len} bytes, exceeding the maximum of {max} bytes")]
    PayloadTooLarge {
        /// Length of the encoded datagram.
        len: usize,

        /// Maximum payload length.
        max: usize,
    },
}

#[derive(Clone, Copy)]
enum MetricType {
    Counter,
    Gauge,
    Timer,
}

impl MetricType {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            MetricType::Counter => b"|c",
            MetricType::Gauge => b"|g",
            MetricType::Timer => b"|ms",
        }
    }
}

/// Literal sign written in front of the value.
#[derive(Clone, Copy)]
enum Sign {
    Implicit,
    Plus,
    Minus,
}

struct MetricValueFormatter {
    int_writer: itoa::Buffer,
    float_writer: ryu::Buffer,
}

impl MetricValueFormatter {
    fn new() -> Self {
        Self { int_writer: itoa::Buffer::new(), float_writer: ryu::Buffer::new() }
    }

    fn format(&mut self, value: MetricValue) -> &str {
        match value {
            MetricValue::Integer(v) => self.int_writer.format(v),
            MetricValue::Unsigned(v) => self.int_writer.format(v),
            MetricValue::Float(v) => self.float_writer.format(v),
        }
    }
}

/// Encodes metrics into statsd datagrams.
///
/// Each datagram holds exactly one metric, in the form `<name>:<value>|<type>[|@<rate>][|#<tag>,...]`, with no trailing
/// newline. Names and metadata follow the writer's [`NamingPolicy`].
#[derive(Clone, Debug)]
pub struct DatagramWriter {
    policy: NamingPolicy,
    max_payload_len: usize,
}

impl DatagramWriter {
    /// Creates a new `DatagramWriter` with the given naming policy and maximum payload length.
    ///
    /// Maximum payload lengths too small to hold any metric are raised to the smallest valid length.
    pub fn new(policy: NamingPolicy, max_payload_len: usize) -> Self {
        DatagramWriter { policy, max_payload_len: max_payload_len.max(SMALLEST_VALID_PAYLOAD.len()) }
    }

    /// Returns the naming policy.
    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    /// Returns the maximum payload length.
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    fn try_write(
        &self,
        name: &str,
        sign: Sign,
        value: MetricValue,
        metric_type: MetricType,
        maybe_sample_rate: Option<f64>,
        tags: Option<&[String]>,
    ) -> Result<Vec<u8>, EncodeError> {
        if name.is_empty() {
            return Err(EncodeError::EmptyName);
        }

        if !value.is_finite() {
            return Err(EncodeError::NonFiniteValue { value: value.as_f64() });
        }

        let mut formatter = MetricValueFormatter::new();
        let value_str = formatter.format(value);

        let mut buf = Vec::with_capacity(64);
        self.policy.write_name(&mut buf, name);

        buf.push(b':');
        match sign {
            Sign::Implicit => {}
            Sign::Plus => buf.push(b'+'),
            Sign::Minus => buf.push(b'-'),
        }
        buf.extend_from_slice(value_str.as_bytes());

        buf.extend_from_slice(metric_type.as_bytes());
        self.policy.write_meta(&mut buf, maybe_sample_rate, tags);

        if buf.len() > self.max_payload_len {
            return Err(EncodeError::PayloadTooLarge { len: buf.len(), max: self.max_payload_len });
        }

        Ok(buf)
    }

    /// Encodes a gauge.
    pub fn gauge(
        &self,
        name: &str,
        value: MetricValue,
        tags: Option<&[String]>,
    ) -> Result<Vec<u8>, EncodeError> {
        self.try_write(name, Sign::Implicit, value, MetricType::Gauge, None, tags)
    }

    /// Encodes a relative gauge adjustment, such as `+2.0` or `-0.5`.
    pub fn gauge_delta(
        &self,
        name: &str,
        delta: f64,
        tags: Option<&[String]>,
    ) -> Result<Vec<u8>, EncodeError> {
        let sign = if delta.is_sign_negative() { Sign::Minus } else { Sign::Plus };
        self.try_write(name, sign, MetricValue::Float(delta.abs()), MetricType::Gauge, None, tags)
    }

    /// Encodes a counter increment.
    pub fn increment(
        &self,
        name: &str,
        value: MetricValue,
        tags: Option<&[String]>,
        sampling_rate: f64,
    ) -> Result<Vec<u8>, EncodeError> {
        self.try_write(name, Sign::Implicit, value, MetricType::Counter, Some(sampling_rate), tags)
    }

    /// Encodes a counter decrement.
    ///
    /// The value is negated literally: `3` is written as `-3`.
    pub fn decrement(
        &self,
        name: &str,
        value: MetricValue,
        tags: Option<&[String]>,
        sampling_rate: f64,
    ) -> Result<Vec<u8>, EncodeError> {
        self.try_write(name, Sign::Minus, value, MetricType::Counter, Some(sampling_rate), tags)
    }

    /// Encodes a histogram, sent as a millisecond timer.
    pub fn histogram(
        &self,
        name: &str,
        value: MetricValue,
        tags: Option<&[String]>,
    ) -> Result<Vec<u8>, EncodeError> {
        self.try_write(name, Sign::Implicit, value, MetricType::Timer, None, tags)
    }
}
