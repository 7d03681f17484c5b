use std::{error::Error as StdError, io, sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    access::{Request, RequestContext, Response, StatusLineError},
    base::{duration_ms, BaseLogger, Level, LogError, TracingLogger},
    event::{MetricEvent, MetricKind, MetricValue},
    fields::{metric_event, FieldError, Fields},
    forwarder::MetricSink,
    naming::NamingPolicy,
    writer::{DatagramWriter, EncodeError},
};

/// Sampling rate counters are sent with unless told otherwise.
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;

/// Everything that can go wrong on the way from a facade call to the collector or the base logger.
///
/// None of these ever reach the caller of a [`StatsdLogger`]: they are dropped at the facade boundary.
#[derive(Debug, Error)]
pub(crate) enum EmitError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("failed to send datagram: {0}")]
    Send(#[from] io::Error),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Status(#[from] StatusLineError),

    #[error(transparent)]
    Log(#[from] LogError),
}

/// The boundary where metrics and base-logger failures are dropped. Nothing is logged about them.
#[inline]
pub(crate) fn discard(result: Result<(), EmitError>) {
    drop(result);
}

/// Encoder plus transport, shared between the facade and the handles it hands out as a `metrics` recorder.
pub(crate) struct Emitter {
    writer: DatagramWriter,
    sink: Option<Box<dyn MetricSink>>,
}

impl Emitter {
    pub fn new(writer: DatagramWriter, sink: Option<Box<dyn MetricSink>>) -> Self {
        Emitter { writer, sink }
    }

    /// Encodes and sends one datagram.
    ///
    /// Without a transport nothing is encoded, and nothing is sent.
    pub fn send<F>(&self, encode: F) -> Result<(), EmitError>
    where
        F: FnOnce(&DatagramWriter) -> Result<Vec<u8>, EncodeError>,
    {
        let Some(sink) = self.sink.as_deref() else {
            return Ok(());
        };

        let datagram = encode(&self.writer)?;
        sink.send(&datagram)?;
        Ok(())
    }
}

/// A logger that also reports statsd metrics.
///
/// Every call is handed to the base logger `L` for textual output, and is additionally turned into statsd datagrams
/// sent to the collector:
///
/// - [`critical`][Self::critical], [`error`][Self::error], [`warning`][Self::warning] and
///   [`exception`][Self::exception] increment `log.<level>` after logging
/// - [`log`][Self::log] (and [`info`][Self::info]/[`debug`][Self::debug], which go through it) emits the metric
///   described by its side-channel [`Fields`], if any
/// - [`access`][Self::access] records the request duration, the request count and the count per status code
///
/// Metrics are best-effort: no method returns an error or panics because of the metrics path or the base logger, and
/// without a transport the metric side of every call is a no-op.
///
/// `StatsdLogger` also implements [`metrics::Recorder`], so it can serve the `metrics` macros.
pub struct StatsdLogger<L = TracingLogger> {
    base: L,
    emitter: Arc<Emitter>,
}

impl<L: Clone> Clone for StatsdLogger<L> {
    fn clone(&self) -> Self {
        StatsdLogger { base: self.base.clone(), emitter: Arc::clone(&self.emitter) }
    }
}

impl<L: BaseLogger> StatsdLogger<L> {
    pub(crate) fn new(base: L, writer: DatagramWriter, sink: Option<Box<dyn MetricSink>>) -> Self {
        StatsdLogger { base, emitter: Arc::new(Emitter::new(writer, sink)) }
    }

    pub(crate) fn emitter(&self) -> &Arc<Emitter> {
        &self.emitter
    }

    /// Returns the base logger.
    pub fn base(&self) -> &L {
        &self.base
    }

    /// Returns the naming policy applied to metric names and metadata.
    pub fn naming(&self) -> &NamingPolicy {
        self.emitter.writer.policy()
    }

    /// Returns `true` if a transport to the collector is available.
    pub fn has_transport(&self) -> bool {
        self.emitter.sink.is_some()
    }

    /// Logs a critical message, then increments `log.critical`.
    pub fn critical(&self, message: &str, fields: Option<&Fields>) {
        discard(self.base.critical(message, fields).map_err(Into::into));
        self.increment("log.critical", 1, None);
    }

    /// Logs an error message, then increments `log.error`.
    pub fn error(&self, message: &str, fields: Option<&Fields>) {
        discard(self.base.error(message, fields).map_err(Into::into));
        self.increment("log.error", 1, None);
    }

    /// Logs a warning message, then increments `log.warning`.
    pub fn warning(&self, message: &str, fields: Option<&Fields>) {
        discard(self.base.warning(message, fields).map_err(Into::into));
        self.increment("log.warning", 1, None);
    }

    /// Logs a caught error, then increments `log.exception`.
    pub fn exception(&self, message: &str, error: Option<&(dyn StdError + 'static)>, fields: Option<&Fields>) {
        discard(self.base.exception(message, error, fields).map_err(Into::into));
        self.increment("log.exception", 1, None);
    }

    /// Logs an informational message through [`log`][Self::log].
    pub fn info(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Info, message, fields);
    }

    /// Logs a debug message through [`log`][Self::log].
    pub fn debug(&self, message: &str, fields: Option<&Fields>) {
        self.log(Level::Debug, message, fields);
    }

    /// Logs a message, emitting the metric carried by `fields` first.
    ///
    /// When `fields` set `metric`, `value` and `mtype` (see [`metric_event`]), the matching gauge, counter increment or
    /// histogram is sent. The message then goes to the base logger, unless it is empty: an empty message makes the call
    /// metrics-only.
    pub fn log(&self, level: Level, message: &str, fields: Option<&Fields>) {
        if let Some(fields) = fields {
            discard(self.try_emit_fields(fields));
        }

        if !message.is_empty() {
            discard(self.base.log(level, message, fields).map_err(Into::into));
        }
    }

    fn try_emit_fields(&self, fields: &Fields) -> Result<(), EmitError> {
        match metric_event(fields)? {
            Some(event) => self.try_emit(&event),
            None => Ok(()),
        }
    }

    /// Logs a handled request, then records `request.duration`, `requests` and `request.status.<code>`.
    pub fn access(&self, response: &Response, request: &Request, context: &RequestContext, request_time: Duration) {
        discard(self.base.access(response, request, context, request_time).map_err(Into::into));

        self.histogram("request.duration", duration_ms(request_time), None);
        self.increment("requests", 1, None);
        discard(self.try_count_status(response));
    }

    fn try_count_status(&self, response: &Response) -> Result<(), EmitError> {
        let status_code = response.status_code()?;
        let name = format!("request.status.{status_code}");
        self.emitter.send(|w| w.increment(&name, MetricValue::from(1), None, DEFAULT_SAMPLING_RATE))
    }

    /// Emits a metric event.
    ///
    /// The event's sampling rate is only honored for counters.
    pub fn emit(&self, event: &MetricEvent) {
        discard(self.try_emit(event));
    }

    fn try_emit(&self, event: &MetricEvent) -> Result<(), EmitError> {
        let name = event.name.as_str();
        let tags = event.tags.as_deref();

        self.emitter.send(|w| match event.kind {
            MetricKind::Gauge => w.gauge(name, event.value, tags),
            MetricKind::Counter => {
                w.increment(name, event.value, tags, event.sampling_rate.unwrap_or(DEFAULT_SAMPLING_RATE))
            }
            MetricKind::Histogram => w.histogram(name, event.value, tags),
        })
    }

    /// Sends a gauge.
    pub fn gauge<V: Into<MetricValue>>(&self, name: &str, value: V, tags: Option<&[String]>) {
        let value = value.into();
        discard(self.emitter.send(|w| w.gauge(name, value, tags)));
    }

    /// Increments a counter, at the default sampling rate.
    pub fn increment<V: Into<MetricValue>>(&self, name: &str, value: V, tags: Option<&[String]>) {
        self.increment_with_rate(name, value, tags, DEFAULT_SAMPLING_RATE);
    }

    /// Increments a counter, at the given sampling rate.
    ///
    /// Rates outside of `(0.0, 1.0]` are left off the datagram.
    pub fn increment_with_rate<V: Into<MetricValue>>(
        &self,
        name: &str,
        value: V,
        tags: Option<&[String]>,
        sampling_rate: f64,
    ) {
        let value = value.into();
        discard(self.emitter.send(|w| w.increment(name, value, tags, sampling_rate)));
    }

    /// Decrements a counter, at the default sampling rate.
    pub fn decrement<V: Into<MetricValue>>(&self, name: &str, value: V, tags: Option<&[String]>) {
        self.decrement_with_rate(name, value, tags, DEFAULT_SAMPLING_RATE);
    }

    /// Decrements a counter, at the given sampling rate.
    ///
    /// Rates outside of `(0.0, 1.0]` are left off the datagram.
    pub fn decrement_with_rate<V: Into<MetricValue>>(
        &self,
        name: &str,
        value: V,
        tags: Option<&[String]>,
        sampling_rate: f64,
    ) {
        let value = value.into();
        discard(self.emitter.send(|w| w.decrement(name, value, tags, sampling_rate)));
    }

    /// Sends a histogram, as a millisecond timer.
    pub fn histogram<V: Into<MetricValue>>(&self, name: &str, value: V, tags: Option<&[String]>) {
        let value = value.into();
        discard(self.emitter.send(|w| w.histogram(name, value, tags)));
    }
}
