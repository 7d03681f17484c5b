//! A logger that also reports what it logs as [statsd][statsd] metrics.
//!
//! [statsd]: https://github.com/statsd/statsd/blob/master/docs/metric_types.md
//!
//! # Usage
//!
//! ```no_run
//! # use metrics_statsd_logger::{Level, StatsdLoggerBuilder};
//! // First, create a builder.
//! //
//! // The builder decides where metrics go and how they're named: the collector address, the process name, and
//! // whether metadata is sent as statsd tags.
//! let builder = StatsdLoggerBuilder::default()
//!     .with_process_name("worker1")
//!     .with_collector_address(("127.0.0.1", 8125));
//!
//! // Building never fails. If the collector can't be reached, the logger still logs, but sends no metrics.
//! let logger = builder.build();
//!
//! // Logs through `tracing`, then sends `gunicorn.worker1.log.error:1|c|@1.0`.
//! logger.error("upstream went away", None);
//!
//! // Metrics can also be sent directly.
//! logger.gauge("workers", 4, None);
//! ```
//!
//! # What gets sent
//!
//! Every metric name is qualified with the `gunicorn` namespace. When a process name is configured, it is either
//! folded into the name (`gunicorn.<process name>.<name>`) or, in tag mode, sent as an `app:<process name>` tag.
//!
//! - critical, error, warning and exception records each increment `log.<level>` by one
//! - any record can carry a metric in its side-channel [`Fields`], using the `metric`, `value` and `mtype` keys, and a
//!   record with an empty message only sends that metric
//! - access records send the request duration in milliseconds (`request.duration`), a request count (`requests`) and a
//!   count per status code (`request.status.<code>`)
//!
//! Each metric is sent immediately, as a single UDP datagram, without aggregation or batching.
//!
//! # Failures
//!
//! Metrics are best-effort. Encoding errors, send errors and base logger errors are dropped silently, and no logging
//! call ever fails or panics because of them.
//!
//! # The `metrics` crate
//!
//! [`StatsdLogger`] implements [`metrics::Recorder`], so it can be installed as the global recorder (see
//! [`StatsdLoggerBuilder::install`]) to send everything recorded through the `metrics` macros as well. Labels are sent as
//! tags in tag mode.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod access;
pub use self::access::{Request, RequestContext, Response, StatusLineError};

mod base;
pub use self::base::{BaseLogger, Level, LogError, TracingLogger};

mod builder;
pub use self::builder::{BuildError, InstrumentationConfig, StatsdLoggerBuilder, DEFAULT_MAX_PAYLOAD_LEN};

mod event;
pub use self::event::{MetricEvent, MetricKind, MetricValue};

mod fields;
pub use self::fields::{
    metric_event, FieldError, FieldValue, Fields, METRIC_FIELD, MTYPE_FIELD, TAGS_FIELD, VALUE_FIELD,
};

mod forwarder;
pub use self::forwarder::{udp::UdpSink, MetricSink, TransportError, DEFAULT_STATSD_PORT};

mod logger;
pub use self::logger::{StatsdLogger, DEFAULT_SAMPLING_RATE};

mod naming;
pub use self::naming::{NamingPolicy, NAMESPACE};

mod recorder;

mod writer;
pub use self::writer::{DatagramWriter, EncodeError};

#[cfg(test)]
mod test_util;
