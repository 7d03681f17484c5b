use thiserror::Error;
use tracing::debug;

use crate::{
    base::{BaseLogger, TracingLogger},
    forwarder::{udp::UdpSink, MetricSink, RemoteAddr},
    logger::StatsdLogger,
    naming::NamingPolicy,
    writer::DatagramWriter,
};

/// Default maximum payload length, in bytes.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 8192;

/// Errors that could occur while building or installing a [`StatsdLogger`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse the remote address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the parsing failure.
        reason: String,
    },

    /// Failed to install the recorder due to an existing global recorder already being installed.
    #[error("failed to install logger as global recorder")]
    FailedToInstall,
}

/// Instrumentation settings, as read from the host's configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentationConfig {
    /// Name of the process. Folded into metric names, or sent as an `app:` tag in tag mode.
    pub process_name: Option<String>,

    /// Whether metadata is sent as statsd tags.
    pub use_tags: bool,

    /// Host and port of the statsd collector. Without one, no metrics are sent.
    pub collector_address: Option<(String, u16)>,
}

enum CollectorAddress {
    Unresolved(String, u16),
    Resolved(RemoteAddr),
}

/// Builder for a [`StatsdLogger`].
///
/// Building never fails: when no collector address is configured, or the transport to it can't be set up, the logger
/// is built without a transport and its metrics are dropped.
pub struct StatsdLoggerBuilder {
    process_name: Option<String>,
    use_tags: bool,
    collector: Option<CollectorAddress>,
    max_payload_len: usize,
}

impl StatsdLoggerBuilder {
    /// Creates a builder from instrumentation settings.
    pub fn from_config(config: InstrumentationConfig) -> Self {
        let mut builder = Self::default().with_tags(config.use_tags);
        builder.process_name = config.process_name;
        match config.collector_address {
            Some(addr) => builder.with_collector_address(addr),
            None => builder,
        }
    }

    /// Sets the process name.
    ///
    /// An empty name, or the reserved `gunicorn`, leaves metric names unqualified by process.
    ///
    /// Defaults to no process name.
    #[must_use]
    pub fn with_process_name<N: Into<String>>(mut self, process_name: N) -> Self {
        self.process_name = Some(process_name.into());
        self
    }

    /// Sets whether metadata is sent as statsd tags.
    ///
    /// In tag mode the process name is sent as an `app:<process name>` tag instead of being folded into metric names.
    ///
    /// Defaults to `false`.
    #[must_use]
    pub fn with_tags(mut self, use_tags: bool) -> Self {
        self.use_tags = use_tags;
        self
    }

    /// Sets the collector to send metrics to, as a host and port.
    ///
    /// The host is resolved when the logger is built. If it can't be resolved, the logger is built without a
    /// transport.
    #[must_use]
    pub fn with_collector_address<H: Into<String>>(mut self, (host, port): (H, u16)) -> Self {
        self.collector = Some(CollectorAddress::Unresolved(host.into(), port));
        self
    }

    /// Sets the collector to send metrics to.
    ///
    /// The address needs to be in the format of `<host>:<port>`, or `<host>` to use the default statsd port of 8125.
    ///
    /// # Errors
    ///
    /// If the given address is not able to be parsed or resolved, an error will be returned indicating the reason.
    pub fn with_remote_address<A>(mut self, addr: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        let remote_addr = RemoteAddr::try_from(addr.as_ref())
            .map_err(|reason| BuildError::InvalidRemoteAddress { reason })?;
        self.collector = Some(CollectorAddress::Resolved(remote_addr));
        Ok(self)
    }

    /// Sets the maximum payload length.
    ///
    /// Metrics that can't be encoded within this length are dropped. Values too small to hold any metric are raised to
    /// the smallest usable length.
    ///
    /// Defaults to 8192 bytes.
    #[must_use]
    pub fn with_maximum_payload_length(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    fn writer(&self) -> DatagramWriter {
        let policy = NamingPolicy::new(self.process_name.clone(), self.use_tags);
        DatagramWriter::new(policy, self.max_payload_len)
    }

    fn connect(&self) -> Option<Box<dyn MetricSink>> {
        let remote_addr = match self.collector.as_ref() {
            None => {
                debug!("No statsd collector address configured. Metrics will not be sent.");
                return None;
            }
            Some(CollectorAddress::Resolved(remote_addr)) => remote_addr.clone(),
            Some(CollectorAddress::Unresolved(host, port)) => match RemoteAddr::resolve(host, *port) {
                Ok(remote_addr) => remote_addr,
                Err(reason) => {
                    debug!(%host, port, %reason, "Failed to resolve statsd collector address. Metrics will not be sent.");
                    return None;
                }
            },
        };

        match UdpSink::connect(&remote_addr) {
            Ok(sink) => Some(Box::new(sink)),
            Err(e) => {
                debug!(error = %e, "Failed to connect to statsd collector. Metrics will not be sent.");
                None
            }
        }
    }

    /// Builds a logger that writes its records through [`tracing`].
    pub fn build(self) -> StatsdLogger {
        self.build_with(TracingLogger)
    }

    /// Builds a logger that writes its records through the given base logger.
    pub fn build_with<L: BaseLogger>(self, base: L) -> StatsdLogger<L> {
        let sink = self.connect();
        StatsdLogger::new(base, self.writer(), sink)
    }

    /// Builds a logger that sends its datagrams to the given sink instead of a UDP socket.
    ///
    /// The configured collector address, if any, is ignored.
    pub fn build_with_sink<L, S>(self, base: L, sink: S) -> StatsdLogger<L>
    where
        L: BaseLogger,
        S: MetricSink + 'static,
    {
        StatsdLogger::new(base, self.writer(), Some(Box::new(sink)))
    }

    /// Builds a logger that writes its records through [`tracing`], and installs it as the global recorder.
    ///
    /// The returned logger shares its transport with the installed recorder.
    ///
    /// # Errors
    ///
    /// If a global recorder is already installed, an error will be returned.
    pub fn install(self) -> Result<StatsdLogger, BuildError> {
        let logger = self.build();

        metrics::set_global_recorder(logger.clone()).map_err(|_| BuildError::FailedToInstall)?;
        Ok(logger)
    }
}

impl Default for StatsdLoggerBuilder {
    fn default() -> Self {
        StatsdLoggerBuilder {
            process_name: None,
            use_tags: false,
            collector: None,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}
