use std::{error::Error as StdError, fmt, io, time::Duration};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    access::{Request, RequestContext, Response},
    fields::Fields,
};

/// Log severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// A failure the process is unlikely to recover from.
    Critical,

    /// A failure.
    Error,

    /// Something unexpected that is not a failure.
    Warning,

    /// Routine information.
    Info,

    /// Diagnostic detail.
    Debug,
}

impl Level {
    /// Returns the lowercase level name, as used in `log.<level>` metric names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Critical => "critical",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a base logger can report.
#[derive(Debug, Error)]
pub enum LogError {
    /// Writing the record failed.
    #[error("failed to write log record: {0}")]
    Io(#[from] io::Error),

    /// The logger cannot accept records.
    #[error("logger unavailable: {reason}")]
    Unavailable {
        /// Why the logger is unavailable.
        reason: String,
    },
}

/// The structured logger that a [`StatsdLogger`][crate::StatsdLogger] delegates textual output to.
///
/// Only [`log`][BaseLogger::log] and [`access`][BaseLogger::access] are required. The leveled helpers default to
/// calling `log` with the matching [`Level`].
pub trait BaseLogger: Send + Sync {
    /// Writes a leveled record.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn log(&self, level: Level, message: &str, fields: Option<&Fields>) -> Result<(), LogError>;

    /// Writes an access record for a handled request.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn access(
        &self,
        response: &Response,
        request: &Request,
        context: &RequestContext,
        request_time: Duration,
    ) -> Result<(), LogError>;

    /// Writes a critical record.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn critical(&self, message: &str, fields: Option<&Fields>) -> Result<(), LogError> {
        self.log(Level::Critical, message, fields)
    }

    /// Writes an error record.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn error(&self, message: &str, fields: Option<&Fields>) -> Result<(), LogError> {
        self.log(Level::Error, message, fields)
    }

    /// Writes a warning record.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn warning(&self, message: &str, fields: Option<&Fields>) -> Result<(), LogError> {
        self.log(Level::Warning, message, fields)
    }

    /// Writes an error record about a caught error.
    ///
    /// # Errors
    ///
    /// If the record could not be written, an error is returned.
    fn exception(
        &self,
        message: &str,
        _error: Option<&(dyn StdError + 'static)>,
        fields: Option<&Fields>,
    ) -> Result<(), LogError> {
        self.log(Level::Error, message, fields)
    }
}

/// Renders fields as space-separated `key=value` pairs.
struct DisplayFields<'a>(Option<&'a Fields>);

impl fmt::Display for DisplayFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.into_iter().flatten().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Formats a duration as fractional milliseconds.
pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_micros()) / 1000.0
}

/// A [`BaseLogger`] that writes records as [`tracing`] events.
///
/// Leveled records map onto `tracing` levels, with critical records logged at `ERROR` and marked `critical = true`.
/// Access records are logged at `INFO` under the `access` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl BaseLogger for TracingLogger {
    fn log(&self, level: Level, message: &str, fields: Option<&Fields>) -> Result<(), LogError> {
        let fields = DisplayFields(fields);
        match level {
            Level::Critical => error!(critical = true, fields = %fields, "{}", message),
            Level::Error => error!(fields = %fields, "{}", message),
            Level::Warning => warn!(fields = %fields, "{}", message),
            Level::Info => info!(fields = %fields, "{}", message),
            Level::Debug => debug!(fields = %fields, "{}", message),
        }
        Ok(())
    }

    fn access(
        &self,
        response: &Response,
        request: &Request,
        context: &RequestContext,
        request_time: Duration,
    ) -> Result<(), LogError> {
        let remote_addr = context.remote_addr().unwrap_or("-");
        let target = request.target();

        info!(
            target: "access",
            remote_addr,
            method = %request.method,
            path = %target,
            status = %response.status,
            response_length = response.response_length,
            request_time_ms = duration_ms(request_time),
            user_agent = context.user_agent().unwrap_or("-"),
            referer = context.referer().unwrap_or("-"),
            "{} \"{} {} {}\" {}",
            remote_addr,
            request.method,
            target,
            request.version,
            response.status,
        );
        Ok(())
    }

    fn exception(
        &self,
        message: &str,
        error: Option<&(dyn StdError + 'static)>,
        fields: Option<&Fields>,
    ) -> Result<(), LogError> {
        let fields = DisplayFields(fields);
        match error {
            Some(error) => error!(exception = true, error, fields = %fields, "{}", message),
            None => error!(exception = true, fields = %fields, "{}", message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{duration_ms, DisplayFields, Level};
    use crate::fields::{FieldValue, Fields};

    #[test]
    fn level_names() {
        let cases = [
            (Level::Critical, "critical"),
            (Level::Error, "error"),
            (Level::Warning, "warning"),
            (Level::Info, "info"),
            (Level::Debug, "debug"),
        ];

        for (level, expected) in cases {
            assert_eq!(level.as_str(), expected);
            assert_eq!(level.to_string(), expected);
        }
    }

    #[test]
    fn milliseconds() {
        assert_eq!(duration_ms(Duration::new(1, 500_000_000)), 1500.0);
        assert_eq!(duration_ms(Duration::from_micros(2_250)), 2.25);
        assert_eq!(duration_ms(Duration::ZERO), 0.0);

        // Precision stops at microseconds.
        assert_eq!(duration_ms(Duration::from_nanos(1_999)), 0.001);
    }

    #[test]
    fn display_fields() {
        let mut fields = Fields::new();
        fields.insert("request_id".to_string(), FieldValue::from("abc"));
        fields.insert("attempt".to_string(), FieldValue::from(2));

        assert_eq!(DisplayFields(Some(&fields)).to_string(), "request_id=abc attempt=2");
        assert_eq!(DisplayFields(None).to_string(), "");
    }
}
