use std::{error::Error as StdError, io, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    access::{Request, RequestContext, Response},
    base::{BaseLogger, Level, LogError},
    fields::Fields,
    forwarder::MetricSink,
};

/// Something a test double saw, in the order it saw it.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Log { level: Level, message: String },
    Exception { message: String, error: Option<String> },
    Access { status: String, request_time: Duration },
    Datagram(String),
}

/// Shared, ordered record of base-logger calls and sent datagrams.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl Journal {
    fn push(&self, entry: Entry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    pub fn datagrams(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                Entry::Datagram(datagram) => Some(datagram.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Base logger that journals every call, and optionally fails all of them afterwards.
#[derive(Clone, Debug)]
pub struct RecordingLogger {
    journal: Journal,
    fail: bool,
}

impl RecordingLogger {
    pub fn new(journal: Journal) -> Self {
        RecordingLogger { journal, fail: false }
    }

    pub fn failing(journal: Journal) -> Self {
        RecordingLogger { journal, fail: true }
    }

    fn record(&self, entry: Entry) -> Result<(), LogError> {
        self.journal.push(entry);
        if self.fail {
            Err(LogError::Unavailable { reason: "recording logger set to fail".to_string() })
        } else {
            Ok(())
        }
    }
}

impl BaseLogger for RecordingLogger {
    fn log(&self, level: Level, message: &str, _fields: Option<&Fields>) -> Result<(), LogError> {
        self.record(Entry::Log { level, message: message.to_string() })
    }

    fn access(
        &self,
        response: &Response,
        _request: &Request,
        _context: &RequestContext,
        request_time: Duration,
    ) -> Result<(), LogError> {
        self.record(Entry::Access { status: response.status.clone(), request_time })
    }

    fn exception(
        &self,
        message: &str,
        error: Option<&(dyn StdError + 'static)>,
        _fields: Option<&Fields>,
    ) -> Result<(), LogError> {
        self.record(Entry::Exception { message: message.to_string(), error: error.map(ToString::to_string) })
    }
}

/// Sink that journals every datagram, and optionally fails every send afterwards.
#[derive(Clone, Debug)]
pub struct RecordingSink {
    journal: Journal,
    fail: bool,
}

impl RecordingSink {
    pub fn new(journal: Journal) -> Self {
        RecordingSink { journal, fail: false }
    }

    pub fn failing(journal: Journal) -> Self {
        RecordingSink { journal, fail: true }
    }
}

impl MetricSink for RecordingSink {
    fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.journal.push(Entry::Datagram(String::from_utf8_lossy(datagram).into_owned()));
        if self.fail {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "recording sink set to fail"))
        } else {
            Ok(datagram.len())
        }
    }
}
