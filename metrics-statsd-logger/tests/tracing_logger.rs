use std::{io, sync::Arc, time::Duration};

use metrics_statsd_logger::{FieldValue, Fields, Request, RequestContext, Response, StatsdLoggerBuilder};
use parking_lot::Mutex;

#[derive(Clone, Default)]
struct CapturedOutput {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }
}

impl io::Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: FnOnce()>(f: F) -> String {
    let output = CapturedOutput::default();
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    output.contents()
}

#[test]
fn leveled_records() {
    let output = capture(|| {
        let logger = StatsdLoggerBuilder::default().build();

        let mut fields = Fields::new();
        fields.insert("request_id".to_string(), FieldValue::from("abc"));

        logger.critical("boom", None);
        logger.error("bad gateway", Some(&fields));
        logger.warning("slow request", None);
        logger.info("booting worker", None);
        logger.debug("tick", None);
    });

    let lines: Vec<_> = output.lines().collect();

    // The first line is the build-time notice about the missing collector.
    assert!(lines[0].contains("DEBUG"), "{output}");
    assert!(lines[0].contains("No statsd collector address configured"), "{output}");

    assert!(lines[1].contains("ERROR") && lines[1].contains("boom") && lines[1].contains("critical=true"), "{output}");
    assert!(lines[2].contains("ERROR") && lines[2].contains("bad gateway"), "{output}");
    assert!(lines[2].contains("request_id=abc"), "{output}");
    assert!(!lines[2].contains("critical"), "{output}");
    assert!(lines[3].contains("WARN") && lines[3].contains("slow request"), "{output}");
    assert!(lines[4].contains("INFO") && lines[4].contains("booting worker"), "{output}");
    assert!(lines[5].contains("DEBUG") && lines[5].contains("tick"), "{output}");
}

#[test]
fn exception_records() {
    let output = capture(|| {
        let logger = StatsdLoggerBuilder::default().build();
        let error = io::Error::new(io::ErrorKind::Other, "disk on fire");

        logger.exception("failed to write upload", Some(&error), None);
    });

    let last = output.lines().last().unwrap_or_default();
    assert!(last.contains("ERROR") && last.contains("failed to write upload"), "{output}");
    assert!(last.contains("exception=true") && last.contains("disk on fire"), "{output}");
}

#[test]
fn access_records() {
    let output = capture(|| {
        let logger = StatsdLoggerBuilder::default().build();

        logger.access(
            &Response::new("404 Not Found").with_response_length(9),
            &Request::new("GET", "/search").with_query("q=rust"),
            &RequestContext::new()
                .with_var("REMOTE_ADDR", "10.0.0.7")
                .with_var("HTTP_USER_AGENT", "curl/8.0")
                .with_var("HTTP_REFERER", "https://example.com/start"),
            Duration::from_millis(12),
        );
    });

    let last = output.lines().last().unwrap_or_default();
    assert!(last.contains("INFO") && last.contains("access"), "{output}");
    assert!(last.contains("10.0.0.7 \"GET /search?q=rust HTTP/1.1\" 404 Not Found"), "{output}");
    assert!(last.contains("request_time_ms=12.0"), "{output}");
    assert!(last.contains("response_length=9"), "{output}");
    assert!(last.contains("user_agent=") && last.contains("curl/8.0"), "{output}");
    assert!(last.contains("referer=") && last.contains("https://example.com/start"), "{output}");
}
