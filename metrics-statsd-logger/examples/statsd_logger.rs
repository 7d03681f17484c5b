use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use metrics_statsd_logger::{
    FieldValue, Fields, Level, Request, RequestContext, Response, StatsdLoggerBuilder,
};

fn main() {
    tracing_subscriber::fmt::init();

    let logger = StatsdLoggerBuilder::default()
        .with_process_name("demo")
        .with_remote_address("localhost:9125")
        .expect("failed to parse remote address")
        .install()
        .expect("failed to install statsd logger");

    logger.info("starting demo server", None);
    gauge!("workers").set(4.0);

    let routes = ["/", "/health", "/missing", "/search"];

    // Pretend to serve requests, over and over.
    for i in 0u64.. {
        let route = routes[(i % routes.len() as u64) as usize];
        let started = Instant::now();
        std::thread::sleep(Duration::from_millis(25 + i % 50));

        let status = if route == "/missing" { "404 Not Found" } else { "200 OK" };
        logger.access(
            &Response::new(status).with_response_length(128),
            &Request::new("GET", route),
            &RequestContext::new().with_var("REMOTE_ADDR", "127.0.0.1"),
            started.elapsed(),
        );
        counter!("routes", "route" => route).increment(1);

        if i % 10 == 0 {
            let mut fields = Fields::new();
            fields.insert("metric".to_string(), FieldValue::from("queue.depth"));
            fields.insert("value".to_string(), FieldValue::from(i % 7 + 1));
            fields.insert("mtype".to_string(), FieldValue::from("gauge"));
            logger.log(Level::Info, "sampled queue depth", Some(&fields));
        }

        if i % 25 == 0 {
            logger.warning("request took longer than expected", None);
        }
    }
}
