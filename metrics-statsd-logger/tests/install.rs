use std::{net::UdpSocket, time::Duration};

use metrics_statsd_logger::{BuildError, StatsdLoggerBuilder};

#[test]
fn install_as_global_recorder() {
    let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
    collector.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let port = collector.local_addr().unwrap().port();

    let logger = StatsdLoggerBuilder::default()
        .with_process_name("worker1")
        .with_collector_address(("127.0.0.1", port))
        .install()
        .unwrap();

    metrics::counter!("boots").increment(1);
    logger.error("failed to reload", None);

    let mut buf = [0u8; 512];
    let (len, _) = collector.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"gunicorn.worker1.boots:1|c|@1.0");
    let (len, _) = collector.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"gunicorn.worker1.log.error:1|c|@1.0");

    // Only one global recorder can ever be installed.
    let result = StatsdLoggerBuilder::default().install();
    assert!(matches!(result, Err(BuildError::FailedToInstall)));
}
