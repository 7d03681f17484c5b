/// Namespace every metric name is qualified with.
pub const NAMESPACE: &str = "gunicorn";

/// Process name that is treated as "no process name configured".
const RESERVED_PROCESS_NAME: &str = NAMESPACE;

/// Naming and tagging conventions derived from the instrumentation configuration.
///
/// Per-process metrics are told apart either by folding the process name into the metric name, or, in tag mode, by an
/// `app:<process name>` tag. Never both.
#[derive(Clone, Debug, Default)]
pub struct NamingPolicy {
    process_name: Option<String>,
    use_tags: bool,
    app_tag: Option<String>,
}

impl NamingPolicy {
    /// Creates a new `NamingPolicy`.
    ///
    /// An empty process name is treated the same as no process name at all.
    pub fn new(process_name: Option<String>, use_tags: bool) -> Self {
        let process_name = process_name.filter(|name| !name.is_empty());
        let app_tag = process_name
            .as_deref()
            .filter(|name| *name != RESERVED_PROCESS_NAME)
            .map(|name| format!("app:{name}"));

        NamingPolicy { process_name, use_tags, app_tag }
    }

    /// Returns the configured process name, if any.
    pub fn process_name(&self) -> Option<&str> {
        self.process_name.as_deref()
    }

    /// Returns `true` if metadata is sent as statsd tags.
    pub fn uses_tags(&self) -> bool {
        self.use_tags
    }

    /// Returns the process name to fold into metric names, if any.
    fn name_segment(&self) -> Option<&str> {
        if self.use_tags {
            return None;
        }

        self.process_name.as_deref().filter(|name| *name != RESERVED_PROCESS_NAME)
    }

    /// Qualifies a raw metric name.
    ///
    /// Yields `gunicorn.<process name>.<name>` when tag mode is disabled and a non-default process name is configured,
    /// and `gunicorn.<name>` otherwise.
    pub fn qualify(&self, raw_name: &str) -> String {
        let mut buf = Vec::with_capacity(NAMESPACE.len() + raw_name.len() + 16);
        self.write_name(&mut buf, raw_name);

        // Only ever built from `&str` pieces.
        String::from_utf8(buf).unwrap_or_default()
    }

    /// Serializes the sampling rate and tags into the suffix that follows the metric type.
    pub fn serialize_meta(&self, sampling_rate: Option<f64>, tags: Option<&[String]>) -> String {
        let mut buf = Vec::new();
        self.write_meta(&mut buf, sampling_rate, tags);

        String::from_utf8(buf).unwrap_or_default()
    }

    pub(crate) fn write_name(&self, buf: &mut Vec<u8>, raw_name: &str) {
        buf.extend_from_slice(NAMESPACE.as_bytes());
        buf.push(b'.');

        if let Some(segment) = self.name_segment() {
            buf.extend_from_slice(segment.as_bytes());
            buf.push(b'.');
        }

        buf.extend_from_slice(raw_name.as_bytes());
    }

    pub(crate) fn write_meta(&self, buf: &mut Vec<u8>, sampling_rate: Option<f64>, tags: Option<&[String]>) {
        if let Some(rate) = sampling_rate.filter(|rate| *rate > 0.0 && *rate <= 1.0) {
            let mut float_writer = ryu::Buffer::new();

            buf.extend_from_slice(b"|@");
            buf.extend_from_slice(float_writer.format(rate).as_bytes());
        }

        if !self.use_tags {
            return;
        }

        // The application tag trails the caller's tags. The caller's slice itself is never touched.
        //
        // With no tags at all this still writes a bare `|#`.
        buf.extend_from_slice(b"|#");
        let caller_tags = tags.unwrap_or_default().iter().map(String::as_str);
        for (i, tag) in caller_tags.chain(self.app_tag.as_deref()).enumerate() {
            if i > 0 {
                buf.push(b',');
            }
            buf.extend_from_slice(tag.as_bytes());
        }
    }
}
