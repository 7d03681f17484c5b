use std::sync::Arc;

use metrics::{
    Counter, CounterFn, Gauge, GaugeFn, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};

use crate::{
    base::BaseLogger,
    event::MetricValue,
    logger::{discard, Emitter, StatsdLogger, DEFAULT_SAMPLING_RATE},
};

/// A registered metric: its name and the tags built from its labels.
///
/// Every update is sent as its own datagram, right away. Nothing is aggregated.
struct Handle {
    emitter: Arc<Emitter>,
    name: String,
    tags: Vec<String>,
}

impl Handle {
    fn new(emitter: &Arc<Emitter>, key: &Key) -> Arc<Self> {
        let tags = key
            .labels()
            .map(|label| {
                if label.value().is_empty() {
                    label.key().to_string()
                } else {
                    format!("{}:{}", label.key(), label.value())
                }
            })
            .collect();

        Arc::new(Handle { emitter: Arc::clone(emitter), name: key.name().to_string(), tags })
    }
}

impl CounterFn for Handle {
    fn increment(&self, value: u64) {
        discard(self.emitter.send(|w| {
            w.increment(&self.name, MetricValue::Unsigned(value), Some(&self.tags), DEFAULT_SAMPLING_RATE)
        }));
    }

    // statsd counters have no absolute form.
    fn absolute(&self, _value: u64) {}
}

impl GaugeFn for Handle {
    fn increment(&self, value: f64) {
        discard(self.emitter.send(|w| w.gauge_delta(&self.name, value, Some(&self.tags))));
    }

    fn decrement(&self, value: f64) {
        discard(self.emitter.send(|w| w.gauge_delta(&self.name, -value, Some(&self.tags))));
    }

    fn set(&self, value: f64) {
        // A leading `-` on a gauge is a relative adjustment, so a negative absolute value is sent as a reset to zero
        // followed by the signed delta.
        if value < 0.0 && value.is_finite() {
            discard(self.emitter.send(|w| w.gauge(&self.name, MetricValue::Unsigned(0), Some(&self.tags))));
            discard(self.emitter.send(|w| w.gauge_delta(&self.name, value, Some(&self.tags))));
            return;
        }

        discard(self.emitter.send(|w| w.gauge(&self.name, MetricValue::Float(value), Some(&self.tags))));
    }
}

impl HistogramFn for Handle {
    fn record(&self, value: f64) {
        discard(self.emitter.send(|w| w.histogram(&self.name, MetricValue::Float(value), Some(&self.tags))));
    }
}

impl<L: BaseLogger> Recorder for StatsdLogger<L> {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        Counter::from_arc(Handle::new(self.emitter(), key))
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Handle::new(self.emitter(), key))
    }

    fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Handle::new(self.emitter(), key))
    }
}
