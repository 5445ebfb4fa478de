//! # Sensor Publication
//!
//! Downstream consumers register a sink per OBIS key. On every tick each
//! registration receives the current value of its key, or `None` when the
//! key is stale or was never seen. Registrations are published in the order
//! they were made; registering a key twice publishes it twice.

use crate::dsmr::store::ReadingStore;
use log::warn;

/// Receiver of published values.
pub trait SensorSink {
    /// `None` marks the sensor unavailable.
    fn publish(&mut self, value: Option<f64>);
}

impl<F> SensorSink for F
where
    F: FnMut(Option<f64>),
{
    fn publish(&mut self, value: Option<f64>) {
        self(value)
    }
}

/// Sink that writes every published value to the log.
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        LogSink { name: name.into() }
    }
}

impl SensorSink for LogSink {
    fn publish(&mut self, value: Option<f64>) {
        match value {
            Some(v) => log::info!("{}: {v:.3}", self.name),
            None => log::info!("{}: unavailable", self.name),
        }
    }
}

/// Ordered list of (key, sink) registrations.
#[derive(Default)]
pub struct Publisher {
    sensors: Vec<(String, Box<dyn SensorSink>)>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink for an OBIS key. Empty keys are ignored.
    pub fn register(&mut self, key: &str, sink: Box<dyn SensorSink>) -> bool {
        if key.is_empty() {
            warn!("Ignoring sensor registration with an empty OBIS key");
            return false;
        }
        self.sensors.push((key.to_string(), sink));
        true
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Registered keys in publication order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|(key, _)| key.as_str())
    }

    /// Push the current value of every registered key to its sink.
    pub fn publish_all(&mut self, store: &ReadingStore) {
        for (key, sink) in self.sensors.iter_mut() {
            sink.publish(store.snapshot(key));
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
