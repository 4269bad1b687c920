//! Ordered multicast delivery from a pin to its sinks.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    data::Data,
    error::{DeliveryError, Error, Result, SinkFailure},
};

/// Downstream entrypoint: a module's `process` or a terminal callback.
pub type Sink = Box<dyn FnMut(Data) -> Result<()>>;

/// Sinks registered on one pin, invoked synchronously in registration order.
///
/// Every sink is attempted on every `emit`: a sink that errors or panics is
/// recorded and the remaining sinks still receive the payload. The recorded
/// failures are returned to the emitter once all sinks ran.
#[derive(Default)]
pub struct Signal {
    sinks: Vec<Sink>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sink` and returns its registration index.
    pub fn register<F>(&mut self, sink: F) -> usize
    where
        F: FnMut(Data) -> Result<()> + 'static,
    {
        self.sinks.push(Box::new(sink));
        self.sinks.len() - 1
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Delivers `data` to every sink and returns how many were invoked.
    pub fn emit(&mut self, data: Data) -> Result<usize> {
        let attempted = self.sinks.len();
        let mut failures = Vec::new();

        for (index, sink) in self.sinks.iter_mut().enumerate() {
            let payload = Data::clone(&data);
            let result = match catch_unwind(AssertUnwindSafe(|| sink(payload))) {
                Ok(result) => result,
                Err(panic) => Err(Error::SinkPanicked(panic_message(panic))),
            };
            if let Err(error) = result {
                log::warn!("signal: sink #{} failed on {}: {}", index, data, error);
                failures.push(SinkFailure { index, error });
            }
        }

        if failures.is_empty() {
            Ok(attempted)
        } else {
            Err(DeliveryError {
                attempted,
                failures,
            }
            .into())
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
#[path = "signal_test.rs"]
mod signal_test;
