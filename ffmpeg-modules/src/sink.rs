//! Leaf modules that consume payloads without producing any.

use crate::{data::Data, error::Result, module::Module, pin::Pin};

/// Accepts and drops everything.
#[derive(Debug, Default)]
pub struct Null {}

impl Null {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for Null {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn process(&mut self, _data: Data) -> Result<()> {
        Ok(())
    }

    fn pins(&self) -> &[Pin] {
        &[]
    }

    fn pins_mut(&mut self) -> &mut [Pin] {
        &mut []
    }
}

/// Logs the kind and size of every payload it receives.
#[derive(Debug, Default)]
pub struct Print {
    received: u64,
    bytes: u64,
}

impl Print {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Module for Print {
    fn name(&self) -> &'static str {
        "Print"
    }

    fn process(&mut self, data: Data) -> Result<()> {
        self.received += 1;
        self.bytes += data.size() as u64;
        log::info!("[Print] #{}: {}", self.received, data);
        Ok(())
    }

    fn pins(&self) -> &[Pin] {
        &[]
    }

    fn pins_mut(&mut self) -> &mut [Pin] {
        &mut []
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Payload, RawData};

    #[test]
    fn test_print_counts() -> anyhow::Result<()> {
        let mut print = Print::new();
        print.process(Payload::from(RawData::new(10)).share())?;
        print.process(Payload::from(RawData::new(5)).share())?;
        assert_eq!(print.received(), 2);
        assert_eq!(print.bytes(), 15);
        assert_eq!(print.num_pins(), 0);
        print.flush()?;
        print.flush()?;
        Ok(())
    }

    #[test]
    fn test_null_has_no_pins() {
        let mut null = Null::new();
        assert!(null.pin(0).is_none());
        assert!(null.pin_mut(0).is_err());
    }
}
