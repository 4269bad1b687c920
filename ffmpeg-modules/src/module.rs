use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    data::Data,
    error::{Error, Result},
    pin::Pin,
};

/// A processing unit of the graph.
///
/// `process` consumes one payload and may emit on the module's own pins; the
/// emission runs every downstream module before `process` returns. A module
/// owns its pins, created at construction: their index is stable for the
/// module's lifetime.
pub trait Module {
    /// Short name used in log lines and errors.
    fn name(&self) -> &'static str;

    /// An `Err` tells the driver to stop delivering to this module.
    fn process(&mut self, data: Data) -> Result<()>;

    /// Emits whatever the module still buffers. Must be safe to call again,
    /// and with nothing buffered.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn pins(&self) -> &[Pin];

    fn pins_mut(&mut self) -> &mut [Pin];

    fn num_pins(&self) -> usize {
        self.pins().len()
    }

    fn pin(&self, index: usize) -> Option<&Pin> {
        self.pins().get(index)
    }

    fn pin_mut(&mut self, index: usize) -> Result<&mut Pin> {
        let count = self.num_pins();
        self.pins_mut()
            .get_mut(index)
            .ok_or(Error::NoSuchPin { index, count })
    }
}

/// Shared handle through which a module is wired and driven.
pub type ModuleRef<M> = Rc<RefCell<M>>;

pub fn create<M: Module>(module: M) -> ModuleRef<M> {
    Rc::new(RefCell::new(module))
}
