//! Wiring pins to downstream entrypoints.
//!
//! The whole graph is wired before the first payload flows. Downstream
//! modules are held weakly: the owner of a module decides when it is torn
//! down, and a pin still wired to a destroyed module reports
//! [`Error::SinkGone`] on delivery.

use std::rc::Rc;

use crate::{
    data::Data,
    error::{Error, Result},
    module::{Module, ModuleRef},
    pin::Pin,
};

/// Binds `pin` to a terminal callback. Returns the sink's registration index.
pub fn connect<F>(pin: &mut Pin, callback: F) -> usize
where
    F: FnMut(Data) -> Result<()> + 'static,
{
    pin.signal_mut().register(callback)
}

/// Binds `pin` to `module`'s `process`.
pub fn connect_output_to_input<M>(pin: &mut Pin, module: &ModuleRef<M>) -> usize
where
    M: Module + ?Sized + 'static,
{
    let module = Rc::downgrade(module);
    pin.signal_mut().register(move |data| {
        let module = module.upgrade().ok_or(Error::SinkGone)?;
        let mut module = module.try_borrow_mut().map_err(|_| Error::Reentrant)?;
        module.process(data)
    })
}

/// Binds output pin `index` of `src` to `dst`'s `process`.
pub fn connect_modules<A, B>(src: &ModuleRef<A>, index: usize, dst: &ModuleRef<B>) -> Result<usize>
where
    A: Module + ?Sized,
    B: Module + ?Sized + 'static,
{
    let mut src = src.try_borrow_mut().map_err(|_| Error::Reentrant)?;
    let pin = src.pin_mut(index)?;
    Ok(connect_output_to_input(pin, dst))
}

#[cfg(test)]
#[path = "connect_test.rs"]
mod connect_test;
