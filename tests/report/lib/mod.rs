use std::{
    io::{self, Write},
    string::FromUtf8Error,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use suitecase::formatter::common::color::SupportsColor;

mod sanitize;
pub use sanitize::*;

#[derive(Debug)]
#[allow(dead_code)]
pub enum Error {
    Poison,
    FromUtf8(FromUtf8Error),
}

#[derive(Debug, Default, Clone)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("poison error"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("poison error"))?;
        guard.flush()
    }
}

impl SupportsColor for Buffer {
    fn supports_color(&self) -> bool {
        false
    }
}

impl Buffer {
    pub fn try_to_string(&self) -> Result<String, Error> {
        let guard = self.0.lock().map_err(|_| Error::Poison)?;
        let string = String::from_utf8(guard.to_vec()).map_err(Error::FromUtf8)?;
        Ok(string)
    }
}

static PANIC_HOOK: Mutex<()> = Mutex::new(());

/// Tests installing the panic routing bridge must not overlap.
pub fn panic_hook_lock() -> MutexGuard<'static, ()> {
    PANIC_HOOK.lock().unwrap_or_else(PoisonError::into_inner)
}
