//! Shared health cell for collectors and exporters.
//!
//! A `Status` is read by the self-monitor while the owning worker keeps
//! updating it, so the cell is internally locked and safe to share through
//! an `Arc`.

use std::sync::RwLock;

/// Component lifecycle, advanced by the supervisor and the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Created,
    Initialized,
    Running,
    Standby,
    Failed,
    Stopped,
}

/// Health code reported by `get()`: 0 = standby, 1 = up, 2 = failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusCode {
    Standby = 0,
    Up = 1,
    Failed = 2,
}

impl StatusCode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Up => "up",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: State,
    code: StatusCode,
    message: String,
}

#[derive(Debug)]
pub struct Status {
    inner: RwLock<Inner>,
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: State::Created,
                code: StatusCode::Standby,
                message: String::new(),
            }),
        }
    }

    pub fn set_state(&self, state: State) {
        self.write().state = state;
    }

    pub fn set(&self, code: StatusCode, message: impl Into<String>) {
        let mut inner = self.write();
        inner.code = code;
        inner.message = message.into();
    }

    pub fn state(&self) -> State {
        self.read().state
    }

    pub fn code(&self) -> StatusCode {
        self.read().code
    }

    /// Returns `(code, label, message)` as reported to the self-monitor.
    pub fn get(&self) -> (u8, &'static str, String) {
        let inner = self.read();
        (inner.code as u8, inner.code.label(), inner.message.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
