//! Recording connection for simulation.

use std::{cell::RefCell, rc::Rc};

use parley_client::{Connection, ConnectionClosed};
use serde_json::Value;

#[derive(Default)]
struct Wire {
    frames: Vec<String>,
    closed: bool,
}

/// [`Connection`] that records every frame written to it.
///
/// Clones share the same wire, so a test can keep one handle while the
/// transport owns another.
#[derive(Clone, Default)]
pub struct RecordingConnection {
    wire: Rc<RefCell<Wire>>,
}

impl RecordingConnection {
    /// Create an open connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the connection. Later writes fail.
    pub fn close(&self) {
        self.wire.borrow_mut().closed = true;
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.wire.borrow().closed
    }

    /// Frames written so far.
    pub fn sent(&self) -> Vec<String> {
        self.wire.borrow().frames.clone()
    }

    /// Frames written so far, parsed as JSON. Unparseable frames are skipped.
    pub fn sent_json(&self) -> Vec<Value> {
        self.wire.borrow().frames.iter().filter_map(|f| serde_json::from_str(f).ok()).collect()
    }

    /// Frames written so far with the given `msg_type`.
    pub fn sent_of_type(&self, msg_type: u64) -> Vec<Value> {
        self.sent_json().into_iter().filter(|v| v["msg_type"].as_u64() == Some(msg_type)).collect()
    }

    /// Bodies of the text messages written so far.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_of_type(3)
            .iter()
            .filter_map(|v| v["text"].as_str().map(str::to_owned))
            .collect()
    }
}

impl Connection for RecordingConnection {
    fn send(&mut self, frame: String) -> Result<(), ConnectionClosed> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(ConnectionClosed { frame });
        }
        wire.frames.push(frame);
        Ok(())
    }
}

impl std::fmt::Debug for RecordingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wire = self.wire.borrow();
        f.debug_struct("RecordingConnection")
            .field("sent", &wire.frames.len())
            .field("closed", &wire.closed)
            .finish()
    }
}
