use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::serial::{Connector, Transport, TransportError};

/// What a scripted device saw and did, shared with the test after the transport is boxed.
#[derive(Debug, Default)]
pub struct Wire {
    pub written: Vec<String>,
    pub replies: VecDeque<String>,
    pub opened: usize,
    pub closed: usize,
}

/// In-memory device that answers reads from a fixed script; an exhausted script reads as a timeout.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    pub wire: Rc<RefCell<Wire>>,
}

impl ScriptedTransport {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wire = Wire {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Wire::default()
        };
        Self {
            wire: Rc::new(RefCell::new(wire)),
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.wire.borrow().written.clone()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.wire
            .borrow_mut()
            .written
            .push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        Ok(self.wire.borrow_mut().replies.pop_front().unwrap_or_default())
    }

    fn close(&mut self) {
        self.wire.borrow_mut().closed += 1;
    }
}

pub struct ScriptedConnector {
    pub transport: ScriptedTransport,
    pub fail_open: bool,
}

impl ScriptedConnector {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport,
            fail_open: false,
        }
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        if self.fail_open {
            return Err(TransportError::Closed);
        }
        self.transport.wire.borrow_mut().opened += 1;
        Ok(Box::new(self.transport.clone()))
    }
}
