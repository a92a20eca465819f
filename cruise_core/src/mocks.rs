//! Stand-in collaborators for optional seams and tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use cruise_traits::{Annunciator, CommandSource, Cue};

/// A serial channel with nothing attached.
pub struct NoCommands;

impl CommandSource for NoCommands {
    fn poll_line(&mut self) -> Option<String> {
        None
    }
}

/// Drops every cue; used when no buzzer is wired.
pub struct SilentAnnunciator;

impl Annunciator for SilentAnnunciator {
    fn announce(&mut self, cue: Cue) {
        tracing::trace!(?cue, "cue (silent)");
    }
}

/// Command source backed by a shared queue; push lines through the handle
/// between ticks.
#[derive(Default)]
pub struct QueuedCommands {
    lines: Rc<RefCell<VecDeque<String>>>,
}

impl QueuedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Rc<RefCell<VecDeque<String>>> {
        self.lines.clone()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push_back(line.into());
    }
}

impl CommandSource for QueuedCommands {
    fn poll_line(&mut self) -> Option<String> {
        self.lines.borrow_mut().pop_front()
    }
}
