//! Window-level host hooks.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

/// Blocking user dialogs (`window.alert`).
pub trait Dialogs {
    /// Show a message and wait for the user to dismiss it.
    fn alert(&self, message: &str);
}

impl<D: Dialogs + ?Sized> Dialogs for Rc<D> {
    fn alert(&self, message: &str) {
        (**self).alert(message)
    }
}

/// Dialogs for headless hosts: alerts go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDialogs;

impl Dialogs for LoggingDialogs {
    fn alert(&self, message: &str) {
        warn!(text = message, "alert");
    }
}

/// Dialogs that remember every alert, in order.
#[derive(Debug, Default)]
pub struct RecordingDialogs {
    alerts: RefCell<Vec<String>>,
}

impl RecordingDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    /// Forget recorded alerts.
    pub fn clear(&self) {
        self.alerts.borrow_mut().clear();
    }
}

impl Dialogs for RecordingDialogs {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_through_rc() {
        let dialogs = Rc::new(RecordingDialogs::new());
        let shared: Rc<RecordingDialogs> = dialogs.clone();
        shared.alert("first");
        shared.alert("second");
        assert_eq!(dialogs.alerts(), vec!["first", "second"]);

        dialogs.clear();
        assert!(dialogs.alerts().is_empty());
    }
}
