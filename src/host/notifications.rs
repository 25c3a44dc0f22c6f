//! User-visible notifications.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Represents a message to display to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub level: MessageLevel,
}

/// Message severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Info => write!(f, "info"),
            MessageLevel::Warning => write!(f, "warning"),
            MessageLevel::Error => write!(f, "error"),
        }
    }
}

/// Queue of pending notifications, cheap to clone and share.
///
/// The session and the built-in modes push; the host front end drains and
/// displays.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Rc<RefCell<VecDeque<Message>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, text: impl Into<String>, level: MessageLevel) {
        let message = Message {
            text: text.into(),
            level,
        };
        log::debug!("notify [{}] {}", message.level, message.text);
        self.queue.borrow_mut().push_back(message);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.push(text, MessageLevel::Info);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.push(text, MessageLevel::Warning);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(text, MessageLevel::Error);
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Message> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
