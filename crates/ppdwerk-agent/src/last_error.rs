// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Last-error buffer for the host integration.
//
// Holds only the most recent error; each write overwrites the previous one.
// Messages longer than the capacity are truncated on a character boundary.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use ppdwerk_core::error::PpdError;
use serde::Serialize;

/// The retained error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Bounded, overwrite-on-write store for the most recent error.
#[derive(Debug)]
pub struct LastError {
    capacity: usize,
    slot: Mutex<Option<ErrorRecord>>,
}

impl LastError {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slot: Mutex::new(None),
        }
    }

    pub fn record(&self, err: &PpdError) {
        let record = ErrorRecord {
            kind: err.kind().to_string(),
            message: truncate(&err.to_string(), self.capacity),
            at: Utc::now(),
        };
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(record);
    }

    pub fn get(&self) -> Option<ErrorRecord> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn truncate(message: &str, capacity: usize) -> String {
    if message.len() <= capacity {
        return message.to_string();
    }
    let mut end = capacity;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest() {
        let last = LastError::new(1023);
        assert!(last.get().is_none());

        last.record(&PpdError::GroupNotFound("A".into()));
        last.record(&PpdError::OptionNotFound("B".into()));

        let record = last.get().unwrap();
        assert_eq!(record.kind, "OptionNotFound");
        assert_eq!(record.message, "option not found: B");

        last.clear();
        assert!(last.get().is_none());
    }

    #[test]
    fn long_messages_are_bounded() {
        let last = LastError::new(20);
        last.record(&PpdError::DocumentUnreadable("é".repeat(50)));
        let message = last.get().unwrap().message;
        assert!(message.len() <= 20);
        assert!(message.starts_with("document unreadable"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // "ab" + 2-byte char; cutting at 3 would split it.
        assert_eq!(truncate("abé", 3), "ab");
        assert_eq!(truncate("abé", 4), "abé");
    }
}
