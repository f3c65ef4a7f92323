// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the printer configuration dialogs.
//
// Every error kind is mapped to a plain sentence with a suggestion. The host
// uses the severity to decide whether to offer a retry.

use crate::error::PpdError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Temporary condition; the same request may succeed later.
    Transient,
    /// The caller must pick something else (another file, group, option).
    ActionRequired,
    /// The document itself cannot be used.
    Permanent,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::ActionRequired => "action-required",
            Self::Permanent => "permanent",
        }
    }
}

/// A human-readable error with a message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PpdError` into a `HumanError` suitable for a configuration dialog.
pub fn humanize_error(err: &PpdError) -> HumanError {
    match err {
        PpdError::DocumentUnreadable(detail) => {
            if detail.contains("gzip") || detail.contains("decompress") {
                HumanError {
                    message: "The compressed printer description could not be unpacked.".into(),
                    suggestion: "The .gz file may be damaged. Reinstall the printer driver package or pick another description file.".into(),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "This is not a usable printer description (PPD) file.".into(),
                    suggestion: format!("Choose a different PPD file for this printer. ({detail})"),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            }
        }

        PpdError::GroupNotFound(group) => HumanError {
            message: format!("The option group \"{group}\" does not exist for this printer."),
            suggestion: "Reload the list of option groups and pick one of those.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PpdError::OptionNotFound(option) => HumanError {
            message: format!("The option \"{option}\" does not exist for this printer."),
            suggestion: "Reload the options for this printer and pick one of those.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PpdError::TempFileConflict(_) => HumanError {
            message: "A temporary file could not be created safely.".into(),
            suggestion: "Another file is in the way in the temporary directory. Ask an administrator to check it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PpdError::Config(detail) => HumanError {
            message: "The printer configuration agent is misconfigured.".into(),
            suggestion: format!("Fix or remove the agent configuration file. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PpdError::InvalidRequest(detail) => HumanError {
            message: "The request could not be understood.".into(),
            suggestion: format!("This is a bug in the calling tool. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PpdError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The printer description file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Choose the file again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "The printer description file can't be read.".into(),
                suggestion: "Check the file permissions.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        PpdError::Serialization(_) => HumanError {
            message: "The agent had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_document_is_permanent() {
        let err = PpdError::DocumentUnreadable("missing *PPD-Adobe header".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
    }

    #[test]
    fn corrupt_gzip_gets_specific_message() {
        let err = PpdError::DocumentUnreadable("gzip stream corrupt".into());
        let human = humanize_error(&err);
        assert!(human.message.contains("compressed"));
    }

    #[test]
    fn unknown_group_is_action_required() {
        let human = humanize_error(&PpdError::GroupNotFound("NoSuchGroup".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("NoSuchGroup"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = PpdError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
