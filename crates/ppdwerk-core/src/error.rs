// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ppdwerk.

use thiserror::Error;

/// Top-level error type for all ppdwerk operations.
#[derive(Debug, Error)]
pub enum PpdError {
    // -- Document errors --
    /// Path missing, decompression failure, or the reader rejected the content.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("option not found: {0}")]
    OptionNotFound(String),

    /// Exclusive creation of a temporary file collided with an existing name.
    #[error("temporary file conflict: {0}")]
    TempFileConflict(String),

    // -- Host integration --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PpdError {
    /// Short, stable name of the error kind, used by the agent protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentUnreadable(_) => "DocumentUnreadable",
            Self::GroupNotFound(_) => "GroupNotFound",
            Self::OptionNotFound(_) => "OptionNotFound",
            Self::TempFileConflict(_) => "TempFileConflict",
            Self::Config(_) => "Config",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Io(_) => "Io",
            Self::Serialization(_) => "Serialization",
        }
    }

    /// Errors caused by what the caller asked for rather than by the
    /// document or the agent itself.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::OptionNotFound(_) | Self::InvalidRequest(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PpdError>;
