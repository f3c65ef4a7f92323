// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ppdwerk-agent — query facade over PPD documents, with a per-path document
// cache, a bounded last-error buffer and the JSON request protocol used by
// the host integration.

pub mod cache;
pub mod facade;
pub mod fingerprint;
pub mod last_error;
pub mod protocol;

pub use cache::DocumentCache;
pub use facade::QueryFacade;
pub use last_error::{ErrorRecord, LastError};
pub use protocol::{Request, dispatch, handle_line};
