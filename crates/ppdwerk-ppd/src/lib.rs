// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ppdwerk-ppd — PPD documents to option models and constraint reports.
//
// Provides the document loader (plain and gzip-packed files), the PPD record
// reader, the option model builder, the constraint table and the constraint
// evaluator.

pub mod constraints;
pub mod evaluator;
pub mod gzip;
pub mod loader;
pub mod model;
pub mod raw;
pub mod reader;

// Re-export the primary entry points so callers can use `ppdwerk_ppd::FileLoader` etc.
pub use constraints::ConstraintTable;
pub use evaluator::ConstraintEvaluator;
pub use loader::{DocumentLoader, FileLoader};
pub use model::{OptionModelBuilder, build_document};
pub use raw::RawDocument;
