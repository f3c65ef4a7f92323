// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Constraint table — raw constraint records to ordered `Constraint`s.

use ppdwerk_core::error::{PpdError, Result};
use ppdwerk_core::{Constraint, Document, PpdOption, Term};
use tracing::debug;

use crate::raw::{RawDocument, RawTerm};

pub struct ConstraintTable;

impl ConstraintTable {
    /// One constraint per raw record, in source order, indexed from 0.
    ///
    /// Terms naming options the document never declares are kept as-is; the
    /// evaluator treats them as unsatisfiable.
    pub fn build(raw: &RawDocument) -> Vec<Constraint> {
        let constraints: Vec<Constraint> = raw
            .constraints
            .iter()
            .enumerate()
            .map(|(index, record)| Constraint {
                index,
                first: term(&record.first),
                second: term(&record.second),
            })
            .collect();

        for constraint in &constraints {
            for t in [&constraint.first, &constraint.second] {
                if !raw.declares_option(&t.option) {
                    debug!(index = constraint.index, option = %t.option, "constraint names an undeclared option");
                }
            }
        }

        constraints
    }

    /// Resolve both terms of a constraint against the model, failing with
    /// `OptionNotFound` for the first term whose option is not declared.
    pub fn resolve_strict<'d>(
        constraint: &Constraint,
        document: &'d Document,
    ) -> Result<(&'d PpdOption, &'d PpdOption)> {
        let lookup = |t: &Term| {
            document
                .option(&t.option)
                .ok_or_else(|| PpdError::OptionNotFound(t.option.clone()))
        };
        Ok((lookup(&constraint.first)?, lookup(&constraint.second)?))
    }
}

fn term(raw: &RawTerm) -> Term {
    Term {
        option: raw.option.clone(),
        choice: raw.choice.clone(),
    }
}
