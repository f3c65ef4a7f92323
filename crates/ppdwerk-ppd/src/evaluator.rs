// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Constraint evaluation — which constraints does a selection violate?
//
// A term on an option the model does not declare is never satisfied, so a
// malformed record cannot produce a spurious violation.

use std::collections::{HashMap, HashSet};

use ppdwerk_core::{Constraint, Document, Selection, Term};

/// Evaluates selections against one document's constraints.
pub struct ConstraintEvaluator<'a> {
    constraints: &'a [Constraint],
    known_options: HashSet<&'a str>,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self::with_known_options(
            &document.constraints,
            document.options().map(|o| o.key.as_str()),
        )
    }

    pub fn with_known_options(
        constraints: &'a [Constraint],
        known_options: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            constraints,
            known_options: known_options.into_iter().collect(),
        }
    }

    /// Constraints whose both terms hold under `selection`, ordered by source
    /// index regardless of the order they were supplied in.
    pub fn violations(&self, selection: &Selection) -> Vec<Constraint> {
        let chosen: HashMap<&str, &str> = selection.iter().collect();

        let mut violated: Vec<Constraint> = self
            .constraints
            .iter()
            .filter(|c| self.holds(&c.first, &chosen) && self.holds(&c.second, &chosen))
            .cloned()
            .collect();
        violated.sort_by_key(|c| c.index);
        violated
    }

    fn holds(&self, term: &Term, chosen: &HashMap<&str, &str>) -> bool {
        if !self.known_options.contains(term.option.as_str()) {
            return false;
        }
        match (term.choice.as_deref(), chosen.get(term.option.as_str())) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(wanted), Some(got)) => wanted == *got,
        }
    }
}

/// Violations of the document's own constraints under `selection`.
pub fn violations(selection: &Selection, document: &Document) -> Vec<Constraint> {
    ConstraintEvaluator::new(document).violations(selection)
}
