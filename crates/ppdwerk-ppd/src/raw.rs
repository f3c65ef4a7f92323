// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw PPD records, as read from the document before any normalisation.
//
// Fields that the source may omit are `Option`s here; the model builders
// decide what an absent value means.

use std::collections::HashMap;

use ppdwerk_core::OptionKind;

/// Read-only handle over one opened PPD document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub nickname: Option<String>,
    pub short_nickname: Option<String>,
    /// Groups in source order.
    pub groups: Vec<RawGroup>,
    /// `*Default<Option>` values keyed by option keyword.
    pub defaults: HashMap<String, String>,
    /// `*UIConstraints` / `*NonUIConstraints` records in source order.
    pub constraints: Vec<RawConstraint>,
}

impl RawDocument {
    /// Recorded default choice key for an option.
    pub fn default_for(&self, option: &str) -> Option<&str> {
        self.defaults.get(option).map(String::as_str)
    }

    /// Whether any group declares an option with this key.
    pub fn declares_option(&self, option: &str) -> bool {
        self.groups
            .iter()
            .flat_map(|g| g.options.iter())
            .any(|o| o.key.as_deref() == Some(option))
    }

    pub fn option_count(&self) -> usize {
        self.groups.iter().map(|g| g.options.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGroup {
    pub key: Option<String>,
    pub label: Option<String>,
    pub options: Vec<RawOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOption {
    pub key: Option<String>,
    pub label: Option<String>,
    pub kind: OptionKind,
    pub choices: Vec<RawChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChoice {
    pub key: Option<String>,
    pub label: Option<String>,
}

/// One side of a constraint record; `choice == None` is the wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTerm {
    pub option: String,
    pub choice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConstraint {
    pub first: RawTerm,
    pub second: RawTerm,
}
