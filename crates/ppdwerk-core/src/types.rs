// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ppdwerk option model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Printer identity as recorded in the document header.
///
/// Absent fields are always the empty string, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub nickname: String,
}

impl Identity {
    /// Build an identity from optional header values, normalising absent
    /// fields to the empty string.
    pub fn from_parts(
        manufacturer: Option<&str>,
        model: Option<&str>,
        nickname: Option<&str>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.unwrap_or_default().to_string(),
            model: model.unwrap_or_default().to_string(),
            nickname: nickname.unwrap_or_default().to_string(),
        }
    }
}

/// One legal value of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub label: String,
    pub is_default: bool,
}

/// User-interface type declared for an option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    #[default]
    PickOne,
    PickMany,
    Boolean,
}

impl OptionKind {
    /// Parse the keyword following `*OpenUI`. Unknown keywords map to `PickOne`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "PickMany" => Self::PickMany,
            "Boolean" => Self::Boolean,
            _ => Self::PickOne,
        }
    }
}

/// A single user-configurable setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpdOption {
    pub key: String,
    pub label: String,
    pub kind: OptionKind,
    /// Key of the group this option belongs to.
    pub group: String,
    /// Legal values in document order. Never empty.
    pub choices: Vec<Choice>,
}

impl PpdOption {
    /// The choice marked as default, if the document names one.
    pub fn default_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_default)
    }

    pub fn choice(&self, key: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.key == key)
    }
}

/// A named partition of related options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub key: String,
    pub label: String,
    pub options: Vec<PpdOption>,
}

impl Group {
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            key: self.key.clone(),
            label: self.label.clone(),
        }
    }
}

/// Group key and label without its options, used for navigation menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub label: String,
}

/// Candidate assignment of chosen choice keys to option keys.
///
/// Not required to cover every option; unset options are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, String>);

impl Selection {
    /// Set the chosen value for an option, returning the previous one.
    pub fn set(&mut self, option: impl Into<String>, choice: impl Into<String>) -> Option<String> {
        self.0.insert(option.into(), choice.into())
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.0.get(option).map(String::as_str)
    }

    pub fn contains(&self, option: &str) -> bool {
        self.0.contains_key(option)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Selection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One side of a constraint: an option with a concrete choice, or the
/// wildcard (`choice == None`) meaning "any choice of this option".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub option: String,
    pub choice: Option<String>,
}

impl Term {
    pub fn exact(option: impl Into<String>, choice: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            choice: Some(choice.into()),
        }
    }

    pub fn any(option: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            choice: None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.choice.is_none()
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.choice {
            Some(choice) => write!(f, "*{} {}", self.option, choice),
            None => write!(f, "*{}", self.option),
        }
    }
}

/// A forbidden simultaneous combination of two terms. Symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Position of the record in the source document.
    pub index: usize,
    pub first: Term,
    pub second: Term,
}

impl Constraint {
    /// Whether either term refers to the given option.
    pub fn involves(&self, option: &str) -> bool {
        self.first.option == option || self.second.option == option
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}: {} / {}", self.index, self.first, self.second)
    }
}

/// The top-level aggregate built from one source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub identity: Identity,
    pub groups: Vec<Group>,
    /// Ordered by source index.
    pub constraints: Vec<Constraint>,
}

impl Document {
    pub fn group(&self, key: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Find an option by key in any group.
    pub fn option(&self, key: &str) -> Option<&PpdOption> {
        self.options().find(|o| o.key == key)
    }

    /// Every option of the document, group by group in document order.
    pub fn options(&self) -> impl Iterator<Item = &PpdOption> {
        self.groups.iter().flat_map(|g| g.options.iter())
    }

    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        self.groups.iter().map(Group::summary).collect()
    }

    /// Selection holding every option's default choice.
    pub fn default_selection(&self) -> Selection {
        self.options()
            .filter_map(|o| o.default_choice().map(|c| (o.key.clone(), c.key.clone())))
            .collect()
    }
}
