// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Option model builder — raw records to groups, options and choices.
//
// Absent display strings are normalised here, once. Records without a key
// are skipped. Duplicate keys resolve to the last occurrence.

use std::collections::HashSet;

use ppdwerk_core::{Choice, Document, Group, Identity, PpdOption};
use tracing::{debug, warn};

use crate::constraints::ConstraintTable;
use crate::raw::{RawChoice, RawDocument, RawGroup, RawOption};

/// Build the complete document model from an opened raw handle.
pub fn build_document(raw: &RawDocument) -> Document {
    let groups = OptionModelBuilder::build(raw);
    let constraints = ConstraintTable::build(raw);
    Document {
        identity: identity(raw),
        groups,
        constraints,
    }
}

/// Printer identity with absent fields as empty strings. The nickname falls
/// back to `*ShortNickName`.
pub fn identity(raw: &RawDocument) -> Identity {
    Identity::from_parts(
        raw.manufacturer.as_deref(),
        raw.model_name.as_deref(),
        raw.nickname.as_deref().or(raw.short_nickname.as_deref()),
    )
}

pub struct OptionModelBuilder;

impl OptionModelBuilder {
    /// Walk groups, options and choices in source order.
    ///
    /// Never fails; a document without groups yields an empty list. Empty
    /// groups are kept. An option key seen again anywhere in the document
    /// replaces the earlier option.
    pub fn build(raw: &RawDocument) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::with_capacity(raw.groups.len());

        for raw_group in &raw.groups {
            let Some(group) = build_group(raw, raw_group) else {
                continue;
            };
            if let Some(pos) = groups.iter().position(|g| g.key == group.key) {
                warn!(group = %group.key, "duplicate group key, keeping the last one");
                groups.remove(pos);
            }
            groups.push(group);
        }

        dedupe_options_across_groups(&mut groups);

        debug!(
            groups = groups.len(),
            options = groups.iter().map(|g| g.options.len()).sum::<usize>(),
            "option model built"
        );
        groups
    }
}

fn build_group(raw: &RawDocument, raw_group: &RawGroup) -> Option<Group> {
    let Some(key) = raw_group.key.clone() else {
        warn!(label = ?raw_group.label, "group without key skipped");
        return None;
    };

    let mut options: Vec<PpdOption> = Vec::with_capacity(raw_group.options.len());
    for raw_option in &raw_group.options {
        let Some(option) = build_option(raw, raw_option, &key) else {
            continue;
        };
        if let Some(pos) = options.iter().position(|o| o.key == option.key) {
            warn!(group = %key, option = %option.key, "duplicate option key, keeping the last one");
            options.remove(pos);
        }
        options.push(option);
    }

    Some(Group {
        label: raw_group.label.clone().unwrap_or_else(|| key.clone()),
        key,
        options,
    })
}

fn build_option(raw: &RawDocument, raw_option: &RawOption, group: &str) -> Option<PpdOption> {
    let Some(key) = raw_option.key.clone() else {
        warn!(group, label = ?raw_option.label, "option without key skipped");
        return None;
    };

    let default = raw.default_for(&key);
    let mut choices: Vec<Choice> = Vec::with_capacity(raw_option.choices.len());
    for raw_choice in &raw_option.choices {
        let Some(choice) = build_choice(raw_choice, default, &key) else {
            continue;
        };
        if let Some(pos) = choices.iter().position(|c| c.key == choice.key) {
            choices.remove(pos);
        }
        choices.push(choice);
    }

    if choices.is_empty() {
        warn!(group, option = %key, "option without usable choices dropped");
        return None;
    }

    if default.is_some() && !choices.iter().any(|c| c.is_default) {
        debug!(option = %key, default = ?default, "default names no choice, left unset");
    }

    Some(PpdOption {
        label: raw_option.label.clone().unwrap_or_else(|| key.clone()),
        key,
        kind: raw_option.kind,
        group: group.to_string(),
        choices,
    })
}

fn build_choice(raw_choice: &RawChoice, default: Option<&str>, option: &str) -> Option<Choice> {
    let Some(key) = raw_choice.key.clone() else {
        warn!(option, label = ?raw_choice.label, "choice without key skipped");
        return None;
    };
    Some(Choice {
        label: raw_choice.label.clone().unwrap_or_else(|| key.clone()),
        is_default: default == Some(key.as_str()),
        key,
    })
}

/// Keep only the last occurrence of each option key across all groups, so
/// that every option belongs to exactly one group.
fn dedupe_options_across_groups(groups: &mut [Group]) {
    let mut seen: HashSet<String> = HashSet::new();
    for group in groups.iter_mut().rev() {
        let mut kept = Vec::with_capacity(group.options.len());
        for option in group.options.drain(..).rev() {
            if seen.insert(option.key.clone()) {
                kept.push(option);
            } else {
                warn!(group = %group.key, option = %option.key, "option redeclared in a later group, dropped here");
            }
        }
        kept.reverse();
        group.options = kept;
    }
}
