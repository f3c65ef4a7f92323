// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Query facade — the read operations offered to the host dispatch layer.
//
// Every operation opens (or fetches from the cache) the document at the
// given path, answers from the typed model, and records any error it
// returns in the shared last-error buffer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ppdwerk_core::error::{PpdError, Result};
use ppdwerk_core::{
    AgentConfig, Constraint, Document, GroupSummary, Identity, PpdOption, Selection,
};
use ppdwerk_ppd::evaluator::violations;
use ppdwerk_ppd::{ConstraintTable, DocumentLoader, FileLoader, build_document};
use tracing::{debug, error, instrument};

use crate::cache::DocumentCache;
use crate::fingerprint::fingerprint;
use crate::last_error::LastError;

pub struct QueryFacade<L = FileLoader> {
    loader: L,
    cache: Option<DocumentCache>,
    last_error: Arc<LastError>,
}

impl QueryFacade<FileLoader> {
    /// Facade over the local filesystem, configured from `config`.
    pub fn from_config(config: &AgentConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| DocumentCache::new(config.cache_capacity));
        Self::new(
            FileLoader::new(config.temp_dir.clone()),
            cache,
            Arc::new(LastError::new(config.last_error_capacity)),
        )
    }
}

impl<L: DocumentLoader> QueryFacade<L> {
    pub fn new(loader: L, cache: Option<DocumentCache>, last_error: Arc<LastError>) -> Self {
        Self {
            loader,
            cache,
            last_error,
        }
    }

    pub fn last_error(&self) -> &LastError {
        &self.last_error
    }

    // -- Operations -----------------------------------------------------------

    /// Whether the path opens as a PPD document. Never fails.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn is_valid_document(&self, path: &Path) -> bool {
        match self.document(path) {
            Ok(_) => true,
            Err(err) => {
                debug!(%err, "not a valid PPD");
                false
            }
        }
    }

    /// Printer identity; all fields empty when the document cannot be opened.
    pub fn identity(&self, path: &Path) -> Identity {
        self.document(path)
            .map(|doc| doc.identity.clone())
            .unwrap_or_default()
    }

    /// Group keys and labels, in document order.
    pub fn groups_of(&self, path: &Path) -> Result<Vec<GroupSummary>> {
        self.track(self.document(path).map(|doc| doc.group_summaries()))
    }

    /// Options of one group, in document order.
    pub fn options_of(&self, path: &Path, group: &str) -> Result<Vec<PpdOption>> {
        self.track(self.document(path).and_then(|doc| {
            doc.group(group)
                .map(|g| g.options.clone())
                .ok_or_else(|| PpdError::GroupNotFound(group.to_string()))
        }))
    }

    /// A single option, wherever it is grouped.
    pub fn option(&self, path: &Path, option: &str) -> Result<PpdOption> {
        self.track(self.document(path).and_then(|doc| {
            doc.option(option)
                .cloned()
                .ok_or_else(|| PpdError::OptionNotFound(option.to_string()))
        }))
    }

    pub fn all_constraints(&self, path: &Path) -> Result<Vec<Constraint>> {
        self.track(self.document(path).map(|doc| doc.constraints.clone()))
    }

    /// Constraints with a term on `option`; the option must exist.
    pub fn constraints_for(&self, path: &Path, option: &str) -> Result<Vec<Constraint>> {
        self.track(self.document(path).and_then(|doc| {
            if doc.option(option).is_none() {
                return Err(PpdError::OptionNotFound(option.to_string()));
            }
            Ok(doc
                .constraints
                .iter()
                .filter(|c| c.involves(option))
                .cloned()
                .collect())
        }))
    }

    /// Constraints violated by `selection`, ordered by source index.
    #[instrument(skip(self, selection), fields(path = %path.display(), selected = selection.len()))]
    pub fn violated_constraints(
        &self,
        path: &Path,
        selection: &Selection,
    ) -> Result<Vec<Constraint>> {
        self.track(self.document(path).map(|doc| {
            let violated = violations(selection, &doc);
            debug!(violated = violated.len(), "selection evaluated");
            violated
        }))
    }

    /// Like [`Self::violated_constraints`], with every option the selection
    /// leaves unset taking its default choice.
    pub fn violated_with_defaults(
        &self,
        path: &Path,
        selection: &Selection,
    ) -> Result<Vec<Constraint>> {
        self.track(self.document(path).map(|doc| {
            let mut effective = doc.default_selection();
            for (option, choice) in selection.iter() {
                effective.set(option, choice);
            }
            violations(&effective, &doc)
        }))
    }

    /// Both options of the constraint with source index `index`. Fails with
    /// `OptionNotFound` when a term names an undeclared option.
    pub fn constraint_options(&self, path: &Path, index: usize) -> Result<(PpdOption, PpdOption)> {
        self.track(self.document(path).and_then(|doc| {
            let constraint = doc
                .constraints
                .iter()
                .find(|c| c.index == index)
                .ok_or_else(|| PpdError::InvalidRequest(format!("no constraint {index}")))?;
            let (first, second) = ConstraintTable::resolve_strict(constraint, &doc)?;
            Ok((first.clone(), second.clone()))
        }))
    }

    /// Write the plaintext document into `dir` and return its path.
    pub fn extract_to(&self, path: &Path, dir: &Path) -> Result<PathBuf> {
        self.track(self.loader.extract(path, dir))
    }

    // -- Document access ------------------------------------------------------

    /// The built document for `path`, from the cache when it is still fresh.
    /// The built document is always parsed from the same bytes that were
    /// fingerprinted.
    pub fn document(&self, path: &Path) -> Result<Arc<Document>> {
        let source = self.loader.source_bytes(path)?;
        let Some(cache) = &self.cache else {
            return self.build(path, &source).map(Arc::new);
        };

        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        cache.get_or_build(&key, &fingerprint(&source), || self.build(path, &source))
    }

    fn build(&self, path: &Path, source: &[u8]) -> Result<Document> {
        // The raw handle is dropped as soon as the model is built.
        let raw = self.loader.load_source(path, source)?;
        Ok(build_document(&raw))
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_caller_error() {
                debug!(kind = err.kind(), %err, "query rejected");
            } else {
                error!(kind = err.kind(), %err, "query failed");
            }
            self.last_error.record(err);
        }
        result
    }
}
