//! Case Catalog
//!
//! Loads the cases of one iteration from a directory of JSON files. The
//! generator writes either a full case object or a bare array of
//! `{"Parties": [...], "Services": [...]}` groups; both are accepted.
//!
//! Cases are ordered by (party count, service count, case id) so runs go from
//! the smallest to the largest input.

use crate::model::{Case, CaseGroup, IterationContext};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a case catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read case directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No usable case files in {0}")]
    Empty(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaseFile {
    Case(Case),
    Groups(Vec<CaseGroup>),
}

/// Ordered, read-only collection of the cases of one iteration
#[derive(Debug, Clone, Default)]
pub struct CaseCatalog {
    cases: Vec<Case>,
}

impl CaseCatalog {
    /// Build a catalog from already-loaded cases (sorted on construction)
    pub fn new(mut cases: Vec<Case>) -> Self {
        cases.sort_by(|a, b| {
            (a.party_count(), a.service_count(), &a.case_id).cmp(&(
                b.party_count(),
                b.service_count(),
                &b.case_id,
            ))
        });
        Self { cases }
    }

    /// Load every `*.json` file of `dir`. Files that cannot be parsed are
    /// skipped with a warning. Group-array files take their id from the file
    /// stem and their seed from `seed`.
    pub fn load_dir(dir: &Path, seed: u64) -> Result<Self, CatalogError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut cases = Vec::with_capacity(paths.len());
        for path in paths {
            match load_case_file(&path, seed) {
                Ok(case) => cases.push(case),
                Err(message) => {
                    tracing::warn!("Skipping case file {}: {}", path.display(), message);
                }
            }
        }

        if cases.is_empty() {
            return Err(CatalogError::Empty(dir.to_path_buf()));
        }
        Ok(Self::new(cases))
    }

    /// Cases in execution order
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Number of cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the catalog holds no cases
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn load_case_file(path: &Path, seed: u64) -> Result<Case, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let parsed: CaseFile = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    let case = match parsed {
        CaseFile::Case(case) => case.normalized(),
        CaseFile::Groups(groups) => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| "file name is not valid UTF-8".to_string())?;
            Case::from_groups(stem, seed, groups)
        }
    };
    if case.groups.is_empty() {
        return Err("case has no groups".to_string());
    }
    Ok(case)
}

/// Supplies the case catalog of each iteration
pub trait CaseSource {
    /// Catalog to run during the given iteration
    fn catalog(&self, context: &IterationContext) -> Result<CaseCatalog, CatalogError>;
}

/// Reads cases from `<root>/<seed>` when the generator wrote one directory
/// per iteration, and from `<root>` otherwise
#[derive(Debug, Clone)]
pub struct DirectoryCaseSource {
    root: PathBuf,
    padding: usize,
}

impl DirectoryCaseSource {
    /// Create a source rooted at `root`; per-iteration directories are named
    /// by the seed zero-padded to `padding` digits
    pub fn new(root: impl Into<PathBuf>, padding: usize) -> Self {
        Self {
            root: root.into(),
            padding,
        }
    }

    /// Directory holding the cases of the given iteration
    pub fn dir_for(&self, context: &IterationContext) -> PathBuf {
        let per_iteration = self
            .root
            .join(format!("{:0width$}", context.seed, width = self.padding));
        if per_iteration.is_dir() {
            per_iteration
        } else {
            self.root.clone()
        }
    }
}

impl CaseSource for DirectoryCaseSource {
    fn catalog(&self, context: &IterationContext) -> Result<CaseCatalog, CatalogError> {
        CaseCatalog::load_dir(&self.dir_for(context), context.seed)
    }
}

impl CaseSource for CaseCatalog {
    fn catalog(&self, _context: &IterationContext) -> Result<CaseCatalog, CatalogError> {
        Ok(self.clone())
    }
}
