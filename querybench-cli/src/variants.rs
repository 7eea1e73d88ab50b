//! SQL variant loading
//!
//! Variants come from `.sql` files given directly or found in directories.
//! The file stem is the variant name; files are taken in name order.

use querybench_core::{PLACEHOLDER, SqlVariant};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading SQL variants
#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No usable SQL variant files (each needs exactly one {placeholder})")]
    NoVariants { placeholder: &'static str },
}

/// Load variants from files and directories. Templates without exactly one
/// placeholder are skipped with a warning.
pub fn load_variants(paths: &[PathBuf]) -> Result<Vec<SqlVariant>, VariantError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| VariantError::Read {
                path: path.clone(),
                source,
            })?;
            files.extend(
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "sql")),
            );
        } else {
            files.push(path.clone());
        }
    }
    // Same file reached through different spellings loads once
    let mut files: Vec<PathBuf> = files
        .into_iter()
        .map(|file| std::fs::canonicalize(&file).unwrap_or(file))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    files.dedup();

    let mut variants = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = variant_name(&file) else {
            tracing::warn!("Skipping {}: file name is not valid UTF-8", file.display());
            continue;
        };
        let template = std::fs::read_to_string(&file).map_err(|source| VariantError::Read {
            path: file.clone(),
            source,
        })?;
        match SqlVariant::new(name, template) {
            Some(variant) => variants.push(variant),
            None => tracing::warn!(
                "Placeholder missing or repeated in {}, skipping",
                file.display()
            ),
        }
    }

    if variants.is_empty() {
        return Err(VariantError::NoVariants {
            placeholder: PLACEHOLDER,
        });
    }
    Ok(variants)
}

fn variant_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}
