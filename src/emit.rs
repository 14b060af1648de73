use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

const MAX_SLUG_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub md_path: String,
    pub sha256: String,
}

/// File stem for an output title: lowercase, whitespace runs become `_`,
/// anything outside `[a-z0-9_]` is dropped.
pub fn slugify(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    let mut s = String::with_capacity(lower.len());
    let mut in_space = false;
    for ch in lower.chars() {
        if ch.is_whitespace() {
            if !in_space {
                s.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            s.push(ch);
        }
    }
    let s: String = s.chars().take(MAX_SLUG_CHARS).collect();
    if s.is_empty() {
        "output".to_string()
    } else {
        s
    }
}

/// First `<slug>_<n>.md` in `outdir` that does not exist yet, n from 1.
pub fn next_output_path(outdir: &Path, slug: &str) -> PathBuf {
    let mut n = 1usize;
    loop {
        let candidate = outdir.join(format!("{}_{}.md", slug, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Write `text` to `path` through a temp file in the same directory.
/// With `overwrite = false` an existing target is an error.
pub fn write_atomic(path: &Path, text: &str, overwrite: bool) -> Result<(), EmitError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    tmp.write_all(text.as_bytes()).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    tmp.flush().map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let persisted = if overwrite { tmp.persist(path) } else { tmp.persist_noclobber(path) };
    persisted.map_err(|e| EmitError::WriteFailed(e.error.to_string()))?;
    Ok(())
}

/// Write a normalized output file named after `title` into `outdir`.
pub fn emit_output(text: &str, title: &str, outdir: &str) -> Result<EmitPaths, EmitError> {
    let outdir = Path::new(outdir);
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let md_path = next_output_path(outdir, &slugify(title));
    write_atomic(&md_path, text, false)?;
    Ok(EmitPaths { md_path: md_path.to_string_lossy().to_string(), sha256: sha256_hex(text.as_bytes()) })
}

/// Lowercase hex SHA-256 of `bytes`, reported as the output's fingerprint.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
