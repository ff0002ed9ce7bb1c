//! Content scanning: expands a compiler's content globs and collects
//! candidate strings from the matched files.

use crate::errors::Result;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files larger than this are skipped (10MB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Tokens longer than this are never class names
const MAX_CANDIDATE_LEN: usize = 100;

// Anything but whitespace, quotes and markup delimiters. Brackets are
// allowed so arbitrary values survive intact.
const TOKEN_PATTERN: &str = r#"[^\s"'`<>={};,]+"#;

/// Result of scanning content files
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Unique candidate strings, in first-seen order
    pub candidates: Vec<String>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

/// Splits source text into class-like candidate strings
#[derive(Debug, Clone)]
pub struct Scanner {
    tokens: Regex,
}

impl Scanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tokens: Regex::new(TOKEN_PATTERN)?,
        })
    }

    /// Candidate strings in `content`, in order of appearance
    pub fn extract<'a>(&self, content: &'a str) -> Vec<&'a str> {
        self.tokens
            .find_iter(content)
            .map(|m| m.as_str().trim_end_matches(['.', ')', '(']))
            .filter(|token| is_candidate(token))
            .collect()
    }

    fn read_file(&self, path: &Path) -> Option<Vec<String>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                return None;
            }
        };
        if metadata.len() > MAX_FILE_SIZE {
            warn!(
                path = %path.display(),
                size_mb = metadata.len() / (1024 * 1024),
                "skipping file above size limit"
            );
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) => Some(self.extract(&content).into_iter().map(str::to_string).collect()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping non-UTF-8 or unreadable file");
                None
            }
        }
    }

    /// Scan every file matched by `globs`
    ///
    /// Files are read in parallel; candidate order follows file order, then
    /// position within the file.
    pub fn scan(&self, globs: &[String]) -> Result<ScanResult> {
        let files = collect_files(globs)?;
        debug!(patterns = globs.len(), files = files.len(), "scanning content");

        let per_file: Vec<Option<Vec<String>>> = files.par_iter().map(|path| self.read_file(path)).collect();

        let mut result = ScanResult::default();
        let mut seen = HashSet::new();
        for candidates in per_file {
            let Some(candidates) = candidates else {
                result.files_skipped += 1;
                continue;
            };
            result.files_scanned += 1;
            for candidate in candidates {
                if seen.insert(candidate.clone()) {
                    result.candidates.push(candidate);
                }
            }
        }
        Ok(result)
    }
}

fn is_candidate(token: &str) -> bool {
    if token.is_empty() || token.len() > MAX_CANDIDATE_LEN {
        return false;
    }
    let starts_ok = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '!' | '[' | '@'));
    if !starts_ok {
        return false;
    }
    // Brackets must balance for arbitrary values to be usable
    let mut depth = 0i32;
    for ch in token.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

/// Expand glob patterns into a deduplicated file list
pub fn collect_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;
            if path.is_dir() {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Scan `globs` with a default scanner
pub fn scan_globs(globs: &[String]) -> Result<ScanResult> {
    Scanner::new()?.scan(globs)
}
