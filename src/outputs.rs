// src/outputs.rs

//! Output tracking for targets that declare `produces = [...]`.
//!
//! Patterns are globs relative to the collector's root directory. Matching
//! is done on `/`-separated relative paths so the same patterns work on
//! every platform.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::fs::{FileSystem, RealFileSystem};

/// Compiled `produces` patterns for a single target.
#[derive(Debug, Clone)]
pub struct OutputPatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl OutputPatterns {
    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            patterns: patterns.to_vec(),
            set: build_globset(patterns)?,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Walks a directory tree and reports files matching a target's patterns.
#[derive(Debug, Clone)]
pub struct OutputCollector {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl OutputCollector {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Collector over the real filesystem rooted at `root`.
    pub fn real(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(RealFileSystem), root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All files under the root that match `patterns`, sorted.
    pub fn collect(&self, patterns: &OutputPatterns) -> Result<Vec<PathBuf>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        if !self.fs.exists(&self.root) {
            debug!(root = ?self.root, "output root does not exist; nothing produced");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            for path in self.fs.read_dir(&dir)? {
                if self.fs.is_dir(&path) {
                    stack.push(path);
                } else if self.fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        let rel_str = rel.to_string_lossy().replace('\\', "/");
                        if patterns.matches(&rel_str) {
                            files.push(path);
                        }
                    }
                }
            }
        }

        files.sort();
        debug!(root = ?self.root, matched = files.len(), "collected produced outputs");
        Ok(files)
    }
}
