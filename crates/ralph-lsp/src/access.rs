// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! File access: the only module that touches the filesystem.
//!
//! Everything above this layer works with URIs and the [`FileAccess`]
//! trait, so workspace logic stays deterministic under test.

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// The Ralph source file extension.
pub const RALPH_EXTENSION: &str = "ral";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("file not found: {0}")]
    NotFound(Url),

    #[error("not a local file path: {0}")]
    InvalidUri(Url),

    #[error("failed to {action} {uri}: {message}")]
    Io {
        action: &'static str,
        uri: Url,
        message: String,
    },
}

/// Read/write/list/exists over the URI namespace.
pub trait FileAccess: Send + Sync {
    fn read(&self, uri: &Url) -> Result<String, AccessError>;
    fn write(&self, uri: &Url, code: &str) -> Result<Url, AccessError>;
    fn exists(&self, uri: &Url) -> Result<bool, AccessError>;
    /// All Ralph source files under `dir`, recursively.
    fn list(&self, dir: &Url) -> Result<Vec<Url>, AccessError>;
}

/// Production implementation over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskAccess;

impl DiskAccess {
    fn path_of(uri: &Url) -> Result<PathBuf, AccessError> {
        uri.to_file_path().map_err(|()| AccessError::InvalidUri(uri.clone()))
    }
}

impl FileAccess for DiskAccess {
    fn read(&self, uri: &Url) -> Result<String, AccessError> {
        let path = Self::path_of(uri)?;
        std::fs::read_to_string(&path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                AccessError::NotFound(uri.clone())
            } else {
                AccessError::Io { action: "read", uri: uri.clone(), message: error.to_string() }
            }
        })
    }

    fn write(&self, uri: &Url, code: &str) -> Result<Url, AccessError> {
        let path = Self::path_of(uri)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| AccessError::Io {
                action: "create directory for",
                uri: uri.clone(),
                message: error.to_string(),
            })?;
        }
        std::fs::write(&path, code).map_err(|error| AccessError::Io {
            action: "write",
            uri: uri.clone(),
            message: error.to_string(),
        })?;
        Ok(uri.clone())
    }

    fn exists(&self, uri: &Url) -> Result<bool, AccessError> {
        let path = Self::path_of(uri)?;
        Ok(path.exists())
    }

    fn list(&self, dir: &Url) -> Result<Vec<Url>, AccessError> {
        let root = Self::path_of(dir)?;
        let mut files = Vec::new();
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            let entries = std::fs::read_dir(&current).map_err(|error| AccessError::Io {
                action: "list",
                uri: dir.clone(),
                message: error.to_string(),
            })?;

            for entry in entries {
                let entry = entry.map_err(|error| AccessError::Io {
                    action: "list",
                    uri: dir.clone(),
                    message: error.to_string(),
                })?;
                let path = entry.path();

                if path.is_dir() {
                    // Skip hidden directories and build output.
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if !name.starts_with('.') && name != "node_modules" && name != "target" {
                        stack.push(path);
                    }
                } else if path.extension().map(|e| e == RALPH_EXTENSION).unwrap_or(false) {
                    if let Ok(uri) = Url::from_file_path(&path) {
                        files.push(uri);
                    }
                }
            }
        }

        files.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(files)
    }
}
