//! Shared fixtures: a real on-disk workspace plus an isolated dependency
//! root, driven through the engine the way the server drives it.
#![allow(dead_code)]

use std::path::Path;

use ralph_lsp::access::DiskAccess;
use ralph_lsp::workspace::{self, WorkspaceState};
use tempfile::TempDir;
use url::Url;

pub const DEFAULT_BUILD: &str =
    r#"{ "compilerOptions": {}, "contractPath": "contracts", "artifactPath": "artifacts" }"#;

pub struct Fixture {
    pub workspace_dir: TempDir,
    pub dependency_dir: TempDir,
}

impl Fixture {
    /// A workspace with `contracts/`, `artifacts/` and a valid build file.
    pub fn new() -> Self {
        Self::with_build(DEFAULT_BUILD)
    }

    pub fn with_build(build_code: &str) -> Self {
        let workspace_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(workspace_dir.path().join("contracts")).unwrap();
        std::fs::create_dir_all(workspace_dir.path().join("artifacts")).unwrap();
        std::fs::write(workspace_dir.path().join("ralph.json"), build_code).unwrap();
        Self { workspace_dir, dependency_dir: TempDir::new().unwrap() }
    }

    pub fn workspace_uri(&self) -> Url {
        Url::from_file_path(self.workspace_dir.path()).unwrap()
    }

    pub fn build_uri(&self) -> Url {
        Url::from_file_path(self.workspace_dir.path().join("ralph.json")).unwrap()
    }

    pub fn dependency_root(&self) -> &Path {
        self.dependency_dir.path()
    }

    pub fn write_contract(&self, name: &str, code: &str) -> Url {
        let path = self.workspace_dir.path().join("contracts").join(name);
        std::fs::write(&path, code).unwrap();
        Url::from_file_path(path).unwrap()
    }

    /// `create` -> first build -> `parse_and_compile`, the way
    /// `initialized` runs it.
    pub fn compile(&self) -> WorkspaceState {
        let state = workspace::create(self.workspace_uri());
        let state = workspace::get_or_build(state, self.dependency_root(), &DiskAccess);
        workspace::parse_and_compile(state, &DiskAccess)
    }
}
