#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use assetpipe::config::ConfigFile;
use assetpipe::fs::RealFileSystem;
use assetpipe::tasks::BuildContext;
use assetpipe::types::Mode;

pub use assetpipe_test_utils::builders::ConfigFileBuilder;
pub use assetpipe_test_utils::fake_invoker::FakeInvoker;
pub use assetpipe_test_utils::{init_tracing, with_timeout};

/// A throwaway project directory on disk.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn context(&self, mode: Mode, config: ConfigFile) -> Arc<BuildContext> {
        Arc::new(BuildContext::new(
            self.root(),
            mode,
            config,
            Arc::new(RealFileSystem),
        ))
    }
}
