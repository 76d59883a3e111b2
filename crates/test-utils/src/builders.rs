use assetpipe::config::{ConfigFile, PathEntryConfig, RawConfigFile};
use assetpipe::types::{AssetCategory, FailurePolicy};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; every setter overrides one value.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_paths(mut self, category: AssetCategory, src: &[&str], dest: &str) -> Self {
        let entry = Some(PathEntryConfig {
            src: src.iter().map(|s| s.to_string()).collect(),
            dest: dest.to_string(),
        });
        let paths = &mut self.config.paths;
        match category {
            AssetCategory::Styles => paths.styles = entry,
            AssetCategory::Images => paths.images = entry,
            AssetCategory::Scripts => paths.js = entry,
            AssetCategory::CopyAssets => paths.copy_assets = entry,
            AssetCategory::CopyCss => paths.copy_css = entry,
            AssetCategory::Package => paths.package = entry,
        }
        self
    }

    pub fn with_purge_content(mut self, patterns: &[&str]) -> Self {
        self.config.styles.purge_content = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn with_use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_base_dir(mut self, dir: &str) -> Self {
        self.config.server.base_dir = dir.to_string();
        self
    }

    pub fn with_package_name(mut self, name: &str) -> Self {
        self.config.package.name = Some(name.to_string());
        self
    }

    pub fn with_on_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.run.on_failure = policy;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
