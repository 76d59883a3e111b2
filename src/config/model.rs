// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::SourceSet;
use crate::types::{AssetCategory, FailurePolicy};

/// Top-level configuration as read from `Assetpipe.toml`.
///
/// ```toml
/// [paths.styles]
/// src = ["src/assets/css/style.css"]
/// dest = "dist/assets/css"
///
/// [server]
/// port = 3000
///
/// [run]
/// on_failure = "cancel"
/// ```
///
/// All sections are optional; the defaults reproduce the standard
/// `src/` -> `dist/` layout.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Per-category source globs and destinations from `[paths.<category>]`.
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub package: PackageSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[paths]` section. A missing entry keeps the built-in default.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PathsSection {
    #[serde(default)]
    pub styles: Option<PathEntryConfig>,
    #[serde(default)]
    pub images: Option<PathEntryConfig>,
    #[serde(default)]
    pub js: Option<PathEntryConfig>,
    #[serde(default)]
    pub copy_assets: Option<PathEntryConfig>,
    #[serde(default)]
    pub copy_css: Option<PathEntryConfig>,
    #[serde(default)]
    pub package: Option<PathEntryConfig>,
}

impl PathsSection {
    /// Effective raw entry for a category (configured or default).
    pub fn entry(&self, category: AssetCategory) -> PathEntryConfig {
        let configured = match category {
            AssetCategory::Styles => &self.styles,
            AssetCategory::Images => &self.images,
            AssetCategory::Scripts => &self.js,
            AssetCategory::CopyAssets => &self.copy_assets,
            AssetCategory::CopyCss => &self.copy_css,
            AssetCategory::Package => &self.package,
        };
        configured
            .clone()
            .unwrap_or_else(|| default_path_entry(category))
    }
}

/// `[paths.<category>]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PathEntryConfig {
    /// Ordered source globs; `!` prefix negates.
    pub src: Vec<String>,
    /// Destination directory.
    pub dest: String,
}

/// Built-in path table.
pub fn default_path_entry(category: AssetCategory) -> PathEntryConfig {
    let (src, dest): (&[&str], &str) = match category {
        AssetCategory::Styles => (&["src/assets/css/style.css"], "dist/assets/css"),
        AssetCategory::Images => (
            &[
                "src/assets/images/*.{jpg,jpeg,png,gif,svg}",
                "src/assets/images/**/*.{jpg,jpeg,png,gif,svg}",
            ],
            "dist/assets/images",
        ),
        AssetCategory::Scripts => (&["src/assets/js/**/*.js"], "dist/assets/js"),
        AssetCategory::CopyAssets => (&["src/**/*.html"], "dist/"),
        AssetCategory::CopyCss => (
            &["src/assets/css/*.css", "!src/assets/css/tailwind.css"],
            "dist/assets/css/",
        ),
        AssetCategory::Package => (&["dist/**/*"], "finalproject"),
    };
    PathEntryConfig {
        src: src.iter().map(|s| s.to_string()).collect(),
        dest: dest.to_string(),
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// HTML files scanned for used selectors when purging.
    #[serde(default = "default_purge_content")]
    pub purge_content: Vec<String>,

    /// Browserslist query used for vendor prefixing.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,

    /// Browserslist query used when minifying in production.
    #[serde(default = "default_production_browsers")]
    pub production_browsers: Vec<String>,
}

fn default_purge_content() -> Vec<String> {
    vec!["src/**/*.html".to_string()]
}

fn default_browsers() -> Vec<String> {
    vec!["last 2 versions".to_string()]
}

fn default_production_browsers() -> Vec<String> {
    vec!["last 2 versions".to_string(), "ie >= 8".to_string()]
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            purge_content: default_purge_content(),
            browsers: default_browsers(),
            production_browsers: default_production_browsers(),
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Syntax target for transpilation, e.g. `"es2015"`.
    #[serde(default = "default_script_target")]
    pub target: String,
}

fn default_script_target() -> String {
    "es2015".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            target: default_script_target(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// oxipng optimisation preset (0..=6).
    #[serde(default = "default_png_preset")]
    pub png_preset: u8,
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_png_preset() -> u8 {
    2
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_preset: default_png_preset(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Directory served by the dev server (the pre-build sources).
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_dir() -> String {
    "src".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiet period before a category pipeline starts after a change.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Skip a pipeline when the category's files hash to the same value as
    /// on the previous run.
    #[serde(default = "default_use_hash")]
    pub use_hash: bool,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_use_hash() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            use_hash: default_use_hash(),
        }
    }
}

/// `[package]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    /// JSON package descriptor the project name is read from.
    #[serde(default = "default_descriptor")]
    pub descriptor: String,

    /// Explicit archive name (without `.zip`); overrides the descriptor.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_descriptor() -> String {
    "package.json".to_string()
}

impl Default for PackageSection {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
            name: None,
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    /// `"cancel"` (default) or `"wait"`.
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

/// A compiled path table entry.
#[derive(Debug, Clone)]
pub struct PathEntry {
    pub category: AssetCategory,
    pub sources: SourceSet,
    pub dest: PathBuf,
}

/// Static mapping from asset category to sources and destination.
#[derive(Debug, Clone)]
pub struct PathTable {
    entries: BTreeMap<AssetCategory, PathEntry>,
}

impl PathTable {
    pub(crate) fn new_unchecked(entries: BTreeMap<AssetCategory, PathEntry>) -> Self {
        Self { entries }
    }

    /// Entry for a category. Every category is always present.
    pub fn get(&self, category: AssetCategory) -> &PathEntry {
        &self.entries[&category]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values()
    }
}

/// Validated configuration.
///
/// Constructed only through `TryFrom<RawConfigFile>`, so holding one means
/// every glob compiled and every value is in range.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathTable,
    purge_content: SourceSet,
    styles: StylesSection,
    scripts: ScriptsSection,
    images: ImagesSection,
    server: ServerSection,
    watch: WatchSection,
    package: PackageSection,
    run: RunSection,
}

impl ConfigFile {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        paths: PathTable,
        purge_content: SourceSet,
        styles: StylesSection,
        scripts: ScriptsSection,
        images: ImagesSection,
        server: ServerSection,
        watch: WatchSection,
        package: PackageSection,
        run: RunSection,
    ) -> Self {
        Self {
            paths,
            purge_content,
            styles,
            scripts,
            images,
            server,
            watch,
            package,
            run,
        }
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn purge_content(&self) -> &SourceSet {
        &self.purge_content
    }

    pub fn styles(&self) -> &StylesSection {
        &self.styles
    }

    pub fn scripts(&self) -> &ScriptsSection {
        &self.scripts
    }

    pub fn images(&self) -> &ImagesSection {
        &self.images
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn package(&self) -> &PackageSection {
        &self.package
    }

    pub fn run(&self) -> &RunSection {
        &self.run
    }

    /// Override the dev server port (from `--port`).
    pub fn set_port(&mut self, port: u16) {
        self.server.port = port;
    }

    /// Absolute-or-root-relative directory served by the dev server.
    pub fn server_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.server.base_dir)
    }
}
