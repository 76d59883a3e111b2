use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Build mode shared by every task in a run.
///
/// - `Development`: source maps on, no minification.
/// - `Production`: minified output, no source maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn from_prod_flag(prod: bool) -> Self {
        if prod { Mode::Production } else { Mode::Development }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}

/// What the scheduler does with the rest of a run once a task fails.
///
/// - `Cancel`: cancel running siblings and skip everything still pending
///   (default).
/// - `Wait`: let already-running siblings finish; only dependents of the
///   failed task are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Cancel,
    Wait,
}

/// Asset category of the path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetCategory {
    Styles,
    Images,
    Scripts,
    CopyAssets,
    CopyCss,
    Package,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::Styles,
        AssetCategory::Images,
        AssetCategory::Scripts,
        AssetCategory::CopyAssets,
        AssetCategory::CopyCss,
        AssetCategory::Package,
    ];

    /// Key used for this category in `[paths.<key>]`.
    pub fn config_key(self) -> &'static str {
        match self {
            AssetCategory::Styles => "styles",
            AssetCategory::Images => "images",
            AssetCategory::Scripts => "js",
            AssetCategory::CopyAssets => "copy_assets",
            AssetCategory::CopyCss => "copy_css",
            AssetCategory::Package => "package",
        }
    }

    /// Task that processes this category.
    pub fn task(self) -> TaskKind {
        match self {
            AssetCategory::Styles => TaskKind::Styles,
            AssetCategory::Images => TaskKind::Images,
            AssetCategory::Scripts => TaskKind::Scripts,
            AssetCategory::CopyAssets => TaskKind::CopyAssets,
            AssetCategory::CopyCss => TaskKind::CopyCss,
            AssetCategory::Package => TaskKind::Compress,
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Every unit of work the engine can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Styles,
    Images,
    Scripts,
    CopyAssets,
    CopyCss,
    Compress,
    Serve,
    Reload,
    Monitor,
}

impl TaskKind {
    /// The five independent transform tasks that make up `build`.
    pub const TRANSFORMS: [TaskKind; 5] = [
        TaskKind::Styles,
        TaskKind::Scripts,
        TaskKind::Images,
        TaskKind::CopyAssets,
        TaskKind::CopyCss,
    ];

    /// Entry point name as typed on the command line.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Styles => "styles",
            TaskKind::Images => "images",
            TaskKind::Scripts => "js",
            TaskKind::CopyAssets => "copyAssets",
            TaskKind::CopyCss => "copyCss",
            TaskKind::Compress => "compress",
            TaskKind::Serve => "serve",
            TaskKind::Reload => "reload",
            TaskKind::Monitor => "monitor",
        }
    }

    /// Long-running control tasks never complete on their own.
    pub fn is_long_lived(self) -> bool {
        matches!(self, TaskKind::Monitor)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "styles" => Ok(TaskKind::Styles),
            "images" => Ok(TaskKind::Images),
            "js" | "scripts" => Ok(TaskKind::Scripts),
            "copyAssets" | "copy-assets" => Ok(TaskKind::CopyAssets),
            "copyCss" | "copy-css" => Ok(TaskKind::CopyCss),
            "compress" | "package" => Ok(TaskKind::Compress),
            "serve" | "staticServer" => Ok(TaskKind::Serve),
            "reload" => Ok(TaskKind::Reload),
            "monitor" | "watch" => Ok(TaskKind::Monitor),
            other => Err(format!("unknown task: {other}")),
        }
    }
}
