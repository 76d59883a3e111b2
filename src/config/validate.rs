// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use lightningcss::targets::Browsers;

use crate::config::model::{ConfigFile, PathEntry, PathTable, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::fs::SourceSet;
use crate::types::AssetCategory;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let paths = build_path_table(&raw)?;
        let purge_content = compile_globs("styles.purge_content", &raw.styles.purge_content)?;
        validate_browsers("styles.browsers", &raw.styles.browsers)?;
        validate_browsers("styles.production_browsers", &raw.styles.production_browsers)?;
        validate_scripts(&raw)?;
        validate_images(&raw)?;
        validate_server(&raw)?;

        Ok(ConfigFile::new_unchecked(
            paths,
            purge_content,
            raw.styles,
            raw.scripts,
            raw.images,
            raw.server,
            raw.watch,
            raw.package,
            raw.run,
        ))
    }
}

fn build_path_table(cfg: &RawConfigFile) -> Result<PathTable> {
    let mut entries = BTreeMap::new();

    for category in AssetCategory::ALL {
        let entry = cfg.paths.entry(category);
        let key = format!("paths.{}", category.config_key());

        if entry.dest.trim().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[{key}].dest must not be empty"
            )));
        }

        let sources = compile_globs(&key, &entry.src)?;
        entries.insert(
            category,
            PathEntry {
                category,
                sources,
                dest: PathBuf::from(entry.dest.trim()),
            },
        );
    }

    Ok(PathTable::new_unchecked(entries))
}

fn compile_globs(key: &str, patterns: &[String]) -> Result<SourceSet> {
    if patterns.is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[{key}] must list at least one glob"
        )));
    }
    SourceSet::new(patterns)
        .map_err(|e| PipelineError::ConfigError(format!("[{key}]: {e:#}")))
}

fn validate_browsers(key: &str, query: &[String]) -> Result<()> {
    if query.is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[{key}] must not be empty"
        )));
    }
    match Browsers::from_browserslist(query.iter().map(String::as_str)) {
        Ok(_) => Ok(()),
        Err(e) => Err(PipelineError::ConfigError(format!(
            "[{key}] invalid browserslist query {query:?}: {e}"
        ))),
    }
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scripts.target.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[scripts].target must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    if !(1..=100).contains(&cfg.images.jpeg_quality) {
        return Err(PipelineError::ConfigError(format!(
            "[images].jpeg_quality must be within 1..=100 (got {})",
            cfg.images.jpeg_quality
        )));
    }
    if cfg.images.png_preset > 6 {
        return Err(PipelineError::ConfigError(format!(
            "[images].png_preset must be within 0..=6 (got {})",
            cfg.images.png_preset
        )));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    Ok(())
}
