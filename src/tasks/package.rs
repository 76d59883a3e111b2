// src/tasks/package.rs

//! Zip the build output into `<dest>/<project-name>.zip`.

use std::io::{Cursor, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::errors::{PipelineError, Result};
use crate::fs::SourceFile;
use crate::tasks::context::{BuildContext, TaskReport};
use crate::types::{AssetCategory, TaskKind};

#[derive(Debug, Deserialize)]
struct PackageDescriptor {
    name: Option<String>,
}

pub fn run(ctx: &BuildContext) -> Result<TaskReport> {
    let name = archive_name(ctx)?;
    let mut files = ctx.sources(AssetCategory::Package)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    let bytes = build_archive(ctx, &files)?;
    let out = ctx
        .dest_dir(AssetCategory::Package)
        .join(format!("{name}.zip"));
    ctx.fs.write(&out, &bytes).map_err(fail)?;

    info!(archive = %ctx.display_path(&out), entries = files.len(), "package written");
    Ok(TaskReport {
        files_written: 1,
        outputs: vec![out],
    })
}

fn fail(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::transform(TaskKind::Compress, err.to_string())
}

/// Archive base name: the `[package].name` override, else the descriptor's
/// `name` field. Scoped names (`@scope/pkg`) become `@scope-pkg`.
pub fn archive_name(ctx: &BuildContext) -> Result<String> {
    let settings = ctx.config.package();
    let raw = match &settings.name {
        Some(name) => name.clone(),
        None => {
            let path = ctx.root.join(&settings.descriptor);
            read_descriptor_name(ctx, &path)?
        }
    };
    Ok(sanitize_name(&raw))
}

fn read_descriptor_name(ctx: &BuildContext, path: &Path) -> Result<String> {
    let text = ctx
        .fs
        .read_to_string(path)
        .map_err(|e| fail(format!("{e:#}")))?;
    let descriptor: PackageDescriptor = serde_json::from_str(&text)
        .map_err(|e| fail(format!("parsing {}: {e}", ctx.display_path(path))))?;
    descriptor
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| fail(format!("{} has no \"name\" field", ctx.display_path(path))))
}

pub fn sanitize_name(raw: &str) -> String {
    raw.trim().replace('/', "-")
}

fn build_archive(ctx: &BuildContext, files: &[SourceFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        let entry = file.relative.to_string_lossy().replace('\\', "/");
        let bytes = ctx.fs.read(&file.path).map_err(|e| fail(format!("{e:#}")))?;
        zip.start_file(entry.as_str(), options).map_err(fail)?;
        zip.write_all(&bytes).map_err(fail)?;
        debug!(entry = %entry, "added to archive");
    }

    let cursor = zip.finish().map_err(fail)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::sanitize_name;

    #[test]
    fn scoped_names_are_flattened() {
        assert_eq!(sanitize_name("@acme/site"), "@acme-site");
        assert_eq!(sanitize_name("site"), "site");
    }
}
