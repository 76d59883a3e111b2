// src/tasks/copy.rs

//! Plain copies: HTML and other static assets, and the raw stylesheets.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::tasks::context::{BuildContext, TaskReport};
use crate::types::AssetCategory;

/// Copy every file of `category` to its destination, mirroring paths
/// relative to the glob base.
///
/// For [`AssetCategory::CopyCss`], files that are also styles entries are
/// skipped: the styles task owns their output.
pub fn run(ctx: &BuildContext, category: AssetCategory) -> Result<TaskReport> {
    let task = category.task();
    let owned_by_styles: HashSet<String> = if category == AssetCategory::CopyCss {
        ctx.sources(AssetCategory::Styles)?
            .into_iter()
            .map(|f| f.rel_path)
            .collect()
    } else {
        HashSet::new()
    };

    let mut report = TaskReport::default();
    for file in ctx.sources(category)? {
        if owned_by_styles.contains(&file.rel_path) {
            debug!(file = %file.rel_path, "left to the styles task");
            continue;
        }

        let bytes = ctx
            .fs
            .read(&file.path)
            .map_err(|e| PipelineError::transform(task, format!("{e:#}")))?;
        let out = ctx.output_path(category, &file);
        ctx.fs
            .write(&out, &bytes)
            .map_err(|e| PipelineError::transform(task, format!("{e:#}")))?;
        debug!(src = %file.rel_path, dest = %ctx.display_path(&out), "copied");
        report.record(out);
    }
    Ok(report)
}
