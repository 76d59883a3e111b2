// src/tasks/styles.rs

//! Stylesheet pipeline: bundle `@import`s, prefix for the configured
//! browsers, purge unused rules, minify in production and attach an inline
//! source map in development.
//!
//! Entry discovery, purge content and output go through `ctx.fs`, but the
//! bundler resolves `@import`s with lightningcss's own `FileProvider`, which
//! reads from disk. The styles task therefore always needs a real project
//! directory, even when the context carries another `FileSystem`.

use std::collections::HashSet;

use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::SourceFile;
use crate::tasks::context::{BuildContext, TaskReport};
use crate::tasks::{css_map, purge};
use crate::types::{AssetCategory, TaskKind};

pub fn run(ctx: &BuildContext) -> Result<TaskReport> {
    let targets = targets_for(ctx)?;
    let tokens = purge_tokens(ctx)?;

    let mut report = TaskReport::default();
    for file in ctx.sources(AssetCategory::Styles)? {
        let css = process_file(ctx, &file, targets, tokens.as_ref())?;
        let out = ctx.output_path(AssetCategory::Styles, &file);
        ctx.fs.write(&out, css.as_bytes()).map_err(fail)?;
        debug!(src = %file.rel_path, dest = %ctx.display_path(&out), "wrote stylesheet");
        report.record(out);
    }
    Ok(report)
}

fn fail(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::transform(TaskKind::Styles, err.to_string())
}

/// Browser targets for the current mode.
fn targets_for(ctx: &BuildContext) -> Result<Targets> {
    let styles = ctx.config.styles();
    let queries = if ctx.mode.is_production() {
        &styles.production_browsers
    } else {
        &styles.browsers
    };
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| fail(format!("browserslist: {e}")))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Tokens of every purge content file, or `None` when no content globs
/// resolve (purging against nothing would drop every rule).
fn purge_tokens(ctx: &BuildContext) -> Result<Option<HashSet<String>>> {
    let files = ctx
        .config
        .purge_content()
        .resolve(ctx.fs.as_ref(), &ctx.root)
        .map_err(|e| fail(format!("{e:#}")))?;
    if files.is_empty() {
        debug!("no purge content files matched; keeping every rule");
        return Ok(None);
    }

    let mut contents = Vec::with_capacity(files.len());
    for file in &files {
        contents.push(ctx.fs.read_to_string(&file.path).map_err(fail)?);
    }
    Ok(Some(purge::content_tokens(contents.iter().map(String::as_str))))
}

fn process_file(
    ctx: &BuildContext,
    file: &SourceFile,
    targets: Targets,
    tokens: Option<&HashSet<String>>,
) -> Result<String> {
    let development = !ctx.mode.is_production();
    let project_root = ctx.root.to_string_lossy().to_string();
    let mut source_map = development.then(|| SourceMap::new(&project_root));

    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, source_map.as_mut(), ParserOptions::default());
    let mut stylesheet = bundler
        .bundle(&file.path)
        .map_err(|e| fail(format!("{}: {e}", file.rel_path)))?;
    drop(bundler);

    let unused_symbols = match tokens {
        Some(tokens) => {
            let printed = stylesheet
                .to_css(PrinterOptions::default())
                .map_err(|e| fail(format!("{}: {e}", file.rel_path)))?;
            purge::unused_symbols(&printed.code, tokens)
        }
        None => HashSet::new(),
    };
    if !unused_symbols.is_empty() {
        debug!(file = %file.rel_path, count = unused_symbols.len(), "purging unused selectors");
    }

    stylesheet
        .minify(MinifyOptions {
            targets,
            unused_symbols,
        })
        .map_err(|e| fail(format!("{}: {e}", file.rel_path)))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: ctx.mode.is_production(),
            source_map: source_map.as_mut(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(format!("{}: {e}", file.rel_path)))?;

    let mut css = result.code;
    if let Some(map) = source_map.as_mut() {
        css.push_str(&css_map::inline_comment(map).map_err(|e| fail(format!("{e:#}")))?);
    }
    Ok(css)
}
