// src/tasks/scripts.rs

//! Script pipeline: transpile to the configured target; development keeps
//! an inline source map, production minifies (compress + mangle).

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::tasks::context::{BuildContext, TaskReport};
use crate::types::{AssetCategory, Mode, TaskKind};

pub fn run(ctx: &BuildContext) -> Result<TaskReport> {
    let options = TransformOptions::from_target(&ctx.config.scripts().target)
        .map_err(|e| fail(format!("invalid target: {e}")))?;

    let mut report = TaskReport::default();
    for file in ctx.sources(AssetCategory::Scripts)? {
        let source = ctx.fs.read_to_string(&file.path).map_err(fail)?;
        let code = compile(&file.path, &file.rel_path, &source, &options, ctx.mode)?;
        let out = ctx.output_path(AssetCategory::Scripts, &file);
        ctx.fs.write(&out, code.as_bytes()).map_err(fail)?;
        debug!(src = %file.rel_path, dest = %ctx.display_path(&out), "wrote script");
        report.record(out);
    }
    Ok(report)
}

fn fail(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::transform(TaskKind::Scripts, err.to_string())
}

/// Transpile one script.
pub fn compile(
    path: &Path,
    display: &str,
    source: &str,
    options: &TransformOptions,
    mode: Mode,
) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = parsed.errors.first() {
        return Err(fail(format!("{display}: {err}")));
    }
    let mut program = parsed.program;

    let semantic = SemanticBuilder::new().build(&program);
    if let Some(err) = semantic.errors.first() {
        return Err(fail(format!("{display}: {err}")));
    }
    let (symbols, scopes) = semantic.semantic.into_symbol_table_and_scope_tree();

    let transformed = Transformer::new(&allocator, path, options)
        .build_with_symbols_and_scopes(symbols, scopes, &mut program);
    if let Some(err) = transformed.errors.first() {
        return Err(fail(format!("{display}: {err}")));
    }

    match mode {
        Mode::Development => {
            let generated = Codegen::new()
                .with_options(CodegenOptions {
                    source_map_path: Some(path.to_path_buf()),
                    ..CodegenOptions::default()
                })
                .build(&program);

            let mut code = generated.code;
            if let Some(map) = generated.map {
                code.push_str("\n//# sourceMappingURL=");
                code.push_str(&map.to_data_url());
                code.push('\n');
            }
            Ok(code)
        }
        Mode::Production => {
            let minified = Minifier::new(MinifierOptions::default()).build(&allocator, &mut program);
            let generated = Codegen::new()
                .with_options(CodegenOptions {
                    minify: true,
                    ..CodegenOptions::default()
                })
                .with_symbol_table(minified.symbol_table)
                .build(&program);
            Ok(generated.code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "const fallback = window.config ?? {};\nconsole.log(fallback);\n";

    const VERBOSE: &str = "function computeTotal(firstValue, secondValue) {\n    // add both values\n    const combinedResult = firstValue + secondValue;\n    return combinedResult;\n}\nconsole.log(computeTotal(1, 2));\n";

    fn options() -> TransformOptions {
        TransformOptions::from_target("es2015").unwrap()
    }

    #[test]
    fn development_output_has_inline_map() {
        let out = compile(Path::new("main.js"), "main.js", SOURCE, &options(), Mode::Development)
            .unwrap();
        assert!(out.contains("//# sourceMappingURL=data:application/json"));
        assert!(!out.contains("??"), "nullish coalescing is lowered for es2015");
    }

    #[test]
    fn production_output_is_minified_without_map() {
        let out = compile(Path::new("main.js"), "main.js", VERBOSE, &options(), Mode::Production)
            .unwrap();
        assert!(!out.contains("sourceMappingURL"));
        assert!(!out.contains("add both values"));
        assert!(out.len() < VERBOSE.len());
    }

    #[test]
    fn syntax_errors_fail_the_task() {
        let err = compile(Path::new("bad.js"), "bad.js", "let = ;", &options(), Mode::Development)
            .unwrap_err();
        assert!(err.to_string().contains("bad.js"));
    }
}
