// src/tasks/images.rs

//! Lossless-where-possible image compression.
//!
//! PNG goes through oxipng, JPEG is re-encoded at the configured quality,
//! SVG has comments, metadata and inter-tag whitespace stripped. Anything
//! else (GIF included) is copied. The smaller of the original and the
//! compressed bytes is written, so no output is ever larger than its input.

use std::sync::LazyLock;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ImagesSection;
use crate::errors::{PipelineError, Result};
use crate::tasks::context::{BuildContext, TaskReport};
use crate::types::{AssetCategory, TaskKind};

static SVG_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static SVG_METADATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<metadata\b.*?</metadata>").expect("valid metadata regex"));

static SVG_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid whitespace regex"));

/// Image kinds the task knows how to shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Svg,
    Other,
}

impl ImageKind {
    pub fn from_name(name: &str) -> Self {
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => ImageKind::Png,
            Some("jpg") | Some("jpeg") => ImageKind::Jpeg,
            Some("svg") => ImageKind::Svg,
            _ => ImageKind::Other,
        }
    }
}

pub fn run(ctx: &BuildContext) -> Result<TaskReport> {
    let settings = ctx.config.images();
    let mut report = TaskReport::default();
    let mut saved: u64 = 0;

    for file in ctx.sources(AssetCategory::Images)? {
        let original = ctx.fs.read(&file.path).map_err(fail)?;
        let kind = ImageKind::from_name(&file.rel_path);
        let output = match compress(kind, &original, settings) {
            Ok(bytes) if bytes.len() < original.len() => bytes,
            Ok(_) => original.clone(),
            Err(err) => {
                // A file the codec cannot handle is still delivered.
                warn!(file = %file.rel_path, error = %err, "could not compress image; copying as-is");
                original.clone()
            }
        };
        saved += (original.len() - output.len()) as u64;

        let out = ctx.output_path(AssetCategory::Images, &file);
        ctx.fs.write(&out, &output).map_err(fail)?;
        debug!(
            src = %file.rel_path,
            before = original.len(),
            after = output.len(),
            "wrote image"
        );
        report.record(out);
    }

    debug!(files = report.files_written, saved_bytes = saved, "images done");
    Ok(report)
}

fn fail(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::transform(TaskKind::Images, err.to_string())
}

/// Compress one image. The result may be larger than the input; callers
/// pick the smaller one.
pub fn compress(kind: ImageKind, data: &[u8], settings: &ImagesSection) -> anyhow::Result<Vec<u8>> {
    match kind {
        ImageKind::Png => {
            let options = oxipng::Options::from_preset(settings.png_preset);
            Ok(oxipng::optimize_from_memory(data, &options)?)
        }
        ImageKind::Jpeg => {
            let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
            let mut out = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality);
            image::DynamicImage::ImageRgb8(decoded.to_rgb8()).write_with_encoder(encoder)?;
            Ok(out)
        }
        ImageKind::Svg => {
            let text = std::str::from_utf8(data)?;
            Ok(minify_svg(text).into_bytes())
        }
        ImageKind::Other => Ok(data.to_vec()),
    }
}

pub fn minify_svg(svg: &str) -> String {
    let without_comments = SVG_COMMENT_RE.replace_all(svg, "");
    let without_metadata = SVG_METADATA_RE.replace_all(&without_comments, "");
    SVG_GAP_RE
        .replace_all(&without_metadata, "><")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(ImageKind::from_name("a/b.PNG"), ImageKind::Png);
        assert_eq!(ImageKind::from_name("photo.jpeg"), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_name("icon.svg"), ImageKind::Svg);
        assert_eq!(ImageKind::from_name("anim.gif"), ImageKind::Other);
    }

    #[test]
    fn svg_minify_strips_comments_and_gaps() {
        let svg = "<svg>\n  <!-- logo -->\n  <metadata>x</metadata>\n  <rect width=\"1\"/>\n</svg>\n";
        assert_eq!(minify_svg(svg), "<svg><rect width=\"1\"/></svg>");
    }

    #[test]
    fn gif_passes_through() {
        let data = b"GIF89a....";
        let out = compress(ImageKind::Other, data, &ImagesSection::default()).unwrap();
        assert_eq!(out, data);
    }
}
