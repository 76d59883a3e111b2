// src/tasks/css_map.rs

//! Inline source maps for stylesheets.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parcel_sourcemap::SourceMap;
use serde_json::json;

/// Serialize a source map as version-3 JSON.
pub fn to_json(map: &mut SourceMap) -> anyhow::Result<String> {
    let mut mappings = Vec::new();
    map.write_vlq(&mut mappings)
        .map_err(|e| anyhow::anyhow!("encoding source map: {e:?}"))?;
    let mappings = String::from_utf8(mappings)?;

    let value = json!({
        "version": 3,
        "sources": map.get_sources(),
        "sourcesContent": map.get_sources_content(),
        "names": map.get_names(),
        "mappings": mappings,
    });
    Ok(serde_json::to_string(&value)?)
}

/// The trailing `sourceMappingURL` comment carrying the map inline.
pub fn inline_comment(map: &mut SourceMap) -> anyhow::Result<String> {
    let encoded = STANDARD.encode(to_json(map)?);
    Ok(format!(
        "\n/*# sourceMappingURL=data:application/json;charset=utf-8;base64,{encoded} */\n"
    ))
}

/// Decode the inline map of a stylesheet produced by [`inline_comment`].
pub fn extract_inline(css: &str) -> Option<serde_json::Value> {
    const MARKER: &str = "sourceMappingURL=data:application/json;charset=utf-8;base64,";
    let start = css.rfind(MARKER)? + MARKER.len();
    let rest = &css[start..];
    let end = rest.find(" */").unwrap_or(rest.len());
    let bytes = STANDARD.decode(rest[..end].trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}
