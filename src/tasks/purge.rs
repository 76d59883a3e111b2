// src/tasks/purge.rs

//! Unused-selector detection.
//!
//! Class and id names found in the stylesheet's selectors are compared
//! against the tokens of the content files; names that never appear there
//! are reported as unused so the CSS minifier drops the rules using them.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static PRELUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{").expect("valid prelude regex"));

// Identifiers may contain CSS escapes (`.lg\:grid`, `.w-1\/3`, `.\32xl`).
static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[.#](-?(?:[A-Za-z_]|\\[0-9a-fA-F]{1,6} ?|\\[^0-9a-fA-F\r\n])(?:[\w-]|\\[0-9a-fA-F]{1,6} ?|\\[^0-9a-fA-F\r\n])*)",
    )
    .expect("valid symbol regex")
});

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("valid word regex"));

static UTILITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_:/-]+").expect("valid utility regex"));

/// Class and id names used in the selectors of `css` (printed, unminified).
pub fn selector_symbols(css: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    for prelude in PRELUDE_RE.captures_iter(css) {
        let prelude = prelude[1].trim();
        if prelude.starts_with('@') {
            continue;
        }
        for symbol in SYMBOL_RE.captures_iter(prelude) {
            out.insert(unescape_ident(&symbol[1]));
        }
    }
    out
}

/// Resolve CSS escapes in an identifier: `lg\:grid` -> `lg:grid`,
/// `\32 xl` -> `2xl`.
pub fn unescape_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }

        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(decoded);
        // One whitespace character terminates a hex escape.
        if chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
    }

    out
}

/// Every token a content file could be referring to.
pub fn content_tokens<'a>(contents: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    let mut out = HashSet::new();
    for content in contents {
        out.extend(WORD_RE.find_iter(content).map(|m| m.as_str().to_string()));
        out.extend(UTILITY_RE.find_iter(content).map(|m| m.as_str().to_string()));
    }
    out
}

/// Selector symbols that no content file mentions.
pub fn unused_symbols(css: &str, tokens: &HashSet<String>) -> HashSet<String> {
    selector_symbols(css)
        .into_iter()
        .filter(|symbol| !tokens.contains(symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_classes_and_ids_from_selectors_only() {
        let css = ".btn, #hero > .title:hover { color: #fff; }\n@media (min-width: 10px) { .wide { width: 1px; } }";
        let symbols = selector_symbols(css);
        assert!(symbols.contains("btn"));
        assert!(symbols.contains("hero"));
        assert!(symbols.contains("title"));
        assert!(symbols.contains("wide"));
        assert!(!symbols.contains("fff"));
    }

    #[test]
    fn html_tokens_keep_utility_names() {
        let tokens = content_tokens([r#"<div class="md:flex w-1/2 btn">"#]);
        assert!(tokens.contains("btn"));
        assert!(tokens.contains("md:flex"));
        assert!(tokens.contains("w-1/2"));
        assert!(tokens.contains("flex"));
    }

    #[test]
    fn escaped_utility_classes_are_unescaped() {
        let css = ".md\\:flex { a: b } .lg\\:grid { a: b } .w-1\\/3 { a: b } .\\32 xl\\:p-4 { a: b }";
        let symbols = selector_symbols(css);
        assert!(symbols.contains("md:flex"));
        assert!(symbols.contains("lg:grid"));
        assert!(symbols.contains("w-1/3"));
        assert!(symbols.contains("2xl:p-4"));
        assert!(!symbols.contains("lg"));
    }

    #[test]
    fn unused_escaped_classes_are_reported() {
        let css = ".lead { a: b } .md\\:flex { a: b } .lg\\:grid { a: b } .w-1\\/3 { a: b }";
        let tokens = content_tokens([r#"<p class="md:flex lead"></p>"#]);
        let mut unused: Vec<String> = unused_symbols(css, &tokens).into_iter().collect();
        unused.sort();
        assert_eq!(unused, vec!["lg:grid".to_string(), "w-1/3".to_string()]);
    }

    #[test]
    fn unused_is_the_difference() {
        let css = ".used { a: b } .unused { a: b }";
        let tokens = content_tokens(["<p class=\"used\"></p>"]);
        let unused = unused_symbols(css, &tokens);
        assert_eq!(unused.into_iter().collect::<Vec<_>>(), vec!["unused".to_string()]);
    }
}
