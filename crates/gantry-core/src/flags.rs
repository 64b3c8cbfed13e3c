//! Tokenizer for raw pass-through flag strings.

use std::sync::LazyLock;

use regex::Regex;

static FLAG_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(".*?"|[^"\s=]+)+"#).expect("flag token regex is valid"));

/// Split a free-form flag string into argument tokens.
///
/// Tokens split on whitespace or `=`, but never inside a double-quoted
/// substring. Surrounding quotes stay in the emitted token; the wrapped CLI
/// does its own quote handling, so `--flag="a b"` and `--flag "a b"` both
/// tokenize to `["--flag", "\"a b\""]`.
pub fn parse_flags(input: &str) -> Vec<String> {
    FLAG_TOKEN_RE
        .find_iter(input)
        .map(|m| m.as_str().to_string())
        .collect()
}
