//! Title normalization
//!
//! Produces the canonical comparison key used by the second lookup pass.

use unicode_normalization::UnicodeNormalization;

/// Full-width colon (U+FF1A), common in CJK track titles
const FULLWIDTH_COLON: char = '\u{FF1A}';

/// Turn a raw title into a canonical comparison key
///
/// Steps, in order:
/// 1. Unicode NFKC composition
/// 2. Full-width colon → ASCII colon
/// 3. Lower-case
/// 4. Collapse whitespace runs to one space, trim both ends
///
/// Total and pure; an empty input yields an empty key. Idempotent:
/// `normalize(&normalize(x)) == normalize(x)`.
///
/// # Examples
///
/// ```
/// use rbdo_common::reorder::normalize;
///
/// assert_eq!(normalize("Foo\u{FF1A}Bar"), "foo:bar");
/// assert_eq!(normalize("  FOO:  BAR "), "foo: bar");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let composed: String = raw
        .nfkc()
        .map(|c| if c == FULLWIDTH_COLON { ':' } else { c })
        .collect();
    let lowered = composed.to_lowercase();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}
