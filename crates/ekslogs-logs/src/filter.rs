//! Combines include and exclude terms into one CloudWatch Logs filter pattern.

use std::borrow::Cow;

use tracing::debug;

/// Characters that mark a term as already using filter syntax
const STRUCTURAL_MARKERS: [char; 4] = ['{', '[', '?', '*'];

/// Combine include terms (AND) and exclude terms (OR by repeated negation)
/// into a single filter pattern. Returns an empty string when both are empty.
pub fn combine<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(includes.len() + excludes.len());

    for term in includes {
        let quoted = quote_term(term.as_ref());
        debug!(term = term.as_ref(), processed = %quoted, "include pattern");
        parts.push(quoted.into_owned());
    }

    for term in excludes {
        let negated = format!("-{}", quote_term(term.as_ref()));
        debug!(term = term.as_ref(), processed = %negated, "exclude pattern");
        parts.push(negated);
    }

    let combined = parts.join(" ");
    if !combined.is_empty() {
        debug!(pattern = %combined, "combined filter pattern");
    }
    combined
}

/// Whether a plain-text term must be wrapped in double quotes
pub fn needs_quoting(term: &str) -> bool {
    !term.starts_with('"')
        && !term.ends_with('"')
        && !term.contains(STRUCTURAL_MARKERS)
        && !term.starts_with('-')
}

/// Wrap a term in double quotes unless it already carries filter syntax
pub fn quote_term(term: &str) -> Cow<'_, str> {
    if needs_quoting(term) {
        Cow::Owned(format!("\"{}\"", term))
    } else {
        Cow::Borrowed(term)
    }
}
