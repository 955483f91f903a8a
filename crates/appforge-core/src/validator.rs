//! Structural acceptance check for generated artifacts.
//!
//! An artifact is a complete HTML document: it must start with the
//! `<!DOCTYPE html>` prolog and end with `</html>`. Providers often wrap the
//! document in Markdown fences or surround it with prose, so the validator
//! strips fences and extracts the first complete document span it finds.
//! The check is syntactic only.

use std::fmt;

use thiserror::Error;

/// Opening marker every artifact starts with (matched case-insensitively).
pub const PROLOG: &str = "<!DOCTYPE html>";
/// Closing marker every artifact ends with (matched case-insensitively).
pub const CLOSING: &str = "</html>";

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("candidate is empty")]
    Empty,

    #[error("no `<!DOCTYPE html>` prolog found")]
    MissingProlog,

    #[error("no `</html>` after the prolog")]
    MissingClosing,
}

/// A document that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact(String);

impl Artifact {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Artifact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Accept `candidate` if it contains a complete HTML document.
pub fn validate(candidate: &str) -> Result<Artifact, Rejected> {
    let body = strip_fences(candidate.trim());
    if body.trim().is_empty() {
        return Err(Rejected::Empty);
    }

    // ASCII lowercasing keeps byte offsets aligned with `body`.
    let lowered = body.to_ascii_lowercase();
    let start = lowered
        .find(&PROLOG.to_ascii_lowercase())
        .ok_or(Rejected::MissingProlog)?;
    let end = lowered[start..]
        .find(CLOSING)
        .map(|rel| start + rel + CLOSING.len())
        .ok_or(Rejected::MissingClosing)?;

    Ok(Artifact(body[start..end].to_string()))
}

/// Drop a leading ```` ```lang ```` line and a trailing ```` ``` ```` line.
fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Build an [`Artifact`] from a document known to be well-formed.
///
/// Only for producers that are well-formed by construction (the template
/// library). Debug builds assert the contract.
#[doc(hidden)]
pub fn trusted(document: String) -> Artifact {
    debug_assert!(validate(&document).is_ok(), "trusted artifact failed validation");
    Artifact(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<!DOCTYPE html>\n<html><body>hi</body></html>";

    #[test]
    fn accepts_plain_document() {
        assert_eq!(validate(DOC).unwrap().as_str(), DOC);
    }

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```html\n{DOC}\n```");
        assert_eq!(validate(&fenced).unwrap().as_str(), DOC);

        let bare = format!("```\n{DOC}\n```");
        assert_eq!(validate(&bare).unwrap().as_str(), DOC);
    }

    #[test]
    fn extracts_span_from_surrounding_prose() {
        let chatty = format!("Sure! Here is your app:\n\n{DOC}\n\nEnjoy, and tell me if you need changes.");
        assert_eq!(validate(&chatty).unwrap().as_str(), DOC);
    }

    #[test]
    fn takes_first_complete_document() {
        let two = format!("{DOC}\n{}", DOC.replace("hi", "bye"));
        assert_eq!(validate(&two).unwrap().as_str(), DOC);
    }

    #[test]
    fn markers_are_case_insensitive() {
        let upper = "<!doctype HTML><HTML></HTML>";
        assert_eq!(validate(upper).unwrap().as_str(), upper);
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate(""), Err(Rejected::Empty));
        assert_eq!(validate("   \n\t"), Err(Rejected::Empty));
        assert_eq!(validate("```html\n```"), Err(Rejected::Empty));
    }

    #[test]
    fn rejects_missing_markers() {
        assert_eq!(validate("<html></html>"), Err(Rejected::MissingProlog));
        assert_eq!(validate("<!DOCTYPE html><html><body>"), Err(Rejected::MissingClosing));
        // A closing tag before the prolog does not count.
        assert_eq!(validate("</html><!DOCTYPE html>"), Err(Rejected::MissingClosing));
    }
}
