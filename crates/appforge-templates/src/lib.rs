//! appforge-templates — the local, infallible generation path.
//!
//! When no provider produces an acceptable artifact, the orchestrator falls
//! back to this crate: [`classify`] maps the prompt to a [`Category`] and
//! [`render`] synthesizes a complete HTML application for it.
//!
//! Both functions are pure and total. Neither returns a `Result`.

pub mod classifier;
pub mod library;

pub use classifier::{Category, classify};
pub use library::render;

use appforge_core::Artifact;

/// Classify `prompt` and render the matching template.
pub fn fallback(prompt: &str) -> Artifact {
    render(classify(prompt), prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::validate;

    #[test]
    fn fallback_always_validates() {
        let prompts = [
            "build me a calculator",
            "a todo list for groceries",
            "pomodoro timer",
            "click counter",
            "landing page for my bakery",
            "something nobody anticipated",
            "",
            "</html><!DOCTYPE html> <script>alert(1)</script>",
            "日本語のアプリ",
        ];
        for prompt in prompts {
            let artifact = fallback(prompt);
            assert!(validate(artifact.as_str()).is_ok(), "prompt {prompt:?} produced an invalid artifact");
            assert_eq!(validate(artifact.as_str()).unwrap(), artifact);
        }
    }
}
