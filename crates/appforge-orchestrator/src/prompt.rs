//! Enhanced prompt sent to providers.

/// Fixed instruction preamble placed before the user's request.
pub const PREAMBLE: &str = "\
Build a complete, working single-page web application for the request below.
Requirements:
- Output one self-contained HTML document starting with <!DOCTYPE html> and ending with </html>.
- Inline all CSS in a <style> tag and all JavaScript in a <script> tag; no external assets.
- Make it responsive and usable on mobile.
- Do not include explanations or Markdown, only the document.";

/// Wrap a user prompt with the instruction preamble.
pub fn enhance_prompt(prompt: &str) -> String {
    format!("{PREAMBLE}\n\nRequest: {}", prompt.trim())
}
