//! Keyword classifier mapping free-text prompts to template categories.

use std::fmt;

/// Template category for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Calculator,
    TodoList,
    Timer,
    Counter,
    LandingPage,
    Generic,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Calculator => "calculator",
            Category::TodoList => "todo-list",
            Category::Timer => "timer",
            Category::Counter => "counter",
            Category::LandingPage => "landing-page",
            Category::Generic => "generic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered rules; the first category with a matching keyword wins.
const RULES: &[(Category, &[&str])] = &[
    (Category::Calculator, &["calculator", "calc", "arithmetic"]),
    (Category::TodoList, &["todo", "to-do", "to do list", "task list", "checklist"]),
    (Category::Timer, &["timer", "stopwatch", "countdown", "pomodoro"]),
    (Category::Counter, &["counter", "click", "tally"]),
    (Category::LandingPage, &["landing", "homepage", "portfolio", "website"]),
];

/// Map a prompt to a category. Total: unmatched prompts are [`Category::Generic`].
pub fn classify(prompt: &str) -> Category {
    let lowered = prompt.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Generic)
}
