//! Prompt templates for documentation requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a code fragment represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Class,
    Method,
    Other,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Class => write!(f, "class"),
            SegmentKind::Method => write!(f, "method"),
            SegmentKind::Other => write!(f, "other"),
        }
    }
}

/// Render the instruction sent to the model for one fragment.
///
/// The fragment is placed inside a ```` ```php ```` fence without escaping, so
/// a fragment containing a fence will close it early.
pub fn build_prompt(code: &str, kind: SegmentKind, name: &str) -> String {
    match kind {
        SegmentKind::Class => format!(
            "Generate detailed documentation for the following PHP class named `{}`:\n\n\
            ```php\n{}\n```\n\n\
            Include a description of the class's purpose, its properties, and its methods \
            with explanations of their functionalities.",
            name, code
        ),
        SegmentKind::Method => format!(
            "Generate detailed documentation for the following PHP method named `{}`:\n\n\
            ```php\n{}\n```\n\n\
            Include a description of what the method does, its parameters, return values, \
            and an example usage.",
            name, code
        ),
        SegmentKind::Other => format!(
            "Generate documentation for the following PHP code:\n\n```php\n{}\n```\n\n",
            code
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = "<?php\nclass X {\n // ... \n}";

    #[test]
    fn test_class_prompt() {
        let prompt = build_prompt(SNIPPET, SegmentKind::Class, "Foo");
        assert!(prompt.starts_with(
            "Generate detailed documentation for the following PHP class named `Foo`:\n\n```php\n"
        ));
        assert!(prompt.contains(SNIPPET));
        assert!(prompt.ends_with("explanations of their functionalities."));
    }

    #[test]
    fn test_method_prompt() {
        let prompt = build_prompt(SNIPPET, SegmentKind::Method, "bar");
        assert!(prompt.contains("PHP method named `bar`"));
        assert!(prompt.contains(&format!("```php\n{}\n```", SNIPPET)));
        assert!(prompt.ends_with("and an example usage."));
    }

    #[test]
    fn test_other_prompt_ignores_name() {
        let prompt = build_prompt("echo 1;", SegmentKind::Other, "unused");
        assert_eq!(
            prompt,
            "Generate documentation for the following PHP code:\n\n```php\necho 1;\n```\n\n"
        );
    }

    #[test]
    fn test_prompt_is_deterministic() {
        for kind in [SegmentKind::Class, SegmentKind::Method, SegmentKind::Other] {
            assert_eq!(
                build_prompt(SNIPPET, kind, "Same"),
                build_prompt(SNIPPET, kind, "Same")
            );
        }
    }

    #[test]
    fn test_name_change_only_touches_name() {
        let alpha = build_prompt(SNIPPET, SegmentKind::Class, "Alpha");
        let beta = build_prompt(SNIPPET, SegmentKind::Class, "Beta");
        assert_ne!(alpha, beta);
        assert_eq!(alpha.replace("Alpha", "Beta"), beta);
    }

    #[test]
    fn test_fence_not_escaped() {
        let prompt = build_prompt("a\n```\nb", SegmentKind::Other, "");
        assert_eq!(prompt.matches("```").count(), 3);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SegmentKind::Class.to_string(), "class");
        assert_eq!(SegmentKind::Method.to_string(), "method");
        assert_eq!(SegmentKind::Other.to_string(), "other");
    }
}
