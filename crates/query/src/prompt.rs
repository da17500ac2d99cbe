use serde::{Deserialize, Serialize};

/// A language as the services see it (`code`) and as the model reads it
/// (`name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// The user asks in `source`; retrieval and prompting happen in `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Languages {
    pub source: Language,
    pub target: Language,
}

impl Default for Languages {
    fn default() -> Self {
        Self {
            source: Language::new("id", "Indonesian"),
            target: Language::new("en", "English"),
        }
    }
}

/// Newline-joined passage texts, in retrieval order.
pub fn build_context<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts.into_iter().collect::<Vec<_>>().join("\n")
}

/// Compose the answer prompt. The context and question are in the target
/// language; the answer must come back in the user's source language.
pub fn build_answer_prompt(context: &str, question: &str, languages: &Languages) -> String {
    format!(
        r#"Based on the following information (in {target}):
{context}

Question (in {target}): {question}

Please answer the question above in {source}."#,
        target = languages.target.name,
        source = languages.source.name,
        context = context,
        question = question,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_asks_for_source_language() {
        let prompt = build_answer_prompt(
            "Happiness is a choice.",
            "What is happiness?",
            &Languages::default(),
        );

        assert!(prompt.starts_with("Based on the following information (in English):\nHappiness is a choice."));
        assert!(prompt.contains("Question (in English): What is happiness?"));
        assert!(prompt.ends_with("Please answer the question above in Indonesian."));
    }

    #[test]
    fn test_empty_context_keeps_section() {
        let prompt = build_answer_prompt("", "Q?", &Languages::default());
        assert!(prompt.contains("(in English):\n\n\nQuestion"));
    }

    #[test]
    fn test_context_preserves_order() {
        assert_eq!(build_context(["c", "a", "b"]), "c\na\nb");
        assert_eq!(build_context(Vec::<&str>::new()), "");
    }
}
