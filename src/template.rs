//! Named prompt templates and the substitution applied after a turn.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub pattern: &'static str,
}

pub const DEFAULT_TEMPLATE: &str = "Default";

pub static TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate { name: DEFAULT_TEMPLATE, pattern: "" },
    PromptTemplate {
        name: "Summarize Text",
        pattern: "Please summarize the following text:\n\n{text}",
    },
    PromptTemplate {
        name: "Answer Question",
        pattern: "Answer the following question based on the context:\n\nQuestion: {question}\nContext: {context}",
    },
    PromptTemplate { name: "Write a Story", pattern: "Write a short story about {topic}" },
];

pub fn lookup(name: &str) -> Option<&'static PromptTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Substitution {
    /// Default template; nothing to do.
    Unchanged,
    /// New content for the last transcript turn.
    Replace(String),
    InsufficientInput,
    NoMatch,
}

impl Substitution {
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Substitution::InsufficientInput => {
                Some("Please provide both a question and context for this template.")
            }
            Substitution::NoMatch => Some("The selected template does not match your input."),
            Substitution::Unchanged | Substitution::Replace(_) => None,
        }
    }
}

impl PromptTemplate {
    pub fn is_default(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Fills the template from a single free-text input.
    ///
    /// `{text}` wins over `{topic}`; `{question}`+`{context}` need two inputs,
    /// so with one input they are always reported as insufficient.
    pub fn substitute(&self, raw_user_text: &str) -> Substitution {
        let p = self.pattern;
        if self.is_default() {
            Substitution::Unchanged
        } else if p.contains("{text}") {
            Substitution::Replace(p.replace("{text}", raw_user_text))
        } else if p.contains("{question}") && p.contains("{context}") {
            Substitution::InsufficientInput
        } else if p.contains("{topic}") {
            Substitution::Replace(p.replace("{topic}", raw_user_text))
        } else {
            Substitution::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_menu() {
        let names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        assert_eq!(names, ["Default", "Summarize Text", "Answer Question", "Write a Story"]);
    }

    #[test]
    fn text_and_topic_substitute() {
        assert_eq!(
            lookup("Summarize Text").unwrap().substitute("abc"),
            Substitution::Replace("Please summarize the following text:\n\nabc".into())
        );
        assert_eq!(
            lookup("Write a Story").unwrap().substitute("dragons"),
            Substitution::Replace("Write a short story about dragons".into())
        );
    }

    #[test]
    fn question_context_needs_two_inputs() {
        let s = lookup("Answer Question").unwrap().substitute("why?");
        assert_eq!(s, Substitution::InsufficientInput);
        assert!(s.warning().unwrap().contains("question and context"));
    }

    #[test]
    fn default_and_unknown_placeholders() {
        assert_eq!(lookup(DEFAULT_TEMPLATE).unwrap().substitute("x"), Substitution::Unchanged);
        let odd = PromptTemplate { name: "Odd", pattern: "Translate {lang}" };
        assert_eq!(odd.substitute("x"), Substitution::NoMatch);
        assert!(lookup("Nope").is_none());
    }
}
