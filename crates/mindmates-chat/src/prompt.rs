//! Instruction template: an external text asset with a single
//! `{{userMessages}}` substitution point, loaded once at startup and
//! immutable afterwards.

use mindmates_core::ChatError;

/// The one substitution point the template must contain exactly once.
pub const PLACEHOLDER: &str = "{{userMessages}}";

/// Built-in template used when no asset file is present. Carries the full
/// structured-output contract; there is no separate system message.
const DEFAULT_TEMPLATE: &str = r#"You are a warm, supportive companion in a peer-support app. Below are all the messages one user has sent you so far, oldest first:

{{userMessages}}

Reply with ONLY a JSON object, no commentary and no code fences, matching this exact shape:
{"chatResponse": "your empathetic reply to the latest message", "mindTributes": [{"type": "anxiety|sadness|loneliness|fear|anger", "score": 0.0, "summary": "one sentence"}]}

Include a mindTributes entry only for emotional states actually present in the messages; score is intensity from 0 to 10. mindTributes may be empty."#;

/// A validated instruction template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Validates and wraps template text. A template without exactly one
    /// placeholder is a configuration error.
    pub fn from_text(text: impl Into<String>) -> Result<Self, ChatError> {
        let text = text.into();
        match text.matches(PLACEHOLDER).count() {
            1 => Ok(Self { text }),
            n => Err(ChatError::Configuration(format!(
                "prompt template must contain {} exactly once (found {})",
                PLACEHOLDER, n
            ))),
        }
    }

    /// Loads the template from `path`, falling back to the built-in default
    /// when the file is absent. A file that exists but is invalid is an error.
    pub fn load_path(path: &str) -> Result<Self, ChatError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!(target: "mindmates::chat", path, "loaded prompt template");
                Self::from_text(text)
            }
            Err(_) => {
                tracing::info!(target: "mindmates::chat", path, "no template asset, using built-in default");
                Self::from_text(DEFAULT_TEMPLATE)
            }
        }
    }

    /// Renders the template: the ordered transcript (oldest first) is joined
    /// with newlines and substituted for the placeholder exactly once.
    pub fn render(&self, user_messages: &[String]) -> String {
        self.text.replacen(PLACEHOLDER, &user_messages.join("\n"), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_keeps_order_and_newline_separation() {
        let template = PromptTemplate::from_text("Context:\n{{userMessages}}\nEnd.").unwrap();
        let history = vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
        ];
        let rendered = template.render(&history);
        assert_eq!(rendered, "Context:\nfirst\nsecond\nthird\nEnd.");
    }

    #[test]
    fn render_substitutes_exactly_once() {
        let template = PromptTemplate::from_text("Respond to: {{userMessages}}").unwrap();
        let rendered = template.render(&["I feel stuck today".to_string()]);
        assert_eq!(rendered, "Respond to: I feel stuck today");
        assert!(!rendered.contains(PLACEHOLDER));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(matches!(
            PromptTemplate::from_text("no substitution point"),
            Err(ChatError::Configuration(_))
        ));
        assert!(matches!(
            PromptTemplate::from_text("{{userMessages}} twice {{userMessages}}"),
            Err(ChatError::Configuration(_))
        ));
    }

    #[test]
    fn default_template_is_valid() {
        let template = PromptTemplate::load_path("/definitely/not/a/real/path.txt").unwrap();
        let rendered = template.render(&["hello".to_string()]);
        assert!(rendered.contains("hello"));
        assert!(rendered.contains("chatResponse"));
    }
}
