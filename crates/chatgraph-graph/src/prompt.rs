use chatgraph_llm::Message;

/// Prompt text with a `{history}` placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill `{history}` with a role-prefixed transcript of `history`
    pub fn render(&self, history: &[Message]) -> String {
        self.template.replace("{history}", &transcript(history))
    }
}

fn transcript(history: &[Message]) -> String {
    history
        .iter()
        .map(|msg| {
            let calls = msg
                .tool_calls()
                .iter()
                .map(|call| format!("[tool call] {}({})", call.function.name, call.function.arguments))
                .collect::<Vec<_>>();
            let text = if calls.is_empty() {
                msg.text()
            } else {
                calls.join("; ")
            };
            format!("{}: {}", msg.role(), text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_llm::ToolCall;

    #[test]
    fn test_render_transcript() {
        let template = PromptTemplate::new("History:\n{history}\nEnd");
        let rendered = template.render(&[
            Message::human("how many users?"),
            Message::ai_with_tools(vec![ToolCall::new("c1", "query_sql_data", r#"{"query":"SELECT 1"}"#)]),
            Message::tool_result("c1", "1"),
        ]);

        assert_eq!(
            rendered,
            "History:\nuser: how many users?\nassistant: [tool call] query_sql_data({\"query\":\"SELECT 1\"})\ntool: 1\nEnd"
        );
    }

    #[test]
    fn test_template_without_placeholder_is_unchanged() {
        let template = PromptTemplate::new("static");
        assert_eq!(template.render(&[Message::human("x")]), "static");
    }
}
