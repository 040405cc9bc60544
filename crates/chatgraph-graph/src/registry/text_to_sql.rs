use super::{BuildContext, GraphBlueprint, GraphLabel};
use crate::graph::{CompiledGraph, StateGraph};
use crate::nodes::{HistoryNode, LlmNode, ToolNode};
use crate::prompt::PromptTemplate;
use crate::router::{ToolsCondition, END};
use anyhow::Result;
use std::sync::Arc;

/// Schema description used when none is configured
pub const DEFAULT_SCHEMA: &str = "\
## table: users
id:int:user id
name:varchar(255):user name
created_at:timestamp:creation time";

const SQL_PROMPT: &str = "You are a database query assistant. Translate the user's request into a \
single accurate and efficient SQL query, then run it with the available tools.

Tables and columns:
{schema}

Conversation:
{history}

Rules:
1. Only generate SELECT statements; never modify data.
2. Check the SQL carefully before running it.
3. Prefer returning results as a table.
4. If the request is unrelated to the database, guide the user towards a database question.";

const SYNTHESIZER_PROMPT: &str = "You are a data summarizer. Present the query results from the \
conversation below as a Markdown table, followed by a short explanation.

Conversation:
{history}";

/// Natural language to SQL:
/// `history_manager -> sql_executor -> (tools -> result_synthesizer)? -> end`
pub struct TextToSqlGraph {
    schema: String,
}

impl TextToSqlGraph {
    pub const EXECUTOR: &'static str = "sql_executor";
    pub const SYNTHESIZER: &'static str = "result_synthesizer";

    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    fn sql_prompt(&self) -> PromptTemplate {
        PromptTemplate::new(SQL_PROMPT.replace("{schema}", &self.schema))
    }
}

impl GraphBlueprint for TextToSqlGraph {
    fn name(&self) -> &str {
        "text_to_sql"
    }

    fn label(&self) -> GraphLabel {
        GraphLabel::Agent
    }

    fn title(&self) -> &str {
        "SQL assistant [beta]"
    }

    fn description(&self) -> &str {
        "Turns questions into read-only SQL queries and summarizes the results"
    }

    fn build(&self, ctx: &BuildContext) -> Result<CompiledGraph> {
        let executor = LlmNode::new(Self::EXECUTOR, Arc::clone(&ctx.client), ctx.llm.clone())
            .with_tools(ctx.tools.schemas())
            .with_prompt(self.sql_prompt());
        let synthesizer = LlmNode::new(Self::SYNTHESIZER, Arc::clone(&ctx.client), ctx.llm.clone())
            .with_prompt(PromptTemplate::new(SYNTHESIZER_PROMPT));

        let mut graph = StateGraph::new()
            .add_node(Arc::new(HistoryNode::new(ctx.window.clone())))
            .add_node(Arc::new(executor))
            .add_node(Arc::new(ToolNode::new(Arc::clone(&ctx.tools))))
            .add_node(Arc::new(synthesizer))
            .set_entry_point(HistoryNode::DEFAULT_NAME)
            .add_edge(HistoryNode::DEFAULT_NAME, Self::EXECUTOR)
            .add_conditional_edges(Self::EXECUTOR, Arc::new(ToolsCondition::new(ToolNode::DEFAULT_NAME)))
            .add_edge(ToolNode::DEFAULT_NAME, Self::SYNTHESIZER)
            .add_edge(Self::SYNTHESIZER, END);

        if let Some(checkpointer) = &ctx.checkpointer {
            graph = graph.with_checkpointer(Arc::clone(checkpointer));
        }

        graph.compile(ctx.graph.clone())
    }
}
