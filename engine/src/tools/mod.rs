//! Built-in tools and the tool registry

pub mod echo;
pub mod http_fetch;
pub mod summarize;
pub mod url_guard;

pub use echo::EchoTool;
pub use http_fetch::HttpFetchTool;
pub use summarize::SummarizeTool;

use sdk::tool::Tool;
use sdk::types::{ToolError, ToolId, ToolInput};
use std::sync::Arc;
use tracing::debug;

/// Registry of tools the executor can dispatch to.
///
/// Each [`ToolId`] has an optional slot; only occupied slots are
/// dispatchable. `echo`, `http_fetch`, and `web_summarize` ship with the
/// engine; `web_search`, `web_page_text`, and `build_repo` are provided by
/// the embedding host through [`ToolRegistry::register`].
pub struct ToolRegistry {
    echo: Option<Arc<dyn Tool>>,
    http_fetch: Option<Arc<dyn Tool>>,
    web_search: Option<Arc<dyn Tool>>,
    web_page_text: Option<Arc<dyn Tool>>,
    web_summarize: Option<Arc<dyn Tool>>,
    build_repo: Option<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self {
            echo: None,
            http_fetch: None,
            web_search: None,
            web_page_text: None,
            web_summarize: None,
            build_repo: None,
        }
    }

    /// Registry pre-populated with the built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(HttpFetchTool::new()));
        registry.register(Arc::new(SummarizeTool));
        registry
    }

    /// Register a tool implementation into the slot its `id()` names.
    ///
    /// Replaces any previous occupant of the slot.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let slot = match tool.id() {
            ToolId::Echo => &mut self.echo,
            ToolId::HttpFetch => &mut self.http_fetch,
            ToolId::WebSearch => &mut self.web_search,
            ToolId::WebPageText => &mut self.web_page_text,
            ToolId::WebSummarize => &mut self.web_summarize,
            ToolId::BuildRepo => &mut self.build_repo,
        };
        *slot = Some(tool);
    }

    fn slot(&self, id: ToolId) -> Option<&Arc<dyn Tool>> {
        match id {
            ToolId::Echo => self.echo.as_ref(),
            ToolId::HttpFetch => self.http_fetch.as_ref(),
            ToolId::WebSearch => self.web_search.as_ref(),
            ToolId::WebPageText => self.web_page_text.as_ref(),
            ToolId::WebSummarize => self.web_summarize.as_ref(),
            ToolId::BuildRepo => self.build_repo.as_ref(),
        }
    }

    /// Whether a tool is currently enabled.
    pub fn is_enabled(&self, id: ToolId) -> bool {
        self.slot(id).is_some()
    }

    /// Identifiers of all currently enabled tools, in stable order.
    pub fn enabled_tools(&self) -> Vec<ToolId> {
        ToolId::ALL
            .into_iter()
            .filter(|id| self.is_enabled(*id))
            .collect()
    }

    /// Dispatch an invocation to the tool in the slot.
    pub async fn invoke(
        &self,
        id: ToolId,
        input: &ToolInput,
    ) -> Result<serde_json::Value, ToolError> {
        debug!(tool = %id, "tool_dispatch");

        let tool = self
            .slot(id)
            .ok_or_else(|| ToolError::NotEnabled(id.wire_name().to_string()))?;

        tool.invoke(input).await
    }
}
