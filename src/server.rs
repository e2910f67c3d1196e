//! MCP server implementation.

use crate::tools::{
    AnnotateRequest, ResolveRequest, SearchRequest, handle_annotate, handle_reload,
    handle_resolve, handle_search, handle_status,
};
use crate::worker::RuleState;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server answering rule lookups from the shared [`RuleState`].
#[derive(Clone)]
pub struct RulebookServer {
    state: Arc<RuleState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for RulebookServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulebookServer")
            .field("rules_dir", &self.state.config().rules_dir)
            .finish_non_exhaustive()
    }
}

#[tool_router]
impl RulebookServer {
    pub fn new(state: Arc<RuleState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn rule_state(&self) -> &Arc<RuleState> {
        &self.state
    }

    #[tool(
        description = "Search the rulebook. Every query word must appear in a rule's title, description, or keywords. Results are ranked by relevance; rules that explicitly cite the query (e.g. '@Strength') come first.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search_rules(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Resolve a reference id, rule title, or keyword to the page and section it links to. Matching ignores case but is otherwise exact.",
        input_schema = inline_schema_for_type::<ResolveRequest>()
    )]
    async fn resolve_reference(
        &self,
        Parameters(request): Parameters<ResolveRequest>,
    ) -> std::result::Result<String, String> {
        handle_resolve(&self.state, request).await
    }

    #[tool(
        description = "Annotate rule text: resolves @markers and rule names to links and interprets *italic*, **bold**, and ***bold italic*** emphasis.",
        input_schema = inline_schema_for_type::<AnnotateRequest>()
    )]
    async fn annotate_text(
        &self,
        Parameters(request): Parameters<AnnotateRequest>,
    ) -> std::result::Result<String, String> {
        handle_annotate(&self.state, request).await
    }

    #[tool(
        description = "Reload the rulebook from disk and rebuild the index. If loading fails the previous rules stay in service."
    )]
    async fn reload_rules(&self) -> std::result::Result<String, String> {
        handle_reload(&self.state).await
    }

    #[tool(description = "Show which rules are loaded: directory, index generation, entry and reference counts, and the last load error.")]
    async fn rules_status(&self) -> std::result::Result<String, String> {
        Ok(handle_status(&self.state).await)
    }
}

#[tool_handler]
impl ServerHandler for RulebookServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "rulebook-mcp: search and cross-reference a tabletop game rulebook. \
                 Use search_rules to find rules, resolve_reference to follow a @marker or rule name, \
                 and annotate_text to turn rule text into linked Markdown. \
                 Rules are reloaded automatically when the files change."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this sets `inline_subschemas = true`
/// so enums such as the output format render as dropdowns in MCP clients.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
