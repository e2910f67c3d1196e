use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use rulebook_mcp::cli::{Cli, Commands};
use rulebook_mcp::tools::{
    AnnotateRequest, OutputFormat, ResolveRequest, SearchRequest, handle_annotate,
    handle_resolve, handle_search,
};
use rulebook_mcp::{Config, RuleState, RulebookServer, spawn_reload_worker};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

#[tokio::main]
async fn main() -> rulebook_mcp::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the MCP protocol
    rulebook_mcp::tracing::init(cli.log_json);

    let (mut config, source) = Config::discover(cli.config.as_deref())?;
    if let Some(rules_dir) = &cli.rules_dir {
        config.rules_dir.clone_from(rules_dir);
    }
    match &source {
        Some(path) => tracing::info!("Loaded config from {}", path.display()),
        None => tracing::debug!("Using default config"),
    }

    let state = Arc::new(RuleState::new(config));

    let reply = match cli.command() {
        Commands::Serve => return serve(state).await,
        Commands::Search { query, limit, json } => {
            state.refresh(true).await?;
            let request = SearchRequest {
                query: query.clone(),
                limit: *limit,
                format: output_format(*json),
            };
            handle_search(&state, request).await
        }
        Commands::Resolve { key, json } => {
            state.refresh(true).await?;
            let request = ResolveRequest {
                key: key.clone(),
                format: output_format(*json),
            };
            handle_resolve(&state, request).await
        }
        Commands::Annotate {
            text,
            references_only,
            json,
        } => {
            state.refresh(true).await?;
            let request = AnnotateRequest {
                text: text.clone(),
                references_only: *references_only,
                format: output_format(*json),
            };
            handle_annotate(&state, request).await
        }
    };

    let output = reply.map_err(anyhow::Error::msg)?;
    println!("{}", output.trim_end());
    Ok(())
}

async fn serve(state: Arc<RuleState>) -> rulebook_mcp::Result<()> {
    tracing::info!(
        "Starting rulebook-mcp MCP server for {}",
        state.config().rules_dir.display()
    );

    // A failed first load is not fatal; the worker retries and the tools report it
    if let Err(e) = state.refresh(true).await {
        tracing::warn!("Starting without rules: {}", e);
    }

    let cancel = CancellationToken::new();
    let worker = spawn_reload_worker(state.clone(), cancel.clone());

    let server = RulebookServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    let result = service.waiting().await;

    cancel.cancel();
    if let Err(e) = worker.await {
        tracing::warn!("Reload worker ended abnormally: {}", e);
    }

    result?;
    Ok(())
}
