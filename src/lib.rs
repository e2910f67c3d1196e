pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod model;
pub mod resolve;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod worker;

pub use annotate::{Span, SpanKind, TextAnnotator};
pub use config::Config;
pub use error::{ConfigError, LoadError, Result};
pub use model::RuleSet;
pub use resolve::{ReferenceResolver, ReferenceTarget, TargetKind};
pub use search::{EntryKind, IndexOptions, RuleIndex, SearchEngine, SearchResult, SearchableEntry};
pub use server::RulebookServer;
pub use worker::{RuleState, RuleStatus, spawn_reload_worker};
