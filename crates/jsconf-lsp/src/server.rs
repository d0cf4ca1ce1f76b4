//! LSP server implementation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jsconf_complete::{CompletionEngine, Completions};
use jsconf_schema::{SchemaRegistry, VersionResolver};
use jsconf_tree::Document;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::config::{JsconfUserConfig, load_config_or_default};
use crate::position::{offset_to_position, position_to_offset, span_to_range};
use crate::project::{ProjectContexts, context_for};

/// Document state tracked by the server
struct DocumentState {
    content: String,
    document: Document,
    /// Configuration kind, when the file name matches a registered schema.
    kind: Option<String>,
}

/// The jsconf language server
pub struct JsconfLanguageServer {
    /// LSP client for sending notifications
    client: Client,
    /// Open documents
    documents: Arc<RwLock<HashMap<Url, DocumentState>>>,
    registry: Arc<SchemaRegistry>,
    projects: Arc<RwLock<ProjectContexts>>,
    /// Whether the client lets us register file watchers.
    can_watch_files: AtomicBool,
}

impl JsconfLanguageServer {
    /// A server configured from the user config file.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, load_config_or_default())
    }

    pub fn with_config(client: Client, config: JsconfUserConfig) -> Self {
        let registry = match config.registry() {
            Ok(registry) => registry,
            Err(e) => {
                warn!("Ignoring user schemas: {e}");
                SchemaRegistry::builtin().clone()
            }
        };
        let projects = ProjectContexts::new(
            VersionResolver::default(),
            &config.default_dependencies(),
        );
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            registry: Arc::new(registry),
            projects: Arc::new(RwLock::new(projects)),
            can_watch_files: AtomicBool::new(false),
        }
    }

    /// Parse, publish diagnostics and store a document.
    async fn update_document(&self, uri: Url, content: String, version: i32) {
        let document = Document::parse(&content);
        let kind = self
            .registry
            .kind_for_path(Path::new(uri.path()))
            .map(str::to_string);

        let diagnostics = match kind {
            Some(_) => compute_diagnostics(&content, &document),
            None => Vec::new(),
        };
        debug!(%uri, ?kind, errors = document.errors.len(), "Document updated");
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;

        let mut docs = self.documents.write().await;
        docs.insert(
            uri,
            DocumentState {
                content,
                document,
                kind,
            },
        );
    }

    /// Ask the client to report `package.json` changes.
    async fn watch_package_json(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String("**/package.json".to_string()),
                kind: None,
            }],
        };
        let registration = Registration {
            id: "jsconf-package-json".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!("Could not watch package.json files: {e}");
        }
    }
}

fn document_path(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|_| PathBuf::from(uri.path()))
}

fn compute_diagnostics(content: &str, document: &Document) -> Vec<Diagnostic> {
    document
        .errors
        .iter()
        .map(|error| {
            let mut range = span_to_range(content, error.span);
            if range.start == range.end {
                range.end = offset_to_position(content, error.span.end as usize + 1);
            }
            Diagnostic {
                range,
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some("jsconf".to_string()),
                message: error.message().to_string(),
                ..Default::default()
            }
        })
        .collect()
}

/// LSP items for engine candidates. `sort_text` keeps the engine's order and
/// the edit replaces the partially typed key.
fn completion_items(content: &str, offset: usize, completions: &Completions) -> Vec<CompletionItem> {
    let range = match completions.location.as_ref().and_then(|l| l.typed) {
        Some(typed) => span_to_range(content, typed),
        None => {
            let at = offset_to_position(content, offset);
            Range { start: at, end: at }
        }
    };

    completions
        .candidates
        .iter()
        .enumerate()
        .map(|(rank, candidate)| CompletionItem {
            label: candidate.display.clone(),
            kind: Some(CompletionItemKind::FIELD),
            detail: candidate.detail.clone(),
            sort_text: Some(format!("{rank:04}")),
            filter_text: Some(candidate.display.clone()),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: candidate.display.clone(),
            })),
            ..Default::default()
        })
        .collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for JsconfLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let can_watch_files = params
            .capabilities
            .workspace
            .and_then(|w| w.did_change_watched_files)
            .and_then(|w| w.dynamic_registration)
            .unwrap_or(false);
        self.can_watch_files.store(can_watch_files, Ordering::Relaxed);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Full document sync - we get the whole document on each change
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["{".into(), ",".into(), "\n".into()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "jsconf-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!(kinds = ?self.registry.kinds().collect::<Vec<_>>(), "Initialized");
        if self.can_watch_files.load(Ordering::Relaxed) {
            self.watch_package_json().await;
        }
        self.client
            .log_message(MessageType::INFO, "jsconf language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.update_document(doc.uri.clone(), doc.text, doc.version).await;

        // Read the project's package.json before the first completion asks.
        if self.registry.kind_for_path(Path::new(doc.uri.path())).is_some() {
            context_for(&self.projects, &document_path(&doc.uri)).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // With FULL sync, the last change holds the entire document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update_document(uri, change.text, version).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        if params
            .changes
            .iter()
            .any(|change| change.uri.path().ends_with("/package.json"))
        {
            info!("package.json changed, forgetting project modules");
            self.projects.write().await.invalidate();
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        self.documents.write().await.remove(&uri);

        // Clear diagnostics
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        if self.registry.kind_for_path(Path::new(uri.path())).is_none() {
            return Ok(None);
        }
        let context = context_for(&self.projects, &document_path(&uri)).await;

        let docs = self.documents.read().await;
        let Some(doc) = docs.get(&uri) else {
            return Ok(None);
        };
        let Some(kind) = &doc.kind else {
            return Ok(None);
        };

        let offset = position_to_offset(&doc.content, position);
        let engine = CompletionEngine::new(&self.registry);
        let completions = match engine.complete(kind, &doc.document, offset as u32, &context) {
            Ok(completions) => completions,
            Err(e) => {
                warn!(%uri, "{e}");
                return Ok(None);
            }
        };
        debug!(%uri, offset, count = completions.candidates.len(), "Completion");

        Ok(Some(CompletionResponse::Array(completion_items(
            &doc.content,
            offset,
            &completions,
        ))))
    }
}

/// Run the language server on stdin/stdout.
pub async fn run() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(JsconfLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
