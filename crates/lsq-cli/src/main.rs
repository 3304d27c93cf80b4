use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

use lsq_core::domain::ContextError;
use lsq_core::impls::{InMemoryTelemetry, ServiceRegistry};
use lsq_core::ports::ContextFactory;
use lsq_core::{
    CancelReason, CancelSignal, DispatchConfig, HandlerError, HandlerKind, NotificationHandler,
    ParameterlessNotificationHandler, ParameterlessRequestHandler, RequestHandler,
    RequestMetadata, RuntimeBuilder, Submission,
};

/// エディタで開かれているドキュメント
type Documents = Arc<RwLock<HashMap<String, String>>>;

#[derive(Debug, Clone)]
struct Snapshot {
    uri: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextDocumentPosition {
    uri: String,
    line: u32,
}

#[derive(Debug, Serialize)]
struct HoverResult {
    contents: String,
}

#[derive(Debug, Deserialize)]
struct DidOpenParams {
    uri: String,
    text: String,
}

/// params の uri からスナップショットを作る。閉じられていれば None。
struct SnapshotFactory {
    documents: Documents,
}

#[async_trait]
impl ContextFactory<Snapshot> for SnapshotFactory {
    async fn create_context(
        &self,
        request: &RequestMetadata,
        _handler: &HandlerKind<Snapshot>,
        params: Option<&serde_json::Value>,
        _cancel: &CancelSignal,
    ) -> Result<Option<Snapshot>, ContextError> {
        let uri = params
            .and_then(|p| p.get("uri"))
            .and_then(|u| u.as_str())
            .unwrap_or("workspace://");
        // didOpen は開く前なので空のスナップショットを渡す
        if uri == "workspace://" || request.method() == "textDocument/didOpen" {
            return Ok(Some(Snapshot {
                uri: uri.to_string(),
                text: String::new(),
            }));
        }
        let documents = self.documents.read().await;
        Ok(documents.get(uri).map(|text| Snapshot {
            uri: uri.to_string(),
            text: text.clone(),
        }))
    }
}

struct Hover;

#[async_trait]
impl RequestHandler<Snapshot> for Hover {
    type Params = TextDocumentPosition;
    type Result = Option<HoverResult>;

    async fn handle(
        &self,
        params: TextDocumentPosition,
        ctx: &Snapshot,
        _cancel: &CancelSignal,
    ) -> Result<Option<HoverResult>, HandlerError> {
        Ok(ctx.text.lines().nth(params.line as usize).map(|line| HoverResult {
            contents: format!("{}:{} `{}`", ctx.uri, params.line, line.trim()),
        }))
    }
}

/// 時間のかかる検索（キャンセルのデモ用）
struct References;

#[async_trait]
impl RequestHandler<Snapshot> for References {
    type Params = TextDocumentPosition;
    type Result = Vec<String>;

    async fn handle(
        &self,
        params: TextDocumentPosition,
        ctx: &Snapshot,
        cancel: &CancelSignal,
    ) -> Result<Vec<String>, HandlerError> {
        for _ in 0..50 {
            if cancel.is_cancelled() {
                return Err(HandlerError::Canceled);
            }
            sleep(Duration::from_millis(20)).await;
        }
        Ok(vec![format!("{}:{}", ctx.uri, params.line)])
    }
}

struct DidOpen {
    documents: Documents,
}

#[async_trait]
impl NotificationHandler<Snapshot> for DidOpen {
    type Params = DidOpenParams;

    async fn handle(
        &self,
        params: DidOpenParams,
        _ctx: &Snapshot,
        _cancel: &CancelSignal,
    ) -> Result<(), HandlerError> {
        self.documents.write().await.insert(params.uri, params.text);
        Ok(())
    }
}

struct Shutdown {
    requested: Arc<AtomicBool>,
}

#[async_trait]
impl ParameterlessRequestHandler<Snapshot> for Shutdown {
    type Result = ();

    async fn handle(&self, _ctx: &Snapshot, _cancel: &CancelSignal) -> Result<(), HandlerError> {
        self.requested.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct Initialized;

#[async_trait]
impl ParameterlessNotificationHandler<Snapshot> for Initialized {
    async fn handle(&self, _ctx: &Snapshot, _cancel: &CancelSignal) -> Result<(), HandlerError> {
        tracing::info!("client initialized");
        Ok(())
    }
}

/// worker：キューから unit を取り出して順に実行する
async fn worker_loop(mut rx: mpsc::UnboundedReceiver<Submission<Snapshot>>) {
    while let Some(submission) = rx.recv().await {
        let outcome = submission.run().await;
        println!("{} -> {:?}", submission.unit.method(), outcome.kind());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // (A) 設定（引数があればファイルから）
    let config = match std::env::args().nth(1) {
        Some(path) => DispatchConfig::from_path(path)?,
        None => DispatchConfig::default(),
    };

    // (B) サービスと handler を登録
    let documents: Documents = Arc::default();
    let telemetry = InMemoryTelemetry::new();
    let services = ServiceRegistry::builder()
        .telemetry(Arc::new(telemetry.clone()))
        .context_factory(SnapshotFactory {
            documents: Arc::clone(&documents),
        })
        .build();
    let shutdown_requested = Arc::new(AtomicBool::new(false));

    let runtime = RuntimeBuilder::<Snapshot>::new()
        .register("textDocument/hover", HandlerKind::request(Hover))?
        .register("textDocument/references", HandlerKind::request(References))?
        .register(
            "textDocument/didOpen",
            HandlerKind::notification(DidOpen {
                documents: Arc::clone(&documents),
            }),
        )?
        .register(
            "shutdown",
            HandlerKind::parameterless_request(Shutdown {
                requested: Arc::clone(&shutdown_requested),
            }),
        )?
        .register("initialized", HandlerKind::parameterless_notification(Initialized))?
        .services(services)
        .config(config)
        .expect_methods(&["textDocument/hover", "shutdown"])
        .build()?;

    // (C) worker を起動（順序どおりに 1 本）
    let (tx, rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_loop(rx));

    // (D) メッセージ投入
    let uri = "file:///src/main.rs";
    let text = "fn main() {\n    println!(\"hi\");\n}\n";
    let mut pending = Vec::new();
    for (method, params) in [
        ("initialized", None),
        ("textDocument/didOpen", Some(serde_json::json!({ "uri": uri, "text": text }))),
        ("textDocument/hover", Some(serde_json::json!({ "uri": uri, "line": 1 }))),
        // 開かれていないドキュメント：missing-context policy に従う
        ("textDocument/hover", Some(serde_json::json!({ "uri": "file:///closed.rs", "line": 0 }))),
    ] {
        let submission = runtime.submit(method, Some("rust"), params, CancelSignal::new())?;
        pending.push((method, submission.outcome.clone()));
        tx.send(submission).map_err(|_| "worker stopped")?;
    }

    // 途中でキャンセルされる要求
    let cancel = CancelSignal::new();
    let references = runtime.submit(
        "textDocument/references",
        Some("rust"),
        Some(serde_json::json!({ "uri": uri, "line": 0 })),
        cancel.clone(),
    )?;
    pending.push(("textDocument/references", references.outcome.clone()));
    tx.send(references).map_err(|_| "worker stopped")?;

    let shutdown = runtime.submit("shutdown", None, None, CancelSignal::new())?;
    pending.push(("shutdown", shutdown.outcome.clone()));
    tx.send(shutdown).map_err(|_| "worker stopped")?;

    sleep(Duration::from_millis(100)).await;
    cancel.cancel_with(CancelReason::ContentModified);

    // (E) 結果を待つ
    for (method, outcome) in pending {
        match outcome.await.into_result() {
            Ok(response) => println!("{method}: {:?}", response.into_value()),
            Err(e) => println!("{method}: error {} ({e})", e.lsp_code()),
        }
    }

    drop(tx);
    worker.await?;

    println!("shutdown requested: {}", shutdown_requested.load(Ordering::SeqCst));
    println!("telemetry records: {}", telemetry.records().len());
    Ok(())
}
