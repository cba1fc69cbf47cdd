//! Enhancement commands: a single completion, and the end-to-end page flow.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use enhancer_config::{keys, AppConfig};
use enhancer_content::{ContentChannels, ContentHost, ContentScript, MemoryPage};
use enhancer_protocols::{
    CompletionTarget, EnhanceError, EnhanceRequest, MessageKind, PageDom, StorageArea, TextEnhancer, Tone,
};
use enhancer_provider_openai::OpenAIEnhancer;
use enhancer_runtime::{Background, ExtensionBus, HandoffStore, MemoryClipboard, MemoryStore, PopupController, PopupHost};
use serde_json::json;
use tracing::{info, warn};

const POPUP_WAIT: Duration = Duration::from_secs(5);

/// Returns the input unchanged; used with `--offline`.
struct EchoEnhancer;

#[async_trait]
impl TextEnhancer for EchoEnhancer {
    async fn enhance(&self, _target: &CompletionTarget, request: &EnhanceRequest) -> Result<String, EnhanceError> {
        Ok(request.text.trim().to_string())
    }
}

pub(crate) async fn handle_enhance(
    config: &AppConfig,
    text: String,
    tone: Tone,
    kind: MessageKind,
    translate: bool,
    api_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = api_key
        .or_else(|| config.settings.api_key().map(str::to_string))
        .ok_or(EnhanceError::MissingApiKey)?;
    let target = CompletionTarget {
        api_key,
        model: config.settings.model().to_string(),
    };
    let request = EnhanceRequest::new(text)
        .with_tone(tone)
        .with_kind(kind)
        .with_translate(translate || config.settings.translate_enabled);

    let enhancer = OpenAIEnhancer::new(config.openai.clone());
    match enhancer.enhance(&target, &request).await {
        Ok(enhanced) => {
            println!("{}", enhanced);
            Ok(())
        }
        Err(e) => Err(e.user_message().into()),
    }
}

pub(crate) async fn handle_simulate(
    config: &AppConfig,
    html: &Path,
    url: &str,
    field: &str,
    text: &str,
    offline: bool,
    api_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = config.settings.clone();
    if let Some(key) = api_key {
        settings.openai_api_key = Some(key);
    }
    if offline && settings.api_key().is_none() {
        settings.openai_api_key = Some("sk-offline-simulation-key".to_string());
    }

    let sync = Arc::new(MemoryStore::with_items(StorageArea::Sync, settings.to_map()));
    let local = Arc::new(MemoryStore::new(StorageArea::Local));
    let enhancer: Arc<dyn TextEnhancer> = if offline {
        Arc::new(EchoEnhancer)
    } else {
        Arc::new(OpenAIEnhancer::new(config.openai.clone()))
    };

    let bus = ExtensionBus::new("message-enhancer");
    bus.set_background(Arc::new(Background::new(
        sync.clone(),
        HandoffStore::new(local.clone(), config.handoff.clone()),
        Arc::new(bus.clone()),
        enhancer,
    )));

    let markup = std::fs::read_to_string(html)?;
    let (page, page_channels) = MemoryPage::parse(url, &markup);
    let (tab, runtime, messages) = bus.open_tab();
    let host = ContentHost {
        page: page.clone(),
        runtime: Arc::new(runtime),
        settings: sync.clone(),
    };
    let Some(script) = ContentScript::inject(host, config.content.clone()).await? else {
        println!("{}", json!({ "url": url, "injected": false }));
        return Ok(());
    };
    let pump = tokio::spawn(script.clone().run(ContentChannels::new(page_channels, messages)));

    let node = page
        .find(field)
        .ok_or_else(|| format!("no element matches '{}'", field))?;
    page.user_type(node, text)?;
    tokio::task::yield_now().await;

    let overlay = script
        .overlay_for(node)
        .ok_or_else(|| format!("'{}' is not an eligible text field", field))?;
    page.click_overlay(overlay)?;

    let opened = tokio::time::timeout(POPUP_WAIT, async {
        while bus.popup_open_count() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    if opened.is_err() {
        warn!(%tab, "Popup did not open");
        pump.abort();
        return Err("popup did not open".into());
    }

    let popup = PopupController::open(
        PopupHost {
            runtime: Arc::new(bus.popup_runtime()),
            tabs: Arc::new(bus.clone()),
            clipboard: Arc::new(MemoryClipboard::new()),
            settings: sync.clone(),
            local: local.clone(),
        },
        config.popup.clone(),
        config.retry.clone(),
        config.handoff.clone(),
    )
    .await?;

    let view = popup.view();
    if view.output.is_empty() {
        pump.abort();
        return Err(view.notice.unwrap_or_else(|| "enhancement produced no output".to_string()).into());
    }

    let outcome = popup.replace_in_tab().await?;
    info!(?outcome, "Simulation finished");

    let drafts = sync.snapshot().await;
    let report = json!({
        "input": view.input,
        "output": view.output,
        "outcome": outcome,
        "fieldValue": page.value(node).or_else(|| page.text_content(node)),
        "draftSaved": drafts.contains_key(keys::PERSISTED_OUTPUT_TEXT),
        "debug": script.debug_snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    pump.abort();
    Ok(())
}
