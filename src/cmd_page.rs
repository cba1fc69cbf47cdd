//! Page-side commands: policy check and scan.

use std::path::Path;
use std::sync::Arc;

use enhancer_config::AppConfig;
use enhancer_content::{BlockList, ContentHost, ContentScript, DomainPolicy, LocationInfo, MemoryPage};
use enhancer_protocols::StorageArea;
use enhancer_runtime::{ExtensionBus, MemoryStore};
use serde_json::json;
use tracing::info;

pub(crate) fn handle_check(
    config: &AppConfig,
    url: &str,
    blocked: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let location = LocationInfo::parse(url)?;
    let domains = blocked.unwrap_or_else(|| config.settings.blocked_domains.clone());
    let block_list = BlockList::parse(&domains);

    let report = json!({
        "url": url,
        "supportedProtocol": DomainPolicy::is_supported_protocol(&location),
        "sensitiveHost": DomainPolicy::is_sensitive_host(&location),
        "blocked": block_list.matches(&location),
        "enabled": config.settings.enable_content_script,
        "shouldRun": config.settings.enable_content_script && DomainPolicy::should_run(&location, &block_list),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn handle_scan(config: &AppConfig, html: &Path, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let markup = std::fs::read_to_string(html)?;
    let (page, _channels) = MemoryPage::parse(url, &markup);

    let bus = ExtensionBus::new("message-enhancer");
    let (_tab, runtime, _messages) = bus.open_tab();
    let settings = Arc::new(MemoryStore::with_items(StorageArea::Sync, config.settings.to_map()));
    let host = ContentHost {
        page,
        runtime: Arc::new(runtime),
        settings,
    };

    match ContentScript::inject(host, config.content.clone()).await? {
        Some(script) => {
            let snapshot = script.diagnose();
            info!(processed = snapshot.processed_inputs, "Scan finished");
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("{}", json!({ "url": url, "injected": false })),
    }
    Ok(())
}
