use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use kiosk_draft::metrics::DraftMetrics;
use kiosk_draft::storage::FileDraftStorage;
use kiosk_draft::{
    create_instance_key, DraftAction, DraftConfig, DraftHandler, MenuCatalog, MenuEntry,
    OrderInstance,
};

/// Catalog ids are hyphen-free, like the ones the menu service issues
fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO with debug output for this crate; override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kiosk_draft=debug")),
        )
        .init();

    let config = DraftConfig::from_env();
    tracing::info!(
        storage_dir = %config.storage_dir.display(),
        storage_key = %config.storage_key,
        "Starting kiosk draft demo"
    );

    let storage = Arc::new(FileDraftStorage::new(config.storage_dir.clone()));
    let metrics = Arc::new(DraftMetrics::new()?);
    let mut handler = DraftHandler::open(storage, config)
        .await?
        .with_metrics(metrics.clone())
        .debounced();

    if !handler.draft().is_empty() {
        tracing::info!(entries = handler.draft().len(), "Resuming stored draft");
    }

    let burger = new_id();
    let soup = new_id();
    let cheese = new_id();
    let bacon = new_id();

    // Two burgers with cheese, one with bacon
    handler
        .dispatch(DraftAction::CommitNewInstance {
            new_instance: OrderInstance::new(burger.as_str(), [cheese.as_str()], 2)
                .with_notes("no pickles"),
        })
        .await?;
    handler
        .dispatch(DraftAction::CommitNewInstance {
            new_instance: OrderInstance::new(burger.as_str(), [bacon.as_str()], 1),
        })
        .await?;
    handler
        .dispatch(DraftAction::CommitNewInstance {
            new_instance: OrderInstance::new(soup.as_str(), Vec::<&str>::new(), 1),
        })
        .await?;

    // Customer edits the bacon burger into a cheese burger: the lines merge
    handler
        .dispatch(DraftAction::CommitPendingInstance {
            pending_key: create_instance_key(&burger, [&bacon]),
            pending_instance: OrderInstance::new(burger.as_str(), [cheese.as_str()], 1),
        })
        .await?;

    tracing::info!(
        entries = handler.draft().len(),
        items = handler.draft().total_qty(),
        "Draft after edits"
    );

    // Soup was taken off the menu while the customer was browsing
    let catalog = MenuCatalog::new()
        .with_menu(burger.as_str(), MenuEntry::active().with_name("Burger"))
        .with_menu(soup.as_str(), MenuEntry::inactive().with_name("Soup"));

    let submission = handler.submit(Some(&catalog)).await?;
    println!("{}", serde_json::to_string_pretty(&submission)?);

    handler.close().await?;

    tracing::info!(
        actions = metrics.actions_applied.with_label_values(&["CommitNewInstance"]).get(),
        merged = metrics.instances_merged.get(),
        "Demo complete"
    );

    Ok(())
}
