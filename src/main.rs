use convodesk::app::services::{EventService, RefreshService};
use convodesk::app::{App, InitProps, destruct_terminal_for_panic};
use convodesk::cli::Command;
use convodesk::config::Configuration;
use convodesk::config::init_logger;
use convodesk::models::FilterConversation;
use convodesk::storage::new_storage;
use convodesk::verbose;
use eyre::{Context, Result};
use tokio::task;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    Configuration::init(config.clone())?;

    init_logger(&config.log)?;
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing storage...");
    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");

    verbose!("[+] Fetching conversations...");
    let conversations = storage
        .list_conversations(FilterConversation::default())
        .await
        .wrap_err("fetching conversations")?;
    verbose!("[+] Fetched {} conversations", conversations.len());

    let mut events = EventService::default();
    let token = CancellationToken::new();

    let mut task_set = task::JoinSet::new();
    let refresh = RefreshService::new(events.event_tx(), token.clone());
    task_set.spawn(refresh.run());

    let mut app = App::new(&mut events, storage, token.clone(), InitProps { conversations });
    if let Err(err) = app.run().await {
        eprintln!("Error: {}", err);
    }

    task_set.abort_all();
    while let Some(res) = task_set.join_next().await {
        match res {
            Ok(_) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => log::error!("Task error: {}", err),
        }
    }

    Ok(())
}
