pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod media;
pub mod peer;
pub mod session;
pub mod utils;
pub mod widget;

use crate::clipboard::MemoryClipboard;
use crate::config::AppConfig;
use crate::media::FakeMediaDevices;
use crate::peer::Switchboard;
use tracing::{error, info};

/// Два виджета на локальном коммутаторе: наш (управляется из консоли)
/// и тестовый собеседник, который сам отвечает на звонки.
async fn app(config: AppConfig) -> std::io::Result<()> {
    let board = Switchboard::new();

    let (remote_rt, mut remote) = widget::mount(
        &config,
        board.provider(),
        FakeMediaDevices::new("remote"),
        MemoryClipboard::new(),
    );
    tokio::spawn(remote_rt.run());

    let (local_rt, local) = widget::mount(
        &config,
        board.provider(),
        FakeMediaDevices::new("local"),
        MemoryClipboard::new(),
    );
    tokio::spawn(local_rt.run());

    if let Some(id) = remote.wait_for_id().await {
        println!("Test peer is listening as {id} (try `call {id}`)");
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = commands::console::run(local, stdin, tokio::io::stdout()).await;
    remote.unmount();
    result
}

pub fn run() {
    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("peercall: {e}; using defaults");
            AppConfig::default()
        }
    };
    logger::init(&config.log_filter);
    info!("starting with copy feedback {:?}", config.copy_feedback());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start runtime: {}", e);
            return;
        }
    };
    if let Err(e) = runtime.block_on(app(config)) {
        error!("console failed: {}", e);
    }
}
