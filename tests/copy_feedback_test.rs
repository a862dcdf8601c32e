//! Окно "Copied!" на виртуальном времени.

use peercall_lib::clipboard::MemoryClipboard;
use peercall_lib::config::AppConfig;
use peercall_lib::media::FakeMediaDevices;
use peercall_lib::peer::Switchboard;
use peercall_lib::widget::{self, WidgetHandle, WidgetView};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

fn spawn(board: &Switchboard, config: &AppConfig) -> (WidgetHandle, MemoryClipboard) {
    let clipboard = MemoryClipboard::new();
    let (rt, handle) = widget::mount(
        config,
        board.provider_with_id("alice"),
        FakeMediaDevices::new("alice"),
        clipboard.clone(),
    );
    tokio::spawn(rt.run());
    (handle, clipboard)
}

async fn until<F>(handle: &mut WidgetHandle, pred: F) -> WidgetView
where
    F: FnMut(&WidgetView) -> bool,
{
    timeout(Duration::from_millis(100), handle.wait_for(pred))
        .await
        .expect("timed out waiting for view")
        .expect("runtime stopped")
}

#[tokio::test(start_paused = true)]
async fn copied_flag_lasts_five_seconds() {
    let board = Switchboard::new();
    let (mut alice, clipboard) = spawn(&board, &AppConfig::default());
    until(&mut alice, |v| !v.local_id.is_empty()).await;

    alice.copy_id();
    let view = until(&mut alice, |v| v.copied).await;
    assert_eq!(view.copied_text(), Some("Copied!"));
    assert_eq!(clipboard.content().as_deref(), Some("alice"));

    sleep(Duration::from_millis(4999)).await;
    assert!(alice.view().copied);

    sleep(Duration::from_millis(1)).await;
    let view = until(&mut alice, |v| !v.copied).await;
    assert_eq!(view.copied_text(), None);
}

#[tokio::test(start_paused = true)]
async fn repeated_copy_restarts_the_window() {
    let board = Switchboard::new();
    let (mut alice, _clipboard) = spawn(&board, &AppConfig::default());
    until(&mut alice, |v| !v.local_id.is_empty()).await;

    alice.copy_id();
    until(&mut alice, |v| v.copied).await;
    sleep(Duration::from_millis(3000)).await;

    alice.copy_id();
    tokio::task::yield_now().await;
    let second = Instant::now();

    // первый таймер отменён: через 5 с после первого копирования надпись на месте
    sleep(Duration::from_millis(3000)).await;
    assert!(alice.view().copied);

    timeout(Duration::from_secs(10), alice.wait_for(|v| !v.copied))
        .await
        .expect("flag never cleared")
        .expect("runtime stopped");
    assert!(second.elapsed() >= Duration::from_millis(5000));
}

#[tokio::test(start_paused = true)]
async fn feedback_duration_comes_from_config() {
    let config = AppConfig {
        copy_feedback_ms: 200,
        ..AppConfig::default()
    };
    let board = Switchboard::new();
    let (mut alice, _clipboard) = spawn(&board, &config);
    until(&mut alice, |v| !v.local_id.is_empty()).await;

    alice.copy_id();
    until(&mut alice, |v| v.copied).await;
    sleep(Duration::from_millis(199)).await;
    assert!(alice.view().copied);
    sleep(Duration::from_millis(1)).await;
    until(&mut alice, |v| !v.copied).await;
}

#[tokio::test(start_paused = true)]
async fn unmount_cancels_pending_feedback_timer() {
    let board = Switchboard::new();
    let (mut alice, _clipboard) = spawn(&board, &AppConfig::default());
    until(&mut alice, |v| !v.local_id.is_empty()).await;

    alice.copy_id();
    until(&mut alice, |v| v.copied).await;
    alice.unmount();

    // runtime останавливается, не дожидаясь таймера
    let start = Instant::now();
    let stopped = timeout(Duration::from_secs(1), alice.wait_for(|_| false)).await;
    assert_eq!(stopped.expect("runtime kept running"), None);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(board.peers().is_empty());
}
