//! Цикл событий виджета.
//!
//! [`Runtime`] владеет [`CallWidget`], провайдером, устройствами и буфером
//! обмена. Все входы (действия пользователя, события провайдера, завершение
//! захвата камеры, таймер "Copied!") обрабатываются строго по одному.
//! Фронтенд общается с ним через [`WidgetHandle`].

use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::error::CallError;
use crate::logger::dump_stream;
use crate::media::MediaDevices;
use crate::peer::connection::{PeerProvider, ProviderConfig};
use crate::peer::types::ProviderEvent;
use crate::widget::events::{Effect, UiEvent, UserAction, WidgetInput};
use crate::widget::state::CallWidget;
use crate::widget::view::WidgetView;
use std::collections::VecDeque;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Текст блокирующего сообщения при пустом id собеседника
pub const MISSING_TARGET_ALERT: &str = "Please enter the remote peer ID.";

/// Создаёт runtime и ручку управления. Runtime нужно запустить через
/// [`Runtime::run`]; монтирование происходит при старте цикла.
pub fn mount<P, M, C>(
    config: &AppConfig,
    provider: P,
    devices: M,
    clipboard: C,
) -> (Runtime<P, M, C>, WidgetHandle)
where
    P: PeerProvider,
    M: MediaDevices,
    C: Clipboard,
{
    let widget = CallWidget::new(config);
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(widget.view());

    let runtime = Runtime {
        widget,
        provider,
        devices,
        clipboard,
        provider_config: ProviderConfig::new(config.ice_servers.clone()),
        provider_rx: None,
        internal_tx,
        internal_rx,
        actions: actions_rx,
        view_tx,
        events_tx,
        copy_timer: None,
    };
    let handle = WidgetHandle {
        actions: actions_tx,
        view: view_rx,
        events: events_rx,
    };
    (runtime, handle)
}

pub struct Runtime<P, M, C> {
    widget: CallWidget,
    provider: P,
    devices: M,
    clipboard: C,
    provider_config: ProviderConfig,
    provider_rx: Option<mpsc::UnboundedReceiver<ProviderEvent>>,
    internal_tx: mpsc::UnboundedSender<WidgetInput>,
    internal_rx: mpsc::UnboundedReceiver<WidgetInput>,
    actions: mpsc::UnboundedReceiver<UserAction>,
    view_tx: watch::Sender<WidgetView>,
    events_tx: mpsc::UnboundedSender<UiEvent>,
    copy_timer: Option<JoinHandle<()>>,
}

enum Next {
    Input(WidgetInput),
    ProviderGone,
}

async fn recv_provider(rx: &mut Option<mpsc::UnboundedReceiver<ProviderEvent>>) -> Option<ProviderEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl<P, M, C> Runtime<P, M, C>
where
    P: PeerProvider,
    M: MediaDevices,
    C: Clipboard,
{
    /// Монтирует виджет и крутит цикл до размонтирования
    /// (явного или при закрытии [`WidgetHandle`]).
    pub async fn run(mut self) {
        self.dispatch(WidgetInput::Mount);

        while !self.widget.is_unmounted() {
            let next = tokio::select! {
                biased;
                Some(input) = self.internal_rx.recv() => Next::Input(input),
                event = recv_provider(&mut self.provider_rx) => match event {
                    Some(event) => Next::Input(WidgetInput::Provider(event)),
                    None => Next::ProviderGone,
                },
                action = self.actions.recv() => Next::Input(WidgetInput::User(
                    action.unwrap_or(UserAction::Unmount),
                )),
            };

            match next {
                Next::Input(input) => self.dispatch(input),
                Next::ProviderGone => {
                    warn!("provider event channel closed");
                    self.provider_rx = None;
                }
            }
        }
        info!("widget runtime stopped");
    }

    fn dispatch(&mut self, input: WidgetInput) {
        let mut queue = VecDeque::from([input]);
        while let Some(input) = queue.pop_front() {
            match self.widget.handle(input) {
                Ok(effects) => {
                    for effect in effects {
                        self.execute(effect, &mut queue);
                    }
                }
                Err(err) => self.report(err),
            }
        }
        self.view_tx.send_replace(self.widget.view());
    }

    fn execute(&mut self, effect: Effect, queue: &mut VecDeque<WidgetInput>) {
        match effect {
            Effect::ConnectProvider => match self.provider.connect(&self.provider_config) {
                Ok(rx) => self.provider_rx = Some(rx),
                Err(e) => {
                    error!("failed to connect provider: {}", e);
                    self.emit(UiEvent::Error {
                        message: e.to_string(),
                    });
                }
            },
            Effect::AcquireMedia {
                purpose,
                constraints,
            } => {
                debug!("requesting media for {:?}", purpose);
                let devices = self.devices.clone();
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let result = devices.get_user_media(constraints).await;
                    if let Ok(stream) = &result {
                        dump_stream("LOCAL", stream);
                    }
                    let _ = tx.send(WidgetInput::MediaReady { purpose, result });
                });
            }
            Effect::PlaceCall { target, stream } => match self.provider.call(&target, &stream) {
                Ok(call) => queue.push_back(WidgetInput::OutboundPlaced { call }),
                Err(e) => queue.push_back(WidgetInput::OutboundFailed(e)),
            },
            Effect::Answer { call, stream } => {
                if let Err(error) = self.provider.answer(&call, &stream) {
                    queue.push_back(WidgetInput::AnswerFailed { call, error });
                }
            }
            Effect::CloseCall { call } => {
                if let Err(e) = self.provider.close_call(&call) {
                    debug!("close of call {} failed: {}", call, e);
                }
            }
            Effect::CopyToClipboard { text } => {
                if let Err(e) = self.clipboard.copy(&text) {
                    warn!("copy to clipboard failed: {}", e);
                }
            }
            Effect::ScheduleCopyReset { generation, after } => {
                self.cancel_copy_timer();
                let tx = self.internal_tx.clone();
                self.copy_timer = Some(tokio::spawn(async move {
                    sleep(after).await;
                    let _ = tx.send(WidgetInput::CopyFeedbackExpired { generation });
                }));
            }
            Effect::CancelCopyReset => self.cancel_copy_timer(),
            Effect::DestroyProvider => {
                self.provider.destroy();
                self.provider_rx = None;
            }
            Effect::Emit(event) => self.emit(event),
        }
    }

    fn cancel_copy_timer(&mut self) {
        if let Some(handle) = self.copy_timer.take() {
            debug!("aborting pending copy feedback timer");
            handle.abort();
        }
    }

    fn report(&mut self, err: CallError) {
        match err {
            CallError::MissingTarget => {
                warn!("call attempted without a remote peer id");
                self.emit(UiEvent::Alert {
                    message: MISSING_TARGET_ALERT.into(),
                });
            }
            CallError::Busy => debug!("call button pressed while a call is active"),
            other => {
                error!("{}", other);
                self.emit(UiEvent::Error {
                    message: other.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: UiEvent) {
        debug!("emit {:?}", event);
        let _ = self.events_tx.send(event);
    }
}

/// Ручка фронтенда: отправка действий, чтение снимков и уведомлений.
/// Когда ручка уничтожается, виджет размонтируется.
pub struct WidgetHandle {
    actions: mpsc::UnboundedSender<UserAction>,
    pub(crate) view: watch::Receiver<WidgetView>,
    pub(crate) events: mpsc::UnboundedReceiver<UiEvent>,
}

impl WidgetHandle {
    /// false, если виджет уже остановлен
    pub fn send(&self, action: UserAction) -> bool {
        self.actions.send(action).is_ok()
    }

    pub fn set_target(&self, target: impl Into<String>) -> bool {
        self.send(UserAction::SetTarget(target.into()))
    }

    pub fn call(&self) -> bool {
        self.send(UserAction::Call)
    }

    pub fn hang_up(&self) -> bool {
        self.send(UserAction::HangUp)
    }

    pub fn copy_id(&self) -> bool {
        self.send(UserAction::CopyId)
    }

    pub fn unmount(&self) -> bool {
        self.send(UserAction::Unmount)
    }

    /// Последний опубликованный снимок
    pub fn view(&self) -> WidgetView {
        self.view.borrow().clone()
    }

    /// Ждёт снимок, удовлетворяющий условию; None, если runtime остановлен
    pub async fn wait_for<F>(&mut self, pred: F) -> Option<WidgetView>
    where
        F: FnMut(&WidgetView) -> bool,
    {
        self.view.wait_for(pred).await.ok().map(|v| v.clone())
    }

    /// Ждёт, пока провайдер выдаст id
    pub async fn wait_for_id(&mut self) -> Option<String> {
        self.wait_for(|v| !v.local_id.is_empty())
            .await
            .map(|v| v.local_id)
    }

    pub async fn next_event(&mut self) -> Option<UiEvent> {
        self.events.recv().await
    }

    pub fn try_event(&mut self) -> Option<UiEvent> {
        self.events.try_recv().ok()
    }
}
