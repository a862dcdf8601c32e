//! Состояние виджета звонка.
//!
//! [`CallWidget`] ничего не делает сам: принимает [`WidgetInput`] и
//! возвращает список [`Effect`], которые исполняет runtime.

use crate::config::AppConfig;
use crate::error::CallError;
use crate::media::{MediaConstraints, MediaStream};
use crate::peer::types::{CallId, PeerId, ProviderEvent};
use crate::session::{CallStatus, Session};
use crate::widget::events::{CallDirection, Effect, MediaPurpose, UiEvent, UserAction, WidgetInput};
use crate::widget::view::{ButtonView, WidgetView, CALLING_LABEL, CALL_LABEL};
use crate::widget::BusyPolicy;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Mounted,
    Unmounted,
}

/// Текущий звонок. У исходящего id появляется после того, как провайдер
/// принял вызов.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveCall {
    id: Option<CallId>,
    direction: CallDirection,
}

impl ActiveCall {
    fn is(&self, call: &CallId) -> bool {
        self.id.as_ref() == Some(call)
    }
}

pub struct CallWidget {
    session: Session,
    constraints: MediaConstraints,
    copy_feedback: Duration,
    policy: BusyPolicy,
    phase: Phase,
    pending_target: String,
    local_stream: Option<MediaStream>,
    remote_stream: Option<MediaStream>,
    active: Option<ActiveCall>,
    // входящие, для которых ещё ждём камеру
    ringing: Vec<CallId>,
    copied: bool,
    copy_generation: u64,
}

impl CallWidget {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            session: Session::new(),
            constraints: config.media,
            copy_feedback: config.copy_feedback(),
            policy: config.busy_policy,
            phase: Phase::Created,
            pending_target: String::new(),
            local_stream: None,
            remote_stream: None,
            active: None,
            ringing: Vec::new(),
            copied: false,
            copy_generation: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn local_stream(&self) -> Option<&MediaStream> {
        self.local_stream.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&MediaStream> {
        self.remote_stream.as_ref()
    }

    pub fn is_copied(&self) -> bool {
        self.copied
    }

    pub fn is_unmounted(&self) -> bool {
        self.phase == Phase::Unmounted
    }

    /// id звонка, который сейчас считается активным
    pub fn active_call(&self) -> Option<&CallId> {
        self.active.as_ref().and_then(|a| a.id.as_ref())
    }

    pub fn view(&self) -> WidgetView {
        let calling = self.session.is_call_active();
        WidgetView {
            local_id: self.session.shareable_id().to_owned(),
            local_video: self.local_stream.as_ref().map(|s| s.id.clone()),
            remote_video: self.remote_stream.as_ref().map(|s| s.id.clone()),
            target_input: self.pending_target.clone(),
            call_button: ButtonView {
                label: if calling { CALLING_LABEL } else { CALL_LABEL },
                disabled: calling,
            },
            can_hang_up: self.active_call().is_some(),
            copied: self.copied,
            status: self.session.status,
        }
    }

    pub fn handle(&mut self, input: WidgetInput) -> Result<Vec<Effect>, CallError> {
        if self.phase == Phase::Unmounted {
            return match input {
                WidgetInput::User(_) => Err(CallError::Unmounted),
                other => {
                    debug!("ignoring {:?} after unmount", other);
                    Ok(Vec::new())
                }
            };
        }

        match input {
            WidgetInput::Mount => Ok(self.mount()),
            WidgetInput::User(_) if self.phase == Phase::Created => Err(CallError::Unmounted),
            WidgetInput::User(action) => self.on_user(action),
            WidgetInput::Provider(event) => Ok(self.on_provider(event)),
            WidgetInput::MediaReady { purpose, result } => Ok(match (purpose, result) {
                (MediaPurpose::Preview, Ok(stream)) => self.bind_preview(stream),
                (MediaPurpose::Preview, Err(e)) => {
                    error!("Error accessing media devices: {}", e);
                    Vec::new()
                }
                (MediaPurpose::Answer(call), Ok(stream)) => self.answer(call, stream),
                (MediaPurpose::Answer(call), Err(e)) => {
                    error!("Error accessing media devices: {} (call {} left unanswered)", e, call);
                    self.ringing.retain(|c| *c != call);
                    Vec::new()
                }
            }),
            WidgetInput::OutboundPlaced { call } => Ok(self.on_outbound_placed(call)),
            WidgetInput::OutboundFailed(e) => {
                warn!("outbound call failed: {}", e);
                if matches!(&self.active, Some(a) if a.id.is_none()) {
                    self.reset_call();
                }
                Err(CallError::Provider(e))
            }
            WidgetInput::AnswerFailed { call, error } => {
                warn!("answering call {} failed: {}", call, error);
                if matches!(&self.active, Some(a) if a.is(&call)) {
                    self.reset_call();
                }
                Err(CallError::Provider(error))
            }
            WidgetInput::CopyFeedbackExpired { generation } => {
                if generation == self.copy_generation {
                    self.copied = false;
                } else {
                    debug!("stale copy timer {} (current {})", generation, self.copy_generation);
                }
                Ok(Vec::new())
            }
        }
    }

    fn mount(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Created {
            debug!("mount called twice, ignoring");
            return Vec::new();
        }
        self.phase = Phase::Mounted;
        info!("widget mounted - connecting provider and requesting media");
        vec![
            Effect::ConnectProvider,
            Effect::AcquireMedia {
                purpose: MediaPurpose::Preview,
                constraints: self.constraints,
            },
        ]
    }

    fn on_user(&mut self, action: UserAction) -> Result<Vec<Effect>, CallError> {
        match action {
            UserAction::SetTarget(target) => {
                self.pending_target = target;
                Ok(Vec::new())
            }
            UserAction::Call => self.initiate_call(),
            UserAction::HangUp => Ok(self.hang_up()),
            UserAction::CopyId => Ok(self.copy_id()),
            UserAction::Unmount => Ok(self.unmount()),
        }
    }

    fn initiate_call(&mut self) -> Result<Vec<Effect>, CallError> {
        if self.session.is_call_active() {
            return Err(CallError::Busy);
        }
        let target = self.pending_target.trim();
        if target.is_empty() {
            return Err(CallError::MissingTarget);
        }
        let stream = self.local_stream.clone().ok_or(CallError::MediaNotReady)?;
        let target = PeerId::new(target);

        info!("calling {} with stream {}", target, stream.id);
        self.session.status = CallStatus::Calling;
        self.active = Some(ActiveCall {
            id: None,
            direction: CallDirection::Outbound,
        });
        Ok(vec![
            Effect::PlaceCall { target, stream },
            Effect::Emit(UiEvent::CallStarted {
                direction: CallDirection::Outbound,
            }),
        ])
    }

    fn on_outbound_placed(&mut self, call: CallId) -> Vec<Effect> {
        match &mut self.active {
            Some(active) if active.direction == CallDirection::Outbound && active.id.is_none() => {
                debug!("outbound call placed as {}", call);
                active.id = Some(call);
                Vec::new()
            }
            _ => {
                debug!("call {} is no longer wanted, closing", call);
                vec![Effect::CloseCall { call }]
            }
        }
    }

    fn hang_up(&mut self) -> Vec<Effect> {
        match self.active_call() {
            Some(call) => {
                info!("hanging up call {}", call);
                vec![Effect::CloseCall { call: call.clone() }]
            }
            None => Vec::new(),
        }
    }

    fn copy_id(&mut self) -> Vec<Effect> {
        self.copied = true;
        self.copy_generation += 1;
        vec![
            Effect::CopyToClipboard {
                text: self.session.shareable_id().to_owned(),
            },
            Effect::ScheduleCopyReset {
                generation: self.copy_generation,
                after: self.copy_feedback,
            },
            Effect::Emit(UiEvent::Copied),
        ]
    }

    fn unmount(&mut self) -> Vec<Effect> {
        info!("widget unmounted - releasing provider");
        self.phase = Phase::Unmounted;
        self.session.status = CallStatus::Idle;
        self.active = None;
        self.ringing.clear();
        self.local_stream = None;
        self.remote_stream = None;
        self.copied = false;
        vec![Effect::CancelCopyReset, Effect::DestroyProvider]
    }

    fn on_provider(&mut self, event: ProviderEvent) -> Vec<Effect> {
        match event {
            ProviderEvent::Open(id) => {
                info!("My peer ID is: {}", id);
                if !self.session.assign_id(id.clone()) {
                    debug!("peer id reassigned ({} open events)", self.session.open_count());
                } else if let Some(since) = self.session.online_since() {
                    debug!("online since {}", since.format("%Y-%m-%d %H:%M:%S"));
                }
                vec![Effect::Emit(UiEvent::IdentityAssigned {
                    id: id.to_string(),
                })]
            }
            ProviderEvent::IncomingCall { call, from } => self.on_incoming(call, from),
            ProviderEvent::Stream { call, stream } => {
                if !matches!(&self.active, Some(a) if a.is(&call)) {
                    debug!("stream {} for inactive call {} ignored", stream.id, call);
                    return Vec::new();
                }
                info!("remote stream {} arrived on call {}", stream.id, call);
                let stream_id = stream.id.clone();
                self.remote_stream = Some(stream);
                vec![Effect::Emit(UiEvent::RemoteStream { stream_id })]
            }
            ProviderEvent::CallClosed { call } => {
                if matches!(&self.active, Some(a) if a.is(&call)) {
                    info!("call {} closed", call);
                    self.reset_call();
                    return vec![Effect::Emit(UiEvent::CallEnded)];
                }
                if self.ringing.contains(&call) {
                    debug!("incoming call {} closed before answer", call);
                    self.ringing.retain(|c| *c != call);
                }
                Vec::new()
            }
            ProviderEvent::Error(e) => {
                warn!("provider error: {}", e);
                vec![Effect::Emit(UiEvent::Error {
                    message: e.to_string(),
                })]
            }
            ProviderEvent::Disconnected => {
                warn!("provider disconnected");
                // провайдер может не прислать закрытие каждого звонка
                self.ringing.clear();
                if self.active.is_none() {
                    return Vec::new();
                }
                self.reset_call();
                vec![Effect::Emit(UiEvent::CallEnded)]
            }
        }
    }

    fn on_incoming(&mut self, call: CallId, from: PeerId) -> Vec<Effect> {
        info!("incoming call {} from {}", call, from);
        let mut effects = Vec::new();
        if !self.make_room_for(&call, &mut effects) {
            return effects;
        }
        self.ringing.push(call.clone());
        effects.push(Effect::AcquireMedia {
            purpose: MediaPurpose::Answer(call),
            constraints: self.constraints,
        });
        effects
    }

    /// Политика занятости: true, если новый входящий можно принимать
    fn make_room_for(&mut self, call: &CallId, effects: &mut Vec<Effect>) -> bool {
        let Some(active) = &self.active else {
            return true;
        };
        match self.policy {
            BusyPolicy::Reject => {
                info!("busy - rejecting call {}", call);
                effects.push(Effect::CloseCall { call: call.clone() });
                false
            }
            BusyPolicy::LastWins => {
                info!("busy - dropping current call for {}", call);
                if let Some(old) = active.id.clone() {
                    effects.push(Effect::CloseCall { call: old });
                }
                self.reset_call();
                effects.push(Effect::Emit(UiEvent::CallEnded));
                true
            }
        }
    }

    fn answer(&mut self, call: CallId, stream: MediaStream) -> Vec<Effect> {
        if !self.ringing.contains(&call) {
            debug!("media {} arrived for call {} that is gone", stream.id, call);
            return Vec::new();
        }
        self.ringing.retain(|c| *c != call);

        let mut effects = Vec::new();
        if !self.make_room_for(&call, &mut effects) {
            return effects;
        }

        info!("answering call {} with stream {}", call, stream.id);
        self.local_stream = Some(stream.clone());
        self.session.status = CallStatus::Calling;
        self.active = Some(ActiveCall {
            id: Some(call.clone()),
            direction: CallDirection::Inbound,
        });
        effects.push(Effect::Answer { call, stream });
        effects.push(Effect::Emit(UiEvent::CallStarted {
            direction: CallDirection::Inbound,
        }));
        effects
    }

    fn bind_preview(&mut self, stream: MediaStream) -> Vec<Effect> {
        // поток ответа на звонок уже в превью, его не трогаем
        if let Some(current) = &self.local_stream {
            debug!("preview {} arrived after {} was bound, ignoring", stream.id, current.id);
            return Vec::new();
        }
        info!("local preview bound to stream {}", stream.id);
        self.local_stream = Some(stream);
        Vec::new()
    }

    fn reset_call(&mut self) {
        self.session.status = CallStatus::Idle;
        self.active = None;
        self.remote_stream = None;
    }
}
