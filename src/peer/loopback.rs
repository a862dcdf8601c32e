//! Провайдер в пределах одного процесса.
//!
//! [`Switchboard`] играет роль сигнального сервера: выдаёт id, соединяет
//! звонки между зарегистрированными пирами и рассылает события. Каждый
//! виджет получает свой [`LoopbackProvider`] через [`Switchboard::provider`].

use crate::error::ProviderError;
use crate::media::MediaStream;
use crate::peer::connection::{PeerProvider, ProviderConfig};
use crate::peer::types::{CallId, PeerId, ProviderEvent};
use crate::utils::random_id;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info};

struct Line {
    caller: PeerId,
    callee: PeerId,
    caller_stream: MediaStream,
    answered: bool,
}

impl Line {
    fn involves(&self, peer: &PeerId) -> bool {
        self.caller == *peer || self.callee == *peer
    }
}

#[derive(Default)]
struct Board {
    peers: HashMap<PeerId, mpsc::UnboundedSender<ProviderEvent>>,
    calls: HashMap<CallId, Line>,
}

impl Board {
    fn notify(&self, peer: &PeerId, event: ProviderEvent) {
        if let Some(tx) = self.peers.get(peer) {
            let _ = tx.send(event);
        }
    }
}

/// Общий коммутатор для нескольких loopback-провайдеров
#[derive(Clone, Default)]
pub struct Switchboard {
    inner: Arc<Mutex<Board>>,
}

impl Switchboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Новый провайдер со случайным id
    pub fn provider(&self) -> LoopbackProvider {
        LoopbackProvider {
            board: self.clone(),
            requested_id: None,
            id: None,
            destroyed: false,
        }
    }

    /// Провайдер, который получит заданный id (если он свободен)
    pub fn provider_with_id(&self, id: impl Into<String>) -> LoopbackProvider {
        LoopbackProvider {
            board: self.clone(),
            requested_id: Some(PeerId::new(id)),
            id: None,
            destroyed: false,
        }
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.lock().peers.keys().cloned().collect()
    }

    pub fn active_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Разрыв связи с пиром: звонки закрываются, пир получает Disconnected
    pub fn disconnect_peer(&self, peer: &PeerId) {
        let mut board = self.lock();
        board.notify(peer, ProviderEvent::Disconnected);
        close_lines_of(&mut board, peer);
        board.peers.remove(peer);
    }

    fn lock(&self) -> MutexGuard<'_, Board> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn close_lines_of(board: &mut Board, peer: &PeerId) {
    let ids: Vec<CallId> = board
        .calls
        .iter()
        .filter(|(_, line)| line.involves(peer))
        .map(|(id, _)| id.clone())
        .collect();
    for id in ids {
        if let Some(line) = board.calls.remove(&id) {
            board.notify(&line.caller, ProviderEvent::CallClosed { call: id.clone() });
            board.notify(&line.callee, ProviderEvent::CallClosed { call: id });
        }
    }
}

/// Провайдер одного пира на [`Switchboard`]
pub struct LoopbackProvider {
    board: Switchboard,
    requested_id: Option<PeerId>,
    id: Option<PeerId>,
    destroyed: bool,
}

impl LoopbackProvider {
    pub fn id(&self) -> Option<&PeerId> {
        self.id.as_ref()
    }

    fn me(&self) -> Result<&PeerId, ProviderError> {
        if self.destroyed {
            return Err(ProviderError::Destroyed);
        }
        self.id.as_ref().ok_or(ProviderError::NotConnected)
    }
}

impl PeerProvider for LoopbackProvider {
    fn connect(
        &mut self,
        config: &ProviderConfig,
    ) -> Result<mpsc::UnboundedReceiver<ProviderEvent>, ProviderError> {
        if self.destroyed {
            return Err(ProviderError::Destroyed);
        }
        if self.id.is_some() {
            return Err(ProviderError::InvalidConfig("already connected".into()));
        }

        let rtc = config.rtc_configuration();
        debug!("loopback connect with {} ICE servers", rtc.ice_servers.len());

        let mut board = self.board.lock();
        let id = match self.requested_id.take() {
            Some(id) if !board.peers.contains_key(&id) => id,
            Some(id) => {
                return Err(ProviderError::InvalidConfig(format!("id {id} is taken")));
            }
            None => PeerId::new(random_id()),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ProviderEvent::Open(id.clone()));
        board.peers.insert(id.clone(), tx);
        info!("loopback peer {} registered", id);
        self.id = Some(id);
        Ok(rx)
    }

    fn call(&mut self, remote: &PeerId, stream: &MediaStream) -> Result<CallId, ProviderError> {
        let me = self.me()?.clone();
        let call = CallId::new(random_id());
        let mut board = self.board.lock();

        if *remote == me || !board.peers.contains_key(remote) {
            debug!("loopback call {} to unavailable peer {}", call, remote);
            board.notify(&me, ProviderEvent::Error(ProviderError::PeerUnavailable(remote.clone())));
            board.notify(&me, ProviderEvent::CallClosed { call: call.clone() });
            return Ok(call);
        }

        board.calls.insert(
            call.clone(),
            Line {
                caller: me.clone(),
                callee: remote.clone(),
                caller_stream: stream.clone(),
                answered: false,
            },
        );
        board.notify(
            remote,
            ProviderEvent::IncomingCall {
                call: call.clone(),
                from: me,
            },
        );
        Ok(call)
    }

    fn answer(&mut self, call: &CallId, stream: &MediaStream) -> Result<(), ProviderError> {
        let me = self.me()?.clone();
        let mut board = self.board.lock();
        let (caller, caller_stream) = match board.calls.get_mut(call) {
            Some(line) if line.callee == me && !line.answered => {
                line.answered = true;
                (line.caller.clone(), line.caller_stream.clone())
            }
            _ => return Err(ProviderError::UnknownCall(call.clone())),
        };

        board.notify(
            &caller,
            ProviderEvent::Stream {
                call: call.clone(),
                stream: stream.clone(),
            },
        );
        board.notify(
            &me,
            ProviderEvent::Stream {
                call: call.clone(),
                stream: caller_stream,
            },
        );
        Ok(())
    }

    fn close_call(&mut self, call: &CallId) -> Result<(), ProviderError> {
        let me = self.me()?.clone();
        let mut board = self.board.lock();
        match board.calls.get(call) {
            Some(line) if line.involves(&me) => {}
            _ => return Err(ProviderError::UnknownCall(call.clone())),
        }
        if let Some(line) = board.calls.remove(call) {
            board.notify(&line.caller, ProviderEvent::CallClosed { call: call.clone() });
            board.notify(&line.callee, ProviderEvent::CallClosed { call: call.clone() });
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(id) = self.id.take() {
            let mut board = self.board.lock();
            // сначала убираем себя, чтобы не слать события в закрытый канал
            board.peers.remove(&id);
            close_lines_of(&mut board, &id);
            info!("loopback peer {} destroyed", id);
        }
    }
}

impl Drop for LoopbackProvider {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaTrack, TrackKind};

    fn stream(id: &str) -> MediaStream {
        MediaStream {
            id: id.into(),
            tracks: vec![MediaTrack {
                id: format!("{id}-v"),
                kind: TrackKind::Video,
                label: "cam".into(),
            }],
        }
    }

    fn open(rx: &mut mpsc::UnboundedReceiver<ProviderEvent>) -> PeerId {
        match rx.try_recv() {
            Ok(ProviderEvent::Open(id)) => id,
            other => panic!("expected Open, got {other:?}"),
        }
    }

    #[test]
    fn connect_emits_open_with_assigned_id() {
        let board = Switchboard::new();
        let mut p = board.provider_with_id("alice");
        let mut rx = p.connect(&ProviderConfig::default()).unwrap();
        assert_eq!(open(&mut rx), PeerId::new("alice"));
        assert_eq!(p.id(), Some(&PeerId::new("alice")));
        assert_eq!(board.peers(), vec![PeerId::new("alice")]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let board = Switchboard::new();
        let mut a = board.provider_with_id("alice");
        let _rx = a.connect(&ProviderConfig::default()).unwrap();
        let mut b = board.provider_with_id("alice");
        assert!(matches!(
            b.connect(&ProviderConfig::default()),
            Err(ProviderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn call_answer_close_roundtrip() {
        let board = Switchboard::new();
        let mut a = board.provider_with_id("a");
        let mut b = board.provider_with_id("b");
        let mut rx_a = a.connect(&ProviderConfig::default()).unwrap();
        let mut rx_b = b.connect(&ProviderConfig::default()).unwrap();
        open(&mut rx_a);
        open(&mut rx_b);

        let call = a.call(&PeerId::new("b"), &stream("sa")).unwrap();
        match rx_b.try_recv().unwrap() {
            ProviderEvent::IncomingCall { call: c, from } => {
                assert_eq!(c, call);
                assert_eq!(from, PeerId::new("a"));
            }
            other => panic!("unexpected {other:?}"),
        }

        b.answer(&call, &stream("sb")).unwrap();
        assert!(matches!(rx_a.try_recv().unwrap(), ProviderEvent::Stream { stream, .. } if stream.id == "sb"));
        assert!(matches!(rx_b.try_recv().unwrap(), ProviderEvent::Stream { stream, .. } if stream.id == "sa"));
        assert!(matches!(b.answer(&call, &stream("sb")), Err(ProviderError::UnknownCall(_))));

        a.close_call(&call).unwrap();
        assert!(matches!(rx_a.try_recv().unwrap(), ProviderEvent::CallClosed { .. }));
        assert!(matches!(rx_b.try_recv().unwrap(), ProviderEvent::CallClosed { .. }));
        assert_eq!(board.active_calls(), 0);
    }

    #[test]
    fn unknown_peer_reports_error_and_closes() {
        let board = Switchboard::new();
        let mut a = board.provider();
        let mut rx = a.connect(&ProviderConfig::default()).unwrap();
        open(&mut rx);
        let call = a.call(&PeerId::new("nobody"), &stream("s")).unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            ProviderEvent::Error(ProviderError::PeerUnavailable(p)) if p.as_str() == "nobody"
        ));
        assert!(matches!(rx.try_recv().unwrap(), ProviderEvent::CallClosed { call: c } if c == call));
    }

    #[test]
    fn call_before_connect_fails() {
        let board = Switchboard::new();
        let mut a = board.provider();
        assert_eq!(
            a.call(&PeerId::new("x"), &stream("s")).unwrap_err(),
            ProviderError::NotConnected
        );
    }

    #[test]
    fn destroy_closes_calls_and_ends_channel() {
        let board = Switchboard::new();
        let mut a = board.provider_with_id("a");
        let mut b = board.provider_with_id("b");
        let mut rx_a = a.connect(&ProviderConfig::default()).unwrap();
        let mut rx_b = b.connect(&ProviderConfig::default()).unwrap();
        open(&mut rx_a);
        open(&mut rx_b);
        let call = a.call(&PeerId::new("b"), &stream("sa")).unwrap();
        let _ = rx_b.try_recv();

        a.destroy();
        assert!(matches!(rx_b.try_recv().unwrap(), ProviderEvent::CallClosed { call: c } if c == call));
        assert!(matches!(rx_a.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
        assert_eq!(board.peers(), vec![PeerId::new("b")]);
        assert_eq!(
            a.call(&PeerId::new("b"), &stream("s")).unwrap_err(),
            ProviderError::Destroyed
        );
    }

    #[test]
    fn disconnect_peer_notifies_and_closes() {
        let board = Switchboard::new();
        let mut a = board.provider_with_id("a");
        let mut b = board.provider_with_id("b");
        let mut rx_a = a.connect(&ProviderConfig::default()).unwrap();
        let mut rx_b = b.connect(&ProviderConfig::default()).unwrap();
        open(&mut rx_a);
        open(&mut rx_b);
        a.call(&PeerId::new("b"), &stream("sa")).unwrap();
        let _ = rx_b.try_recv();

        board.disconnect_peer(&PeerId::new("b"));
        assert!(matches!(rx_b.try_recv().unwrap(), ProviderEvent::Disconnected));
        assert!(matches!(rx_b.try_recv().unwrap(), ProviderEvent::CallClosed { .. }));
        assert!(matches!(rx_a.try_recv().unwrap(), ProviderEvent::CallClosed { .. }));
        assert_eq!(board.peers(), vec![PeerId::new("a")]);
    }

    #[test]
    fn dropping_provider_releases_id() {
        let board = Switchboard::new();
        {
            let mut a = board.provider_with_id("a");
            let _rx = a.connect(&ProviderConfig::default()).unwrap();
            assert_eq!(board.peers().len(), 1);
        }
        assert!(board.peers().is_empty());
    }
}
