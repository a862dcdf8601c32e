use crate::error::ProviderError;
use crate::media::MediaStream;
use crate::peer::types::{CallId, PeerId, ProviderEvent, ServerConfig};
use crate::utils::add_ice_url_scheme;
use once_cell::sync::Lazy;
use tokio::sync::mpsc;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;

/// Дефолтные STUN серверы, если пользователь ничего не задал
pub static DEFAULT_ICE_URLS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "stun:stun.l.google.com:19302".into(),
        "stun:stun1.l.google.com:19302".into(),
    ]
});

/// Провайдер peer-соединений: выдаёт id, звонит, отвечает, закрывает.
///
/// Все уведомления (open, входящий звонок, поток, закрытие) приходят через
/// канал, который возвращает [`PeerProvider::connect`]. Методы не блокируют:
/// результат звонка приходит позже событием.
pub trait PeerProvider: Send + 'static {
    /// Подключиться к провайдеру. Вызывается один раз за время жизни виджета.
    fn connect(
        &mut self,
        config: &ProviderConfig,
    ) -> Result<mpsc::UnboundedReceiver<ProviderEvent>, ProviderError>;

    /// Исходящий звонок с локальным потоком
    fn call(&mut self, remote: &PeerId, stream: &MediaStream) -> Result<CallId, ProviderError>;

    /// Ответить на входящий звонок
    fn answer(&mut self, call: &CallId, stream: &MediaStream) -> Result<(), ProviderError>;

    fn close_call(&mut self, call: &CallId) -> Result<(), ProviderError>;

    /// Освободить соединение; после этого события больше не приходят
    fn destroy(&mut self);
}

/// Настройки подключения к провайдеру
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub ice_servers: Vec<ServerConfig>,
}

impl ProviderConfig {
    pub fn new(ice_servers: Vec<ServerConfig>) -> Self {
        Self { ice_servers }
    }

    /// RTC конфигурация для провайдеров на базе webrtc
    pub fn rtc_configuration(&self) -> RTCConfiguration {
        let custom = (!self.ice_servers.is_empty()).then(|| self.ice_servers.clone());
        rtc_config(custom)
    }
}

/// Создает конфигурацию для peer connection
fn rtc_config(custom_servers: Option<Vec<ServerConfig>>) -> RTCConfiguration {
    let ice_servers = if let Some(servers) = custom_servers {
        get_user_ice_servers(servers)
    } else {
        vec![RTCIceServer {
            urls: DEFAULT_ICE_URLS.clone(),
            ..Default::default()
        }]
    };

    RTCConfiguration {
        ice_servers,
        bundle_policy: RTCBundlePolicy::MaxBundle,
        rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
        ..Default::default()
    }
}

/// Пользовательские серверы → RTCIceServer
pub fn get_user_ice_servers(servers: Vec<ServerConfig>) -> Vec<RTCIceServer> {
    servers
        .into_iter()
        .map(|config| {
            let url = add_ice_url_scheme(&config);

            RTCIceServer {
                urls: vec![url],
                username: config.username.unwrap_or_default(),
                credential: config.credential.unwrap_or_default(),
                ..Default::default()
            }
        })
        .collect()
}
