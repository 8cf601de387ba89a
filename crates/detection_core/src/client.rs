//! Cliente de telemetria: instância única e injetável que junta pollers,
//! classificador, janelas de histórico e notificações.
//!
//! Todo o estado pertence à thread que chama [`TelemetryClient::pump`] (ou
//! [`TelemetryClient::wait`]). As threads de I/O só fazem a requisição e a
//! decodificação do JSON, devolvendo o resultado por channel; frames são
//! decodificados aqui, depois de aceitos. Painéis de
//! apresentação leem snapshots, assinam [`ClientEvent`] via
//! [`TelemetryClient::subscribe`] e enviam intenções pelos métodos públicos.

use crate::classifier;
use crate::config::{ClientConfig, DetectionSettings};
use crate::frame::{FrameChannel, FrameResource, ResumeStream};
use crate::history::HistoryBuffer;
use crate::notify::{self, NotificationTrigger, Notifier, Toast};
use crate::poller::{Applied, Completion, Payload, ResourcePoller};
use crate::protocol::{self, ProtocolError};
use crate::scheduler::{Scheduler, TaskHandle, ThreadScheduler};
use crate::transport::{FetchError, HttpTransport, Transport};
use crate::types::{AlertEntity, ConnectionState, LogEntity, RawRecord, Resource, SystemStatus};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Buffer por assinante; assinante lento perde eventos.
const SUBSCRIBER_BUFFER: usize = 256;

/// Erros das intenções do cliente.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Falha ao exportar logs: {0}")]
    Export(ProtocolError),

    #[error("Falha ao serializar configuração: {0}")]
    Settings(ProtocolError),
}

/// Eventos publicados para os painéis.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ConnectionChanged {
        resource: Resource,
        state: ConnectionState,
    },
    /// Recurso voltou a responder após erro (uma vez por recuperação)
    Reconnected(Resource),
    AlertsUpdated(usize),
    LogsUpdated(usize),
    StatusUpdated,
    FrameUpdated { width: u32, height: u32 },
    StreamStopped,
    Notification(Toast),
    SettingsPushed { accepted: bool },
}

/// Mensagens recebidas pela thread dona do estado.
#[derive(Debug)]
pub enum LoopMessage {
    Completion(Completion),
    Resume(ResumeStream),
    SettingsPushed(Result<(), FetchError>),
}

impl From<Completion> for LoopMessage {
    fn from(c: Completion) -> Self {
        LoopMessage::Completion(c)
    }
}

impl From<ResumeStream> for LoopMessage {
    fn from(r: ResumeStream) -> Self {
        LoopMessage::Resume(r)
    }
}

/// Cliente de telemetria do backend de detecção.
pub struct TelemetryClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    notifier: Box<dyn Notifier>,

    tx: Sender<LoopMessage>,
    rx: Receiver<LoopMessage>,

    frames: FrameChannel,
    logs_poller: ResourcePoller,
    status_poller: ResourcePoller,

    alerts: HistoryBuffer<AlertEntity>,
    logs: HistoryBuffer<LogEntity>,
    system_status: Option<SystemStatus>,

    trigger: NotificationTrigger,
    sound_enabled: bool,
    settings_task: Option<TaskHandle>,
    subscribers: Vec<Sender<ClientEvent>>,
}

impl TelemetryClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (tx, rx) = unbounded();

        Self {
            frames: FrameChannel::new(config.frame_interval(), config.reconnect_delay()),
            logs_poller: ResourcePoller::logs(config.logs_interval()),
            status_poller: ResourcePoller::status(config.status_interval()),
            alerts: HistoryBuffer::new(config.alert_capacity),
            logs: HistoryBuffer::new(config.log_capacity),
            system_status: None,
            trigger: NotificationTrigger::new(),
            sound_enabled: config.sound_enabled,
            settings_task: None,
            subscribers: Vec::new(),
            config,
            transport,
            scheduler,
            notifier,
            tx,
            rx,
        }
    }

    /// Cliente com HTTP real e pool de threads.
    pub fn with_http(
        config: ClientConfig,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(&config.backend_url, config.request_timeout())?;
        let scheduler = ThreadScheduler::new(config.worker_threads);
        Ok(Self::new(
            config,
            Arc::new(transport),
            Arc::new(scheduler),
            notifier,
        ))
    }

    // ──────────────────────────────────────────
    // Ciclo de vida
    // ──────────────────────────────────────────

    /// Inicia os polls de `/logs` e `/status`.
    pub fn start(&mut self) {
        self.trigger.reset();
        self.logs_poller.start(
            self.scheduler.as_ref(),
            Arc::clone(&self.transport),
            self.tx.clone(),
        );
        self.status_poller.start(
            self.scheduler.as_ref(),
            Arc::clone(&self.transport),
            self.tx.clone(),
        );
        self.emit_state(Resource::Logs);
        self.emit_state(Resource::Status);
        info!("Cliente iniciado – backend {}", self.config.backend_url);

        if self.config.stream_on_start {
            self.start_stream();
        }
    }

    /// Para todos os polls e libera o frame exibido.
    pub fn shutdown(&mut self) {
        self.frames.stop();
        self.logs_poller.stop();
        self.status_poller.stop();
        self.settings_task = None;
        for resource in Resource::ALL {
            self.emit_state(resource);
        }
        info!("Cliente parado");
    }

    /// Processa todas as mensagens pendentes sem bloquear.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg);
            handled += 1;
        }
        handled
    }

    /// Espera até `timeout` pela próxima mensagem e drena as pendentes.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.handle(msg);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    /// Assina os eventos do cliente.
    pub fn subscribe(&mut self) -> Receiver<ClientEvent> {
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        self.subscribers.push(tx);
        rx
    }

    // ──────────────────────────────────────────
    // Intenções
    // ──────────────────────────────────────────

    pub fn start_stream(&mut self) {
        if self.frames.is_active() {
            return;
        }
        self.frames.start(
            self.scheduler.as_ref(),
            Arc::clone(&self.transport),
            self.tx.clone(),
        );
        self.emit_state(Resource::Frame);
    }

    pub fn stop_stream(&mut self) {
        self.frames.stop();
        self.emit_state(Resource::Frame);
        self.emit(ClientEvent::StreamStopped);
    }

    /// Para o stream e o religa após o atraso configurado, se estava ligado.
    pub fn reconnect_stream(&mut self) {
        self.frames.reconnect(self.scheduler.as_ref(), self.tx.clone());
        self.emit_state(Resource::Frame);
    }

    /// Limpa a janela de alertas (local, não avisa o backend).
    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
        info!("Alertas limpos localmente");
        self.emit(ClientEvent::AlertsUpdated(0));
    }

    /// Remove um alerta localmente. Ele volta no próximo poll se o
    /// backend ainda o reportar.
    pub fn remove_alert(&mut self, id: &str) -> bool {
        let removed = self.alerts.remove(id) > 0;
        if removed {
            debug!("Alerta {id} dispensado localmente");
            self.emit(ClientEvent::AlertsUpdated(self.alerts.len()));
        }
        removed
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
        info!("Logs limpos localmente");
        self.emit(ClientEvent::LogsUpdated(0));
    }

    /// JSON da janela de logs atual, para download.
    pub fn export_logs(&self) -> Result<Vec<u8>, ClientError> {
        self.logs.export().map_err(ClientError::Export)
    }

    /// Alterna o som de alerta e retorna o novo estado.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        let label = if self.sound_enabled {
            "ligado"
        } else {
            "desligado"
        };
        info!("Som de alerta {label}");
        self.sound_enabled
    }

    /// Envia a configuração ao backend (best-effort, numa thread de I/O).
    ///
    /// Falhas só são registradas; a persistência local não depende disso.
    pub fn push_settings(&mut self, settings: &DetectionSettings) -> Result<(), ClientError> {
        let body = protocol::encode_settings(settings).map_err(ClientError::Settings)?;
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();

        self.settings_task = Some(self.scheduler.after(
            Duration::ZERO,
            Box::new(move || {
                let result = transport.post_json(protocol::CONFIGURE_PATH, body);
                let _ = tx.send(LoopMessage::SettingsPushed(result));
            }),
        ));
        Ok(())
    }

    // ──────────────────────────────────────────
    // Leitura
    // ──────────────────────────────────────────

    pub fn connection(&self, resource: Resource) -> ConnectionState {
        match resource {
            Resource::Frame => self.frames.state(),
            Resource::Logs => self.logs_poller.state(),
            Resource::Status => self.status_poller.state(),
        }
    }

    pub fn last_success(&self, resource: Resource) -> Option<Instant> {
        match resource {
            Resource::Frame => self.frames.last_success(),
            Resource::Logs => self.logs_poller.last_success(),
            Resource::Status => self.status_poller.last_success(),
        }
    }

    pub fn last_error(&self, resource: Resource) -> Option<&FetchError> {
        match resource {
            Resource::Frame => self.frames.last_error(),
            Resource::Logs => self.logs_poller.last_error(),
            Resource::Status => self.status_poller.last_error(),
        }
    }

    /// Algum recurso consultado está em erro ("Backend Offline").
    pub fn is_backend_offline(&self) -> bool {
        Resource::ALL
            .iter()
            .any(|r| self.connection(*r) == ConnectionState::Error)
    }

    pub fn alerts(&self) -> &[AlertEntity] {
        self.alerts.snapshot()
    }

    pub fn logs(&self) -> &[LogEntity] {
        self.logs.snapshot()
    }

    pub fn current_frame(&self) -> Option<&FrameResource> {
        self.frames.current()
    }

    pub fn is_streaming(&self) -> bool {
        self.frames.is_active()
    }

    pub fn live_frames(&self) -> usize {
        self.frames.live_frames()
    }

    pub fn system_status(&self) -> Option<&SystemStatus> {
        self.system_status.as_ref()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ──────────────────────────────────────────
    // Loop interno
    // ──────────────────────────────────────────

    fn handle(&mut self, msg: LoopMessage) {
        match msg {
            LoopMessage::Completion(completion) => self.handle_completion(completion),
            LoopMessage::Resume(request) => {
                let resumed = self.frames.resume(
                    request,
                    self.scheduler.as_ref(),
                    Arc::clone(&self.transport),
                    self.tx.clone(),
                );
                if resumed {
                    self.emit_state(Resource::Frame);
                }
            }
            LoopMessage::SettingsPushed(result) => {
                match &result {
                    Ok(()) => info!("Configuração enviada ao backend"),
                    Err(e) => {
                        warn!("Backend não aceitou a configuração ({e}); mantida só localmente")
                    }
                }
                self.emit(ClientEvent::SettingsPushed {
                    accepted: result.is_ok(),
                });
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        let resource = completion.resource;
        let applied = match resource {
            Resource::Frame => self.frames.apply(completion),
            Resource::Logs => self.logs_poller.apply(completion),
            Resource::Status => self.status_poller.apply(completion),
        };
        let Some(mut applied) = applied else {
            return;
        };

        self.emit_transition(resource, &applied);

        match applied.payload.take() {
            Some(Payload::Logs(records)) => self.ingest_logs(&records),
            Some(Payload::Status(status)) => {
                self.system_status = Some(status);
                self.emit(ClientEvent::StatusUpdated);
            }
            // Já publicado pelo FrameChannel
            Some(Payload::Frame(_)) | None => {}
        }

        if resource == Resource::Frame && applied.error.is_none() {
            if let Some(frame) = self.frames.current() {
                let event = ClientEvent::FrameUpdated {
                    width: frame.width(),
                    height: frame.height(),
                };
                self.emit(event);
            }
        }
    }

    fn ingest_logs(&mut self, records: &[RawRecord]) {
        self.alerts.replace(classifier::extract_alerts(records));
        self.logs.replace(classifier::extract_logs(records));
        self.emit(ClientEvent::AlertsUpdated(self.alerts.len()));
        self.emit(ClientEvent::LogsUpdated(self.logs.len()));

        if self.trigger.observe(self.alerts.len()) {
            self.notify_latest_alert();
        }
    }

    fn notify_latest_alert(&mut self) {
        let Some(latest) = notify::newest_alert(self.alerts.snapshot()) else {
            return;
        };
        let toast = Toast::for_alert(latest);
        if self.sound_enabled {
            self.notifier.chime();
        }
        self.notifier.toast(&toast);
        self.emit(ClientEvent::Notification(toast));
    }

    fn emit_transition(&mut self, resource: Resource, applied: &Applied) {
        if applied.state_changed() {
            self.emit(ClientEvent::ConnectionChanged {
                resource,
                state: applied.current,
            });
        }
        if applied.reconnected {
            self.emit(ClientEvent::Reconnected(resource));
        }
    }

    fn emit_state(&mut self, resource: Resource) {
        let state = self.connection(resource);
        self.emit(ClientEvent::ConnectionChanged { resource, state });
    }

    fn emit(&mut self, event: ClientEvent) {
        self.subscribers.retain(|sub| match sub.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Assinante lento, descartando evento");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_support::png;
    use crate::notify::recording::RecordingNotifier;
    use crate::scheduler::ManualScheduler;
    use crate::transport::fake::ScriptedTransport;
    use crate::types::{AlertCategory, LogLevel, Severity};
    use serde_json::{Value, json};

    struct Rig {
        scheduler: Arc<ManualScheduler>,
        transport: Arc<ScriptedTransport>,
        notifier: RecordingNotifier,
        client: TelemetryClient,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_config(ClientConfig::default())
        }

        fn with_config(config: ClientConfig) -> Self {
            let scheduler = Arc::new(ManualScheduler::new());
            let transport = Arc::new(ScriptedTransport::default());
            let notifier = RecordingNotifier::default();
            let client = TelemetryClient::new(
                config,
                Arc::clone(&transport) as Arc<dyn Transport>,
                Arc::clone(&scheduler) as Arc<dyn Scheduler>,
                Box::new(notifier.clone()),
            );
            Self {
                scheduler,
                transport,
                notifier,
                client,
            }
        }

        fn step(&mut self, by: Duration) {
            self.scheduler.advance(by);
            self.client.pump();
        }
    }

    fn weapon_logs(n: usize) -> Value {
        let logs: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "timestamp": format!("t{i}"),
                    "alert_type": "gun",
                    "details": {"description": format!("Gun #{i}")},
                })
            })
            .collect();
        json!({ "logs": logs })
    }

    fn status_ok() -> Value {
        json!({"status": "running", "alert_count": 0})
    }

    #[test]
    fn knife_scenario_produces_weapon_alert() {
        let mut rig = Rig::new();
        rig.transport.push_json(
            protocol::LOGS_PATH,
            json!({"logs": [{
                "timestamp": "2024-01-01T00:00:00Z",
                "alert_type": "Knife Detected",
                "details": {"description": "Knife near entrance", "location": "Cam-1"}
            }]}),
        );
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.step(Duration::ZERO);

        let alerts = rig.client.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Weapon);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].message, "Knife near entrance");
        assert_eq!(alerts[0].location, "Cam-1");
        assert_eq!(rig.client.logs()[0].level, LogLevel::Error);
        assert_eq!(
            rig.client.connection(Resource::Logs),
            ConnectionState::Connected
        );
    }

    #[test]
    fn status_recovers_after_three_failures() {
        let mut rig = Rig::new();
        for _ in 0..3 {
            rig.transport
                .push(protocol::STATUS_PATH, Err(FetchError::HttpStatus(503)));
        }
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.transport.push_json(protocol::LOGS_PATH, json!({"logs": []}));
        let events = rig.client.subscribe();
        rig.client.start();

        let mut states = Vec::new();
        rig.step(Duration::ZERO);
        states.push(rig.client.connection(Resource::Status));
        for _ in 0..4 {
            rig.step(Duration::from_secs(10));
            states.push(rig.client.connection(Resource::Status));
        }
        use ConnectionState::*;
        assert_eq!(states, [Error, Error, Error, Connected, Connected]);

        let reconnects = events
            .try_iter()
            .filter(|e| *e == ClientEvent::Reconnected(Resource::Status))
            .count();
        assert_eq!(reconnects, 1);
        assert_eq!(
            rig.client.system_status().and_then(|s| s.backend_status()),
            Some("running")
        );
        assert!(!rig.client.is_backend_offline());
    }

    #[test]
    fn backend_offline_keeps_last_status() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.transport.push(
            protocol::STATUS_PATH,
            Err(FetchError::NetworkUnreachable("refused".into())),
        );
        rig.transport.push_json(protocol::LOGS_PATH, json!({"logs": []}));
        rig.client.start();
        rig.step(Duration::ZERO);
        rig.step(Duration::from_secs(10));

        assert!(rig.client.is_backend_offline());
        assert!(rig.client.system_status().is_some());
        assert!(rig.client.last_success(Resource::Status).is_some());
    }

    #[test]
    fn notification_skips_first_poll_and_fires_on_growth() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(3));
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(5));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();

        rig.step(Duration::ZERO);
        assert_eq!(rig.client.alerts().len(), 3);
        assert_eq!(*rig.notifier.chimes.borrow(), 0);

        rig.step(Duration::from_secs(2));
        assert_eq!(rig.client.alerts().len(), 5);
        assert_eq!(*rig.notifier.chimes.borrow(), 1);

        // Mesma contagem: não dispara de novo
        rig.step(Duration::from_secs(4));
        assert_eq!(*rig.notifier.chimes.borrow(), 1);

        let toasts = rig.notifier.toasts.borrow();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].severity, Severity::High);
        // Mais recente pelo timestamp, não pela posição
        assert_eq!(toasts[0].description, "Gun #4");
    }

    #[test]
    fn muted_sound_still_shows_toast() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(1));
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(2));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        assert!(!rig.client.toggle_sound());
        rig.client.start();
        rig.step(Duration::ZERO);
        rig.step(Duration::from_secs(2));

        assert_eq!(*rig.notifier.chimes.borrow(), 0);
        assert_eq!(rig.notifier.toasts.borrow().len(), 1);
    }

    #[test]
    fn restart_suppresses_first_poll_again() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(2));
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(4));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.step(Duration::ZERO);

        rig.client.shutdown();
        rig.client.start();
        rig.step(Duration::ZERO);
        assert_eq!(rig.client.alerts().len(), 4);
        assert_eq!(*rig.notifier.chimes.borrow(), 0);
    }

    #[test]
    fn windows_are_bounded() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(50));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.step(Duration::ZERO);

        assert_eq!(rig.client.alerts().len(), 10);
        assert_eq!(rig.client.logs().len(), 20);
        assert_eq!(rig.client.alerts()[0].id, "t0-gun");
    }

    #[test]
    fn removed_alert_reappears_on_next_poll() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(2));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.step(Duration::ZERO);

        assert!(rig.client.remove_alert("t0-gun"));
        assert!(!rig.client.remove_alert("t0-gun"));
        assert!(!rig.client.remove_alert("nope"));
        assert_eq!(rig.client.alerts().len(), 1);

        rig.step(Duration::from_secs(2));
        assert_eq!(rig.client.alerts().len(), 2);
    }

    #[test]
    fn clear_and_export_logs() {
        let mut rig = Rig::new();
        rig.transport.push_json(
            protocol::LOGS_PATH,
            json!({"logs": [
                {"timestamp": "1", "type": "normal"},
                {"timestamp": "2", "message": "Camera online"}
            ]}),
        );
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.step(Duration::ZERO);

        let exported: Vec<LogEntity> =
            serde_json::from_slice(&rig.client.export_logs().unwrap()).unwrap();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].level, LogLevel::Success);
        assert_eq!(exported[1].message, "Camera online");

        rig.client.clear_logs();
        rig.client.clear_alerts();
        assert!(rig.client.logs().is_empty());
        assert!(rig.client.alerts().is_empty());
        // Nenhuma requisição extra para limpar
        assert!(rig.transport.posts().is_empty());
    }

    #[test]
    fn stream_lifecycle_releases_frames() {
        let mut rig = Rig::new();
        rig.transport.push(protocol::FRAME_PATH, Ok(png(8, 6)));
        let events = rig.client.subscribe();
        rig.client.start_stream();
        rig.step(Duration::from_millis(300));

        let frame = rig.client.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert_eq!(rig.client.live_frames(), 1);
        assert!(
            events
                .try_iter()
                .any(|e| e == ClientEvent::FrameUpdated { width: 8, height: 6 })
        );

        // Respostas emitidas antes do stop chegam atrasadas
        rig.scheduler.advance(Duration::from_millis(200));
        rig.client.stop_stream();
        assert_eq!(rig.client.live_frames(), 0);
        rig.client.pump();

        assert!(rig.client.current_frame().is_none());
        assert_eq!(rig.client.live_frames(), 0);
        assert_eq!(
            rig.client.connection(Resource::Frame),
            ConnectionState::Disconnected
        );
        assert!(!rig.client.is_streaming());
    }

    #[test]
    fn reconnect_stream_waits_then_resumes() {
        let mut rig = Rig::new();
        rig.transport.push(protocol::FRAME_PATH, Ok(png(2, 2)));
        rig.client.start_stream();
        rig.step(Duration::ZERO);

        rig.client.reconnect_stream();
        assert!(rig.client.current_frame().is_none());
        rig.step(Duration::from_millis(500));
        assert!(!rig.client.is_streaming());

        rig.step(Duration::from_millis(500));
        assert!(rig.client.is_streaming());
        rig.step(Duration::ZERO);
        assert!(rig.client.current_frame().is_some());
        assert_eq!(
            rig.client.connection(Resource::Frame),
            ConnectionState::Connected
        );
    }

    #[test]
    fn reconnect_without_stream_does_not_start_it() {
        let mut rig = Rig::new();
        rig.transport.push(protocol::FRAME_PATH, Ok(png(2, 2)));
        rig.client.reconnect_stream();
        rig.step(Duration::from_millis(1000));
        assert!(!rig.client.is_streaming());

        rig.client.start_stream();
        rig.client.stop_stream();
        rig.client.reconnect_stream();
        rig.step(Duration::from_secs(2));
        assert!(!rig.client.is_streaming());
        assert_eq!(
            rig.client.connection(Resource::Frame),
            ConnectionState::Disconnected
        );
        assert_eq!(rig.client.live_frames(), 0);
    }

    #[test]
    fn stream_on_start_config() {
        let config = ClientConfig {
            stream_on_start: true,
            ..ClientConfig::default()
        };
        let mut rig = Rig::with_config(config);
        rig.client.start();
        assert!(rig.client.is_streaming());
        assert_eq!(
            rig.client.connection(Resource::Frame),
            ConnectionState::Connecting
        );
    }

    #[test]
    fn settings_push_is_best_effort() {
        let mut rig = Rig::new();
        rig.transport
            .fail_posts(FetchError::NetworkUnreachable("offline".into()));
        let events = rig.client.subscribe();
        rig.client
            .push_settings(&DetectionSettings::default())
            .unwrap();
        rig.step(Duration::ZERO);

        let posts = rig.transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, protocol::CONFIGURE_PATH);
        assert!(
            events
                .try_iter()
                .any(|e| e == ClientEvent::SettingsPushed { accepted: false })
        );
    }

    #[test]
    fn late_responses_after_shutdown_are_ignored() {
        let mut rig = Rig::new();
        rig.transport.push_json(protocol::LOGS_PATH, weapon_logs(2));
        rig.transport.push_json(protocol::STATUS_PATH, status_ok());
        rig.client.start();
        rig.scheduler.advance(Duration::ZERO);
        rig.client.shutdown();
        rig.client.pump();

        assert!(rig.client.alerts().is_empty());
        assert!(rig.client.system_status().is_none());
        assert_eq!(
            rig.client.connection(Resource::Logs),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut rig = Rig::new();
        drop(rig.client.subscribe());
        let kept = rig.client.subscribe();
        rig.client.clear_alerts();
        assert_eq!(rig.client.subscribers.len(), 1);
        assert_eq!(kept.try_recv(), Ok(ClientEvent::AlertsUpdated(0)));
    }
}
