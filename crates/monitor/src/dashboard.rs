//! Painel de console – consumidor sem estado próprio dos eventos do cliente.

use crossbeam_channel::Receiver;
use detection_core::TelemetryClient;
use detection_core::client::ClientEvent;
use detection_core::config::ClientConfig;
use detection_core::types::{ConnectionState, Resource};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Intervalo entre resumos completos no console.
const SUMMARY_EVERY: Duration = Duration::from_secs(5);
/// Linhas de log mostradas no resumo.
const LOG_LINES: usize = 5;

pub struct ConsoleDashboard {
    events: Receiver<ClientEvent>,
    summary_every: Duration,
    last_summary: Option<Instant>,
    offline: bool,
}

impl ConsoleDashboard {
    pub fn new(events: Receiver<ClientEvent>, config: &ClientConfig) -> Self {
        Self {
            events,
            // Nunca mais rápido que o poll de logs
            summary_every: SUMMARY_EVERY.max(config.logs_interval()),
            last_summary: None,
            offline: false,
        }
    }

    /// Drena os eventos pendentes e redesenha o resumo quando vence.
    pub fn update(&mut self, client: &TelemetryClient) {
        while let Ok(event) = self.events.try_recv() {
            self.on_event(&event);
        }

        let offline = client.is_backend_offline();
        if offline != self.offline {
            if offline {
                warn!("⚠ Backend Offline – exibindo últimos dados conhecidos");
            } else {
                info!("Backend online");
            }
            self.offline = offline;
        }

        if self
            .last_summary
            .is_none_or(|t| t.elapsed() >= self.summary_every)
        {
            render_summary(client);
            self.last_summary = Some(Instant::now());
        }
    }

    fn on_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::ConnectionChanged { resource, state } => {
                info!("{:<6} → {state:?}", resource.name());
            }
            ClientEvent::Reconnected(resource) => info!("{} reconectado", resource.name()),
            ClientEvent::AlertsUpdated(n) => debug!("{n} alertas na janela"),
            ClientEvent::LogsUpdated(n) => debug!("{n} logs na janela"),
            ClientEvent::StatusUpdated => debug!("Status atualizado"),
            ClientEvent::FrameUpdated { width, height } => debug!("Frame {width}x{height}"),
            ClientEvent::StreamStopped => info!("Stream de vídeo parado"),
            // O notificador já exibiu
            ClientEvent::Notification(_) => {}
            ClientEvent::SettingsPushed { accepted } => {
                debug!("Configuração aceita pelo backend: {accepted}");
            }
        }
    }
}

fn render_summary(client: &TelemetryClient) {
    println!("──────── Detection Monitor ────────");

    for resource in Resource::ALL {
        let state = client.connection(resource);
        let mut line = format!("{:<6} {state:?}", resource.name());
        if state == ConnectionState::Error {
            if let Some(at) = client.last_success(resource) {
                line.push_str(&format!(" (dados de {} atrás)", format_age(at.elapsed())));
            }
        }
        println!("{line}");
    }

    if let Some(status) = client.system_status() {
        println!(
            "Backend: {} | uptime {} | câmeras {} | alertas {}",
            status.backend_status().unwrap_or("?"),
            status.uptime_display().unwrap_or_else(|| "?".into()),
            status
                .active_cameras
                .map_or_else(|| "?".into(), |n| n.to_string()),
            status
                .total_alerts()
                .map_or_else(|| "?".into(), |n| n.to_string()),
        );
    }

    let alerts = client.alerts();
    if alerts.is_empty() {
        println!("Sem alertas");
    }
    for alert in alerts {
        println!(
            "  [{}] {:?} – {} @ {} ({})",
            alert.severity.label(),
            alert.category,
            alert.message,
            alert.location,
            alert.timestamp,
        );
    }

    for log in client.logs().iter().take(LOG_LINES) {
        println!("  {} {} {}", log.timestamp, log.level.prefix(), log.message);
    }

    if let Some(frame) = client.current_frame() {
        println!("Frame {}x{}", frame.width(), frame.height());
    }
    let sound = if client.sound_enabled() { "ligado" } else { "mudo" };
    println!("Som {sound}");
}

/// Idade curta para o aviso de dados antigos.
fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}min {}s", secs / 60, secs % 60),
        _ => format!("{}h {}min", secs / 3600, (secs % 3600) / 60),
    }
}
