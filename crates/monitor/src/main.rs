//! # Detection Monitor
//!
//! Monitor headless do backend de detecção. Liga o transporte HTTP e o
//! scheduler de threads ao [`TelemetryClient`] e mostra no console alertas,
//! logs e saúde do backend.
//!
//! ## Argumentos
//! - `--stream`: inicia também o stream de frames
//! - `--no-sound`: começa com o som de alerta desligado

mod dashboard;
#[cfg(feature = "sound")]
mod sound;

use dashboard::ConsoleDashboard;
use detection_core::TelemetryClient;
use detection_core::config::AppConfig;
use detection_core::notify::{LogNotifier, Notifier};
use std::time::Duration;
use tracing::{error, info, warn};

/// Espera máxima por mensagens antes de redesenhar o painel.
const LOOP_TICK: Duration = Duration::from_millis(250);

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("{e}");
        }
    }
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            error!("Configuração inválida: {problem}");
        }
        error!("Corrija {} e reinicie", config_path.display());
        std::process::exit(1);
    }

    let mut client_config = config.client.clone();
    let mut mute = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--stream" => client_config.stream_on_start = true,
            "--no-sound" => mute = true,
            other => warn!("Argumento ignorado: {other}"),
        }
    }

    // ── Cliente ──
    let mut client = match TelemetryClient::with_http(client_config, build_notifier()) {
        Ok(client) => client,
        Err(e) => {
            error!("Falha ao criar cliente HTTP: {e}");
            std::process::exit(1);
        }
    };
    if mute && client.sound_enabled() {
        client.toggle_sound();
    }

    let mut dashboard = ConsoleDashboard::new(client.subscribe(), client.config());
    client.start();

    if let Err(e) = client.push_settings(&config.settings) {
        warn!("{e}");
    }

    info!("Monitor rodando – Ctrl+C para sair");
    loop {
        client.wait(LOOP_TICK);
        dashboard.update(&client);
    }
}

#[cfg(feature = "sound")]
fn build_notifier() -> Box<dyn Notifier> {
    match sound::ChimeNotifier::new() {
        Ok(notifier) => Box::new(notifier),
        Err(e) => {
            warn!("Áudio indisponível ({e}), usando notificações só no log");
            Box::new(LogNotifier)
        }
    }
}

#[cfg(not(feature = "sound"))]
fn build_notifier() -> Box<dyn Notifier> {
    Box::new(LogNotifier)
}
