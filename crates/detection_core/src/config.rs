//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável, com seções `[client]`
//! (polling e janelas) e `[settings]` (parâmetros enviados a `/configure`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Erros ao persistir configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro de serialização TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuração do cliente de telemetria.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL base do backend de detecção
    pub backend_url: String,
    /// Intervalo do stream de frames (ms)
    pub frame_interval_ms: u64,
    /// Intervalo de `/logs` (ms)
    pub logs_interval_ms: u64,
    /// Intervalo de `/status` (ms)
    pub status_interval_ms: u64,
    /// Espera entre parar e religar o stream no reconnect (ms)
    pub reconnect_delay_ms: u64,
    /// Timeout de cada requisição HTTP (ms)
    pub request_timeout_ms: u64,
    /// Tamanho máximo da janela de alertas
    pub alert_capacity: usize,
    /// Tamanho máximo da janela de logs
    pub log_capacity: usize,
    /// Som de alerta habilitado ao iniciar
    pub sound_enabled: bool,
    /// Threads de I/O do scheduler
    pub worker_threads: usize,
    /// Inicia o stream de frames junto com o cliente
    pub stream_on_start: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            frame_interval_ms: 100,
            logs_interval_ms: 2000,
            status_interval_ms: 10_000,
            reconnect_delay_ms: 1000,
            request_timeout_ms: 4000,
            alert_capacity: crate::history::ALERT_CAPACITY,
            log_capacity: crate::history::LOG_CAPACITY,
            sound_enabled: true,
            worker_threads: 4,
            stream_on_start: false,
        }
    }
}

impl ClientConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn logs_interval(&self) -> Duration {
        Duration::from_millis(self.logs_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Sensibilidade do detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

/// Parâmetros de detecção enviados ao backend (best-effort).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub camera_resolution: String,
    pub detection_sensitivity: Sensitivity,
    pub alert_notifications: bool,
    pub auto_archive: bool,
    pub recording_enabled: bool,
    pub stream_quality: String,
    pub alert_sound: bool,
    /// Retenção de logs no backend (dias)
    pub max_log_retention: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            camera_resolution: "1920x1080".into(),
            detection_sensitivity: Sensitivity::High,
            alert_notifications: true,
            auto_archive: true,
            recording_enabled: true,
            stream_quality: "high".into(),
            alert_sound: true,
            max_log_retention: 30,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub settings: DetectionSettings,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let c = &self.client;

        if let Err(e) = url::Url::parse(&c.backend_url) {
            errors.push(format!("URL do backend inválida '{}': {e}", c.backend_url));
        }
        for (name, value) in [
            ("frame_interval_ms", c.frame_interval_ms),
            ("logs_interval_ms", c.logs_interval_ms),
            ("status_interval_ms", c.status_interval_ms),
            ("request_timeout_ms", c.request_timeout_ms),
        ] {
            if value == 0 {
                errors.push(format!("{name} não pode ser 0"));
            }
        }
        if c.alert_capacity == 0 || c.log_capacity == 0 {
            errors.push("Capacidade das janelas não pode ser 0".into());
        }
        if c.worker_threads == 0 {
            errors.push("worker_threads deve ser ≥ 1".into());
        }

        errors
    }
}
