//! # Detection Core
//!
//! Cliente de telemetria do backend de detecção de ameaças: consulta
//! periódica de frames, logs e status, classificação de alertas, janelas de
//! histórico e disparo de notificações.
//!
//! ## Módulos
//! - [`types`] – Registros crus, entidades classificadas e estados de conexão
//! - [`classifier`] – Regras de categoria, severidade e nível de log
//! - [`history`] – Janelas limitadas de alertas e logs
//! - [`protocol`] – Rotas e envelopes JSON do backend
//! - [`transport`] – Abstração HTTP (reqwest bloqueante)
//! - [`scheduler`] – Tarefas periódicas e atrasadas com cancelamento
//! - [`poller`] – Máquina de estados de conexão por recurso
//! - [`frame`] – Stream de frames com liberação garantida
//! - [`notify`] – Gatilho de notificações e toasts
//! - [`config`] – Configuração TOML
//! - [`client`] – Fachada [`TelemetryClient`]

pub mod types;
pub mod classifier;
pub mod history;
pub mod protocol;
pub mod config;
pub mod transport;
pub mod scheduler;
pub mod poller;
pub mod frame;
pub mod notify;
pub mod client;

// Re-exports convenientes
pub use client::{ClientError, ClientEvent, TelemetryClient};
pub use config::{AppConfig, ClientConfig, DetectionSettings};
pub use notify::{LogNotifier, Notifier, Toast};
pub use types::{AlertEntity, ConnectionState, LogEntity, Resource, SystemStatus};
