//! Formatos de fio do backend de detecção.
//!
//! ```text
//! GET  /frame      → corpo binário (image/*)
//! GET  /logs       → { "logs": [RawRecord, ...] }
//! GET  /status     → SystemStatus
//! POST /configure  ← DetectionSettings (JSON)
//! ```
//!
//! O export local de logs usa o mesmo JSON, em array indentado.

use crate::config::DetectionSettings;
use crate::types::{RawRecord, SystemStatus};
use serde::{Deserialize, Serialize};

pub const FRAME_PATH: &str = "/frame";
pub const LOGS_PATH: &str = "/logs";
pub const STATUS_PATH: &str = "/status";
pub const CONFIGURE_PATH: &str = "/configure";

/// Erros do protocolo.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON inválido: {0}")]
    Json(String),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e.to_string())
    }
}

#[derive(Deserialize)]
struct LogsEnvelope {
    logs: Option<Vec<RawRecord>>,
}

/// Decodifica o corpo de `/logs`.
pub fn decode_logs(body: &[u8]) -> Result<Vec<RawRecord>, ProtocolError> {
    let envelope: LogsEnvelope = serde_json::from_slice(body)?;
    envelope.logs.ok_or(ProtocolError::MissingField("logs"))
}

/// Decodifica o corpo de `/status`.
pub fn decode_status(body: &[u8]) -> Result<SystemStatus, ProtocolError> {
    Ok(serde_json::from_slice(body)?)
}

/// Serializa entidades para o arquivo de export.
pub fn encode_export<T: Serialize>(entries: &[T]) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec_pretty(entries)?)
}

/// Corpo do `POST /configure`.
pub fn encode_settings(settings: &DetectionSettings) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(settings)?)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
