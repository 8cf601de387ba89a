//! Definição de tipos/structs do cliente de telemetria.
//!
//! Registros brutos do backend são mantidos como objetos JSON opacos
//! ([`RawRecord`]); o classificador os converte em [`AlertEntity`] e
//! [`LogEntity`] fortemente tipados.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ──────────────────────────────────────────────
// Conexão
// ──────────────────────────────────────────────

/// Estado de conexão de um recurso consultado periodicamente.
///
/// Só muda em resposta ao resultado de um poll, nunca diretamente pela UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Recursos consultados no backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Frame,
    Logs,
    Status,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Frame, Resource::Logs, Resource::Status];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Frame => "frame",
            Resource::Logs => "logs",
            Resource::Status => "status",
        }
    }
}

// ──────────────────────────────────────────────
// Registro bruto
// ──────────────────────────────────────────────

/// Registro heterogêneo como enviado pelo backend.
///
/// Todos os campos são preservados; apenas `timestamp`, `alert_type`/`type`,
/// `message` e `details.{description,location}` são interpretados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    /// Timestamp em forma de texto (números são formatados, ausente = vazio).
    pub fn timestamp(&self) -> String {
        match self.0.get("timestamp") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Tipo do evento: `alert_type`, ou a chave legada `type`.
    pub fn alert_type(&self) -> Option<&str> {
        self.str_field("alert_type").or_else(|| self.str_field("type"))
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    pub fn description(&self) -> Option<&str> {
        self.detail("description")
    }

    pub fn location(&self) -> Option<&str> {
        self.detail("location")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn detail(&self, key: &str) -> Option<&str> {
        self.0
            .get("details")
            .and_then(Value::as_object)
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawRecord(map),
            _ => RawRecord::default(),
        }
    }
}

// ──────────────────────────────────────────────
// Alertas
// ──────────────────────────────────────────────

/// Categoria de um alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Weapon,
    Suspicious,
    Breach,
    Anomaly,
}

/// Severidade de um alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

/// Alerta classificado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntity {
    /// Chave estável derivada de timestamp + tipo
    pub id: String,
    pub timestamp: String,
    pub category: AlertCategory,
    pub severity: Severity,
    pub message: String,
    pub location: String,
    pub raw_details: RawRecord,
}

// ──────────────────────────────────────────────
// Logs
// ──────────────────────────────────────────────

/// Nível de uma entrada de log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl LogLevel {
    /// Prefixo exibido no terminal de logs.
    pub fn prefix(self) -> &'static str {
        match self {
            LogLevel::Error => "[CRITICAL]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Success => "[SUCCESS]",
            LogLevel::Info => "[INFO]",
        }
    }
}

/// Entrada de log classificada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntity {
    pub id: String,
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub raw_details: RawRecord,
}

// ──────────────────────────────────────────────
// Status do sistema
// ──────────────────────────────────────────────

/// Saúde do backend retornada por `/status`.
///
/// Aceita o formato documentado e o legado (`status`, `alert_count`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    pub uptime: Option<Value>,
    pub active_cameras: Option<u32>,
    pub detection_fps: Option<f64>,
    pub total_alerts: Option<u64>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub backend_status: Option<String>,
    status: Option<String>,
    alert_count: Option<u64>,
    /// Campos não interpretados
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SystemStatus {
    pub fn backend_status(&self) -> Option<&str> {
        self.backend_status.as_deref().or(self.status.as_deref())
    }

    pub fn total_alerts(&self) -> Option<u64> {
        self.total_alerts.or(self.alert_count)
    }

    /// Uptime em texto para exibição.
    pub fn uptime_display(&self) -> Option<String> {
        match self.uptime.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_reads_legacy_type_key() {
        let raw = RawRecord::from(json!({"timestamp": "20240101", "type": "knife"}));
        assert_eq!(raw.alert_type(), Some("knife"));
        assert_eq!(raw.timestamp(), "20240101");
    }

    #[test]
    fn alert_type_takes_precedence_over_type() {
        let raw = RawRecord::from(json!({"alert_type": "gun", "type": "person"}));
        assert_eq!(raw.alert_type(), Some("gun"));
    }

    #[test]
    fn numeric_timestamp_and_details() {
        let raw = RawRecord::from(json!({
            "timestamp": 1700000000,
            "details": {"description": "Knife near entrance", "location": "Cam-1"},
            "confidence": 0.93
        }));
        assert_eq!(raw.timestamp(), "1700000000");
        assert_eq!(raw.description(), Some("Knife near entrance"));
        assert_eq!(raw.location(), Some("Cam-1"));
        // Campos extras preservados
        assert!(raw.0.contains_key("confidence"));
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let raw = RawRecord::from(json!({"alert_type": "  ", "details": {"location": ""}}));
        assert_eq!(raw.alert_type(), None);
        assert_eq!(raw.location(), None);
    }

    #[test]
    fn legacy_status_shape() {
        let status: SystemStatus =
            serde_json::from_value(json!({"status": "running", "alert_count": 4})).unwrap();
        assert_eq!(status.backend_status(), Some("running"));
        assert_eq!(status.total_alerts(), Some(4));
        assert_eq!(status.cpu_usage, None);
    }

    #[test]
    fn documented_status_shape() {
        let status: SystemStatus = serde_json::from_value(json!({
            "uptime": "2h 13m",
            "active_cameras": 3,
            "detection_fps": 24.5,
            "total_alerts": 12,
            "cpu_usage": 41.0,
            "backend_status": "online",
            "gpu": "rtx"
        }))
        .unwrap();
        assert_eq!(status.backend_status(), Some("online"));
        assert_eq!(status.total_alerts(), Some(12));
        assert_eq!(status.uptime_display().as_deref(), Some("2h 13m"));
        assert_eq!(status.extra.get("gpu"), Some(&json!("rtx")));
    }

    #[test]
    fn level_prefixes() {
        assert_eq!(LogLevel::Error.prefix(), "[CRITICAL]");
        assert_eq!(LogLevel::Info.prefix(), "[INFO]");
    }
}
