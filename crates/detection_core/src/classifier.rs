//! Classificação de registros brutos em alertas e logs tipados.
//!
//! Puramente sintática: busca de substrings (case-insensitive) em tabelas
//! ordenadas de regras, a primeira regra que casa vence. Tipos desconhecidos
//! caem no padrão seguro (Suspicious / Low / Info), nunca em erro.

use crate::types::{AlertCategory, AlertEntity, LogEntity, LogLevel, RawRecord, Severity};
use tracing::info;

/// Local exibido quando o registro não traz `details.location`.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Mensagem genérica quando o registro não traz nada aproveitável.
pub const FALLBACK_MESSAGE: &str = "System log entry";

const CATEGORY_RULES: &[(&[&str], AlertCategory)] = &[
    (&["weapon", "gun", "knife"], AlertCategory::Weapon),
    (&["breach", "unauthorized"], AlertCategory::Breach),
    (&["anomaly", "unusual"], AlertCategory::Anomaly),
];

const SEVERITY_RULES: &[(&[&str], Severity)] = &[
    (&["weapon", "gun"], Severity::High),
    (&["knife", "breach"], Severity::High),
    (&["suspicious", "anomaly"], Severity::Medium),
];

const LEVEL_RULES: &[(&[&str], LogLevel)] = &[
    (&["weapon", "gun", "knife"], LogLevel::Error),
    (&["suspicious", "anomaly"], LogLevel::Warning),
    (&["normal", "safe"], LogLevel::Success),
];

fn first_match<T: Copy>(rules: &[(&[&str], T)], alert_type: Option<&str>) -> Option<T> {
    let lowered = alert_type?.to_lowercase();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, value)| *value)
}

/// Categoria casada por palavra-chave, `None` quando cairia no padrão.
pub fn match_category(alert_type: Option<&str>) -> Option<AlertCategory> {
    first_match(CATEGORY_RULES, alert_type)
}

pub fn classify_category(alert_type: Option<&str>) -> AlertCategory {
    match_category(alert_type).unwrap_or_else(|| {
        info!("Tipo sem categoria conhecida: {alert_type:?} → Suspicious");
        AlertCategory::Suspicious
    })
}

pub fn classify_severity(alert_type: Option<&str>) -> Severity {
    first_match(SEVERITY_RULES, alert_type).unwrap_or(Severity::Low)
}

pub fn classify_log_level(alert_type: Option<&str>) -> LogLevel {
    first_match(LEVEL_RULES, alert_type).unwrap_or(LogLevel::Info)
}

/// Mensagem: descrição > "<tipo> detected" > `message` > texto genérico.
pub fn derive_message(raw: &RawRecord) -> String {
    if let Some(description) = raw.description() {
        return description.to_string();
    }
    if let Some(kind) = raw.alert_type() {
        return format!("{kind} detected");
    }
    raw.message().unwrap_or(FALLBACK_MESSAGE).to_string()
}

pub fn derive_location(raw: &RawRecord) -> String {
    raw.location().unwrap_or(UNKNOWN_LOCATION).to_string()
}

/// Chave estável para de-duplicação entre polls (não define ordem).
///
/// `index` é a posição do registro na resposta, usada só quando não há tipo.
pub fn derive_id(raw: &RawRecord, index: usize) -> String {
    let timestamp = raw.timestamp();
    match raw.alert_type() {
        Some(kind) => format!("{timestamp}-{}", kind.to_lowercase()),
        None => format!("{timestamp}-{index}"),
    }
}

/// Um registro entra na janela de alertas só se uma regra de categoria casou.
pub fn is_alert(raw: &RawRecord) -> bool {
    match_category(raw.alert_type()).is_some()
}

pub fn classify_alert(raw: &RawRecord, index: usize) -> AlertEntity {
    let kind = raw.alert_type();
    AlertEntity {
        id: derive_id(raw, index),
        timestamp: raw.timestamp(),
        category: classify_category(kind),
        severity: classify_severity(kind),
        message: derive_message(raw),
        location: derive_location(raw),
        raw_details: raw.clone(),
    }
}

pub fn classify_log(raw: &RawRecord, index: usize) -> LogEntity {
    LogEntity {
        id: derive_id(raw, index),
        timestamp: raw.timestamp(),
        level: classify_log_level(raw.alert_type()),
        message: derive_message(raw),
        raw_details: raw.clone(),
    }
}

/// Filtra e classifica os alertas de uma resposta, na ordem do servidor.
pub fn extract_alerts(records: &[RawRecord]) -> Vec<AlertEntity> {
    records
        .iter()
        .enumerate()
        .filter(|(_, raw)| is_alert(raw))
        .map(|(i, raw)| classify_alert(raw, i))
        .collect()
}

pub fn extract_logs(records: &[RawRecord]) -> Vec<LogEntity> {
    records
        .iter()
        .enumerate()
        .map(|(i, raw)| classify_log(raw, i))
        .collect()
}
