//! Disparo de notificações (som + toast) quando surgem alertas novos.
//!
//! Disparo por borda: só quando a contagem de alertas cresce entre polls
//! consecutivos, e nunca no primeiro poll após (re)iniciar, para não
//! re-alertar estado que o backend já tinha.

use crate::types::{AlertEntity, Severity};
use std::cmp::Ordering;
use tracing::{info, warn};

/// Guarda a contagem anterior e decide se o crescimento dispara.
#[derive(Debug, Clone, Default)]
pub struct NotificationTrigger {
    previous_count: usize,
}

impl NotificationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compara com a contagem anterior e a atualiza.
    pub fn observe(&mut self, count: usize) -> bool {
        let fire = count > self.previous_count && self.previous_count > 0;
        self.previous_count = count;
        fire
    }

    /// Volta ao estado de início (o próximo poll não dispara).
    pub fn reset(&mut self) {
        self.previous_count = 0;
    }

    pub fn previous_count(&self) -> usize {
        self.previous_count
    }
}

/// Alerta mais recente pelo timestamp.
///
/// Timestamps numéricos comparam como números, os demais como texto
/// (ISO 8601 ordena lexicograficamente). Empate fica com o primeiro.
pub fn newest_alert(alerts: &[AlertEntity]) -> Option<&AlertEntity> {
    alerts.iter().reduce(|best, alert| {
        if timestamp_order(&alert.timestamp, &best.timestamp) == Ordering::Greater {
            alert
        } else {
            best
        }
    })
}

fn timestamp_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

/// Aviso visual transitório.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Toast {
    /// Toast para o alerta mais recente.
    pub fn for_alert(alert: &AlertEntity) -> Self {
        Self {
            title: format!("{} PRIORITY ALERT", alert.severity.label()),
            description: alert.message.clone(),
            severity: alert.severity,
        }
    }
}

/// Efeitos colaterais de notificação, fornecidos pela camada de apresentação.
pub trait Notifier {
    /// Sinal sonoro curto de dois tons.
    fn chime(&self);

    fn toast(&self, toast: &Toast);
}

/// Notificador que apenas registra no log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn chime(&self) {
        info!("🔔 Novo alerta");
    }

    fn toast(&self, toast: &Toast) {
        match toast.severity {
            Severity::High => warn!("{}: {}", toast.title, toast.description),
            _ => info!("{}: {}", toast.title, toast.description),
        }
    }
}
