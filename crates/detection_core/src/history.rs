//! Janelas de histórico de capacidade fixa para alertas e logs.
//!
//! Cada janela é uma *visão materializada* da última resposta do backend:
//! um poll bem-sucedido substitui todo o conteúdo, truncado à capacidade.
//! `clear` e `remove` são ações locais, nada é enviado ao backend, então
//! itens removidos reaparecem no próximo poll se o backend ainda os reportar.

use crate::protocol::{self, ProtocolError};
use crate::types::{AlertEntity, LogEntity};
use serde::Serialize;

/// Capacidade padrão da janela de alertas.
pub const ALERT_CAPACITY: usize = 10;
/// Capacidade padrão da janela de logs.
pub const LOG_CAPACITY: usize = 20;

/// Entidades que possuem uma chave estável.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for AlertEntity {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for LogEntity {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Sequência ordenada com tamanho máximo.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: Vec<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitui a janela inteira pelos primeiros `capacity` itens.
    pub fn replace<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.entries.clear();
        self.entries.extend(items.into_iter().take(self.capacity));
    }

    /// Visão somente-leitura, na ordem do servidor.
    pub fn snapshot(&self) -> &[T] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Keyed> HistoryBuffer<T> {
    /// Remove localmente pelo id. Id inexistente é no-op.
    ///
    /// Retorna quantas entradas saíram da janela.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != id);
        before - self.entries.len()
    }
}

impl<T: Serialize> HistoryBuffer<T> {
    /// Serializa a janela atual (JSON) para download.
    pub fn export(&self) -> Result<Vec<u8>, ProtocolError> {
        protocol::encode_export(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogLevel, RawRecord};

    fn log(id: &str) -> LogEntity {
        LogEntity {
            id: id.into(),
            timestamp: "12:00:00".into(),
            level: LogLevel::Info,
            message: format!("entry {id}"),
            raw_details: RawRecord::default(),
        }
    }

    #[test]
    fn never_exceeds_capacity() {
        for size in [0, 1, ALERT_CAPACITY - 1, ALERT_CAPACITY, ALERT_CAPACITY + 1, 500] {
            let mut buf = HistoryBuffer::new(ALERT_CAPACITY);
            buf.replace((0..size).map(|i| log(&i.to_string())));
            assert_eq!(buf.len(), size.min(ALERT_CAPACITY));
        }
        let mut logs = HistoryBuffer::new(LOG_CAPACITY);
        logs.replace((0..21).map(|i| log(&i.to_string())));
        assert_eq!(logs.len(), LOG_CAPACITY);
    }

    #[test]
    fn truncation_keeps_server_order_prefix() {
        let mut buf = HistoryBuffer::new(3);
        buf.replace(["a", "b", "c", "d", "e"].map(log));
        let ids: Vec<_> = buf.snapshot().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn replace_does_not_accumulate() {
        let mut buf = HistoryBuffer::new(10);
        buf.replace(["a", "b"].map(log));
        buf.replace(["c"].map(log));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.snapshot()[0].id, "c");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut buf = HistoryBuffer::new(10);
        buf.replace(["a", "b"].map(log));
        assert_eq!(buf.remove("a"), 1);
        assert_eq!(buf.remove("a"), 0);
        assert_eq!(buf.remove("missing"), 0);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut buf = HistoryBuffer::new(10);
        buf.replace(["a"].map(log));
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn export_is_json_array() {
        let mut buf = HistoryBuffer::new(10);
        buf.replace(["a", "b"].map(log));
        let bytes = buf.export().unwrap();
        let parsed: Vec<LogEntity> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, buf.snapshot());
    }
}
