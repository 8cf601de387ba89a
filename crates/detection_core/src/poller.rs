//! Poller genérico de recursos do backend.
//!
//! Cada disparo do timer vira uma requisição independente numa thread de
//! I/O (sem coalescer: requisições podem se sobrepor). O resultado volta
//! como [`Completion`] pelo channel da thread dona do estado, que chama
//! [`ResourcePoller::apply`]. Conclusões de uma época anterior (poller
//! parado ou reiniciado) ou mais antigas que a última aplicada são
//! descartadas.
//!
//! Erros nunca param o poll: o intervalo é fixo, sem backoff.

use crate::protocol;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::transport::{Endpoint, FetchError, Transport};
use crate::types::{ConnectionState, RawRecord, Resource, SystemStatus};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Corpo decodificado de um poll.
#[derive(Debug)]
pub enum Payload {
    /// Corpo da imagem ainda não decodificado
    Frame(Vec<u8>),
    Logs(Vec<RawRecord>),
    Status(SystemStatus),
}

/// Decodificador executado na thread de I/O.
pub type Decoder = Arc<dyn Fn(&[u8]) -> Result<Payload, FetchError> + Send + Sync>;

/// Resultado de uma requisição, enviado à thread dona do estado.
#[derive(Debug)]
pub struct Completion {
    pub resource: Resource,
    pub epoch: u64,
    /// Ordem de emissão da requisição
    pub seq: u64,
    pub outcome: Result<Payload, FetchError>,
}

/// Efeito de uma conclusão aceita.
#[derive(Debug)]
pub struct Applied {
    pub previous: ConnectionState,
    pub current: ConnectionState,
    /// Transição Error → Connected (sinal único de recuperação)
    pub reconnected: bool,
    pub payload: Option<Payload>,
    pub error: Option<FetchError>,
}

impl Applied {
    pub fn state_changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Poll periódico de um endpoint.
pub struct ResourcePoller {
    resource: Resource,
    endpoint: Endpoint,
    interval: Duration,
    decode: Decoder,
    state: ConnectionState,
    epoch: u64,
    issued: Arc<AtomicU64>,
    newest_applied: Option<u64>,
    task: Option<TaskHandle>,
    last_error: Option<FetchError>,
    last_success: Option<Instant>,
}

impl ResourcePoller {
    pub fn new(
        resource: Resource,
        endpoint: Endpoint,
        interval: Duration,
        decode: Decoder,
    ) -> Self {
        Self {
            resource,
            endpoint,
            interval,
            decode,
            state: ConnectionState::Disconnected,
            epoch: 0,
            issued: Arc::new(AtomicU64::new(0)),
            newest_applied: None,
            task: None,
            last_error: None,
            last_success: None,
        }
    }

    /// Poller de `/logs`.
    pub fn logs(interval: Duration) -> Self {
        Self::new(
            Resource::Logs,
            Endpoint::json(protocol::LOGS_PATH),
            interval,
            Arc::new(|body: &[u8]| -> Result<Payload, FetchError> {
                Ok(Payload::Logs(protocol::decode_logs(body)?))
            }),
        )
    }

    /// Poller de `/status`.
    pub fn status(interval: Duration) -> Self {
        Self::new(
            Resource::Status,
            Endpoint::json(protocol::STATUS_PATH),
            interval,
            Arc::new(|body: &[u8]| -> Result<Payload, FetchError> {
                Ok(Payload::Status(protocol::decode_status(body)?))
            }),
        )
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Instante do último poll bem-sucedido (aviso de dado velho).
    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// Começa a emitir uma requisição por intervalo. No-op se já ativo.
    pub fn start<M>(
        &mut self,
        scheduler: &dyn Scheduler,
        transport: Arc<dyn Transport>,
        tx: Sender<M>,
    ) where
        M: From<Completion> + Send + 'static,
    {
        if self.is_active() {
            return;
        }

        self.epoch += 1;
        self.state = ConnectionState::Connecting;
        self.newest_applied = None;

        let resource = self.resource;
        let endpoint = self.endpoint;
        let epoch = self.epoch;
        let issued = Arc::clone(&self.issued);
        let decode = Arc::clone(&self.decode);

        let job = move || {
            let seq = issued.fetch_add(1, Ordering::SeqCst);
            let outcome = transport
                .get(&endpoint)
                .and_then(|body| decode(&body));
            // Receptor fechado = cliente encerrado
            let _ = tx.send(M::from(Completion {
                resource,
                epoch,
                seq,
                outcome,
            }));
        };

        self.task = Some(scheduler.every(self.interval, Arc::new(job)));
        info!(
            "Poll de {} iniciado a cada {:?}",
            self.endpoint.path, self.interval
        );
    }

    /// Cancela o timer. Respostas em voo serão descartadas ao chegar.
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
            info!("Poll de {} parado", self.endpoint.path);
        }
        self.epoch += 1;
        self.state = ConnectionState::Disconnected;
    }

    /// `false` para conclusões de outra época ou mais antigas que a última
    /// aplicada.
    pub fn accepts(&self, completion: &Completion) -> bool {
        if !self.is_active() || completion.epoch != self.epoch {
            debug!(
                "Descartando resposta de {} (época {} ≠ {})",
                self.endpoint.path, completion.epoch, self.epoch
            );
            return false;
        }
        if self.newest_applied.is_some_and(|newest| completion.seq < newest) {
            debug!(
                "Descartando resposta fora de ordem de {} (seq {})",
                self.endpoint.path, completion.seq
            );
            return false;
        }
        true
    }

    /// Aplica uma conclusão. `None` quando ela é velha e foi descartada.
    pub fn apply(&mut self, completion: Completion) -> Option<Applied> {
        if !self.accepts(&completion) {
            return None;
        }
        self.newest_applied = Some(completion.seq);

        let previous = self.state;
        match completion.outcome {
            Ok(payload) => {
                self.state = ConnectionState::Connected;
                self.last_success = Some(Instant::now());
                self.last_error = None;
                let reconnected = previous == ConnectionState::Error;
                if reconnected {
                    info!("{} respondendo novamente", self.endpoint.path);
                }
                Some(Applied {
                    previous,
                    current: self.state,
                    reconnected,
                    payload: Some(payload),
                    error: None,
                })
            }
            Err(e) => {
                self.state = ConnectionState::Error;
                if previous == ConnectionState::Error {
                    debug!("{} ainda indisponível: {e}", self.endpoint.path);
                } else {
                    warn!("Falha no poll de {}: {e}", self.endpoint.path);
                }
                self.last_error = Some(e.clone());
                Some(Applied {
                    previous,
                    current: self.state,
                    reconnected: false,
                    payload: None,
                    error: Some(e),
                })
            }
        }
    }
}
