//! Agendamento de tarefas periódicas canceláveis.
//!
//! [`ThreadScheduler`] usa uma thread de timer por tarefa repetitiva
//! (`crossbeam_channel::tick` + `select!`) e um pool fixo de workers que
//! executa cada disparo de forma independente, então requisições podem se
//! sobrepor. Fila de jobs cheia descarta o disparo.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, tick};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error};

/// Job executado uma vez.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Job executado a cada disparo de uma tarefa repetitiva.
pub type RepeatingJob = Arc<dyn Fn() + Send + Sync + 'static>;

/// Agendador de tarefas.
pub trait Scheduler: Send + Sync {
    /// Dispara `job` imediatamente e depois a cada `period`.
    fn every(&self, period: Duration, job: RepeatingJob) -> TaskHandle;

    /// Dispara `job` uma vez após `delay`.
    fn after(&self, delay: Duration, job: Job) -> TaskHandle;
}

/// Handle de uma tarefa agendada. Cancela ao ser descartado.
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    // Desconectar o sender acorda a thread de timer
    wake: Option<Sender<()>>,
}

impl TaskHandle {
    fn new(cancelled: Arc<AtomicBool>, wake: Option<Sender<()>>) -> Self {
        Self { cancelled, wake }
    }

    /// Nenhum disparo novo após o retorno. Idempotente.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ──────────────────────────────────────────────
// Implementação com threads
// ──────────────────────────────────────────────

/// Período mínimo de um timer repetido; zero giraria sem parar.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Capacidade da fila de jobs por worker.
const QUEUE_PER_WORKER: usize = 16;

/// Scheduler de produção: timers em threads dedicadas, I/O num pool.
pub struct ThreadScheduler {
    jobs: Sender<Job>,
}

impl ThreadScheduler {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = bounded::<Job>(workers * QUEUE_PER_WORKER);

        for i in 0..workers {
            let rx = rx.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("detection-worker-{i}"))
                .spawn(move || worker_loop(&rx));
            if let Err(e) = spawned {
                error!("Falha ao criar worker {i}: {e}");
            }
        }

        Self { jobs: tx }
    }

    fn dispatch(jobs: &Sender<Job>, job: Job) {
        match jobs.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Fila de jobs cheia, descartando disparo"),
            Err(TrySendError::Disconnected(_)) => debug!("Workers encerrados, descartando disparo"),
        }
    }
}

fn worker_loop(rx: &Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        job();
    }
}

impl Scheduler for ThreadScheduler {
    fn every(&self, period: Duration, job: RepeatingJob) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = bounded::<()>(0);
        let jobs = self.jobs.clone();
        let flag = Arc::clone(&cancelled);

        let spawned = std::thread::Builder::new()
            .name("poll-timer".into())
            .spawn(move || {
                let ticker = tick(period.max(MIN_PERIOD));
                let fire = |job: &RepeatingJob| {
                    let job = Arc::clone(job);
                    ThreadScheduler::dispatch(&jobs, Box::new(move || job()));
                };

                fire(&job);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if flag.load(Ordering::SeqCst) {
                                break;
                            }
                            fire(&job);
                        }
                        recv(wake_rx) -> _ => break,
                    }
                }
            });
        if let Err(e) = spawned {
            error!("Falha ao criar thread de timer: {e}");
        }

        TaskHandle::new(cancelled, Some(wake_tx))
    }

    fn after(&self, delay: Duration, job: Job) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = bounded::<()>(0);
        let jobs = self.jobs.clone();
        let flag = Arc::clone(&cancelled);

        let spawned = std::thread::Builder::new()
            .name("delay-timer".into())
            .spawn(move || {
                select! {
                    recv(crossbeam_channel::after(delay)) -> _ => {
                        if !flag.load(Ordering::SeqCst) {
                            ThreadScheduler::dispatch(&jobs, job);
                        }
                    }
                    recv(wake_rx) -> _ => {}
                }
            });
        if let Err(e) = spawned {
            error!("Falha ao criar thread de timer: {e}");
        }

        TaskHandle::new(cancelled, Some(wake_tx))
    }
}

// ──────────────────────────────────────────────
// Relógio virtual (testes)
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) use manual::ManualScheduler;
