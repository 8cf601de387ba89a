//! Canal de frames binários do stream de vídeo.
//!
//! Especialização do [`ResourcePoller`] para `/frame` (`Accept: image/*`).
//! O canal é dono exclusivo do último frame decodificado: o anterior é
//! liberado antes de o novo ser publicado, e no `stop` o frame exibido é
//! liberado e limpo. Um [`FrameLedger`] conta os frames vivos.

use crate::poller::{Applied, Completion, Payload, ResourcePoller};
use crate::protocol;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::transport::{Endpoint, FetchError, Transport};
use crate::types::{ConnectionState, Resource};
use crossbeam_channel::Sender;
use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Contador de [`FrameResource`] vivos.
#[derive(Debug, Clone, Default)]
pub struct FrameLedger(Arc<AtomicUsize>);

impl FrameLedger {
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frame decodificado (RGBA8). Liberado ao ser descartado.
pub struct FrameResource {
    image: RgbaImage,
    ledger: FrameLedger,
}

impl FrameResource {
    /// Decodifica um corpo JPEG/PNG.
    pub fn decode(bytes: &[u8], ledger: &FrameLedger) -> Result<Self, FetchError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FetchError::Decode(format!("frame: {e}")))?
            .into_rgba8();
        ledger.0.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            image,
            ledger: ledger.clone(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl Drop for FrameResource {
    fn drop(&mut self) {
        self.ledger.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for FrameResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameResource")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Pedido de religar o stream após o atraso do reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeStream {
    pub token: u64,
}

/// Stream de frames com posse exclusiva do frame exibido.
pub struct FrameChannel {
    poller: ResourcePoller,
    ledger: FrameLedger,
    current: Option<FrameResource>,
    /// Intenção do usuário de manter o stream ativo
    wanted: bool,
    reconnect_delay: Duration,
    reconnect_token: u64,
    reconnect_task: Option<TaskHandle>,
}

impl FrameChannel {
    pub fn new(interval: Duration, reconnect_delay: Duration) -> Self {
        // Só os bytes viajam; a decodificação espera a conclusão ser aceita
        let poller = ResourcePoller::new(
            Resource::Frame,
            Endpoint::image(protocol::FRAME_PATH),
            interval,
            Arc::new(|body: &[u8]| -> Result<Payload, FetchError> {
                Ok(Payload::Frame(body.to_vec()))
            }),
        );

        Self {
            poller,
            ledger: FrameLedger::default(),
            current: None,
            wanted: false,
            reconnect_delay,
            reconnect_token: 0,
            reconnect_task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.poller.state()
    }

    pub fn is_active(&self) -> bool {
        self.poller.is_active()
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted
    }

    pub fn current(&self) -> Option<&FrameResource> {
        self.current.as_ref()
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.poller.last_success()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.poller.last_error()
    }

    /// Frames decodificados vivos (no máximo o exibido).
    pub fn live_frames(&self) -> usize {
        self.ledger.live()
    }

    pub fn start<M>(
        &mut self,
        scheduler: &dyn Scheduler,
        transport: Arc<dyn Transport>,
        tx: Sender<M>,
    ) where
        M: From<Completion> + Send + 'static,
    {
        self.wanted = true;
        self.reconnect_task = None;
        self.poller.start(scheduler, transport, tx);
    }

    /// Para o stream e libera o frame exibido imediatamente.
    pub fn stop(&mut self) {
        self.wanted = false;
        self.reconnect_task = None;
        self.halt();
    }

    fn halt(&mut self) {
        self.poller.stop();
        if self.current.take().is_some() {
            debug!("Frame exibido liberado");
        }
    }

    /// Para, espera `reconnect_delay` e religa se o stream ainda for desejado.
    ///
    /// Com o stream já parado, apenas garante a parada.
    ///
    /// O religamento chega como [`ResumeStream`] pelo channel e é efetivado
    /// por [`FrameChannel::resume`].
    pub fn reconnect<M>(&mut self, scheduler: &dyn Scheduler, tx: Sender<M>)
    where
        M: From<ResumeStream> + Send + 'static,
    {
        let wanted = self.wanted;
        self.halt();
        if !wanted {
            debug!("Reconnect com stream parado: nada a religar");
            return;
        }
        self.reconnect_token += 1;
        let token = self.reconnect_token;

        info!("Reconectando stream em {:?}", self.reconnect_delay);
        self.reconnect_task = Some(scheduler.after(
            self.reconnect_delay,
            Box::new(move || {
                let _ = tx.send(M::from(ResumeStream { token }));
            }),
        ));
    }

    /// Religa após um reconnect. Retorna `true` se o stream voltou.
    pub fn resume<M>(
        &mut self,
        request: ResumeStream,
        scheduler: &dyn Scheduler,
        transport: Arc<dyn Transport>,
        tx: Sender<M>,
    ) -> bool
    where
        M: From<Completion> + Send + 'static,
    {
        if request.token != self.reconnect_token || !self.wanted || self.poller.is_active() {
            debug!("Religamento {} ignorado", request.token);
            return false;
        }
        self.reconnect_task = None;
        self.poller.start(scheduler, transport, tx);
        true
    }

    /// Aplica uma conclusão de `/frame`, publicando o frame novo.
    ///
    /// Só conclusões aceitas pelo poller são decodificadas; as velhas são
    /// descartadas como bytes. Falhas de decodificação viram `Error` e
    /// mantêm o último frame visível até o próximo sucesso.
    pub fn apply(&mut self, mut completion: Completion) -> Option<Applied> {
        if !self.poller.accepts(&completion) {
            return None;
        }

        let decoded = match &completion.outcome {
            Ok(Payload::Frame(bytes)) => Some(FrameResource::decode(bytes, &self.ledger)),
            _ => None,
        };
        let frame = match decoded {
            Some(Ok(frame)) => Some(frame),
            Some(Err(e)) => {
                completion.outcome = Err(e);
                None
            }
            None => None,
        };

        let mut applied = self.poller.apply(completion)?;
        applied.payload = None;
        if let Some(frame) = frame {
            // Libera o anterior antes de publicar
            drop(self.current.take());
            self.current = Some(frame);
        }
        Some(applied)
    }
}
