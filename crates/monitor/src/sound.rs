//! Sinal sonoro de alerta sintetizado com rodio.

use detection_core::notify::{LogNotifier, Notifier, Toast};
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;

const FIRST_TONE_HZ: f32 = 880.0;
const SECOND_TONE_HZ: f32 = 660.0;
const TONE_LENGTH: Duration = Duration::from_millis(150);

/// Toca um "ding-dong" curto e delega o toast ao log.
pub struct ChimeNotifier {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
    log: LogNotifier,
}

impl ChimeNotifier {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
            log: LogNotifier,
        })
    }
}

impl Notifier for ChimeNotifier {
    fn chime(&self) {
        // O sink toca em sequência sem bloquear o loop
        for freq in [FIRST_TONE_HZ, SECOND_TONE_HZ] {
            let tone = SineWave::new(freq).take_duration(TONE_LENGTH).amplify(0.3);
            self.sink.append(tone);
        }
    }

    fn toast(&self, toast: &Toast) {
        self.log.toast(toast);
    }
}
