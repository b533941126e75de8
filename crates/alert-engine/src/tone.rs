//! Synthesized alert tone (feature `audio`)
//!
//! rodio's output stream is not `Send`, so a dedicated thread owns it and
//! the sink only sends start/stop commands. If no output device exists the
//! thread logs once and swallows commands, degrading alerts to visual-only.

use crate::sink::AlertSink;
use detection_client::DetectionResult;
use rodio::source::SineWave;
use rodio::{OutputStream, Sink, Source};
use std::sync::mpsc;
use tracing::{debug, warn};

enum ToneCmd {
    Start,
    Stop,
}

/// Attention-getting sine tone, held while the alert is raised
pub struct AudibleTone {
    tx: mpsc::Sender<ToneCmd>,
}

impl AudibleTone {
    /// Spawn the audio thread. `freq_hz` around 880 Hz cuts through well.
    pub fn new(freq_hz: f32) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || tone_thread(rx, freq_hz));
        Self { tx }
    }
}

fn tone_thread(rx: mpsc::Receiver<ToneCmd>, freq_hz: f32) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("audio output unavailable ({e}); alerts degrade to visual-only");
            while rx.recv().is_ok() {}
            return;
        }
    };

    let mut playing: Option<Sink> = None;
    while let Ok(cmd) = rx.recv() {
        match cmd {
            ToneCmd::Start => {
                if playing.is_some() {
                    continue;
                }
                match Sink::try_new(&handle) {
                    Ok(sink) => {
                        sink.append(SineWave::new(freq_hz).amplify(0.25));
                        playing = Some(sink);
                        debug!(freq_hz, "alert tone started");
                    }
                    Err(e) => warn!("cannot open audio sink: {e}"),
                }
            }
            ToneCmd::Stop => {
                if let Some(sink) = playing.take() {
                    sink.stop();
                    debug!("alert tone stopped");
                }
            }
        }
    }
    // Channel closed: the engine is gone, silence and exit
    if let Some(sink) = playing.take() {
        sink.stop();
    }
}

impl AlertSink for AudibleTone {
    fn raise(&mut self, _result: &DetectionResult) {
        let _ = self.tx.send(ToneCmd::Start);
    }

    fn clear(&mut self) {
        let _ = self.tx.send(ToneCmd::Stop);
    }
}
