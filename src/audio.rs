use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio track {} not found", .0.display())]
    Missing(PathBuf),
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("cannot decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Level soundtrack output.
pub trait AudioSink {
    /// Starts `track` from the beginning, looping at `volume` (0.0..=1.0).
    fn play_looping(&mut self, track: &str, volume: f32) -> Result<(), AudioError>;
    /// Stops and rewinds whatever is playing.
    fn stop(&mut self);
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn play_looping(&mut self, track: &str, volume: f32) -> Result<(), AudioError> {
        (**self).play_looping(track, volume)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Used when no audio device is compiled in or `--mute` is set.
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_looping(&mut self, track: &str, _volume: f32) -> Result<(), AudioError> {
        log::debug!("muted: skipping {}", track);
        Ok(())
    }

    fn stop(&mut self) {}
}

#[cfg(feature = "audio")]
pub use device::RodioAudio;

#[cfg(feature = "audio")]
mod device {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::{AudioError, AudioSink};

    pub struct RodioAudio {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        root: PathBuf,
        sink: Option<Sink>,
    }

    impl RodioAudio {
        pub fn new(root: impl Into<PathBuf>) -> Result<Self, AudioError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Output(e.to_string()))?;
            Ok(RodioAudio {
                _stream: stream,
                handle,
                root: root.into(),
                sink: None,
            })
        }
    }

    impl AudioSink for RodioAudio {
        fn play_looping(&mut self, track: &str, volume: f32) -> Result<(), AudioError> {
            self.stop();

            let path = self.root.join(track);
            let file = File::open(&path).map_err(|_| AudioError::Missing(path.clone()))?;
            let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
                path: path.clone(),
                reason: e.to_string(),
            })?;

            let sink =
                Sink::try_new(&self.handle).map_err(|e| AudioError::Output(e.to_string()))?;
            sink.set_volume(volume);
            sink.append(source.repeat_infinite());
            self.sink = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            // dropping the sink drops the decoder; the next play starts at 0
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}
