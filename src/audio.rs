use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::Error;

/// Looping soundtrack playback. The file is decoded to interleaved 16-bit
/// PCM in one shot at startup; playback then loops until drop.
pub struct AudioPlayer {
    // Dropping the stream silences the sink, so it rides along.
    _stream: OutputStream,
    sink: Sink,
}

impl AudioPlayer {
    pub fn play_looping(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("decoding soundtrack {}", path.display());

        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| Error::Initialization(format!("audio output unavailable: {e}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| Error::Initialization(format!("audio sink creation failed: {e}")))?;

        let file = File::open(path).map_err(|e| Error::AssetLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| Error::AssetLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.convert_samples().collect();
        if samples.is_empty() {
            return Err(Error::AssetLoad {
                path: path.to_path_buf(),
                detail: "decoded to zero samples".into(),
            });
        }

        log::info!(
            "soundtrack: {} samples, {channels} channel(s) at {sample_rate} Hz",
            samples.len()
        );

        sink.append(SamplesBuffer::new(channels, sample_rate, samples).repeat_infinite());
        sink.play();

        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }
}
