//! Track loading
//!
//! Resolves a track locator against the audio base, fetches the bytes
//! (filesystem or HTTP), decodes and resamples to the device rate. Decoding
//! runs on the blocking pool.

use crate::audio::decoder::SimpleDecoder;
use crate::audio::resampler::Resampler;
use crate::audio::types::PcmBuffer;
use crate::catalog::{resolve_locator, AudioBase, AudioSource};
use crate::error::{Error, Result};
use crate::playback::PlayRejection;
use std::time::Duration;
use tracing::{debug, info};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TrackLoader {
    base: AudioBase,
    client: reqwest::Client,
    output_rate: u32,
}

impl TrackLoader {
    pub fn new(base: AudioBase, output_rate: u32) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            base,
            client,
            output_rate,
        })
    }

    /// Fetch, decode and resample one track
    pub async fn load(&self, locator: &str) -> Result<PcmBuffer> {
        let source = resolve_locator(locator, &self.base)?;
        let hint = source.extension();
        let output_rate = self.output_rate;
        debug!("Loading track from {}", source);

        let pcm = match source {
            AudioSource::File(path) => {
                tokio::task::spawn_blocking(move || {
                    let decoded = SimpleDecoder::decode_file(&path)?;
                    to_device_rate(decoded.samples, decoded.sample_rate, output_rate)
                })
                .await
                .map_err(|e| Error::Internal(format!("decode task failed: {}", e)))??
            }
            AudioSource::Url(url) => {
                let bytes = self
                    .client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?
                    .to_vec();
                tokio::task::spawn_blocking(move || {
                    let decoded = SimpleDecoder::decode_bytes(bytes, hint.as_deref())?;
                    to_device_rate(decoded.samples, decoded.sample_rate, output_rate)
                })
                .await
                .map_err(|e| Error::Internal(format!("decode task failed: {}", e)))??
            }
        };

        info!(
            "Loaded '{}' ({:.1}s at {}Hz)",
            locator,
            pcm.duration().as_secs_f64(),
            pcm.sample_rate
        );
        Ok(pcm)
    }
}

fn to_device_rate(samples: Vec<f32>, source_rate: u32, output_rate: u32) -> Result<PcmBuffer> {
    let samples = if source_rate == output_rate {
        samples
    } else {
        Resampler::resample(&samples, source_rate, 2, output_rate)?
    };
    Ok(PcmBuffer::new(samples, output_rate))
}

/// How a load failure surfaces through `play()`
pub fn rejection_for(err: &Error) -> PlayRejection {
    match err {
        Error::InvalidInput(_) | Error::Http(_) | Error::Io(_) => {
            PlayRejection::InvalidLocator(err.to_string())
        }
        _ => PlayRejection::Media(err.to_string()),
    }
}
