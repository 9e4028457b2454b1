//! Audio decoder using symphonia
//!
//! Decodes a whole file or an in-memory byte buffer to interleaved stereo
//! f32. Mono is duplicated to both channels; sources with more than two
//! channels keep the front pair.

use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decoded stereo audio at the source sample rate
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Whole-track decoder
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode an entire audio file
    pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
        debug!("Decoding file: {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;

        let extension = path.extension().and_then(|e| e.to_str());
        Self::decode_source(Box::new(file), extension)
    }

    /// Decode audio fetched into memory
    ///
    /// `extension` is a format hint (e.g. "mp3"); probing works without it.
    pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
        debug!("Decoding {} bytes from memory", bytes.len());
        Self::decode_source(Box::new(Cursor::new(bytes)), extension)
    }

    fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<DecodedAudio> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Stream reset required, stopping decode");
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    let buf = match sample_buf.as_mut() {
                        Some(buf) if buf.capacity() >= decoded.capacity() * channels => buf,
                        _ => sample_buf.insert(SampleBuffer::new(decoded.capacity() as u64, spec)),
                    };
                    buf.copy_interleaved_ref(decoded);
                    push_stereo(buf.samples(), channels, &mut samples);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decoder failed: {}", e)));
                }
            }
        }

        if samples.is_empty() {
            return Err(Error::Decode("Source contains no audio frames".to_string()));
        }

        debug!(
            "Decoded {} frames at {}Hz",
            samples.len() / 2,
            sample_rate
        );

        Ok(DecodedAudio {
            samples,
            sample_rate,
        })
    }
}

/// Append interleaved `channels`-wide samples as stereo
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            output.reserve(interleaved.len() * 2);
            for &s in interleaved {
                output.push(s);
                output.push(s);
            }
        }
        2 => output.extend_from_slice(interleaved),
        n => {
            for frame in interleaved.chunks_exact(n) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}
