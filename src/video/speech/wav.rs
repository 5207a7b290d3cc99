use std::path::Path;

use crate::video::errors::SpeechError;

/// 16-bit mono linear PCM as returned by the speech service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl PcmAudio {
    /// Decode little-endian 16-bit samples. A trailing odd byte is a decode error.
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32) -> Result<Self, SpeechError> {
        if bytes.len() % 2 != 0 {
            return Err(SpeechError::Decode(format!(
                "PCM payload has odd length {}",
                bytes.len()
            )));
        }
        if sample_rate == 0 {
            return Err(SpeechError::Decode("sample rate is zero".to_string()));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn write_wav(&self, path: &Path) -> Result<(), SpeechError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| SpeechError::Io(err.to_string()))?;
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let io_error = |err: hound::Error| SpeechError::Io(format!("{}: {err}", path.display()));

        let mut writer = hound::WavWriter::create(path, spec).map_err(io_error)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(io_error)?;
        }
        writer.finalize().map_err(io_error)
    }
}
