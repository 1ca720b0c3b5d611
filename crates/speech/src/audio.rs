//! Audio format detection, WAV merging and media storage

use std::io::Cursor;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::SpeechError;

/// Container formats WhatsApp and browsers send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Ogg,
    Mp3,
    Wav,
    Aac,
    Mp4,
    Webm,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::Webm => "audio/webm",
        }
    }
}

/// Detected format plus the file extension to use (with leading dot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    pub format: AudioFormat,
    pub extension: String,
}

impl DetectedFormat {
    fn new(format: AudioFormat, extension: &str) -> Self {
        Self {
            format,
            extension: extension.to_string(),
        }
    }
}

/// Detect an audio format from the content type, then the file extension
///
/// Unknown inputs default to OGG, which is what WhatsApp voice notes use.
pub fn detect_audio_format(content_type: Option<&str>, path: &str) -> DetectedFormat {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    let by_mime = match mime.as_deref() {
        Some("audio/ogg") => Some((AudioFormat::Ogg, ".ogg")),
        Some("audio/opus") => Some((AudioFormat::Ogg, ".opus")),
        Some("audio/mpeg") | Some("audio/mp3") => Some((AudioFormat::Mp3, ".mp3")),
        Some("audio/wav") | Some("audio/wave") | Some("audio/x-wav") => {
            Some((AudioFormat::Wav, ".wav"))
        },
        Some("audio/aac") => Some((AudioFormat::Aac, ".aac")),
        Some("audio/mp4") | Some("audio/x-m4a") => Some((AudioFormat::Mp4, ".m4a")),
        Some("audio/webm") => Some((AudioFormat::Webm, ".webm")),
        _ => None,
    };
    if let Some((format, ext)) = by_mime {
        return DetectedFormat::new(format, ext);
    }

    // Ignore any query string on URLs
    let path_only = path.split(['?', '#']).next().unwrap_or(path);
    let ext = Path::new(path_only)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()));

    match ext.as_deref() {
        Some(".ogg") | Some(".oga") | Some(".opus") => {
            DetectedFormat::new(AudioFormat::Ogg, ext.as_deref().unwrap_or(".ogg"))
        },
        Some(".mp3") => DetectedFormat::new(AudioFormat::Mp3, ".mp3"),
        Some(".wav") => DetectedFormat::new(AudioFormat::Wav, ".wav"),
        Some(".m4a") => DetectedFormat::new(AudioFormat::Mp4, ".m4a"),
        Some(".aac") => DetectedFormat::new(AudioFormat::Aac, ".aac"),
        Some(".webm") => DetectedFormat::new(AudioFormat::Webm, ".webm"),
        _ => {
            tracing::warn!(
                path,
                content_type = content_type.unwrap_or(""),
                "Unknown audio format, defaulting to ogg"
            );
            DetectedFormat::new(AudioFormat::Ogg, ".ogg")
        },
    }
}

/// Concatenate WAV clips into a single WAV
///
/// All clips must share channel count, sample rate and sample format.
pub fn merge_wav(clips: &[Vec<u8>]) -> Result<Vec<u8>, SpeechError> {
    let first = clips
        .first()
        .ok_or_else(|| SpeechError::Audio("No audio clips to merge".to_string()))?;
    if clips.len() == 1 {
        return Ok(first.clone());
    }

    let spec = WavReader::new(Cursor::new(first.as_slice()))?.spec();
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for (index, clip) in clips.iter().enumerate() {
            let mut reader = WavReader::new(Cursor::new(clip.as_slice()))?;
            if !same_layout(&reader.spec(), &spec) {
                return Err(SpeechError::Audio(format!(
                    "Clip {} has format {:?}, expected {:?}",
                    index,
                    reader.spec(),
                    spec
                )));
            }
            copy_samples(&mut reader, &mut writer, &spec)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

fn same_layout(a: &WavSpec, b: &WavSpec) -> bool {
    a.channels == b.channels
        && a.sample_rate == b.sample_rate
        && a.bits_per_sample == b.bits_per_sample
        && a.sample_format == b.sample_format
}

fn copy_samples<R, W>(
    reader: &mut WavReader<R>,
    writer: &mut WavWriter<W>,
    spec: &WavSpec,
) -> Result<(), SpeechError>
where
    R: std::io::Read,
    W: std::io::Write + std::io::Seek,
{
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => {
            for sample in reader.samples::<f32>() {
                writer.write_sample(sample?)?;
            }
        },
        (SampleFormat::Int, bits) if bits <= 16 => {
            for sample in reader.samples::<i16>() {
                writer.write_sample(sample?)?;
            }
        },
        (SampleFormat::Int, _) => {
            for sample in reader.samples::<i32>() {
                writer.write_sample(sample?)?;
            }
        },
    }
    Ok(())
}

/// Where synthesized audio is written and how it is referenced
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    public_base_url: Option<String>,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a clip under a fresh name and return its reference:
    /// `{public_base_url}/media/{file}` when a base URL is configured,
    /// otherwise the local file path
    pub async fn save(&self, bytes: &[u8], extension: &str) -> Result<String, SpeechError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            extension.trim_start_matches('.')
        );
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Saved synthesized audio");

        Ok(match &self.public_base_url {
            Some(base) => format!("{}/media/{}", base, file_name),
            None => path.display().to_string(),
        })
    }
}
