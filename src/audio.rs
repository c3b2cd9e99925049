use crate::error::AudioError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Named audio announcements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    #[serde(rename = "safe_area")]
    SafeArea,
    #[serde(rename = "danger_150m")]
    Danger150m,
    #[serde(rename = "danger_200m")]
    Danger200m,
    #[serde(rename = "danger_500m")]
    Danger500m,
}

impl Cue {
    /// Asset name handed to the audio capability
    pub fn asset_name(self) -> &'static str {
        match self {
            Cue::SafeArea => "safe_area",
            Cue::Danger150m => "danger_150m",
            Cue::Danger200m => "danger_200m",
            Cue::Danger500m => "danger_500m",
        }
    }

    pub const ALL: [Cue; 4] = [Cue::SafeArea, Cue::Danger150m, Cue::Danger200m, Cue::Danger500m];
}

impl Display for Cue {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.asset_name())
    }
}

/// Platform audio capability
pub trait AudioOutput: Send + Sync {
    fn play_clip(&self, name: &str) -> Result<(), AudioError>;
    fn stop_clip(&self);
}

/// Plays one cue at a time; a new cue interrupts the previous one
pub struct AudioNotifier {
    output: Arc<dyn AudioOutput>,
    current: Mutex<Option<Cue>>,
}

impl AudioNotifier {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            current: Mutex::new(None),
        }
    }

    /// Stop whatever is playing and start `cue`. Failures are logged and
    /// returned; nothing is retried.
    pub fn play(&self, cue: Cue) -> Result<(), AudioError> {
        let mut current = self.lock();
        if current.take().is_some() {
            self.output.stop_clip();
        }

        match self.output.play_clip(cue.asset_name()) {
            Ok(()) => {
                log::info!("[audio] playing {}", cue);
                *current = Some(cue);
                Ok(())
            }
            Err(e) => {
                log::warn!("[audio] cannot play {}: {}", cue, e);
                Err(e)
            }
        }
    }

    /// Halt playback. Returns whether anything was playing.
    pub fn stop(&self) -> bool {
        let mut current = self.lock();
        match current.take() {
            Some(cue) => {
                self.output.stop_clip();
                log::debug!("[audio] stopped {}", cue);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<Cue> {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Cue>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Audio output that resolves cues to files in an asset directory.
///
/// Sound rendering belongs to the platform; this output verifies the asset
/// exists and is non-empty, then logs the playback.
pub struct AssetAudioOutput {
    asset_dir: PathBuf,
    extension: String,
    playing: Mutex<Option<PathBuf>>,
}

impl AssetAudioOutput {
    pub fn new(asset_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            extension: extension.into(),
            playing: Mutex::new(None),
        }
    }

    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.asset_dir.join(format!("{}.{}", name, self.extension))
    }

    /// Cues whose asset file is missing or unusable
    pub fn missing_cues(&self) -> Vec<Cue> {
        Cue::ALL
            .into_iter()
            .filter(|cue| check_asset(&self.asset_path(cue.asset_name())).is_err())
            .collect()
    }

    pub fn now_playing(&self) -> Option<PathBuf> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.playing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioOutput for AssetAudioOutput {
    fn play_clip(&self, name: &str) -> Result<(), AudioError> {
        let path = self.asset_path(name);
        check_asset(&path)?;
        log::info!("[audio] ▶ {}", path.display());
        *self.lock() = Some(path);
        Ok(())
    }

    fn stop_clip(&self) {
        if let Some(path) = self.lock().take() {
            log::debug!("[audio] ■ {}", path.display());
        }
    }
}

fn check_asset(path: &Path) -> Result<(), AudioError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(meta) if meta.is_file() => Err(AudioError::CorruptAsset(format!(
            "{} is empty",
            path.display()
        ))),
        _ => Err(AudioError::MissingAsset(path.display().to_string())),
    }
}
