//! Export/import bundles
//!
//! A bundle is one JSON document holding every bank and pad, with each
//! pad's encoded clip embedded as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundDeckError};
use crate::store::{ClipStore, Library, SoundMeta, DEFAULT_BANK};

/// MIME type recorded for clips written by this crate
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// One pad inside a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSound {
    #[serde(flatten)]
    pub meta: SoundMeta,
    pub audio_base64: Option<String>,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    WAV_MIME_TYPE.to_string()
}

impl ExportedSound {
    /// Decoded clip bytes, or None if the pad was exported without audio
    pub fn audio_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.audio_base64
            .as_deref()
            .map(|encoded| {
                STANDARD.decode(encoded).map_err(|e| SoundDeckError::Bundle {
                    reason: format!("bad audio payload for '{}': {}", self.meta.name, e),
                })
            })
            .transpose()
    }
}

/// Complete soundboard export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    pub banks: Vec<String>,
    pub sounds: Vec<ExportedSound>,
}

/// Outcome of `ExportBundle::import_into`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// IDs of pads created
    pub added: Vec<String>,
    /// IDs of existing pads whose audio and metadata were replaced
    pub replaced: Vec<String>,
    /// Names of pads skipped because a pad with that name exists
    pub skipped: Vec<String>,
    /// Names of pads whose audio payload could not be decoded
    pub failed: Vec<String>,
}

impl ImportReport {
    /// IDs whose audio changed and must be re-decoded by the engine
    pub fn changed_ids(&self) -> impl Iterator<Item = &str> {
        self.added.iter().chain(&self.replaced).map(|id| id.as_str())
    }
}

impl ExportBundle {
    /// Collect every pad of `library` with its stored clip
    ///
    /// Pads whose clip is missing or unreadable are exported without audio.
    pub fn assemble<S: ClipStore + ?Sized>(library: &Library, store: &S, version: u32) -> Self {
        let sounds = library
            .sounds
            .iter()
            .map(|meta| {
                let audio = match store.load(&meta.id) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Exporting '{}' without audio: {}", meta.name, e);
                        None
                    }
                };
                ExportedSound {
                    meta: meta.clone(),
                    audio_base64: audio.map(|bytes| STANDARD.encode(bytes)),
                    mime_type: WAV_MIME_TYPE.to_string(),
                }
            })
            .collect();

        Self {
            version,
            export_date: Utc::now(),
            banks: library.banks.clone(),
            sounds,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a bundle, rejecting bundles with no pads
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: ExportBundle =
            serde_json::from_str(json).map_err(|e| SoundDeckError::Bundle {
                reason: e.to_string(),
            })?;
        if bundle.sounds.is_empty() {
            return Err(SoundDeckError::Bundle {
                reason: "no sounds in file".to_string(),
            });
        }
        Ok(bundle)
    }

    /// Merge this bundle into a library and its clip store
    ///
    /// Banks are added if missing and pads without audio are ignored. A pad
    /// whose name matches an existing pad (case-insensitively) is skipped,
    /// or, with `replace`, overwrites that pad's audio and display fields.
    /// Every other pad gets a fresh ID.
    pub fn import_into<S: ClipStore + ?Sized>(
        &self,
        library: &mut Library,
        store: &mut S,
        replace: bool,
    ) -> Result<ImportReport> {
        for bank in &self.banks {
            library.ensure_bank(bank);
        }

        let mut report = ImportReport::default();
        for sound in &self.sounds {
            let bytes = match sound.audio_bytes() {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping '{}': {}", sound.meta.name, e);
                    report.failed.push(sound.meta.name.clone());
                    continue;
                }
            };

            let name = sound.meta.name.to_lowercase();
            let existing = library
                .sounds
                .iter()
                .position(|s| s.name.to_lowercase() == name);

            match existing {
                Some(index) if replace => {
                    let target = &mut library.sounds[index];
                    store.save(&target.id, &bytes)?;
                    target.icon = sound.meta.icon.clone();
                    target.category = sound.meta.category.clone();
                    target.color = sound.meta.color;
                    target.volume = imported_volume(sound.meta.volume);
                    target.bank = non_empty_or(&sound.meta.bank, DEFAULT_BANK);
                    report.replaced.push(target.id.clone());
                }
                Some(_) => report.skipped.push(sound.meta.name.clone()),
                None => {
                    let id = uuid::Uuid::new_v4().to_string();
                    let bank = non_empty_or(&sound.meta.bank, DEFAULT_BANK);
                    let meta = SoundMeta {
                        id: id.clone(),
                        name: sound.meta.name.clone(),
                        icon: non_empty_or(&sound.meta.icon, "🔊"),
                        category: non_empty_or(&sound.meta.category, "All"),
                        color: sound.meta.color,
                        volume: imported_volume(sound.meta.volume),
                        order: library.sounds.len(),
                        bank,
                        loop_default: sound.meta.loop_default,
                    };
                    store.save(&id, &bytes)?;
                    library.sounds.push(meta);
                    report.added.push(id);
                }
            }
        }

        info!(
            "Imported bundle: {} added, {} replaced, {} skipped, {} failed",
            report.added.len(),
            report.replaced.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

/// A stored volume of 0 is treated as unset
fn imported_volume(volume: u8) -> u8 {
    if volume == 0 {
        80
    } else {
        volume.min(100)
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
