//! Clip persistence
//!
//! The engine only needs `load`, `save` and `delete` on encoded clips keyed
//! by sound ID. `DirectoryStore` additionally keeps the pad metadata
//! (`library.json`) next to the audio files.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bank every library starts with
pub const DEFAULT_BANK: &str = "Main";

/// Key-value storage for encoded clips
pub trait ClipStore {
    /// Encoded bytes for `id`, or None if nothing is stored
    fn load(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `id`, replacing any previous clip
    fn save(&mut self, id: &str, bytes: &[u8]) -> Result<()>;

    /// Remove the clip for `id`; missing IDs are not an error
    fn delete(&mut self, id: &str) -> Result<()>;
}

// ============================================================================
// Pad metadata
// ============================================================================

/// Pad colour names with their display swatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadColor {
    Red,
    Green,
    #[default]
    Purple,
    Orange,
    Blue,
    Pink,
    Teal,
    Yellow,
}

impl PadColor {
    pub const ALL: [PadColor; 8] = [
        PadColor::Red,
        PadColor::Green,
        PadColor::Purple,
        PadColor::Orange,
        PadColor::Blue,
        PadColor::Pink,
        PadColor::Teal,
        PadColor::Yellow,
    ];

    pub fn swatch(self) -> &'static str {
        match self {
            PadColor::Red => "#ff3d71",
            PadColor::Green => "#00e5a0",
            PadColor::Purple => "#7b61ff",
            PadColor::Orange => "#ffaa00",
            PadColor::Blue => "#3d9eff",
            PadColor::Pink => "#ff61a6",
            PadColor::Teal => "#00d4c8",
            PadColor::Yellow => "#ffe144",
        }
    }

    /// Colour whose swatch is `hex`, falling back to red
    pub fn from_swatch(hex: &str) -> Self {
        PadColor::ALL
            .into_iter()
            .find(|c| c.swatch().eq_ignore_ascii_case(hex))
            .unwrap_or(PadColor::Red)
    }

    /// Colour by name, e.g. "teal"
    pub fn from_name(name: &str) -> Option<Self> {
        PadColor::ALL
            .into_iter()
            .find(|c| format!("{:?}", c).eq_ignore_ascii_case(name))
    }
}

/// Metadata of one pad
///
/// Missing fields deserialize to the defaults of a new pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundMeta {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub color: PadColor,
    /// Percent, 0-100
    pub volume: u8,
    pub bank: String,
    pub order: usize,
    pub loop_default: bool,
}

impl SoundMeta {
    /// Metadata with the defaults used for new pads
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: "🔊".to_string(),
            category: "All".to_string(),
            color: PadColor::default(),
            volume: 80,
            bank: DEFAULT_BANK.to_string(),
            order: 0,
            loop_default: false,
        }
    }

    /// Playback gain in [0, 1]
    pub fn gain(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }
}

impl Default for SoundMeta {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// All banks and pads of a soundboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub banks: Vec<String>,
    pub sounds: Vec<SoundMeta>,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            banks: vec![DEFAULT_BANK.to_string()],
            sounds: Vec::new(),
        }
    }
}

impl Library {
    /// Add `bank` unless it already exists
    pub fn ensure_bank(&mut self, bank: &str) {
        if !self.banks.iter().any(|b| b == bank) {
            self.banks.push(bank.to_string());
        }
    }

    /// Number of pads in `bank`, used as the order of the next pad
    pub fn next_order(&self, bank: &str) -> usize {
        self.sounds.iter().filter(|s| s.bank == bank).count()
    }

    pub fn find(&self, id: &str) -> Option<&SoundMeta> {
        self.sounds.iter().find(|s| s.id == id)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// `ClipStore` backed by a map, for tests and short-lived sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    clips: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl ClipStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.clips.get(id).cloned())
    }

    fn save(&mut self, id: &str, bytes: &[u8]) -> Result<()> {
        self.clips.insert(id.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.clips.remove(id);
        Ok(())
    }
}

// ============================================================================
// Directory store
// ============================================================================

/// `ClipStore` writing `audio/<id>.wav` under a root directory
pub struct DirectoryStore {
    root: PathBuf,
    audio_dir: PathBuf,
}

impl DirectoryStore {
    /// Open (without creating) a store rooted at `root`
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            audio_dir: root.join("audio"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn library_path(&self) -> PathBuf {
        self.root.join("library.json")
    }

    fn clip_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid clip id '{}'", id),
            )
            .into());
        }
        Ok(self.audio_dir.join(format!("{}.wav", id)))
    }

    /// Load the library, or an empty one if none was saved yet
    pub fn load_library(&self) -> Result<Library> {
        let path = self.library_path();
        if !path.exists() {
            return Ok(Library::default());
        }

        let content = fs::read_to_string(&path)?;
        let library: Library = serde_json::from_str(&content)?;
        Ok(library)
    }

    pub fn save_library(&self, library: &Library) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let content = serde_json::to_string_pretty(library)?;
        fs::write(self.library_path(), content)?;
        Ok(())
    }

    /// IDs of all stored clips, sorted
    pub fn clip_ids(&self) -> Result<Vec<String>> {
        if !self.audio_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.audio_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("wav") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ClipStore for DirectoryStore {
    fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.clip_path(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.clip_path(id)?;
        fs::create_dir_all(&self.audio_dir)?;
        fs::write(&path, bytes)?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let path = self.clip_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.load("a").unwrap().is_none());

        store.save("a", b"bytes").unwrap();
        assert_eq!(store.load("a").unwrap().unwrap(), b"bytes");
        assert_eq!(store.len(), 1);

        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_directory_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());

        assert!(store.load("kick").unwrap().is_none());
        store.save("kick", b"RIFF....").unwrap();
        store.save("snare-2", b"RIFF").unwrap();

        assert_eq!(store.load("kick").unwrap().unwrap(), b"RIFF....");
        assert_eq!(store.clip_ids().unwrap(), vec!["kick", "snare-2"]);

        store.delete("kick").unwrap();
        store.delete("kick").unwrap();
        assert_eq!(store.clip_ids().unwrap(), vec!["snare-2"]);
    }

    #[test]
    fn test_directory_store_rejects_path_ids() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());

        assert!(store.save("../escape", b"x").is_err());
        assert!(store.load("").is_err());
    }

    #[test]
    fn test_library_persistence() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        assert_eq!(store.load_library().unwrap(), Library::default());

        let mut library = Library::default();
        library.ensure_bank("Drums");
        library.ensure_bank("Drums");
        library.sounds.push(SoundMeta::new("id-1", "Kick"));
        store.save_library(&library).unwrap();

        let loaded = store.load_library().unwrap();
        assert_eq!(loaded.banks, vec!["Main", "Drums"]);
        assert_eq!(loaded.find("id-1").unwrap().name, "Kick");
        assert_eq!(loaded.next_order(DEFAULT_BANK), 1);
    }

    #[test]
    fn test_sound_meta_json_shape() {
        let meta = SoundMeta::new("id-1", "Kick");
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["loopDefault"], false);
        assert_eq!(json["color"], "purple");
        assert_eq!(json["volume"], 80);
        assert!((meta.gain() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_sound_meta_missing_fields_default() {
        let meta: SoundMeta = serde_json::from_str(r#"{"id":"a","name":"Old"}"#).unwrap();
        assert_eq!(meta.bank, DEFAULT_BANK);
        assert_eq!(meta.volume, 80);
        assert!(!meta.loop_default);
    }

    #[test]
    fn test_pad_color_lookup() {
        assert_eq!(PadColor::from_swatch("#00D4C8"), PadColor::Teal);
        assert_eq!(PadColor::from_swatch("#123456"), PadColor::Red);
        assert_eq!(PadColor::from_name("yellow"), Some(PadColor::Yellow));
        assert_eq!(PadColor::from_name("mauve"), None);
    }
}
