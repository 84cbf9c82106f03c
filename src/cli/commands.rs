//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::bundle::ExportBundle;
use crate::codec::{self, Waveform, DEMO_TONES};
use crate::config::EngineConfig;
use crate::dsp::Region;
use crate::engine::{ChannelLayout, Mixer, PcmBuffer, SoundEngine};
use crate::error::{Result, SoundDeckError};
use crate::ingest::{self, ProcessingOptions};
use crate::store::{ClipStore, DirectoryStore, PadColor, SoundMeta, DEFAULT_BANK};

/// Frames rendered per mixer block
const RENDER_BLOCK_FRAMES: usize = 1024;

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// Print the header of a WAV file.
pub fn show_info(path: &Path, config: &EngineConfig) -> Result<()> {
    let bytes = ingest::read_clip_file(path, config)?;
    let info = codec::inspect(&bytes)?;

    println!("File: {}", path.display());
    println!("{:-<40}", "");
    println!("Sample rate: {} Hz", info.sample_rate);
    println!("Channels:    {}", info.channels);
    println!(
        "Format:      {}-bit {}",
        info.bits_per_sample,
        if info.is_float { "float" } else { "PCM" }
    );
    println!("Frames:      {}", info.frames);
    println!("Duration:    {:.3}s", info.duration_secs());

    Ok(())
}

/// Synthesize a tone and write it to `output`.
pub fn tone(frequency: f64, waveform: Waveform, duration: f64, output: &Path) -> Result<()> {
    info!("Synthesizing {} Hz {} for {}s", frequency, waveform, duration);

    let bytes = codec::synthesize_tone(frequency, waveform, duration)?;
    write_output(output, &bytes)?;

    println!("Tone written: {}", output.display());
    Ok(())
}

/// Run the ingest pipeline over one file.
pub fn process(
    input: &Path,
    output: &Path,
    options: ProcessingOptions,
    config: &EngineConfig,
) -> Result<()> {
    info!("Processing {}", input.display());

    let bytes = ingest::read_clip_file(input, config)?;
    let processed = ingest::process_file(&bytes, options, config)?;
    write_output(output, &processed)?;

    println!("Processed: {} -> {}", input.display(), output.display());
    Ok(())
}

/// Process every WAV file under `input`, mirroring the tree into `output`.
///
/// Files that fail are reported and skipped. Returns the number processed.
pub fn batch(
    input: &Path,
    output: &Path,
    options: ProcessingOptions,
    config: &EngineConfig,
) -> Result<usize> {
    info!("Batch processing {}", input.display());

    let mut processed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(input).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_wav(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
        let target = output.join(relative);

        let result = ingest::read_clip_file(entry.path(), config)
            .and_then(|bytes| ingest::process_file(&bytes, options, config))
            .and_then(|bytes| write_output(&target, &bytes));

        match result {
            Ok(()) => {
                debug!("{} -> {}", entry.path().display(), target.display());
                processed += 1;
            }
            Err(e) => {
                warn!("{}: {}", entry.path().display(), e);
                println!("Failed: {} ({})", entry.path().display(), e.friendly_message());
                failed += 1;
            }
        }
    }

    println!("Batch complete: {} processed, {} failed", processed, failed);
    Ok(processed)
}

/// Save the selection `[start, end)` of a clip.
pub fn chop(input: &Path, start: f64, end: f64, output: &Path, config: &EngineConfig) -> Result<()> {
    let bytes = ingest::read_clip_file(input, config)?;
    let buffer = codec::decode(&bytes)?;
    let region = Region::new(start, end, "Selection", 0);

    let chopped = ingest::save_region(&buffer, &region, config)?.ok_or_else(|| {
        SoundDeckError::InvalidBuffer {
            reason: format!(
                "selection {:.3}s-{:.3}s is empty or shorter than {}ms",
                start,
                end,
                ingest::MIN_SELECTION_SECS * 1000.0
            ),
        }
    })?;
    write_output(output, &chopped)?;

    println!("Chop written: {}", output.display());
    Ok(())
}

/// Split a clip at its silences, writing `auto_N.wav` files.
///
/// Returns the number of segments written.
pub fn split(input: &Path, output: &Path, config: &EngineConfig) -> Result<usize> {
    let bytes = ingest::read_clip_file(input, config)?;
    let buffer = codec::decode(&bytes)?;
    let chops = ingest::auto_split(&buffer, 0, config)?;

    if chops.is_empty() {
        println!("No segments found.");
        return Ok(0);
    }

    fs::create_dir_all(output)?;
    for (i, chop) in chops.iter().enumerate() {
        let path = output.join(format!("auto_{}.wav", i + 1));
        fs::write(&path, &chop.bytes)?;
        println!(
            "{}: {:.3}s - {:.3}s -> {}",
            chop.region.label,
            chop.region.start,
            chop.region.end,
            path.display()
        );
    }

    Ok(chops.len())
}

/// Add the demo pads to a library, skipping names already present.
///
/// Returns the number of pads added.
pub fn seed_demo(library_dir: &Path) -> Result<usize> {
    let mut store = DirectoryStore::new(library_dir);
    let mut library = store.load_library()?;
    let mut added = 0;

    for demo in &DEMO_TONES {
        if library
            .sounds
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(demo.name))
        {
            debug!("Demo pad '{}' already present", demo.name);
            continue;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let bytes = demo.synthesize()?;
        store.save(&id, &bytes)?;

        let mut meta = SoundMeta::new(id, demo.name);
        meta.icon = demo.icon.to_string();
        meta.category = demo.category.to_string();
        meta.color = PadColor::from_name(demo.color).unwrap_or_default();
        meta.order = library.next_order(DEFAULT_BANK);
        library.sounds.push(meta);
        added += 1;
    }

    store.save_library(&library)?;
    println!("Added {} demo pads to {}", added, library_dir.display());
    Ok(added)
}

/// Trigger pads together and mix them offline into `output`.
///
/// Each pad plays at its stored volume and loop flag. Rendering stops once
/// every voice has finished or after `max_secs`.
pub fn render(
    library_dir: &Path,
    ids: &[String],
    output: &Path,
    sample_rate: u32,
    max_secs: f64,
    config: &EngineConfig,
) -> Result<()> {
    if sample_rate == 0 {
        return Err(SoundDeckError::Config {
            reason: "render sample rate must be positive".to_string(),
        });
    }

    let store = DirectoryStore::new(library_dir);
    let library = store.load_library()?;
    let layout = ChannelLayout::Stereo;
    let mut engine = SoundEngine::with_config(Mixer::new(sample_rate, layout), config);

    for id in ids {
        if engine.load_from_store(id, &store)?.is_none() {
            return Err(SoundDeckError::ClipNotFound { id: id.clone() });
        }

        let started = match library.find(id) {
            Some(meta) => engine.play(id, meta.gain(), meta.loop_default),
            None => engine.play_default(id),
        };
        if !started {
            warn!("'{}' was not started", id);
        }
    }

    let max_frames = (max_secs.max(0.0) * f64::from(sample_rate)) as usize;
    let channels = layout.num_channels();
    let mut mixed = Vec::new();
    let mut block = vec![0.0; RENDER_BLOCK_FRAMES * channels];
    let mut frames = 0;

    while engine.active_count() > 0 && frames < max_frames {
        let block_frames = RENDER_BLOCK_FRAMES.min(max_frames - frames);
        let out = &mut block[..block_frames * channels];
        engine.render(out);
        mixed.extend_from_slice(out);
        frames += block_frames;
    }
    engine.stop_all();

    let buffer = PcmBuffer::from_interleaved(&mixed, layout, sample_rate)?;
    write_output(output, &codec::encode(&buffer)?)?;

    println!(
        "Rendered {} pads, {:.2}s -> {}",
        ids.len(),
        buffer.duration_secs(),
        output.display()
    );
    Ok(())
}

/// Write every pad of a library to a bundle file.
pub fn export(library_dir: &Path, output: &Path, config: &EngineConfig) -> Result<()> {
    let store = DirectoryStore::new(library_dir);
    let library = store.load_library()?;

    let bundle = ExportBundle::assemble(&library, &store, config.export_version);
    write_output(output, bundle.to_json()?.as_bytes())?;

    println!(
        "Exported {} sounds in {} banks -> {}",
        bundle.sounds.len(),
        bundle.banks.len(),
        output.display()
    );
    Ok(())
}

/// Merge a bundle file into a library.
pub fn import(library_dir: &Path, bundle_path: &Path, replace: bool) -> Result<()> {
    let json = fs::read_to_string(bundle_path)?;
    let bundle = ExportBundle::from_json(&json)?;

    let mut store = DirectoryStore::new(library_dir);
    let mut library = store.load_library()?;
    let report = bundle.import_into(&mut library, &mut store, replace)?;
    store.save_library(&library)?;

    println!(
        "Imported: {} added, {} replaced, {} skipped, {} failed",
        report.added.len(),
        report.replaced.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for name in &report.skipped {
        println!("  skipped existing '{}'", name);
    }
    for name in &report.failed {
        println!("  failed to decode audio for '{}'", name);
    }
    Ok(())
}
