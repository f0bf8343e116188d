//! Orphan classification
//!
//! Every orphan lands in exactly one bucket. Orphans needing a preview get a
//! complete transcoder invocation built for them; nothing is run here.

use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use crate::db::orphans::load_all_orphans;
use crate::error::Result;
use crate::models::Orphan;
use m2v_common::Settings;

/// Processing bucket for one orphan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Zero-byte recording; nothing to sample
    Empty,
    /// Preview clip already on disk
    AlreadySampled,
    /// Preview clip must be generated
    NeedsSample,
}

/// Transcoder family, which decides the overwrite flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Ffmpeg,
    Avconv,
}

impl ConverterKind {
    /// Detect from the executable's file name; unknown binaries behave like ffmpeg
    pub fn detect(program: &Path) -> Self {
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name == "avconv" {
            ConverterKind::Avconv
        } else {
            ConverterKind::Ffmpeg
        }
    }

    fn overwrite_flag(self, overwrite: bool) -> Option<&'static str> {
        match (self, overwrite) {
            (_, true) => Some("-y"),
            (ConverterKind::Ffmpeg, false) => Some("-n"),
            (ConverterKind::Avconv, false) => None,
        }
    }
}

/// Preview generation settings
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub samples_dir: PathBuf,
    pub converter: PathBuf,
    pub quality: u32,
    /// Clip length in seconds
    pub duration: u32,
    /// Regenerate clips that already exist
    pub overwrite: bool,
}

impl SampleConfig {
    pub fn from_settings(settings: &Settings, overwrite: bool) -> Self {
        Self {
            samples_dir: settings.video_samples_dir.clone(),
            converter: settings.vidconverter.clone(),
            quality: settings.preview_quality,
            duration: settings.preview_duration,
            overwrite,
        }
    }

    /// Where an orphan's preview clip lives
    pub fn sample_path(&self, orphan: &Orphan) -> PathBuf {
        self.samples_dir.join(orphan.sample_name())
    }
}

/// A fully built transcoder invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Recording the clip is made from
    pub filename: String,
    /// Whether the transcoder was told to replace an existing `output`
    pub overwrite: bool,
}

impl TranscodeCommand {
    /// Build the preview transcode for `orphan`
    pub fn for_orphan(orphan: &Orphan, config: &SampleConfig) -> Self {
        let input = orphan.source_path();
        let output = config.sample_path(orphan);

        let mut args: Vec<String> = vec![
            "-loglevel".into(),
            "error".into(),
            "-ss".into(),
            "0".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-acodec".into(),
            "libvorbis".into(),
            "-vcodec".into(),
            "libtheora".into(),
            "-q:v".into(),
            config.quality.to_string(),
            "-t".into(),
            config.duration.to_string(),
        ];
        if let Some(flag) = ConverterKind::detect(&config.converter).overwrite_flag(config.overwrite) {
            args.push(flag.to_string());
        }
        args.push(output.to_string_lossy().into_owned());

        Self {
            program: config.converter.clone(),
            args,
            input,
            output,
            filename: orphan.filename.clone(),
            overwrite: config.overwrite,
        }
    }
}

/// Outcome of classifying one orphan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Empty,
    AlreadySampled,
    NeedsSample(TranscodeCommand),
}

impl Classification {
    pub fn bucket(&self) -> Bucket {
        match self {
            Classification::Empty => Bucket::Empty,
            Classification::AlreadySampled => Bucket::AlreadySampled,
            Classification::NeedsSample(_) => Bucket::NeedsSample,
        }
    }

    pub fn command(&self) -> Option<&TranscodeCommand> {
        match self {
            Classification::NeedsSample(cmd) => Some(cmd),
            _ => None,
        }
    }
}

/// Bucket one orphan
///
/// Never fails: a sample path that cannot be inspected counts as absent.
pub fn classify(orphan: &Orphan, config: &SampleConfig) -> Classification {
    if orphan.filesize == 0 {
        return Classification::Empty;
    }

    if !config.overwrite && config.sample_path(orphan).exists() {
        return Classification::AlreadySampled;
    }

    Classification::NeedsSample(TranscodeCommand::for_orphan(orphan, config))
}

/// All persisted orphans, partitioned by bucket
#[derive(Debug, Default)]
pub struct ClassifiedOrphans {
    pub empty: Vec<Orphan>,
    pub already_sampled: Vec<Orphan>,
    pub needs_sample: Vec<(Orphan, TranscodeCommand)>,
}

impl ClassifiedOrphans {
    pub fn total(&self) -> usize {
        self.empty.len() + self.already_sampled.len() + self.needs_sample.len()
    }

    /// Commands to run, in orphan order
    pub fn commands(&self) -> Vec<TranscodeCommand> {
        self.needs_sample.iter().map(|(_, cmd)| cmd.clone()).collect()
    }
}

/// Classify every orphan in the store
pub async fn classify_all(pool: &SqlitePool, config: &SampleConfig) -> Result<ClassifiedOrphans> {
    let mut classified = ClassifiedOrphans::default();

    for orphan in load_all_orphans(pool).await? {
        match classify(&orphan, config) {
            Classification::Empty => classified.empty.push(orphan),
            Classification::AlreadySampled => classified.already_sampled.push(orphan),
            Classification::NeedsSample(cmd) => classified.needs_sample.push((orphan, cmd)),
        }
    }

    tracing::info!(
        empty = classified.empty.len(),
        already_sampled = classified.already_sampled.len(),
        needs_sample = classified.needs_sample.len(),
        "Orphans classified"
    );

    Ok(classified)
}
