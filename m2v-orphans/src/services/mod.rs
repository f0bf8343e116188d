//! Orphan pipeline services
//!
//! Reconciler → Classifier → Sample Generator, plus the independent
//! Promotion Service.

pub mod classifier;
pub mod file_scanner;
pub mod filename_codec;
pub mod promotion;
pub mod reconciler;
pub mod sample_generator;

pub use classifier::{classify, classify_all, Bucket, Classification, ClassifiedOrphans, SampleConfig, TranscodeCommand};
pub use file_scanner::{FileScanner, ScanError};
pub use filename_codec::RecordingName;
pub use promotion::PromotionService;
pub use reconciler::Reconciler;
pub use sample_generator::SampleOutcome;
