//! Writing run results and phase-one progress to disk

pub mod checkpoint;
mod json_saver;

pub use checkpoint::{clear_checkpoint, load_checkpoint, save_checkpoint};
pub use json_saver::{ARTIFACT_MODE, persist_dataset};
