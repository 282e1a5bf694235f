// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequence model contract.
//!
//! A model learns to map a window of 2-hot encoded events to the next
//! event. Its raw output has one score per feature: the first
//! `num_duration_tokens` entries score durations, the rest score notes.

pub mod rnn;

pub use rnn::{RecurrentModel, RnnConfig};

use std::path::{Path, PathBuf};

use crate::encoding::{EncodedEvent, Window};
use crate::error::Result;

/// Options for a training run
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of examples, taken from the end, held out for validation loss
    pub validation_split: f64,
    /// Save weights here whenever the epoch loss improves
    pub checkpoint: Option<PathBuf>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            validation_split: 0.33,
            checkpoint: None,
        }
    }
}

impl FitOptions {
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }
}

/// Loss history of a training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    /// Mean training loss per epoch
    pub losses: Vec<f32>,
    /// Mean validation loss per epoch (empty without a validation set)
    pub validation_losses: Vec<f32>,
    /// Lowest training loss seen
    pub best_loss: Option<f32>,
}

/// Trait for trainable next-step predictors
pub trait SequenceModel {
    /// Train on windows and their next-step targets
    fn fit(&mut self, inputs: &[Window], targets: &[EncodedEvent], options: &FitOptions) -> Result<FitReport>;

    /// Raw feature scores for the event following `window`
    fn predict(&self, window: &[EncodedEvent]) -> Result<Vec<f32>>;

    /// Persist the full model state
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore the full model state
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Persist trainable parameters only
    fn save_weights(&self, path: &Path) -> Result<()>;

    /// Restore trainable parameters saved from a model of identical shape
    fn load_weights(&mut self, path: &Path) -> Result<()>;
}
