// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for songweaver.
//!
//! A project may carry a `songweaver.yaml` with corpus, model, generation,
//! song and render settings. Every field has a default, so an empty file
//! is a valid configuration.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::arrangement::SongStructure;
use crate::corpus::CorpusOptions;
use crate::encoding::windows::DEFAULT_SEQUENCE_LEN;
use crate::generators::SeedMode;
use crate::midi::RenderOptions;
use crate::model::{FitOptions, RnnConfig};

/// Root configuration of a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SongweaverConfig {
    /// Corpus extraction and segmentation
    #[serde(default)]
    pub corpus: CorpusOptions,
    /// Network shape and training
    #[serde(default)]
    pub model: ModelConfig,
    /// Sampling settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Events per song part
    #[serde(default)]
    pub song: SongStructure,
    /// MIDI output
    #[serde(default)]
    pub render: RenderOptions,
}

impl SongweaverConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        ensure!(model.sequence_len > 0, "model.sequence_len must be at least 1");
        ensure!(model.hidden_size > 0, "model.hidden_size must be at least 1");
        ensure!(
            model.learning_rate.is_finite() && model.learning_rate > 0.0,
            "model.learning_rate must be positive, got {}",
            model.learning_rate
        );
        ensure!(model.batch_size > 0, "model.batch_size must be at least 1");
        ensure!(
            (0.0..1.0).contains(&model.validation_split),
            "model.validation_split must be in [0, 1), got {}",
            model.validation_split
        );

        let render = &self.render;
        ensure!(
            render.tempo.is_finite() && render.tempo > 0.0,
            "render.tempo must be positive, got {}",
            render.tempo
        );
        ensure!(render.ppqn > 0, "render.ppqn must be at least 1");
        ensure!(
            (1..=127).contains(&render.velocity),
            "render.velocity must be 1-127, got {}",
            render.velocity
        );
        if let Some(program) = render.program {
            ensure!(program <= 127, "render.program must be 0-127, got {}", program);
        }
        Ok(())
    }
}

/// Model shape and training settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Events per input window
    #[serde(default = "default_sequence_len")]
    pub sequence_len: usize,
    /// Recurrent units
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fraction of windows held out for validation loss
    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
    /// Seed for initialization and shuffling
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_sequence_len() -> usize {
    DEFAULT_SEQUENCE_LEN
}
fn default_hidden_size() -> usize {
    64
}
fn default_learning_rate() -> f32 {
    0.001
}
fn default_epochs() -> usize {
    100
}
fn default_batch_size() -> usize {
    32
}
fn default_validation_split() -> f64 {
    0.33
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sequence_len: default_sequence_len(),
            hidden_size: default_hidden_size(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            validation_split: default_validation_split(),
            seed: None,
        }
    }
}

impl ModelConfig {
    /// Training options without a checkpoint
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
            checkpoint: None,
        }
    }

    /// Network settings for a vocabulary of `num_features`
    pub fn rnn_config(&self, num_features: usize) -> RnnConfig {
        RnnConfig::new(num_features, self.sequence_len)
            .with_hidden_size(self.hidden_size)
            .with_learning_rate(self.learning_rate)
            .with_seed(self.seed)
    }
}

/// Sampling settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default)]
    pub seed_mode: SeedMode,
    /// Seed for window sampling (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Load and validate a configuration file
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<SongweaverConfig> {
    let config = SongweaverConfig::load(path.as_ref())?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration: {:?}", path.as_ref()))?;
    Ok(config)
}
