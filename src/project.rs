// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! On-disk layout of a genre/instrument project.
//!
//! ```text
//! <root>/<genre>/<instrument>/
//!     training_songs/*.mid
//!     parsed_notes/{intro,middle,outro}.json
//!     nn_models/nn_{intro,middle,outro}.json
//!     nn_weights/{intro,middle,outro}.weights.best.json
//!     nn_songs/<name>.mid
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::corpus::Section;
use crate::error::Result;

pub const TRAINING_SONGS_DIR: &str = "training_songs";
pub const PARSED_NOTES_DIR: &str = "parsed_notes";
pub const MODELS_DIR: &str = "nn_models";
pub const WEIGHTS_DIR: &str = "nn_weights";
pub const SONGS_DIR: &str = "nn_songs";

/// Configuration file looked up in the project directory
pub const CONFIG_FILE: &str = "songweaver.yaml";

/// Paths of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    dir: PathBuf,
}

impl ProjectLayout {
    /// Layout for `<root>/<genre>/<instrument>`
    pub fn new<P: AsRef<Path>>(root: P, genre: &str, instrument: &str) -> Self {
        Self::from_dir(root.as_ref().join(genre).join(instrument))
    }

    /// Layout rooted directly at a project directory
    pub fn from_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn training_songs_dir(&self) -> PathBuf {
        self.dir.join(TRAINING_SONGS_DIR)
    }

    pub fn parsed_notes_dir(&self) -> PathBuf {
        self.dir.join(PARSED_NOTES_DIR)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.dir.join(MODELS_DIR)
    }

    pub fn weights_dir(&self) -> PathBuf {
        self.dir.join(WEIGHTS_DIR)
    }

    pub fn songs_dir(&self) -> PathBuf {
        self.dir.join(SONGS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Full model file of a section
    pub fn model_path(&self, section: Section) -> PathBuf {
        self.models_dir().join(format!("nn_{}.json", section))
    }

    /// Checkpointed weights of a section
    pub fn weights_path(&self, section: Section) -> PathBuf {
        self.weights_dir().join(format!("{}.weights.best.json", section))
    }

    /// Output file for a generated song; `.mid` is appended when missing
    pub fn song_path(&self, name: &str) -> PathBuf {
        let lower = name.to_lowercase();
        if lower.ends_with(".mid") || lower.ends_with(".midi") {
            self.songs_dir().join(name)
        } else {
            self.songs_dir().join(format!("{}.mid", name))
        }
    }

    /// Create every output directory
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.parsed_notes_dir(),
            self.models_dir(),
            self.weights_dir(),
            self.songs_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
