// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! songweaver - MIDI-corpus-trained song generator.
//!
//! Training songs are reduced to (note, duration) events, split into intro,
//! middle and outro pools, and used to train one recurrent next-step model
//! per section. New songs are sampled section by section, arranged into a
//! verse/chorus form and written as Standard MIDI Files.

pub mod arrangement;
pub mod config;
pub mod corpus;
pub mod encoding;
pub mod error;
pub mod generators;
pub mod midi;
pub mod model;
pub mod music;
pub mod project;

pub use arrangement::{SongCreator, SongStructure};
pub use config::SongweaverConfig;
pub use corpus::{CorpusOptions, SegmentPools, Section};
pub use encoding::{SequenceEncoder, VocabularySpace};
pub use error::{Error, Result};
pub use generators::SeedMode;
pub use midi::RenderOptions;
pub use model::{RecurrentModel, RnnConfig, SequenceModel};
pub use music::Event;
pub use project::ProjectLayout;
