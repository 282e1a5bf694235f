// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song assembly.
//!
//! This module provides:
//! - Song form: part lengths and the verse/chorus arrangement
//! - Song creation: three section pipelines composed into one piece

pub mod creator;
pub mod song;

pub use creator::{SectionPipeline, SongCreator};
pub use song::{ComposedSong, SongPart, SongStructure, ARRANGEMENT, GENERATION_ORDER};
