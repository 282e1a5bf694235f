// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI file I/O.
//!
//! This module provides:
//! - Reading training files into rests, notes and chords
//! - Rendering generated events into a musical stream
//! - Standard MIDI file export

pub mod export;
pub mod reader;
pub mod render;

pub use export::{ExportNote, MidiExporter};
pub use reader::{read_elements, read_file, MusicalElement};
pub use render::{render, render_stream, render_to_bytes, RenderOptions, StreamElement};
