// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Symbolic music representation.
//!
//! This module provides the pitch codec and the note/duration tokens that
//! flow between the corpus, the sequence encoder and the MIDI writer.

pub mod pitch;
pub mod token;

pub use pitch::{decode_pitch, encode_pitch, PitchClass, PitchName, PitchNumber};
pub use token::{parse_duration, strip_sign, Event, NoteToken, QuarterLength, REST_TOKEN};
