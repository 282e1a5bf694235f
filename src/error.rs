// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for songweaver.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the encoding, generation and rendering pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Pitch spelling not in the pitch-class table, or no valid octave
    #[error("Invalid pitch name: {0}")]
    InvalidPitchName(String),
    /// Duration token that is neither a decimal nor a fraction
    #[error("Invalid duration token: {0}")]
    InvalidDuration(String),
    /// Token absent from the fitted vocabulary
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    /// MIDI file could not be parsed
    #[error("Failed to parse MIDI file {path:?}: {message}")]
    MidiParse { path: PathBuf, message: String },
    /// Not enough material to build windows or seed generation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    /// Stored weights do not fit the model they are loaded into
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    /// Model contract violation
    #[error("Model error: {0}")]
    Model(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
