// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event generation from trained sequence models.
//!
//! This module provides the seeding strategies and the decision rule that
//! turns raw model scores into an event; [`sampler`] runs the
//! autoregressive loop.

pub mod sampler;

pub use sampler::{generate, AutoregressiveGenerator};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::EncodedEvent;
use crate::error::{Error, Result};

/// How the initial window is drawn from the training windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Each position comes from an independently chosen window
    #[default]
    ColumnSampled,
    /// One randomly chosen window is used whole
    Contiguous,
}

impl fmt::Display for SeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedMode::ColumnSampled => write!(f, "column_sampled"),
            SeedMode::Contiguous => write!(f, "contiguous"),
        }
    }
}

impl FromStr for SeedMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "column_sampled" | "column" => Ok(SeedMode::ColumnSampled),
            "contiguous" => Ok(SeedMode::Contiguous),
            _ => Err(format!("Unknown seed mode: {}", s)),
        }
    }
}

/// Index of the highest score.
///
/// Ties resolve to the lowest index and NaN never wins. Returns `None` when
/// no score is a number.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the duration and note independently from a raw prediction.
///
/// `scores[..num_duration_tokens]` scores durations and the remainder
/// scores notes.
pub fn select_event(scores: &[f32], num_duration_tokens: usize) -> Result<EncodedEvent> {
    if num_duration_tokens > scores.len() {
        return Err(Error::Model(format!(
            "prediction of width {} has no room for {} duration scores",
            scores.len(),
            num_duration_tokens
        )));
    }

    let (durations, notes) = scores.split_at(num_duration_tokens);
    let duration = argmax(durations)
        .ok_or_else(|| Error::Model("prediction has no usable duration score".to_string()))?;
    let note = argmax(notes)
        .ok_or_else(|| Error::Model("prediction has no usable note score".to_string()))?;

    Ok(EncodedEvent {
        duration,
        note: num_duration_tokens + note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties_and_nan() {
        assert_eq!(argmax(&[0.1, 0.7, 0.3]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.2]), Some(0));
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[0.2, f32::NAN, 0.9]), Some(2));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_select_event_ranges() {
        // Two durations, three notes; the note range has the global max
        let scores = [0.2, 0.4, 0.9, 0.1, 0.3];
        let event = select_event(&scores, 2).unwrap();
        assert_eq!(event, EncodedEvent { duration: 1, note: 2 });

        let scores = [0.9, 0.1, 0.1, 0.1, 0.8];
        let event = select_event(&scores, 2).unwrap();
        assert_eq!(event, EncodedEvent { duration: 0, note: 4 });
    }

    #[test]
    fn test_select_event_errors() {
        assert!(matches!(select_event(&[0.5], 2), Err(Error::Model(_))));
        assert!(matches!(select_event(&[0.5, 0.5], 2), Err(Error::Model(_))));
    }

    #[test]
    fn test_seed_mode_parsing() {
        assert_eq!("column_sampled".parse::<SeedMode>().unwrap(), SeedMode::ColumnSampled);
        assert_eq!("Contiguous".parse::<SeedMode>().unwrap(), SeedMode::Contiguous);
        assert!("random".parse::<SeedMode>().is_err());
        assert_eq!(SeedMode::default().to_string(), "column_sampled");
    }
}
