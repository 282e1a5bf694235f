// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Multi-label feature encoding of events.
//!
//! A [`VocabularySpace`] is fitted once from a pool and then frozen. Duration
//! tokens occupy feature positions `[0, D)` and note tokens `[D, D + N)`, so
//! every event is a 2-hot vector: one duration bit, one note bit.

pub mod windows;

pub use windows::{build_windows, SequenceEncoder, TrainingSet, Window};

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::music::Event;

/// An event as a pair of feature indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedEvent {
    /// Feature index of the duration token, in `[0, D)`
    pub duration: usize,
    /// Feature index of the note token, in `[D, D + N)`
    pub note: usize,
}

impl EncodedEvent {
    /// Dense 2-hot vector of the given width
    pub fn to_dense(&self, num_features: usize) -> Vec<f32> {
        let mut dense = vec![0.0; num_features];
        dense[self.duration] = 1.0;
        dense[self.note] = 1.0;
        dense
    }
}

/// Frozen token vocabulary of one pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularySpace {
    durations: Vec<String>,
    notes: Vec<String>,
    duration_index: HashMap<String, usize>,
    note_index: HashMap<String, usize>,
}

impl VocabularySpace {
    /// Fit the vocabulary from every token appearing in a pool
    pub fn fit(pool: &[Event]) -> Self {
        let durations: BTreeSet<&str> = pool.iter().map(|e| e.duration.as_str()).collect();
        let notes: BTreeSet<&str> = pool.iter().map(|e| e.note.as_str()).collect();
        Self::from_tokens(
            durations.into_iter().map(String::from).collect(),
            notes.into_iter().map(String::from).collect(),
        )
    }

    fn from_tokens(durations: Vec<String>, notes: Vec<String>) -> Self {
        let duration_index = durations
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        let offset = durations.len();
        let note_index = notes
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), offset + i))
            .collect();

        Self {
            durations,
            notes,
            duration_index,
            note_index,
        }
    }

    /// Width of the feature vector
    pub fn num_features(&self) -> usize {
        self.durations.len() + self.notes.len()
    }

    /// Number of leading duration positions
    pub fn num_duration_tokens(&self) -> usize {
        self.durations.len()
    }

    pub fn num_note_tokens(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_features() == 0
    }

    /// Encode an event; tokens outside the vocabulary are an error
    pub fn encode(&self, event: &Event) -> Result<EncodedEvent> {
        let duration = *self
            .duration_index
            .get(&event.duration)
            .ok_or_else(|| Error::UnknownToken(event.duration.clone()))?;
        let note = *self
            .note_index
            .get(&event.note)
            .ok_or_else(|| Error::UnknownToken(event.note.clone()))?;
        Ok(EncodedEvent { duration, note })
    }

    /// Dense 2-hot encoding of an event
    pub fn encode_dense(&self, event: &Event) -> Result<Vec<f32>> {
        Ok(self.encode(event)?.to_dense(self.num_features()))
    }

    /// Decode an encoded event back to its tokens
    pub fn decode(&self, encoded: &EncodedEvent) -> Result<Event> {
        Ok(Event::new(
            self.note_token(encoded.note)?,
            self.duration_token(encoded.duration)?,
        ))
    }

    /// Duration token at a feature index
    pub fn duration_token(&self, index: usize) -> Result<&str> {
        self.durations
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownToken(format!("duration feature {}", index)))
    }

    /// Note token at a feature index
    pub fn note_token(&self, index: usize) -> Result<&str> {
        index
            .checked_sub(self.durations.len())
            .and_then(|i| self.notes.get(i))
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownToken(format!("note feature {}", index)))
    }
}
