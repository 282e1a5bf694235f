// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sliding-window training sets.

use std::cell::OnceCell;
use std::path::Path;

use tracing::{debug, info};

use super::{EncodedEvent, VocabularySpace};
use crate::corpus::segment::load_pool;
use crate::error::{Error, Result};
use crate::music::Event;

/// Default window length in events
pub const DEFAULT_SEQUENCE_LEN: usize = 16;

/// A run of `sequence_len` consecutive encoded events
pub type Window = Vec<EncodedEvent>;

/// Input windows paired with next-step targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrainingSet {
    pub inputs: Vec<Window>,
    pub targets: Vec<EncodedEvent>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Build next-step prediction windows over a pool.
///
/// Window `i` covers events `[i, i + sequence_len)` and targets event
/// `i + sequence_len`. A pool no longer than the window yields nothing.
pub fn build_windows(
    vocabulary: &VocabularySpace,
    pool: &[Event],
    sequence_len: usize,
) -> Result<TrainingSet> {
    let encoded = pool
        .iter()
        .map(|event| vocabulary.encode(event))
        .collect::<Result<Vec<_>>>()?;

    let count = encoded.len().saturating_sub(sequence_len);
    let mut set = TrainingSet {
        inputs: Vec::with_capacity(count),
        targets: Vec::with_capacity(count),
    };

    for i in 0..count {
        set.inputs.push(encoded[i..i + sequence_len].to_vec());
        set.targets.push(encoded[i + sequence_len]);
    }

    Ok(set)
}

/// Owns a pool, its frozen vocabulary and its training windows
#[derive(Debug)]
pub struct SequenceEncoder {
    pool: Vec<Event>,
    sequence_len: usize,
    vocabulary: VocabularySpace,
    windows: OnceCell<TrainingSet>,
}

impl SequenceEncoder {
    /// Fit an encoder to a pool
    pub fn new(pool: Vec<Event>, sequence_len: usize) -> Result<Self> {
        if sequence_len == 0 {
            return Err(Error::InsufficientData(
                "sequence length must be at least 1".to_string(),
            ));
        }

        let vocabulary = VocabularySpace::fit(&pool);
        debug!(
            events = pool.len(),
            durations = vocabulary.num_duration_tokens(),
            notes = vocabulary.num_note_tokens(),
            "Fitted vocabulary"
        );

        Ok(Self {
            pool,
            sequence_len,
            vocabulary,
            windows: OnceCell::new(),
        })
    }

    /// Fit an encoder to a pool file
    pub fn from_pool_file<P: AsRef<Path>>(path: P, sequence_len: usize) -> Result<Self> {
        Self::new(load_pool(path)?, sequence_len)
    }

    /// Training windows, built on first use and reused afterwards
    pub fn training_set(&self) -> Result<&TrainingSet> {
        if let Some(set) = self.windows.get() {
            return Ok(set);
        }

        let set = build_windows(&self.vocabulary, &self.pool, self.sequence_len)?;
        info!(
            windows = set.len(),
            sequence_len = self.sequence_len,
            features = self.num_features(),
            "Built training windows"
        );
        Ok(self.windows.get_or_init(|| set))
    }

    pub fn pool(&self) -> &[Event] {
        &self.pool
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence_len
    }

    pub fn vocabulary(&self) -> &VocabularySpace {
        &self.vocabulary
    }

    pub fn num_features(&self) -> usize {
        self.vocabulary.num_features()
    }

    pub fn num_duration_tokens(&self) -> usize {
        self.vocabulary.num_duration_tokens()
    }
}
