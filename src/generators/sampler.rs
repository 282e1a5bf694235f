// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Autoregressive sampling loop.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use super::{select_event, SeedMode};
use crate::encoding::{EncodedEvent, SequenceEncoder, Window};
use crate::error::{Error, Result};
use crate::model::SequenceModel;
use crate::music::{strip_sign, Event};

/// Generates events by feeding each prediction back into the window
pub struct AutoregressiveGenerator<'a, M: SequenceModel + ?Sized> {
    model: &'a M,
    encoder: &'a SequenceEncoder,
    seed_mode: SeedMode,
}

impl<'a, M: SequenceModel + ?Sized> AutoregressiveGenerator<'a, M> {
    pub fn new(model: &'a M, encoder: &'a SequenceEncoder) -> Self {
        Self {
            model,
            encoder,
            seed_mode: SeedMode::default(),
        }
    }

    pub fn with_seed_mode(mut self, seed_mode: SeedMode) -> Self {
        self.seed_mode = seed_mode;
        self
    }

    /// Draw the initial window from the encoder's training windows
    pub fn seed_window<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Window> {
        let windows = &self.encoder.training_set()?.inputs;
        if windows.is_empty() {
            return Err(Error::InsufficientData(format!(
                "pool of {} events has no windows of {}",
                self.encoder.pool().len(),
                self.encoder.sequence_len()
            )));
        }

        let window = match self.seed_mode {
            SeedMode::ColumnSampled => (0..self.encoder.sequence_len())
                .map(|position| windows[rng.gen_range(0..windows.len())][position])
                .collect(),
            SeedMode::Contiguous => windows[rng.gen_range(0..windows.len())].clone(),
        };
        Ok(window)
    }

    /// Generate exactly `num_steps` events
    pub fn generate<R: Rng + ?Sized>(&self, num_steps: usize, rng: &mut R) -> Result<Vec<Event>> {
        if num_steps == 0 {
            return Ok(Vec::new());
        }

        let mut window: VecDeque<EncodedEvent> = self.seed_window(rng)?.into();
        let vocabulary = self.encoder.vocabulary();
        let num_features = self.encoder.num_features();
        let mut events = Vec::with_capacity(num_steps);

        for _ in 0..num_steps {
            let scores = self.model.predict(window.make_contiguous())?;
            if scores.len() != num_features {
                return Err(Error::Model(format!(
                    "prediction width {} does not match {} features",
                    scores.len(),
                    num_features
                )));
            }

            let next = select_event(&scores, self.encoder.num_duration_tokens())?;
            let note = vocabulary.note_token(next.note)?;
            let duration = strip_sign(vocabulary.duration_token(next.duration)?);
            events.push(Event::new(note, duration));

            window.push_back(next);
            window.pop_front();
        }

        debug!(steps = num_steps, seed_mode = %self.seed_mode, "Generated events");
        Ok(events)
    }
}

/// Generate `num_steps` events from a model and its encoder
pub fn generate<M, R>(
    model: &M,
    encoder: &SequenceEncoder,
    num_steps: usize,
    seed_mode: SeedMode,
    rng: &mut R,
) -> Result<Vec<Event>>
where
    M: SequenceModel + ?Sized,
    R: Rng + ?Sized,
{
    AutoregressiveGenerator::new(model, encoder)
        .with_seed_mode(seed_mode)
        .generate(num_steps, rng)
}
