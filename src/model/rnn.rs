// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recurrent network implementation of [`SequenceModel`].
//!
//! A single tanh recurrent layer reads the window one event at a time; its
//! final hidden state feeds a sigmoid output layer with one unit per
//! feature. Training minimizes binary cross-entropy against the 2-hot target
//! with backpropagation through the whole window and Adam updates.
//!
//! Since every input is 2-hot, the input projection of an event is the sum
//! of two columns of the input weights; dense input vectors are never built.

use std::fs;
use std::path::Path;

use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{FitOptions, FitReport, SequenceModel};
use crate::encoding::{EncodedEvent, Window};
use crate::error::{Error, Result};

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-8;

/// Per-element gradient clip
const GRADIENT_CLIP: f32 = 5.0;

/// Probabilities are clamped away from 0 and 1 inside the loss
const PROBABILITY_FLOOR: f32 = 1e-7;

/// Architecture and optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnConfig {
    /// Width of the 2-hot input and of the output
    pub num_features: usize,
    /// Events per input window
    pub sequence_len: usize,
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Seed for weight initialization and shuffling (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_hidden_size() -> usize {
    64
}
fn default_learning_rate() -> f32 {
    0.001
}

impl RnnConfig {
    pub fn new(num_features: usize, sequence_len: usize) -> Self {
        Self {
            num_features,
            sequence_len,
            hidden_size: default_hidden_size(),
            learning_rate: default_learning_rate(),
            seed: None,
        }
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size.max(1);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Trainable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RnnParams {
    /// Input to hidden (hidden x features)
    w_xh: Array2<f32>,
    /// Hidden to hidden (hidden x hidden)
    w_hh: Array2<f32>,
    b_h: Array1<f32>,
    /// Hidden to output (features x hidden)
    w_hy: Array2<f32>,
    b_y: Array1<f32>,
}

impl RnnParams {
    fn random<R: Rng + ?Sized>(features: usize, hidden: usize, rng: &mut R) -> Self {
        let mut uniform = |rows: usize, cols: usize| {
            let limit = (6.0 / (rows + cols) as f32).sqrt();
            Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..=limit))
        };
        Self {
            w_xh: uniform(hidden, features),
            w_hh: uniform(hidden, hidden),
            b_h: Array1::zeros(hidden),
            w_hy: uniform(features, hidden),
            b_y: Array1::zeros(features),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w_xh: Array2::zeros(self.w_xh.raw_dim()),
            w_hh: Array2::zeros(self.w_hh.raw_dim()),
            b_h: Array1::zeros(self.b_h.raw_dim()),
            w_hy: Array2::zeros(self.w_hy.raw_dim()),
            b_y: Array1::zeros(self.b_y.raw_dim()),
        }
    }

    fn map_inplace(&mut self, f: impl Fn(f32) -> f32) {
        self.w_xh.mapv_inplace(&f);
        self.w_hh.mapv_inplace(&f);
        self.b_h.mapv_inplace(&f);
        self.w_hy.mapv_inplace(&f);
        self.b_y.mapv_inplace(&f);
    }

    fn shapes(&self) -> Vec<Vec<usize>> {
        vec![
            self.w_xh.shape().to_vec(),
            self.w_hh.shape().to_vec(),
            self.b_h.shape().to_vec(),
            self.w_hy.shape().to_vec(),
            self.b_y.shape().to_vec(),
        ]
    }

    fn describe(&self) -> String {
        format!("{} features, {} hidden units", self.b_y.len(), self.b_h.len())
    }
}

/// Adam moment estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AdamState {
    m: RnnParams,
    v: RnnParams,
    step: u64,
}

fn adam_update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    step_size: f32,
) {
    Zip::from(param).and(grad).and(m).and(v).for_each(|p, &g, m, v| {
        *m = BETA1 * *m + (1.0 - BETA1) * g;
        *v = BETA2 * *v + (1.0 - BETA2) * g * g;
        *p -= step_size * *m / (v.sqrt() + EPSILON);
    });
}

/// On-disk form of a full model
#[derive(Serialize, Deserialize)]
struct ModelFile {
    config: RnnConfig,
    params: RnnParams,
    adam: AdamState,
}

/// Hidden states h_0..h_T and the output probabilities of one window
struct ForwardPass {
    hidden: Vec<Array1<f32>>,
    output: Array1<f32>,
}

/// Single-layer recurrent next-step predictor
#[derive(Debug, Clone)]
pub struct RecurrentModel {
    config: RnnConfig,
    params: RnnParams,
    adam: AdamState,
}

impl RecurrentModel {
    /// Create a model with freshly initialized weights
    pub fn new(config: RnnConfig) -> Self {
        let mut rng = config.rng(0);
        let params = RnnParams::random(config.num_features, config.hidden_size, &mut rng);
        let adam = AdamState {
            m: params.zeros_like(),
            v: params.zeros_like(),
            step: 0,
        };
        Self { config, params, adam }
    }

    pub fn config(&self) -> &RnnConfig {
        &self.config
    }

    fn check_event(&self, event: &EncodedEvent) -> Result<()> {
        let features = self.config.num_features;
        if event.duration >= features || event.note >= features {
            return Err(Error::Model(format!(
                "encoded event {:?} outside {} features",
                event, features
            )));
        }
        Ok(())
    }

    fn check_window(&self, window: &[EncodedEvent]) -> Result<()> {
        if window.len() != self.config.sequence_len {
            return Err(Error::Model(format!(
                "expected a window of {} events, got {}",
                self.config.sequence_len,
                window.len()
            )));
        }
        window.iter().try_for_each(|event| self.check_event(event))
    }

    fn forward(&self, window: &[EncodedEvent]) -> ForwardPass {
        let mut hidden = Vec::with_capacity(window.len() + 1);
        hidden.push(Array1::zeros(self.config.hidden_size));

        for event in window {
            let previous = &hidden[hidden.len() - 1];
            let mut state = self.params.w_hh.dot(previous) + &self.params.b_h;
            state += &self.params.w_xh.column(event.duration);
            state += &self.params.w_xh.column(event.note);
            state.mapv_inplace(f32::tanh);
            hidden.push(state);
        }

        let last = &hidden[hidden.len() - 1];
        let mut output = self.params.w_hy.dot(last) + &self.params.b_y;
        output.mapv_inplace(sigmoid);

        ForwardPass { hidden, output }
    }

    /// Accumulate gradients for one example, returning its loss
    fn backward(
        &self,
        window: &[EncodedEvent],
        pass: &ForwardPass,
        target: &EncodedEvent,
        grads: &mut RnnParams,
    ) -> f32 {
        let target = two_hot(target, self.config.num_features);
        let loss = binary_cross_entropy(&pass.output, &target);

        // Sigmoid + cross-entropy
        let d_output = &pass.output - &target;
        let last = &pass.hidden[window.len()];
        grads.w_hy += &outer(&d_output, last);
        grads.b_y += &d_output;

        let mut d_hidden = self.params.w_hy.t().dot(&d_output);
        for t in (0..window.len()).rev() {
            let state = &pass.hidden[t + 1];
            let previous = &pass.hidden[t];
            let d_state = &d_hidden * &state.mapv(|h| 1.0 - h * h);

            let event = window[t];
            let mut column = grads.w_xh.column_mut(event.duration);
            column += &d_state;
            let mut column = grads.w_xh.column_mut(event.note);
            column += &d_state;

            grads.w_hh += &outer(&d_state, previous);
            grads.b_h += &d_state;
            d_hidden = self.params.w_hh.t().dot(&d_state);
        }

        loss
    }

    fn apply_gradients(&mut self, grads: &RnnParams) {
        self.adam.step += 1;
        let step = self.adam.step as i32;
        let step_size = self.config.learning_rate * (1.0 - BETA2.powi(step)).sqrt()
            / (1.0 - BETA1.powi(step));

        let (p, m, v) = (&mut self.params, &mut self.adam.m, &mut self.adam.v);
        adam_update(&mut p.w_xh, &grads.w_xh, &mut m.w_xh, &mut v.w_xh, step_size);
        adam_update(&mut p.w_hh, &grads.w_hh, &mut m.w_hh, &mut v.w_hh, step_size);
        adam_update(&mut p.b_h, &grads.b_h, &mut m.b_h, &mut v.b_h, step_size);
        adam_update(&mut p.w_hy, &grads.w_hy, &mut m.w_hy, &mut v.w_hy, step_size);
        adam_update(&mut p.b_y, &grads.b_y, &mut m.b_y, &mut v.b_y, step_size);
    }

    /// Mean loss over a set of examples
    fn evaluate(&self, inputs: &[Window], targets: &[EncodedEvent]) -> f32 {
        if inputs.is_empty() {
            return 0.0;
        }
        let total: f32 = inputs
            .iter()
            .zip(targets)
            .map(|(window, target)| {
                let pass = self.forward(window);
                binary_cross_entropy(&pass.output, &two_hot(target, self.config.num_features))
            })
            .sum();
        total / inputs.len() as f32
    }
}

impl SequenceModel for RecurrentModel {
    fn fit(&mut self, inputs: &[Window], targets: &[EncodedEvent], options: &FitOptions) -> Result<FitReport> {
        if inputs.len() != targets.len() {
            return Err(Error::Model(format!(
                "{} input windows but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(Error::InsufficientData("no training windows".to_string()));
        }
        for (window, target) in inputs.iter().zip(targets) {
            self.check_window(window)?;
            self.check_event(target)?;
        }

        // Validation examples come from the tail, before shuffling
        let holdout = options.validation_split.clamp(0.0, 0.9);
        let train_len = ((inputs.len() as f64 * (1.0 - holdout)).floor() as usize).clamp(1, inputs.len());
        let (validation_inputs, validation_targets) = (&inputs[train_len..], &targets[train_len..]);

        let batch_size = options.batch_size.max(1);
        let mut indices: Vec<usize> = (0..train_len).collect();
        let mut rng = self.config.rng(1 + self.adam.step);
        let mut report = FitReport::default();

        for epoch in 0..options.epochs {
            indices.shuffle(&mut rng);
            let mut total = 0.0f32;

            for batch in indices.chunks(batch_size) {
                let mut grads = self.params.zeros_like();
                for &i in batch {
                    let pass = self.forward(&inputs[i]);
                    total += self.backward(&inputs[i], &pass, &targets[i], &mut grads);
                }
                let scale = 1.0 / batch.len() as f32;
                grads.map_inplace(|g| (g * scale).clamp(-GRADIENT_CLIP, GRADIENT_CLIP));
                self.apply_gradients(&grads);
            }

            let loss = total / train_len as f32;
            report.losses.push(loss);

            if !validation_inputs.is_empty() {
                let validation_loss = self.evaluate(validation_inputs, validation_targets);
                report.validation_losses.push(validation_loss);
                debug!(epoch = epoch + 1, loss, validation_loss, "Epoch complete");
            } else {
                debug!(epoch = epoch + 1, loss, "Epoch complete");
            }

            let improved = report.best_loss.map_or(true, |best| loss < best);
            if improved {
                if let Some(path) = &options.checkpoint {
                    info!(
                        epoch = epoch + 1,
                        loss,
                        path = %path.display(),
                        "Loss improved, saving weights"
                    );
                    self.save_weights(path)?;
                }
                report.best_loss = Some(loss);
            }
        }

        Ok(report)
    }

    fn predict(&self, window: &[EncodedEvent]) -> Result<Vec<f32>> {
        self.check_window(window)?;
        Ok(self.forward(window).output.to_vec())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = ModelFile {
            config: self.config.clone(),
            params: self.params.clone(),
            adam: self.adam.clone(),
        };
        write_json(path, &file)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file: ModelFile = read_json(path)?;
        if file.config.num_features != self.config.num_features
            || file.config.sequence_len != self.config.sequence_len
        {
            return Err(Error::ShapeMismatch {
                expected: format!(
                    "{} features, windows of {}",
                    self.config.num_features, self.config.sequence_len
                ),
                found: format!(
                    "{} features, windows of {}",
                    file.config.num_features, file.config.sequence_len
                ),
            });
        }

        self.config = file.config;
        self.params = file.params;
        self.adam = file.adam;
        info!(path = %path.display(), "Loaded model");
        Ok(())
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        write_json(path, &self.params)
    }

    fn load_weights(&mut self, path: &Path) -> Result<()> {
        let params: RnnParams = read_json(path)?;
        if params.shapes() != self.params.shapes() {
            return Err(Error::ShapeMismatch {
                expected: self.params.describe(),
                found: params.describe(),
            });
        }

        self.params = params;
        info!(path = %path.display(), "Loaded weights");
        Ok(())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn two_hot(event: &EncodedEvent, num_features: usize) -> Array1<f32> {
    let mut target = Array1::zeros(num_features);
    target[event.duration] = 1.0;
    target[event.note] = 1.0;
    target
}

fn binary_cross_entropy(output: &Array1<f32>, target: &Array1<f32>) -> f32 {
    output
        .iter()
        .zip(target.iter())
        .map(|(&y, &t)| {
            let y = y.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
            -(t * y.ln() + (1.0 - t) * (1.0 - y).ln())
        })
        .sum()
}

fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    let column = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    column.dot(&row)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_vec(value)?)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
