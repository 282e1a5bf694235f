// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song creation from three section pipelines.

use std::path::PathBuf;

use rand::Rng;
use tracing::{info, warn};

use super::song::{ComposedSong, SongStructure, GENERATION_ORDER};
use crate::corpus::{build_pools, load_corpus, CorpusOptions, SegmentPools, Section};
use crate::encoding::SequenceEncoder;
use crate::error::{Error, Result};
use crate::generators::{generate, SeedMode};
use crate::midi::{render, RenderOptions};
use crate::model::{FitOptions, FitReport, SequenceModel};
use crate::music::Event;
use crate::project::ProjectLayout;

/// Encoder and model of one section
#[derive(Debug)]
pub struct SectionPipeline<M> {
    pub section: Section,
    pub encoder: SequenceEncoder,
    pub model: M,
}

impl<M: SequenceModel> SectionPipeline<M> {
    /// Train the model on the encoder's windows
    pub fn train(&mut self, options: &FitOptions) -> Result<FitReport> {
        let set = self.encoder.training_set()?;
        if set.is_empty() {
            return Err(Error::InsufficientData(format!(
                "{} pool of {} events is too short for windows of {}",
                self.section,
                self.encoder.pool().len(),
                self.encoder.sequence_len()
            )));
        }

        info!(section = %self.section, windows = set.len(), epochs = options.epochs, "Training");
        self.model.fit(&set.inputs, &set.targets, options)
    }

    /// Generate events from this section's model
    pub fn generate<R: Rng + ?Sized>(&self, num_steps: usize, seed_mode: SeedMode, rng: &mut R) -> Result<Vec<Event>> {
        generate(&self.model, &self.encoder, num_steps, seed_mode, rng)
    }
}

/// Builds songs from intro, middle and outro pipelines
#[derive(Debug)]
pub struct SongCreator<M> {
    layout: ProjectLayout,
    intro: SectionPipeline<M>,
    middle: SectionPipeline<M>,
    outro: SectionPipeline<M>,
}

impl<M: SequenceModel> SongCreator<M> {
    /// Read the project's training songs into pools and save them
    pub fn parse(layout: &ProjectLayout, options: &CorpusOptions) -> Result<SegmentPools> {
        let corpus = load_corpus(layout.training_songs_dir(), options)?;
        if corpus.is_empty() {
            warn!(dir = %layout.training_songs_dir().display(), "No training songs found");
        }

        let pools = build_pools(&corpus, options.intro_split, options.outro_split);
        pools.save(layout.parsed_notes_dir())?;
        Ok(pools)
    }

    /// Build pipelines from pools; `factory` creates a model for each encoder
    pub fn from_pools<F>(layout: ProjectLayout, pools: SegmentPools, sequence_len: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut(Section, &SequenceEncoder) -> M,
    {
        let mut pipeline = |section: Section, pool: Vec<Event>| -> Result<SectionPipeline<M>> {
            let encoder = SequenceEncoder::new(pool, sequence_len)?;
            let model = factory(section, &encoder);
            info!(
                section = %section,
                events = encoder.pool().len(),
                features = encoder.num_features(),
                "Prepared section"
            );
            Ok(SectionPipeline { section, encoder, model })
        };

        let SegmentPools { intro, middle, outro } = pools;
        Ok(Self {
            intro: pipeline(Section::Intro, intro)?,
            middle: pipeline(Section::Middle, middle)?,
            outro: pipeline(Section::Outro, outro)?,
            layout,
        })
    }

    /// Build pipelines from previously saved pools
    pub fn open<F>(layout: ProjectLayout, sequence_len: usize, factory: F) -> Result<Self>
    where
        F: FnMut(Section, &SequenceEncoder) -> M,
    {
        let pools = SegmentPools::load(layout.parsed_notes_dir())?;
        Self::from_pools(layout, pools, sequence_len, factory)
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn pipeline(&self, section: Section) -> &SectionPipeline<M> {
        match section {
            Section::Intro => &self.intro,
            Section::Middle => &self.middle,
            Section::Outro => &self.outro,
        }
    }

    pub fn pipeline_mut(&mut self, section: Section) -> &mut SectionPipeline<M> {
        match section {
            Section::Intro => &mut self.intro,
            Section::Middle => &mut self.middle,
            Section::Outro => &mut self.outro,
        }
    }

    /// Train all three models, checkpointing weights when `save_weights` is set
    pub fn train(&mut self, options: &FitOptions, save_weights: bool) -> Result<Vec<FitReport>> {
        let mut reports = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let mut options = options.clone();
            options.checkpoint = save_weights.then(|| self.layout.weights_path(section));
            let report = self.pipeline_mut(section).train(&options)?;
            if let Some(best) = report.best_loss {
                info!(section = %section, best_loss = best, "Training complete");
            }
            reports.push(report);
        }
        Ok(reports)
    }

    /// Save full models to `nn_models/`
    pub fn save_models(&self) -> Result<()> {
        for section in Section::ALL {
            let path = self.layout.model_path(section);
            self.pipeline(section).model.save(&path)?;
            info!(section = %section, path = %path.display(), "Saved model");
        }
        Ok(())
    }

    /// Restore full models from `nn_models/`
    pub fn load_models(&mut self) -> Result<()> {
        for section in Section::ALL {
            let path = self.layout.model_path(section);
            self.pipeline_mut(section).model.load(&path)?;
        }
        Ok(())
    }

    /// Restore checkpointed weights from `nn_weights/`
    pub fn load_weights(&mut self) -> Result<()> {
        for section in Section::ALL {
            let path = self.layout.weights_path(section);
            self.pipeline_mut(section).model.load_weights(&path)?;
        }
        Ok(())
    }

    /// Generate every part of a song
    pub fn compose<R: Rng + ?Sized>(
        &self,
        structure: &SongStructure,
        seed_mode: SeedMode,
        rng: &mut R,
    ) -> Result<ComposedSong> {
        let mut song = ComposedSong::default();
        for part in GENERATION_ORDER {
            let steps = structure.length(part);
            info!(part = %part, section = %part.section(), steps, "Generating");
            let events = self.pipeline(part.section()).generate(steps, seed_mode, rng)?;
            song.set_part(part, events);
        }
        Ok(song)
    }

    /// Compose a song and render it to `nn_songs/<name>.mid`
    pub fn create_song<R: Rng + ?Sized>(
        &self,
        name: &str,
        structure: &SongStructure,
        seed_mode: SeedMode,
        options: &RenderOptions,
        rng: &mut R,
    ) -> Result<PathBuf> {
        let events = self.compose(structure, seed_mode, rng)?.arrange();
        let path = self.layout.song_path(name);
        render(&events, &path, options)?;
        info!(song = name, events = events.len(), path = %path.display(), "Created song");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::encoding::{EncodedEvent, Window};

    /// Always scores the first duration and first note highest
    #[derive(Debug, Default)]
    struct MockModel {
        num_features: usize,
        fitted: bool,
        loaded: Vec<PathBuf>,
    }

    impl SequenceModel for MockModel {
        fn fit(&mut self, inputs: &[Window], _: &[EncodedEvent], options: &FitOptions) -> Result<FitReport> {
            self.fitted = true;
            if let Some(path) = &options.checkpoint {
                self.save_weights(path)?;
            }
            Ok(FitReport {
                losses: vec![inputs.len() as f32],
                validation_losses: Vec::new(),
                best_loss: Some(inputs.len() as f32),
            })
        }

        fn predict(&self, window: &[EncodedEvent]) -> Result<Vec<f32>> {
            let first = window[0];
            let mut scores = vec![0.0; self.num_features];
            scores[first.duration] = 1.0;
            scores[first.note] = 1.0;
            Ok(scores)
        }

        fn save(&self, path: &Path) -> Result<()> {
            std::fs::create_dir_all(path.parent().unwrap())?;
            std::fs::write(path, "{}")?;
            Ok(())
        }

        fn load(&mut self, path: &Path) -> Result<()> {
            std::fs::read(path)?;
            self.loaded.push(path.to_path_buf());
            Ok(())
        }

        fn save_weights(&self, path: &Path) -> Result<()> {
            self.save(path)
        }

        fn load_weights(&mut self, path: &Path) -> Result<()> {
            self.load(path)
        }
    }

    fn pools() -> SegmentPools {
        let pool = |base: usize| -> Vec<Event> {
            (0..40)
                .map(|i| Event::new((base + i % 6).to_string(), if i % 3 == 0 { "-0.5" } else { "-1.0" }))
                .collect()
        };
        SegmentPools {
            intro: pool(40),
            middle: pool(50),
            outro: pool(60),
        }
    }

    fn creator(layout: ProjectLayout) -> SongCreator<MockModel> {
        SongCreator::from_pools(layout, pools(), 8, |_, encoder| MockModel {
            num_features: encoder.num_features(),
            ..MockModel::default()
        })
        .unwrap()
    }

    #[test]
    fn test_compose_default_length() {
        let creator = creator(ProjectLayout::from_dir("unused"));
        let mut rng = StdRng::seed_from_u64(1);

        let song = creator
            .compose(&SongStructure::default(), SeedMode::ColumnSampled, &mut rng)
            .unwrap();
        let events = song.arrange();

        assert_eq!(events.len(), 408);
        assert_eq!(song.intro.len(), 32);
        assert_eq!(song.chorus.len(), 64);
        // Chorus appears three times verbatim
        let chorus_start = 32 + 52;
        assert_eq!(events[chorus_start..chorus_start + 64], song.chorus[..]);
        let second = chorus_start + 64 + 52;
        assert_eq!(events[second..second + 64], song.chorus[..]);
    }

    #[test]
    fn test_parts_use_their_section_vocabulary() {
        let creator = creator(ProjectLayout::from_dir("unused"));
        let mut rng = StdRng::seed_from_u64(2);
        let song = creator
            .compose(&SongStructure::default(), SeedMode::Contiguous, &mut rng)
            .unwrap();

        let note = |e: &Event| e.note.parse::<usize>().unwrap();
        assert!(song.intro.iter().all(|e| (40..46).contains(&note(e))));
        assert!(song.bridge.iter().all(|e| (50..56).contains(&note(e))));
        assert!(song.outro.iter().all(|e| (60..66).contains(&note(e))));
    }

    #[test]
    fn test_train_checkpoints_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::from_dir(dir.path());
        let mut creator = creator(layout.clone());

        let reports = creator.train(&FitOptions::default(), true).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].best_loss, Some(32.0));
        for section in Section::ALL {
            assert!(creator.pipeline(section).model.fitted);
            assert!(layout.weights_path(section).is_file());
        }

        // Every section restores its own weights
        creator.load_weights().unwrap();
        for section in Section::ALL {
            assert_eq!(creator.pipeline(section).model.loaded, vec![layout.weights_path(section)]);
        }
    }

    #[test]
    fn test_save_and_load_models() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::from_dir(dir.path());
        let mut creator = creator(layout.clone());

        assert!(creator.load_models().is_err());
        creator.save_models().unwrap();
        creator.load_models().unwrap();
        assert_eq!(creator.pipeline(Section::Outro).model.loaded, vec![layout.model_path(Section::Outro)]);
    }

    #[test]
    fn test_train_rejects_short_pool() {
        let mut pools = pools();
        pools.outro.truncate(8);
        let mut creator = SongCreator::from_pools(ProjectLayout::from_dir("unused"), pools, 8, |_, encoder| MockModel {
            num_features: encoder.num_features(),
            ..MockModel::default()
        })
        .unwrap();

        let result = creator.train(&FitOptions::default(), false);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_create_song_writes_midi() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::from_dir(dir.path());
        let creator = creator(layout.clone());
        let mut rng = StdRng::seed_from_u64(3);

        let structure = SongStructure {
            intro: 4,
            verse: 4,
            chorus: 4,
            bridge: 4,
            outro: 4,
        };
        let path = creator
            .create_song("demo", &structure, SeedMode::ColumnSampled, &RenderOptions::default(), &mut rng)
            .unwrap();

        assert_eq!(path, layout.song_path("demo"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(midly::Smf::parse(&bytes).is_ok());
    }

    #[test]
    fn test_parse_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::from_dir(dir.path());
        std::fs::create_dir_all(layout.training_songs_dir()).unwrap();

        let pools = SongCreator::<MockModel>::parse(&layout, &CorpusOptions::default()).unwrap();
        assert!(pools.intro.is_empty());
        assert!(SegmentPools::exist_in(layout.parsed_notes_dir()));

        let creator = SongCreator::open(layout, 4, |_, encoder| MockModel {
            num_features: encoder.num_features(),
            ..MockModel::default()
        })
        .unwrap();
        assert_eq!(creator.pipeline(Section::Middle).encoder.pool().len(), 0);
    }
}
