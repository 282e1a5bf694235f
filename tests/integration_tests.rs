// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for songweaver
//!
//! These tests run the corpus, training, generation and rendering stages
//! together against a project laid out on disk.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use songweaver::midi::{read_file, ExportNote, MidiExporter, MusicalElement};
use songweaver::model::FitOptions;
use songweaver::{
    CorpusOptions, Event, ProjectLayout, RecurrentModel, RnnConfig, SeedMode, SegmentPools, Section,
    SequenceEncoder, SongCreator, SongStructure, RenderOptions,
};

const SEQUENCE_LEN: usize = 4;

/// Write a 40-onset training song; every seventh onset is a triad
fn write_song(path: &Path, variant: u64) {
    let mut exporter = MidiExporter::new();
    exporter.set_ppqn(480);
    for k in 0..40u64 {
        let tick = k * 480;
        let key = 60 + ((k * (variant + 2)) % 12) as u8;
        let duration = if k % 2 == 0 { 480 } else { 240 };
        exporter.add_note(ExportNote::new(tick, key, 90, duration));
        if k % 7 == 0 {
            exporter.add_note(ExportNote::new(tick, key + 4, 90, duration));
            exporter.add_note(ExportNote::new(tick, key + 7, 90, duration));
        }
    }
    exporter.export(path).unwrap();
}

fn project(root: &Path) -> ProjectLayout {
    let layout = ProjectLayout::new(root, "folk", "piano");
    fs::create_dir_all(layout.training_songs_dir()).unwrap();
    for variant in 0..3 {
        write_song(&layout.training_songs_dir().join(format!("song{}.mid", variant)), variant);
    }
    layout.ensure_dirs().unwrap();
    layout
}

fn corpus_options() -> CorpusOptions {
    CorpusOptions {
        intro_split: 8,
        outro_split: 8,
        include_rests: true,
    }
}

fn tiny_model(_: Section, encoder: &SequenceEncoder) -> RecurrentModel {
    RecurrentModel::new(
        RnnConfig::new(encoder.num_features(), encoder.sequence_len())
            .with_hidden_size(8)
            .with_learning_rate(0.01)
            .with_seed(Some(11)),
    )
}

fn fit_options() -> FitOptions {
    FitOptions {
        epochs: 3,
        batch_size: 8,
        ..FitOptions::default()
    }
}

/// Test that corpus files become pools with chords and rests
#[test]
fn test_parse_corpus_into_pools() {
    let dir = tempfile::tempdir().unwrap();
    let layout = project(dir.path());
    // Not a MIDI file; skipped with a warning
    fs::write(layout.training_songs_dir().join("broken.mid"), b"not midi").unwrap();

    let pools = SongCreator::<RecurrentModel>::parse(&layout, &corpus_options()).unwrap();

    assert_eq!(pools.intro.len(), 3 * 8);
    assert!(!pools.middle.is_empty());
    assert!(pools.middle.iter().any(|e| e.is_rest()));
    assert!(pools.intro.iter().any(|e| e.note.contains(',')));
    assert!(pools.intro.iter().all(|e| e.duration.starts_with('-')));

    let saved = SegmentPools::load(layout.parsed_notes_dir()).unwrap();
    assert_eq!(saved, pools);
}

/// Test the full train, save, reload and generate path
#[test]
fn test_train_and_generate_song() {
    let dir = tempfile::tempdir().unwrap();
    let layout = project(dir.path());

    let pools = SongCreator::<RecurrentModel>::parse(&layout, &corpus_options()).unwrap();
    let mut creator = SongCreator::from_pools(layout.clone(), pools, SEQUENCE_LEN, tiny_model).unwrap();

    let reports = creator.train(&fit_options(), true).unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.losses.len() == 3));
    creator.save_models().unwrap();

    for section in Section::ALL {
        assert!(layout.weights_path(section).is_file());
        assert!(layout.model_path(section).is_file());
    }

    let structure = SongStructure {
        intro: 6,
        verse: 5,
        chorus: 4,
        bridge: 3,
        outro: 6,
    };
    let options = RenderOptions::default();
    let path = creator
        .create_song("ballad", &structure, SeedMode::ColumnSampled, &options, &mut StdRng::seed_from_u64(1))
        .unwrap();
    assert_eq!(path, layout.song_path("ballad"));

    let bytes = fs::read(&path).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.format, midly::Format::SingleTrack);

    let elements = read_file(&path).unwrap();
    assert!(!elements.is_empty());
    assert!(elements.iter().any(|e| !matches!(e, MusicalElement::Rest { .. })));
}

/// Test that saved full models reproduce the trained models' output
#[test]
fn test_saved_models_reload() {
    let dir = tempfile::tempdir().unwrap();
    let layout = project(dir.path());

    let pools = SongCreator::<RecurrentModel>::parse(&layout, &corpus_options()).unwrap();
    let mut trained = SongCreator::from_pools(layout.clone(), pools, SEQUENCE_LEN, tiny_model).unwrap();
    trained.train(&fit_options(), false).unwrap();
    trained.save_models().unwrap();

    // Different initial weights, replaced by the load
    let mut restored = SongCreator::open(layout, SEQUENCE_LEN, |_, encoder| {
        RecurrentModel::new(RnnConfig::new(encoder.num_features(), encoder.sequence_len()).with_seed(Some(99)))
    })
    .unwrap();
    restored.load_models().unwrap();

    let structure = SongStructure::default();
    let a = trained
        .compose(&structure, SeedMode::Contiguous, &mut StdRng::seed_from_u64(5))
        .unwrap();
    let b = restored
        .compose(&structure, SeedMode::Contiguous, &mut StdRng::seed_from_u64(5))
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.arrange().len(), 408);
}

/// Test that generation without a checkpoint fails cleanly
#[test]
fn test_load_weights_requires_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let layout = project(dir.path());

    let pools = SongCreator::<RecurrentModel>::parse(&layout, &corpus_options()).unwrap();
    let mut creator = SongCreator::from_pools(layout, pools, SEQUENCE_LEN, tiny_model).unwrap();
    assert!(creator.load_weights().is_err());
}

/// Test that generated tokens render with zero durations dropped
#[test]
fn test_generated_tokens_render() {
    let events = vec![
        Event::new("60", "1.0"),
        Event::new("X", "0.5"),
        Event::new("60,64,67", "1/3"),
        Event::new("62", "0.0"),
    ];
    let stream = songweaver::midi::render_stream(&events).unwrap();
    assert_eq!(stream.len(), 3);

    let bytes = songweaver::midi::render_to_bytes(&events, &RenderOptions::default()).unwrap();
    assert!(midly::Smf::parse(&bytes).is_ok());
}
