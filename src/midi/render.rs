// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rendering of generated events to MIDI.
//!
//! Events are first resolved into a stream of rests, notes and chords
//! with quarter-length durations, then laid out back to back on a single
//! track.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::export::{ExportNote, MidiExporter};
use crate::error::Result;
use crate::music::{parse_duration, Event, NoteToken, PitchName};

/// Output settings for rendered files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Ticks per quarter note
    #[serde(default = "default_ppqn")]
    pub ppqn: u16,
    /// Note velocity (1-127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// General MIDI program (None = no program change)
    #[serde(default)]
    pub program: Option<u8>,
}

fn default_tempo() -> f64 {
    120.0
}
fn default_ppqn() -> u16 {
    480
}
fn default_velocity() -> u8 {
    100
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            ppqn: default_ppqn(),
            velocity: default_velocity(),
            program: None,
        }
    }
}

/// A rendered musical object
#[derive(Debug, Clone, PartialEq)]
pub enum StreamElement {
    Rest { quarters: f64 },
    Note { key: u8, quarters: f64 },
    Chord { keys: Vec<u8>, quarters: f64 },
}

impl StreamElement {
    pub fn quarters(&self) -> f64 {
        match self {
            StreamElement::Rest { quarters }
            | StreamElement::Note { quarters, .. }
            | StreamElement::Chord { quarters, .. } => *quarters,
        }
    }
}

/// Resolve events into a musical stream.
///
/// Events whose duration resolves to exactly 0 produce nothing.
pub fn render_stream(events: &[Event]) -> Result<Vec<StreamElement>> {
    let mut stream = Vec::with_capacity(events.len());

    for event in events {
        let quarters = parse_duration(&event.duration)?;
        if quarters == 0.0 {
            debug!(event = %event, "Dropping zero-length event");
            continue;
        }

        let element = match NoteToken::parse(&event.note)? {
            NoteToken::Rest => StreamElement::Rest { quarters },
            NoteToken::Pitch(number) => StreamElement::Note {
                key: PitchName::from_number(number).midi_key()?,
                quarters,
            },
            NoteToken::Chord(numbers) => {
                let keys = numbers
                    .into_iter()
                    .map(|n| PitchName::from_number(n).midi_key())
                    .collect::<Result<Vec<_>>>()?;
                StreamElement::Chord { keys, quarters }
            }
        };
        stream.push(element);
    }

    Ok(stream)
}

/// Lay a stream out on a single-track exporter
pub fn stream_to_exporter(stream: &[StreamElement], options: &RenderOptions) -> MidiExporter {
    let mut exporter = MidiExporter::new();
    exporter.set_ppqn(options.ppqn);
    exporter.set_tempo(options.tempo);
    exporter.set_program(options.program);

    let ppqn = exporter.ppqn() as f64;
    let mut offset = 0.0f64;

    for element in stream {
        let start = (offset * ppqn).round() as u64;
        offset += element.quarters();
        let end = (offset * ppqn).round() as u64;
        let duration = end.saturating_sub(start).max(1);

        match element {
            StreamElement::Rest { .. } => {}
            StreamElement::Note { key, .. } => {
                exporter.add_note(ExportNote::new(start, *key, options.velocity, duration));
            }
            StreamElement::Chord { keys, .. } => {
                for key in keys {
                    exporter.add_note(ExportNote::new(start, *key, options.velocity, duration));
                }
            }
        }
    }

    exporter.set_end_tick((offset * ppqn).round() as u64);
    exporter
}

/// Render events to MIDI bytes
pub fn render_to_bytes(events: &[Event], options: &RenderOptions) -> Result<Vec<u8>> {
    let stream = render_stream(events)?;
    Ok(stream_to_exporter(&stream, options).export_to_bytes()?)
}

/// Render events to a MIDI file, returning the number of stream elements written
pub fn render<P: AsRef<Path>>(events: &[Event], path: P, options: &RenderOptions) -> Result<usize> {
    let path = path.as_ref();
    let stream = render_stream(events)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut exporter = stream_to_exporter(&stream, options);
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        exporter.set_name(stem);
    }
    exporter.export(path)?;

    info!(
        path = %path.display(),
        events = events.len(),
        elements = stream.len(),
        "Wrote MIDI file"
    );
    Ok(stream.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_rest_event() {
        let stream = render_stream(&[Event::new("X", "1.0")]).unwrap();
        assert_eq!(stream, vec![StreamElement::Rest { quarters: 1.0 }]);
    }

    #[test]
    fn test_zero_duration_dropped() {
        let events = vec![
            Event::new("50", "0.0"),
            Event::new("50", "0/3"),
            Event::new("52", "0.5"),
        ];
        let stream = render_stream(&events).unwrap();
        assert_eq!(stream, vec![StreamElement::Note { key: 64, quarters: 0.5 }]);
    }

    #[test]
    fn test_note_and_chord() {
        let events = vec![Event::new("48", "1/3"), Event::new("48,52,55", "2.0")];
        let stream = render_stream(&events).unwrap();

        match &stream[0] {
            StreamElement::Note { key, quarters } => {
                assert_eq!(*key, 60);
                assert!((quarters - 1.0 / 3.0).abs() < 1e-12);
            }
            other => panic!("expected note, got {:?}", other),
        }
        assert_eq!(
            stream[1],
            StreamElement::Chord { keys: vec![60, 64, 67], quarters: 2.0 }
        );
    }

    #[test]
    fn test_malformed_duration() {
        let result = render_stream(&[Event::new("50", "half")]);
        assert!(matches!(result, Err(Error::InvalidDuration(_))));
    }

    #[test]
    fn test_layout_offsets() {
        let stream = vec![
            StreamElement::Note { key: 60, quarters: 1.0 },
            StreamElement::Rest { quarters: 0.5 },
            StreamElement::Chord { keys: vec![60, 64], quarters: 1.0 },
        ];
        let exporter = stream_to_exporter(&stream, &RenderOptions::default());
        let notes = exporter.notes();

        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], ExportNote::new(0, 60, 100, 480));
        assert_eq!(notes[1].tick, 720);
        assert_eq!(notes[2].tick, 720);
        assert_eq!(notes[2].duration, 480);
    }

    #[test]
    fn test_trailing_rest_kept() {
        let events = vec![Event::new("48", "1.0"), Event::new("X", "2.0")];
        let bytes = render_to_bytes(&events, &RenderOptions::default()).unwrap();

        let smf = midly::Smf::parse(&bytes).unwrap();
        let length: u32 = smf.tracks[0].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(length, 1440);
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        let events = vec![Event::new("48", "1.0"), Event::new("X", "1.0"), Event::new("50", "1.0")];

        let written = render(&events, &path, &RenderOptions::default()).unwrap();
        assert_eq!(written, 3);

        let bytes = std::fs::read(&path).unwrap();
        assert!(midly::Smf::parse(&bytes).is_ok());
    }
}
