// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Training corpus preparation.
//!
//! Turns a directory of MIDI files into songs of (note, duration) events and
//! splits them into intro, middle and outro pools.

pub mod segment;

pub use segment::{build_pools, segment, SegmentPools};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::midi::{self, MusicalElement};
use crate::music::{encode_pitch, Event, PitchName, REST_TOKEN};

/// Song section, each with its own pool, encoder and model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Intro,
    Middle,
    Outro,
}

impl Section {
    /// All sections in song order
    pub const ALL: [Section; 3] = [Section::Intro, Section::Middle, Section::Outro];

    /// Name used in file paths
    pub fn name(self) -> &'static str {
        match self {
            Section::Intro => "intro",
            Section::Middle => "middle",
            Section::Outro => "outro",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Events extracted from one source file
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub name: String,
    pub events: Vec<Event>,
}

impl Song {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Corpus extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusOptions {
    /// Events taken from the start of each song for the intro pool
    #[serde(default = "default_split")]
    pub intro_split: usize,
    /// Events taken from the end of each song for the outro pool
    #[serde(default = "default_split")]
    pub outro_split: usize,
    /// Keep rests as "X" events
    #[serde(default = "default_include_rests")]
    pub include_rests: bool,
}

fn default_split() -> usize {
    24
}
fn default_include_rests() -> bool {
    true
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            intro_split: default_split(),
            outro_split: default_split(),
            include_rests: default_include_rests(),
        }
    }
}

/// Convert musical elements to events.
///
/// Durations carry the extraction-time `-` prefix. Elements whose pitch has
/// no spelling are skipped.
pub fn extract_events(elements: &[MusicalElement], include_rests: bool) -> Vec<Event> {
    let mut events = Vec::with_capacity(elements.len());

    for element in elements {
        let note = match element {
            MusicalElement::Rest { .. } => {
                if !include_rests {
                    continue;
                }
                Ok(REST_TOKEN.to_string())
            }
            MusicalElement::Note { key, .. } => encode_key(*key).map(|n| n.to_string()),
            MusicalElement::Chord { keys, .. } => keys
                .iter()
                .map(|key| encode_key(*key).map(|n| n.to_string()))
                .collect::<Result<Vec<_>>>()
                .map(|pitches| pitches.join(",")),
        };

        match note {
            Ok(note) => events.push(Event::new(note, element.duration().to_token())),
            Err(e) => warn!(error = %e, "Skipping element"),
        }
    }

    events
}

fn encode_key(key: u8) -> Result<u8> {
    let name = PitchName::from_midi_key(key)?;
    encode_pitch(&name.to_string())
}

/// List the MIDI files of a directory in file-name order
pub fn midi_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read every MIDI file in a directory into songs.
///
/// Files that fail to read or parse are logged and skipped.
pub fn load_corpus<P: AsRef<Path>>(dir: P, options: &CorpusOptions) -> Result<Vec<Song>> {
    let dir = dir.as_ref();
    let mut songs = Vec::new();

    for path in midi_files(dir)? {
        let elements = match midi::read_file(&path) {
            Ok(elements) => elements,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable MIDI file");
                continue;
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let events = extract_events(&elements, options.include_rests);
        debug!(song = %name, events = events.len(), "Extracted song");
        songs.push(Song::new(name, events));
    }

    info!(dir = %dir.display(), songs = songs.len(), "Loaded corpus");
    Ok(songs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::QuarterLength;

    #[test]
    fn test_section_names() {
        let names: Vec<&str> = Section::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["intro", "middle", "outro"]);
        assert_eq!(Section::Middle.to_string(), "middle");
    }

    #[test]
    fn test_extract_events() {
        let elements = vec![
            MusicalElement::Rest { duration: QuarterLength(12) },
            MusicalElement::Note { key: 62, duration: QuarterLength(3) },
            MusicalElement::Chord { keys: vec![62, 66, 69], duration: QuarterLength(4) },
        ];

        let events = extract_events(&elements, true);
        assert_eq!(
            events,
            vec![
                Event::new("X", "-1.0"),
                Event::new("50", "-0.25"),
                Event::new("50,54,57", "-1/3"),
            ]
        );
    }

    #[test]
    fn test_extract_without_rests() {
        let elements = vec![
            MusicalElement::Rest { duration: QuarterLength(12) },
            MusicalElement::Note { key: 60, duration: QuarterLength(12) },
        ];
        let events = extract_events(&elements, false);
        assert_eq!(events, vec![Event::new("48", "-1.0")]);
    }

    #[test]
    fn test_unspellable_pitch_skipped() {
        let elements = vec![
            MusicalElement::Note { key: 5, duration: QuarterLength(12) },
            MusicalElement::Chord { keys: vec![5, 60], duration: QuarterLength(12) },
            MusicalElement::Note { key: 60, duration: QuarterLength(12) },
        ];
        let events = extract_events(&elements, true);
        assert_eq!(events, vec![Event::new("48", "-1.0")]);
    }

    #[test]
    fn test_load_corpus_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let options = crate::midi::RenderOptions::default();
        crate::midi::render(&[Event::new("48", "1.0")], dir.path().join("b.mid"), &options).unwrap();
        crate::midi::render(&[Event::new("50", "1.0")], dir.path().join("a.mid"), &options).unwrap();
        fs::write(dir.path().join("c.mid"), b"garbage").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let songs = load_corpus(dir.path(), &CorpusOptions::default()).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].name, "a");
        assert_eq!(songs[0].events, vec![Event::new("50", "-1.0")]);
        assert_eq!(songs[1].name, "b");
    }
}
