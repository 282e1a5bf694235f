// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song form: part lengths and the fixed arrangement.
//!
//! A song is intro (A), verse (B), chorus (C), verse (B), chorus (C),
//! bridge (D), chorus (C), outro (E). The chorus is generated once and
//! repeated; everything else is generated fresh.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::Section;
use crate::music::Event;

/// Events generated per part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongStructure {
    #[serde(default = "default_intro")]
    pub intro: usize,
    #[serde(default = "default_verse")]
    pub verse: usize,
    #[serde(default = "default_chorus")]
    pub chorus: usize,
    #[serde(default = "default_bridge")]
    pub bridge: usize,
    #[serde(default = "default_outro")]
    pub outro: usize,
}

fn default_intro() -> usize {
    32
}
fn default_verse() -> usize {
    52
}
fn default_chorus() -> usize {
    64
}
fn default_bridge() -> usize {
    48
}
fn default_outro() -> usize {
    32
}

impl Default for SongStructure {
    fn default() -> Self {
        Self {
            intro: default_intro(),
            verse: default_verse(),
            chorus: default_chorus(),
            bridge: default_bridge(),
            outro: default_outro(),
        }
    }
}

impl SongStructure {
    /// Length of one part
    pub fn length(&self, part: SongPart) -> usize {
        match part {
            SongPart::Intro => self.intro,
            SongPart::Verse1 | SongPart::Verse2 => self.verse,
            SongPart::Chorus => self.chorus,
            SongPart::Bridge => self.bridge,
            SongPart::Outro => self.outro,
        }
    }

    /// Events in the arranged song
    pub fn total_events(&self) -> usize {
        ARRANGEMENT.iter().map(|part| self.length(*part)).sum()
    }
}

/// A distinct generated part of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SongPart {
    Intro,
    Verse1,
    Chorus,
    Verse2,
    Bridge,
    Outro,
}

/// Parts in the order they are generated
pub const GENERATION_ORDER: [SongPart; 6] = [
    SongPart::Intro,
    SongPart::Verse1,
    SongPart::Chorus,
    SongPart::Verse2,
    SongPart::Bridge,
    SongPart::Outro,
];

/// Parts in the order they are played
pub const ARRANGEMENT: [SongPart; 8] = [
    SongPart::Intro,
    SongPart::Verse1,
    SongPart::Chorus,
    SongPart::Verse2,
    SongPart::Chorus,
    SongPart::Bridge,
    SongPart::Chorus,
    SongPart::Outro,
];

impl SongPart {
    /// Section whose model generates this part
    pub fn section(self) -> Section {
        match self {
            SongPart::Intro => Section::Intro,
            SongPart::Outro => Section::Outro,
            _ => Section::Middle,
        }
    }

    /// Form letter
    pub fn label(self) -> char {
        match self {
            SongPart::Intro => 'A',
            SongPart::Verse1 | SongPart::Verse2 => 'B',
            SongPart::Chorus => 'C',
            SongPart::Bridge => 'D',
            SongPart::Outro => 'E',
        }
    }
}

impl fmt::Display for SongPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SongPart::Intro => "intro",
            SongPart::Verse1 => "verse1",
            SongPart::Chorus => "chorus",
            SongPart::Verse2 => "verse2",
            SongPart::Bridge => "bridge",
            SongPart::Outro => "outro",
        };
        write!(f, "{}", name)
    }
}

/// Generated parts of one song
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedSong {
    pub intro: Vec<Event>,
    pub verse1: Vec<Event>,
    pub chorus: Vec<Event>,
    pub verse2: Vec<Event>,
    pub bridge: Vec<Event>,
    pub outro: Vec<Event>,
}

impl ComposedSong {
    pub fn part(&self, part: SongPart) -> &[Event] {
        match part {
            SongPart::Intro => &self.intro,
            SongPart::Verse1 => &self.verse1,
            SongPart::Chorus => &self.chorus,
            SongPart::Verse2 => &self.verse2,
            SongPart::Bridge => &self.bridge,
            SongPart::Outro => &self.outro,
        }
    }

    pub fn set_part(&mut self, part: SongPart, events: Vec<Event>) {
        match part {
            SongPart::Intro => self.intro = events,
            SongPart::Verse1 => self.verse1 = events,
            SongPart::Chorus => self.chorus = events,
            SongPart::Verse2 => self.verse2 = events,
            SongPart::Bridge => self.bridge = events,
            SongPart::Outro => self.outro = events,
        }
    }

    /// Concatenate the parts in arrangement order
    pub fn arrange(&self) -> Vec<Event> {
        ARRANGEMENT
            .iter()
            .flat_map(|part| self.part(*part).iter().cloned())
            .collect()
    }

    /// Form string, e.g. "ABCBCDCE"
    pub fn form() -> String {
        ARRANGEMENT.iter().map(|part| part.label()).collect()
    }
}
