// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch codec.
//!
//! Converts between pitch spellings with an octave (`"D#4"`, `"E-3"`) and the
//! numeric pitch id used in note tokens: `pitch_class + 12 * octave`.
//! Decoding always spells with sharps, so flats do not survive a round trip;
//! only the pitch class does.

use std::fmt;

use crate::error::{Error, Result};

/// Numeric pitch id (`pitch_class + 12 * octave`)
pub type PitchNumber = u8;

/// Offset between a pitch number and its MIDI key (C4 = 48 = MIDI 60)
const MIDI_KEY_OFFSET: u8 = 12;

/// Pitch classes, spelled with sharps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    Cs, // C# / D-
    D,
    Ds, // D# / E-
    E,
    F,
    Fs, // F# / G-
    G,
    Gs, // G# / A-
    A,
    As, // A# / B-
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Get the pitch class index (0-11)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Get pitch class from index
    pub fn from_index(index: u8) -> Self {
        PitchClass::ALL[(index % 12) as usize]
    }

    /// Parse a spelling without octave ("C#", "D-", "Eb", "B#")
    ///
    /// Enharmonic spellings map to the same class; `b` is accepted as a
    /// synonym for the `-` flat sign.
    pub fn from_spelling(s: &str) -> Option<Self> {
        let normalized = s.trim().replace('b', "-").to_uppercase();
        match normalized.as_str() {
            "C" | "B#" => Some(PitchClass::C),
            "C#" | "D-" => Some(PitchClass::Cs),
            "D" => Some(PitchClass::D),
            "D#" | "E-" => Some(PitchClass::Ds),
            "E" | "F-" => Some(PitchClass::E),
            "F" | "E#" => Some(PitchClass::F),
            "F#" | "G-" => Some(PitchClass::Fs),
            "G" => Some(PitchClass::G),
            "G#" | "A-" => Some(PitchClass::Gs),
            "A" => Some(PitchClass::A),
            "A#" | "B-" => Some(PitchClass::As),
            "B" | "C-" => Some(PitchClass::B),
            _ => None,
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        };
        write!(f, "{}", name)
    }
}

/// A spelled pitch: class plus octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchName {
    pub class: PitchClass,
    pub octave: u8,
}

impl PitchName {
    /// Parse a pitch name such as "D#4" or "B-2"
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        let split = name
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidPitchName(name.to_string()))?;
        let (spelling, octave) = name.split_at(split);

        let class = PitchClass::from_spelling(spelling)
            .ok_or_else(|| Error::InvalidPitchName(name.to_string()))?;
        let octave: u8 = octave
            .parse()
            .map_err(|_| Error::InvalidPitchName(name.to_string()))?;

        // Largest representable number is 11 + 12 * 20 = 251
        if octave > 20 {
            return Err(Error::InvalidPitchName(name.to_string()));
        }

        Ok(Self { class, octave })
    }

    /// Build from a pitch number
    pub fn from_number(number: PitchNumber) -> Self {
        Self {
            class: PitchClass::from_index(number % 12),
            octave: number / 12,
        }
    }

    /// Build from a MIDI key number
    pub fn from_midi_key(key: u8) -> Result<Self> {
        if key < MIDI_KEY_OFFSET {
            return Err(Error::InvalidPitchName(format!("MIDI key {}", key)));
        }
        Ok(Self::from_number(key - MIDI_KEY_OFFSET))
    }

    /// Numeric pitch id
    pub fn number(&self) -> PitchNumber {
        self.class.index() + 12 * self.octave
    }

    /// MIDI key number for playback
    pub fn midi_key(&self) -> Result<u8> {
        let key = self.number() as u16 + MIDI_KEY_OFFSET as u16;
        if key > 127 {
            return Err(Error::InvalidPitchName(format!("{} is above the MIDI range", self)));
        }
        Ok(key as u8)
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

/// Encode a pitch spelling with octave ("D#4") to its pitch number
pub fn encode_pitch(name: &str) -> Result<PitchNumber> {
    Ok(PitchName::parse(name)?.number())
}

/// Decode a pitch number to its sharp spelling ("D4", "C#5")
pub fn decode_pitch(number: PitchNumber) -> String {
    PitchName::from_number(number).to_string()
}
