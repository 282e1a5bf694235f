// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note and duration tokens.
//!
//! An [`Event`] pairs a note token (`"X"` for a rest, `"50"` for a pitch,
//! `"50,54,57"` for a chord) with a duration token (`"1.5"`, `"1/3"`, and
//! during corpus preparation a sign-prefixed form such as `"-0.25"`).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::pitch::PitchNumber;
use crate::error::{Error, Result};

/// Note token for a rest
pub const REST_TOKEN: &str = "X";

/// Separator between pitches of a chord token
pub const CHORD_SEPARATOR: char = ',';

/// Quantization grids, in divisions of a quarter note
const QUANTIZE_DIVISORS: [u64; 2] = [4, 3];

/// Twelfths of a quarter note per quarter note
const TWELFTHS: u64 = 12;

/// A (note token, duration token) pair.
///
/// Serialized as a two-element array: `["50,54", "-1.0"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Event {
    pub note: String,
    pub duration: String,
}

impl Event {
    /// Create a new event
    pub fn new(note: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            duration: duration.into(),
        }
    }

    /// Whether this event is a rest
    pub fn is_rest(&self) -> bool {
        self.note == REST_TOKEN
    }
}

impl From<(String, String)> for Event {
    fn from((note, duration): (String, String)) -> Self {
        Self { note, duration }
    }
}

impl From<Event> for (String, String) {
    fn from(event: Event) -> Self {
        (event.note, event.duration)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.note, self.duration)
    }
}

/// Parsed form of a note token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteToken {
    Rest,
    Pitch(PitchNumber),
    Chord(Vec<PitchNumber>),
}

impl NoteToken {
    /// Parse a note token.
    ///
    /// A single sub-token is a rest or a pitch; several comma-separated
    /// sub-tokens form a chord, each decoded independently.
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(CHORD_SEPARATOR).map(str::trim).collect();

        if parts.len() == 1 {
            if parts[0] == REST_TOKEN {
                return Ok(NoteToken::Rest);
            }
            return Ok(NoteToken::Pitch(parse_pitch_number(parts[0])?));
        }

        let pitches = parts
            .iter()
            .map(|p| parse_pitch_number(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(NoteToken::Chord(pitches))
    }

    /// Pitches sounded by this token (empty for a rest)
    pub fn pitches(&self) -> Vec<PitchNumber> {
        match self {
            NoteToken::Rest => Vec::new(),
            NoteToken::Pitch(p) => vec![*p],
            NoteToken::Chord(ps) => ps.clone(),
        }
    }
}

impl fmt::Display for NoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteToken::Rest => write!(f, "{}", REST_TOKEN),
            NoteToken::Pitch(p) => write!(f, "{}", p),
            NoteToken::Chord(ps) => {
                let joined: Vec<String> = ps.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

fn parse_pitch_number(s: &str) -> Result<PitchNumber> {
    s.parse::<PitchNumber>()
        .map_err(|_| Error::InvalidPitchName(s.to_string()))
}

/// Remove the extraction-time sign prefix from a duration token
pub fn strip_sign(token: &str) -> &str {
    token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token)
}

/// Resolve a duration token to a quarter length.
///
/// Tries a decimal first, then `numerator/denominator`. A leading sign is
/// stripped before interpretation.
pub fn parse_duration(token: &str) -> Result<f64> {
    let body = strip_sign(token.trim());
    let invalid = || Error::InvalidDuration(token.to_string());

    let value = match body.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            let (numerator, denominator) = body.split_once('/').ok_or_else(invalid)?;
            let numerator: u64 = numerator.trim().parse().map_err(|_| invalid())?;
            let denominator: u64 = denominator.trim().parse().map_err(|_| invalid())?;
            if denominator == 0 {
                return Err(invalid());
            }
            numerator as f64 / denominator as f64
        }
    };

    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value)
}

/// A duration quantized to the 1/4 or 1/3 quarter-note grid, stored in
/// twelfths of a quarter note
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QuarterLength(pub u64);

impl QuarterLength {
    /// Quantize a quarter length to the nearest grid point
    pub fn quantize(quarters: f64) -> Self {
        let quarters = quarters.max(0.0);
        let mut best = QuarterLength(0);
        let mut best_error = f64::INFINITY;

        for divisor in QUANTIZE_DIVISORS {
            let steps = (quarters * divisor as f64).round() as u64;
            let candidate = QuarterLength(steps * (TWELFTHS / divisor));
            let error = (candidate.as_f64() - quarters).abs();
            // Strictly smaller, so ties keep the 1/4 grid
            if error < best_error {
                best = candidate;
                best_error = error;
            }
        }
        best
    }

    /// Quantize a tick count at the given resolution
    pub fn from_ticks(ticks: u64, ticks_per_quarter: u16) -> Self {
        Self::quantize(ticks as f64 / ticks_per_quarter.max(1) as f64)
    }

    /// Value in quarter notes
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / TWELFTHS as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Duration token for corpus extraction (sign-prefixed)
    pub fn to_token(&self) -> String {
        format!("-{}", self)
    }
}

impl fmt::Display for QuarterLength {
    /// Decimal when the reduced denominator divides 4 ("1.0", "0.25"),
    /// otherwise a reduced fraction ("1/3", "4/3").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divisor = gcd(self.0, TWELFTHS);
        let numerator = self.0 / divisor;
        let denominator = TWELFTHS / divisor;

        if 4 % denominator == 0 {
            let value = self.as_f64();
            if value.fract() == 0.0 {
                write!(f, "{:.1}", value)
            } else {
                write!(f, "{}", value)
            }
        } else {
            write!(f, "{}/{}", numerator, denominator)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_signed() {
        assert_eq!(parse_duration("-0.25").unwrap(), 0.25);
        assert!((parse_duration("-1/3").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(parse_duration("1.5").unwrap(), 1.5);
        assert_eq!(parse_duration("4/3").unwrap(), 4.0 / 3.0);
        assert_eq!(parse_duration("-0.0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_duration_invalid() {
        for bad in ["", "abc", "1/0", "1/x", "1/2/3", "inf", "NaN", "--1"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::InvalidDuration(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_strip_sign() {
        assert_eq!(strip_sign("-0.25"), "0.25");
        assert_eq!(strip_sign("1/3"), "1/3");
        assert_eq!(strip_sign("+2.0"), "2.0");
    }

    #[test]
    fn test_note_token_parse() {
        assert_eq!(NoteToken::parse("X").unwrap(), NoteToken::Rest);
        assert_eq!(NoteToken::parse("50").unwrap(), NoteToken::Pitch(50));
        assert_eq!(
            NoteToken::parse("50,54,57").unwrap(),
            NoteToken::Chord(vec![50, 54, 57])
        );
        assert!(NoteToken::parse("50,X").is_err());
        assert!(NoteToken::parse("C4").is_err());
        assert_eq!(NoteToken::parse("50,54,57").unwrap().to_string(), "50,54,57");
    }

    #[test]
    fn test_chord_pitch_classes_survive_codec() {
        let numbers = match NoteToken::parse("50,54,57").unwrap() {
            NoteToken::Chord(numbers) => numbers,
            other => panic!("expected chord, got {:?}", other),
        };

        let reencoded: Vec<PitchNumber> = numbers
            .iter()
            .map(|&n| crate::music::encode_pitch(&crate::music::decode_pitch(n)).unwrap())
            .collect();

        let mut before: Vec<u8> = numbers.iter().map(|n| n % 12).collect();
        let mut after: Vec<u8> = reencoded.iter().map(|n| n % 12).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_quantize_grids() {
        assert_eq!(QuarterLength::quantize(1.0).to_string(), "1.0");
        assert_eq!(QuarterLength::quantize(0.26).to_string(), "0.25");
        assert_eq!(QuarterLength::quantize(0.34).to_string(), "1/3");
        assert_eq!(QuarterLength::quantize(1.32).to_string(), "4/3");
        assert_eq!(QuarterLength::quantize(1.5).to_string(), "1.5");
        assert_eq!(QuarterLength::quantize(0.01).to_string(), "0.0");
    }

    #[test]
    fn test_quantize_from_ticks() {
        assert_eq!(QuarterLength::from_ticks(480, 480).to_string(), "1.0");
        assert_eq!(QuarterLength::from_ticks(160, 480).to_string(), "1/3");
        assert_eq!(QuarterLength::from_ticks(240, 480).to_token(), "-0.5");
    }

    #[test]
    fn test_event_serializes_as_pair() {
        let event = Event::new("50,54", "-1.0");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"["50,54","-1.0"]"#);

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(!back.is_rest());
    }
}
