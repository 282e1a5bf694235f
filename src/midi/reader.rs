// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file reading.
//!
//! Flattens every track of a file into one temporally ordered list of
//! musical elements: notes sharing a quantized onset become a chord, and
//! silence between elements becomes a rest.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::{Error, Result};
use crate::music::QuarterLength;

/// Ticks per quarter assumed for SMPTE-timed files
const DEFAULT_TICKS_PER_QUARTER: u16 = 480;

/// A rest, note or chord with its quantized duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicalElement {
    Rest { duration: QuarterLength },
    Note { key: u8, duration: QuarterLength },
    Chord { keys: Vec<u8>, duration: QuarterLength },
}

impl MusicalElement {
    pub fn duration(&self) -> QuarterLength {
        match self {
            MusicalElement::Rest { duration }
            | MusicalElement::Note { duration, .. }
            | MusicalElement::Chord { duration, .. } => *duration,
        }
    }
}

/// A sounding note with absolute tick timing
#[derive(Debug, Clone, Copy)]
struct TimedNote {
    onset_tick: u64,
    offset_tick: u64,
    key: u8,
}

/// Read and flatten a MIDI file
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<MusicalElement>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let smf = Smf::parse(&bytes).map_err(|e| Error::MidiParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(read_elements(&smf))
}

/// Flatten a parsed MIDI file into musical elements
pub fn read_elements(smf: &Smf) -> Vec<MusicalElement> {
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(_, _) => DEFAULT_TICKS_PER_QUARTER,
    };

    let notes = collect_notes(smf);

    // Quantized onset -> (key, quantized duration)
    let mut groups: BTreeMap<QuarterLength, Vec<(u8, QuarterLength)>> = BTreeMap::new();
    for note in &notes {
        let onset = QuarterLength::from_ticks(note.onset_tick, ticks_per_quarter);
        let duration = QuarterLength::from_ticks(
            note.offset_tick.saturating_sub(note.onset_tick),
            ticks_per_quarter,
        );
        groups.entry(onset).or_default().push((note.key, duration));
    }

    let mut elements = Vec::with_capacity(groups.len());
    let mut sounding_until: Option<QuarterLength> = None;

    for (onset, mut group) in groups {
        if let Some(end) = sounding_until {
            if onset > end {
                elements.push(MusicalElement::Rest {
                    duration: QuarterLength(onset.0 - end.0),
                });
            }
        }

        let duration = group.iter().map(|(_, d)| *d).max().unwrap_or_default();
        group.sort_by_key(|(key, _)| *key);
        let mut keys: Vec<u8> = group.into_iter().map(|(key, _)| key).collect();
        keys.dedup();

        if keys.len() == 1 {
            elements.push(MusicalElement::Note { key: keys[0], duration });
        } else {
            elements.push(MusicalElement::Chord { keys, duration });
        }

        let end = QuarterLength(onset.0 + duration.0);
        sounding_until = Some(sounding_until.map_or(end, |current| current.max(end)));
    }

    elements
}

/// Pair note-on/note-off events across all tracks
fn collect_notes(smf: &Smf) -> Vec<TimedNote> {
    let mut notes = Vec::new();

    for track in &smf.tracks {
        let mut current_tick: u64 = 0;
        // (channel, key) -> stack of onset ticks
        let mut pending: HashMap<(u8, u8), Vec<u64>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pending.entry((ch, key.as_int())).or_default().push(current_tick);
                        }
                        // vel=0 NoteOn is NoteOff
                        MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                            if let Some(onset) = pending
                                .get_mut(&(ch, key.as_int()))
                                .and_then(|stack| stack.pop())
                            {
                                notes.push(TimedNote {
                                    onset_tick: onset,
                                    offset_tick: current_tick,
                                    key: key.as_int(),
                                });
                            }
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => break,
                _ => {}
            }
        }

        // Close any unclosed notes at the track's final tick
        for ((_, key), stack) in pending {
            for onset in stack {
                notes.push(TimedNote {
                    onset_tick: onset,
                    offset_tick: current_tick,
                    key,
                });
            }
        }
    }

    notes.sort_by(|a, b| a.onset_tick.cmp(&b.onset_tick).then(a.key.cmp(&b.key)));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal format-0 file at 480 PPQN from raw track bytes
    fn make_midi(track: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&480u16.to_be_bytes());

        let mut data = track.to_vec();
        data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&data);
        buf
    }

    #[test]
    fn test_monophonic_with_rest() {
        let midi = make_midi(&[
            // C4 quarter
            0x00, 0x90, 60, 100, 0x83, 0x60, 0x80, 60, 0,
            // half-beat gap, then E4 eighth
            0x81, 0x70, 0x90, 64, 100, 0x81, 0x70, 0x80, 64, 0,
        ]);
        let smf = Smf::parse(&midi).unwrap();
        let elements = read_elements(&smf);

        assert_eq!(
            elements,
            vec![
                MusicalElement::Note { key: 60, duration: QuarterLength(12) },
                MusicalElement::Rest { duration: QuarterLength(6) },
                MusicalElement::Note { key: 64, duration: QuarterLength(6) },
            ]
        );
    }

    #[test]
    fn test_simultaneous_notes_form_chord() {
        let midi = make_midi(&[
            0x00, 0x90, 67, 100, 0x00, 0x90, 60, 100, 0x00, 0x90, 64, 100,
            // velocity-0 note-ons end the chord one quarter later
            0x83, 0x60, 0x90, 60, 0, 0x00, 0x90, 64, 0, 0x00, 0x90, 67, 0,
        ]);
        let smf = Smf::parse(&midi).unwrap();
        let elements = read_elements(&smf);

        assert_eq!(
            elements,
            vec![MusicalElement::Chord { keys: vec![60, 64, 67], duration: QuarterLength(12) }]
        );
    }

    #[test]
    fn test_unclosed_note_ends_at_track_end() {
        let midi = make_midi(&[0x00, 0x90, 62, 100, 0x87, 0x40, 0xB0, 7, 100]);
        let smf = Smf::parse(&midi).unwrap();
        let elements = read_elements(&smf);

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].duration(), QuarterLength(24));
    }

    #[test]
    fn test_read_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mid");
        fs::write(&path, b"not a midi file").unwrap();

        match read_file(&path) {
            Err(Error::MidiParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
