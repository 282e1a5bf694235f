// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Writes a single-track (Type 0) file with tempo, time signature and an
//! optional program change ahead of the note data.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// A note for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// MIDI key (0-127)
    pub key: u8,
    /// Velocity (1-127)
    pub velocity: u8,
    /// Duration in ticks
    pub duration: u64,
}

impl ExportNote {
    /// Create a new export note
    pub fn new(tick: u64, key: u8, velocity: u8, duration: u64) -> Self {
        Self {
            tick,
            key,
            velocity,
            duration,
        }
    }

    /// End tick
    pub fn end_tick(&self) -> u64 {
        self.tick + self.duration
    }
}

/// MIDI event for export
#[derive(Debug, Clone)]
struct MidiExportEvent {
    /// Absolute tick
    tick: u64,
    /// Event data
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn note_on(tick: u64, channel: u8, key: u8, velocity: u8) -> Self {
        Self {
            tick,
            data: vec![0x90 | (channel & 0x0F), key & 0x7F, velocity & 0x7F],
        }
    }

    fn note_off(tick: u64, channel: u8, key: u8) -> Self {
        Self {
            tick,
            data: vec![0x80 | (channel & 0x0F), key & 0x7F, 0],
        }
    }

    fn program_change(tick: u64, channel: u8, program: u8) -> Self {
        Self {
            tick,
            data: vec![0xC0 | (channel & 0x0F), program & 0x7F],
        }
    }

    fn tempo(tick: u64, bpm: f64) -> Self {
        let microseconds = (60_000_000.0 / bpm) as u32;
        Self {
            tick,
            data: vec![
                0xFF, 0x51, 0x03,
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(tick: u64, numerator: u8, denominator: u8) -> Self {
        // Denominator is expressed as power of 2
        let denom_power = (denominator as f64).log2() as u8;
        Self {
            tick,
            data: vec![
                0xFF, 0x58, 0x04,
                numerator,
                denom_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per MIDI quarter note
            ],
        }
    }

    fn track_name(tick: u64, name: &str) -> Self {
        let bytes = &name.as_bytes()[..name.len().min(127)];
        let mut data = vec![0xFF, 0x03, bytes.len() as u8];
        data.extend_from_slice(bytes);
        Self { tick, data }
    }

    fn end_of_track(tick: u64) -> Self {
        Self {
            tick,
            data: vec![0xFF, 0x2F, 0x00],
        }
    }
}

/// Type 0 MIDI file exporter
#[derive(Debug, Clone)]
pub struct MidiExporter {
    /// PPQN (ticks per quarter note)
    ppqn: u16,
    /// Tempo in BPM
    tempo: f64,
    /// Time signature
    time_sig: (u8, u8),
    /// MIDI channel (0-15)
    channel: u8,
    /// Program change at start (None = no change)
    program: Option<u8>,
    /// Track name meta event
    name: Option<String>,
    /// Minimum track length in ticks (trailing rests)
    end_tick: u64,
    notes: Vec<ExportNote>,
}

impl MidiExporter {
    /// Create a new exporter
    pub fn new() -> Self {
        Self {
            ppqn: 480,
            tempo: 120.0,
            time_sig: (4, 4),
            channel: 0,
            program: None,
            name: None,
            end_tick: 0,
            notes: Vec::new(),
        }
    }

    /// Set PPQN
    pub fn set_ppqn(&mut self, ppqn: u16) {
        // Top bit selects SMPTE timing in the header
        self.ppqn = ppqn.clamp(1, 0x7FFF);
    }

    /// Get PPQN
    pub fn ppqn(&self) -> u16 {
        self.ppqn
    }

    /// Set tempo
    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = bpm.clamp(20.0, 300.0);
    }

    /// Get tempo
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn set_program(&mut self, program: Option<u8>) {
        self.program = program;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Extend the track to at least `tick`
    pub fn set_end_tick(&mut self, tick: u64) {
        self.end_tick = tick;
    }

    /// Tick at which End of Track is written
    pub fn end_tick(&self) -> u64 {
        self.notes
            .iter()
            .map(ExportNote::end_tick)
            .max()
            .unwrap_or(0)
            .max(self.end_tick)
    }

    /// Add a note
    pub fn add_note(&mut self, note: ExportNote) {
        self.notes.push(note);
    }

    /// Get notes
    pub fn notes(&self) -> &[ExportNote] {
        &self.notes
    }

    /// Export to file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.write(&mut file)?;
        file.flush()
    }

    /// Export to bytes
    pub fn export_to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }

    /// Write Type 0 MIDI data (single track) to writer
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut events = Vec::new();

        if let Some(name) = &self.name {
            events.push(MidiExportEvent::track_name(0, name));
        }
        events.push(MidiExportEvent::tempo(0, self.tempo));
        events.push(MidiExportEvent::time_signature(0, self.time_sig.0, self.time_sig.1));

        if let Some(program) = self.program {
            events.push(MidiExportEvent::program_change(0, self.channel, program));
        }

        for note in &self.notes {
            events.push(MidiExportEvent::note_on(
                note.tick,
                self.channel,
                note.key,
                note.velocity,
            ));
            events.push(MidiExportEvent::note_off(note.end_tick(), self.channel, note.key));
        }

        // Stable sort keeps a note-off ahead of a re-struck note at the same tick
        events.sort_by_key(|e| e.tick);

        events.push(MidiExportEvent::end_of_track(self.end_tick()));

        self.write_header(writer, 0, 1)?;
        self.write_track(writer, &events)
    }

    /// Write MIDI file header chunk
    fn write_header<W: Write>(&self, writer: &mut W, format: u16, num_tracks: u16) -> io::Result<()> {
        // MThd
        writer.write_all(b"MThd")?;
        // Chunk length (always 6)
        writer.write_all(&[0, 0, 0, 6])?;
        // Format type
        writer.write_all(&format.to_be_bytes())?;
        // Number of tracks
        writer.write_all(&num_tracks.to_be_bytes())?;
        // PPQN
        writer.write_all(&self.ppqn.to_be_bytes())?;
        Ok(())
    }

    /// Write a track chunk
    fn write_track<W: Write>(&self, writer: &mut W, events: &[MidiExportEvent]) -> io::Result<()> {
        let mut track_data = Vec::new();
        let mut last_tick = 0u64;

        for event in events {
            let delta = event.tick.saturating_sub(last_tick);
            write_variable_length(&mut track_data, delta as u32)?;
            track_data.extend_from_slice(&event.data);
            last_tick = event.tick;
        }

        // MTrk
        writer.write_all(b"MTrk")?;
        let length = track_data.len() as u32;
        writer.write_all(&length.to_be_bytes())?;
        writer.write_all(&track_data)?;

        Ok(())
    }
}

impl Default for MidiExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write variable-length quantity
fn write_variable_length<W: Write>(writer: &mut W, mut value: u32) -> io::Result<()> {
    let mut bytes = Vec::new();

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    writer.write_all(&bytes)
}
