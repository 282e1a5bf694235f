// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song segmentation and pooling.
//!
//! Each song contributes its first `intro_n` events to the intro pool, the
//! events from `len - 1 - outro_n` onwards to the outro pool, and what lies
//! between to the middle pool. Bounds follow slice semantics where a
//! negative bound counts from the end, so a song shorter than
//! `intro_n + outro_n + 1` yields overlapping or empty segments.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Section, Song};
use crate::error::Result;
use crate::music::Event;

/// Resolve a possibly negative slice bound against a length
fn slice_bound(index: isize, len: usize) -> usize {
    if index < 0 {
        (len as isize + index).max(0) as usize
    } else {
        (index as usize).min(len)
    }
}

/// Split one song into (intro, middle, outro)
pub fn segment(events: &[Event], intro_n: usize, outro_n: usize) -> (Vec<Event>, Vec<Event>, Vec<Event>) {
    let len = events.len();
    let last_index = len as isize - 1;
    let outro_start = slice_bound(last_index - outro_n as isize, len);
    let intro_end = intro_n.min(len);

    let intro = events[..intro_end].to_vec();
    let middle = if intro_end < outro_start {
        events[intro_end..outro_start].to_vec()
    } else {
        Vec::new()
    };
    let outro = events[outro_start..].to_vec();

    (intro, middle, outro)
}

/// The three pooled event streams of a corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentPools {
    pub intro: Vec<Event>,
    pub middle: Vec<Event>,
    pub outro: Vec<Event>,
}

impl SegmentPools {
    /// Get the pool for a section
    pub fn get(&self, section: Section) -> &[Event] {
        match section {
            Section::Intro => &self.intro,
            Section::Middle => &self.middle,
            Section::Outro => &self.outro,
        }
    }

    /// Path of a section's pool file within a directory
    pub fn pool_path<P: AsRef<Path>>(dir: P, section: Section) -> PathBuf {
        dir.as_ref().join(format!("{}.json", section.name()))
    }

    /// Write the pools as `intro.json`, `middle.json` and `outro.json`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for section in Section::ALL {
            let json = serde_json::to_string(self.get(section))?;
            fs::write(Self::pool_path(dir, section), json)?;
        }
        info!(dir = %dir.display(), "Saved segment pools");
        Ok(())
    }

    /// Read pools written by [`SegmentPools::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            intro: load_pool(Self::pool_path(dir, Section::Intro))?,
            middle: load_pool(Self::pool_path(dir, Section::Middle))?,
            outro: load_pool(Self::pool_path(dir, Section::Outro))?,
        })
    }

    /// Whether all three pool files exist in a directory
    pub fn exist_in<P: AsRef<Path>>(dir: P) -> bool {
        Section::ALL
            .iter()
            .all(|section| Self::pool_path(dir.as_ref(), *section).is_file())
    }
}

/// Read a single pool file
pub fn load_pool<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&contents)?)
}

/// Segment every song and concatenate the segments in corpus order
pub fn build_pools(corpus: &[Song], intro_n: usize, outro_n: usize) -> SegmentPools {
    let mut pools = SegmentPools::default();

    for song in corpus {
        if song.len() <= intro_n + outro_n + 1 {
            warn!(
                song = %song.name,
                events = song.len(),
                "Song too short for clean segmentation; segments will overlap or be empty"
            );
        }

        let (intro, middle, outro) = segment(&song.events, intro_n, outro_n);
        pools.intro.extend(intro);
        pools.middle.extend(middle);
        pools.outro.extend(outro);
    }

    info!(
        intro = pools.intro.len(),
        middle = pools.middle.len(),
        outro = pools.outro.len(),
        "Built segment pools"
    );
    pools
}
