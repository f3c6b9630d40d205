//! Shared fixtures for the integration tests

#![allow(dead_code)]

use carillon::NoteEvent;
use carillon::midi::file;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Write a one-note MIDI file lasting `length` seconds
pub fn write_note(path: &Path, note: u8, length: f64) {
    file::write(
        &[
            NoteEvent::note_on(0.0, note, 100),
            NoteEvent::note_off(length, note),
        ],
        path,
    )
    .unwrap();
}

/// Theme folder `name` under `base` with q1..q4 = 61..64 and h = 50,
/// leaving out the assets listed in `skip`
pub fn write_theme(base: &Path, name: &str, skip: &[&str]) {
    let theme = base.join(name);
    fs::create_dir_all(&theme).unwrap();
    for (asset, note) in [("q1", 61), ("q2", 62), ("q3", 63), ("q4", 64), ("h", 50)] {
        if !skip.contains(&asset) {
            write_note(&theme.join(format!("{}.mid", asset)), note, 0.005);
        }
    }
}

pub fn theme_library(skip: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_theme(dir.path(), "default", skip);
    dir
}

/// Poll `condition` for up to five seconds
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
