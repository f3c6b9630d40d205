//! End-to-end ticks: theme assets, observers and the carillon together

mod common;

use carillon::calendar::{Calendar, ComputedCalendar};
use carillon::observers::{Angelus, Liturgy, NightMuter};
use carillon::observers::liturgy::Antiphons;
use carillon::striker::{Clock, ManualClock};
use carillon::{Carillon, MemoryOutput, StrikeOutcome, Striker, StrikerConfig, ThemeLibrary};
use chrono::{NaiveDate, NaiveDateTime};
use common::{theme_library, wait_for, write_note};
use std::sync::Arc;
use tempfile::TempDir;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn striker(dir: &TempDir) -> (MemoryOutput, Striker) {
    let output = MemoryOutput::new();
    let striker = Striker::new(
        Carillon::new(Box::new(output.clone())),
        ThemeLibrary::new(dir.path()),
        StrikerConfig::default(),
    );
    (output, striker)
}

/// 15:00 plays the fourth quarter then three hour strokes
#[test]
fn test_full_hour_reaches_the_device() {
    let dir = theme_library(&[]);
    let (output, striker) = striker(&dir);

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 15, 0)),
        StrikeOutcome::Played
    );
    assert!(wait_for(|| output.notes_played() == vec![64, 50, 50, 50]));
}

#[test]
fn test_missing_quarter_asset_is_silent() {
    let dir = theme_library(&["q3"]);
    let (output, striker) = striker(&dir);

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 10, 45)),
        StrikeOutcome::Silent
    );
    assert!(wait_for(|| !striker.carillon().is_playing()));
    assert!(output.sent().is_empty());
}

/// An empty tick still claims the carillon from lower priorities
#[test]
fn test_empty_tick_silences_lower_priority_melody() {
    let dir = theme_library(&["q2"]);
    let song = dir.path().join("song.mid");
    write_note(&song, 70, 30.0);
    let (output, striker) = striker(&dir);

    let melody = carillon::Melody::from_asset(&song).unwrap();
    assert!(striker.carillon().play(melody, -5));
    assert!(wait_for(|| output.notes_played() == vec![70]));

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 10, 30)),
        StrikeOutcome::Silent
    );
    assert!(wait_for(|| !striker.carillon().is_playing()));
    assert_eq!(output.notes_played(), vec![70]);
}

#[test]
fn test_unknown_theme_keeps_current() {
    let dir = theme_library(&[]);
    let (_, striker) = striker(&dir);

    assert!(!striker.set_theme("nonexistent"));
    assert_eq!(striker.theme(), "default");
}

/// Night muter vetoes inside the window; the edges and the angelus still sound
#[test]
fn test_night_window_and_angelus() {
    let dir = theme_library(&[]);
    let angelus = dir.path().join("angelus.mid");
    write_note(&angelus, 80, 0.005);

    let (output, striker) = striker(&dir);
    NightMuter::new((21, 0), (8, 0)).register(&striker);
    Angelus::new(vec![(12, 0), (21, 0)], &angelus, 0, 1.0).register(&striker);

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 21, 15)),
        StrikeOutcome::Vetoed
    );
    assert_eq!(
        striker.strike_at(at(2024, 6, 2, 3, 0)),
        StrikeOutcome::Vetoed
    );
    assert!(output.sent().is_empty());

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 21, 0)),
        StrikeOutcome::Played
    );
    assert!(wait_for(|| output.notes_played().last() == Some(&80)));
    assert_eq!(output.notes_played().len(), 1 + 9 + 1);
}

/// Good Friday silences every tick; the evening antiphon follows the season
#[test]
fn test_liturgical_observers() {
    let dir = theme_library(&[]);
    let antiphons = TempDir::new().unwrap();
    for (season, note) in [("christmas", 90), ("lent", 91), ("easter", 92), ("ordinary", 93)] {
        write_note(&antiphons.path().join(format!("{}.mid", season)), note, 0.005);
    }

    let clock = Arc::new(ManualClock::new(at(2024, 3, 29, 21, 0)));
    let calendar: Arc<dyn Calendar> = Arc::new(ComputedCalendar::with_clock(
        clock.clone() as Arc<dyn Clock>,
    ));
    let liturgy = Arc::new(
        Liturgy::new(calendar, "default")
            .with_eastermute(true)
            .with_antiphons(Antiphons {
                time: (21, 0),
                christmas: antiphons.path().join("christmas.mid"),
                lent: antiphons.path().join("lent.mid"),
                easter: antiphons.path().join("easter.mid"),
                ordinary: antiphons.path().join("ordinary.mid"),
                transpose: 0,
                tempo: 1.0,
            }),
    );
    let (output, striker) = striker(&dir);
    liturgy.register(&striker);

    // Good Friday 2024
    assert_eq!(striker.strike_at(clock.now()), StrikeOutcome::Vetoed);

    // Easter Monday: Easter season antiphon
    clock.set(at(2024, 4, 1, 21, 0));
    assert_eq!(striker.strike_at(clock.now()), StrikeOutcome::Played);
    assert!(wait_for(|| output.notes_played().last() == Some(&92)));
    striker.carillon().stop().unwrap();
    output.clear();

    // Ordinary time, and only at the configured chime
    clock.set(at(2024, 7, 10, 21, 0));
    assert_eq!(striker.strike_at(clock.now()), StrikeOutcome::Played);
    assert!(wait_for(|| output.notes_played().last() == Some(&93)));
    striker.carillon().stop().unwrap();
    output.clear();

    clock.set(at(2024, 7, 10, 20, 45));
    assert_eq!(striker.strike_at(clock.now()), StrikeOutcome::Played);
    assert!(wait_for(|| output.notes_played() == vec![63]));
}

/// A tick outranked by a running higher-priority melody is dropped
#[test]
fn test_tick_yields_to_higher_priority() {
    let dir = theme_library(&[]);
    let song = dir.path().join("song.mid");
    write_note(&song, 70, 30.0);
    let (output, striker) = striker(&dir);

    let melody = carillon::Melody::from_asset(&song).unwrap();
    assert!(striker.carillon().play(melody, 5));
    assert!(wait_for(|| output.notes_played() == vec![70]));

    assert_eq!(
        striker.strike_at(at(2024, 6, 1, 9, 15)),
        StrikeOutcome::Rejected
    );
    assert_eq!(output.notes_played(), vec![70]);
    striker.carillon().stop().unwrap();
}
