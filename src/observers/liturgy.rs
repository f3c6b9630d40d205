// Liturgy - Easter silence, seasonal antiphon and rank-based themes

use super::append_song;
use crate::calendar::{Calendar, Rank, Season};
use crate::config::{LiturgySettings, parse_quarter};
use crate::error::Result;
use crate::melody::Melody;
use crate::striker::Striker;
use chrono::{Datelike, TimeDelta};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankThemes {
    pub solemnity: Option<String>,
    pub feast: Option<String>,
    pub memorial: Option<String>,
    pub optional_memorial: Option<String>,
    pub sunday: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Antiphons {
    pub time: (u32, u32),
    pub christmas: PathBuf,
    pub lent: PathBuf,
    pub easter: PathBuf,
    pub ordinary: PathBuf,
    pub transpose: i32,
    pub tempo: f64,
}

impl Antiphons {
    pub fn for_season(&self, season: Season) -> &PathBuf {
        match season {
            Season::Christmas => &self.christmas,
            Season::Lent => &self.lent,
            Season::Easter => &self.easter,
            Season::Ordinary => &self.ordinary,
        }
    }
}

pub struct Liturgy {
    calendar: Arc<dyn Calendar>,
    eastermute: bool,
    antiphons: Option<Antiphons>,
    themes: RankThemes,
    default_theme: String,
    theme_modified: AtomicBool,
}

impl Liturgy {
    pub fn new(calendar: Arc<dyn Calendar>, default_theme: impl Into<String>) -> Self {
        Self {
            calendar,
            eastermute: false,
            antiphons: None,
            themes: RankThemes::default(),
            default_theme: default_theme.into(),
            theme_modified: AtomicBool::new(false),
        }
    }

    pub fn with_eastermute(mut self, enabled: bool) -> Self {
        self.eastermute = enabled;
        self
    }

    pub fn with_antiphons(mut self, antiphons: Antiphons) -> Self {
        self.antiphons = Some(antiphons);
        self
    }

    pub fn with_themes(mut self, themes: RankThemes) -> Self {
        self.themes = themes;
        self
    }

    pub fn from_settings(
        settings: &LiturgySettings,
        calendar: Arc<dyn Calendar>,
        default_theme: impl Into<String>,
    ) -> Result<Self> {
        let mut liturgy = Self::new(calendar, default_theme)
            .with_eastermute(settings.eastermute)
            .with_themes(RankThemes {
                solemnity: settings.theme_solemnity.clone(),
                feast: settings.theme_feast.clone(),
                memorial: settings.theme_memorial.clone(),
                optional_memorial: settings.theme_optional_memorial.clone(),
                sunday: settings.theme_sunday.clone(),
            });

        if let Some(time) = settings.antiphon.as_deref() {
            liturgy = liturgy.with_antiphons(Antiphons {
                time: parse_quarter(time)?,
                christmas: settings.antiphon_christmas.clone(),
                lent: settings.antiphon_lent.clone(),
                easter: settings.antiphon_easter.clone(),
                ordinary: settings.antiphon_ordinary.clone(),
                transpose: settings.antiphon_transpose,
                tempo: settings.antiphon_tempo,
            });
        }
        Ok(liturgy)
    }

    /// Silence on Good Friday and Holy Saturday
    pub fn easter_mute(&self, melody: Melody, _hour: u32, _quarter: u32) -> Option<Melody> {
        let today = self.calendar.today();
        let easter = self.calendar.easter_date(today.year());
        let silent = [easter - TimeDelta::days(1), easter - TimeDelta::days(2)];
        (!silent.contains(&today)).then_some(melody)
    }

    /// Append the marian antiphon of the season after the configured chime
    pub fn antiphon(&self, melody: Melody, hour: u32, quarter: u32) -> Option<Melody> {
        let Some(antiphons) = &self.antiphons else {
            return Some(melody);
        };
        if antiphons.time != (hour, quarter) {
            return Some(melody);
        }

        let path = antiphons.for_season(self.calendar.current_season());
        Some(append_song(melody, path, antiphons.transpose, antiphons.tempo))
    }

    /// Pick today's striker theme from the rank of the day
    ///
    /// Falls back to the default theme once the special day is over.
    /// Returns the theme that was applied, if any.
    pub fn select_theme(&self, striker: &Striker) -> Option<String> {
        let event = self.calendar.current_rank_event();

        let chosen = match event.rank {
            Rank::Solemnity => self.themes.solemnity.as_ref(),
            Rank::Feast => self.themes.feast.as_ref(),
            Rank::Memorial => self.themes.memorial.as_ref(),
            Rank::OptionalMemorial => self.themes.optional_memorial.as_ref(),
            Rank::None => None,
        }
        .or_else(|| {
            event
                .is_sunday()
                .then_some(self.themes.sunday.as_ref())
                .flatten()
        });

        if let Some(theme) = chosen {
            if striker.set_theme(theme) {
                info!("Theme '{}' for {} ({})", theme, event.title, event.rank);
                self.theme_modified.store(true, Ordering::SeqCst);
                return Some(theme.clone());
            }
            return None;
        }

        if self.theme_modified.swap(false, Ordering::SeqCst)
            && striker.set_theme(&self.default_theme)
        {
            info!("Theme back to '{}'", self.default_theme);
            return Some(self.default_theme.clone());
        }
        None
    }

    /// Subscribe the enabled tick observers
    pub fn register(self: &Arc<Self>, striker: &Striker) {
        if self.eastermute {
            let liturgy = Arc::clone(self);
            striker.subscribe(move |melody, hour, quarter| {
                liturgy.easter_mute(melody, hour, quarter)
            });
        }
        if self.antiphons.is_some() {
            let liturgy = Arc::clone(self);
            striker.subscribe(move |melody, hour, quarter| {
                liturgy.antiphon(melody, hour, quarter)
            });
        }
    }
}
