use std::fmt;

use url::Url;

use crate::SelectionError;

/// Calendar month of a player's game archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: u16,
    pub month: u8,
}

impl MonthKey {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: u16, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Parses the last two path segments of an archive pointer,
    /// e.g. `https://api.chess.com/pub/player/hikaru/games/2024/01`.
    ///
    /// Bare paths such as `2024/01` are accepted as well.
    pub fn from_archive_url(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let path = match Url::parse(raw) {
            Ok(url) => url.path().to_string(),
            Err(_) => raw.to_string(),
        };
        let mut segments = path.trim_end_matches('/').rsplit('/');
        let month = segments.next()?.parse::<u8>().ok()?;
        let year = segments.next()?.parse::<u16>().ok()?;
        Self::new(year, month)
    }

    /// `YYYY/MM`, as used in month request paths.
    pub fn path(&self) -> String {
        format!("{:04}/{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Months available for a user, chronological ascending as the source lists them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveIndex {
    months: Vec<MonthKey>,
}

impl ArchiveIndex {
    pub fn new(months: Vec<MonthKey>) -> Self {
        Self { months }
    }

    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Takes the last `k` months of `index`, keeping their order.
pub fn select_recent_months(index: &ArchiveIndex, k: usize) -> Result<&[MonthKey], SelectionError> {
    let months = index.months();
    if months.is_empty() {
        return Err(SelectionError::EmptyArchive);
    }
    let start = months.len().saturating_sub(k);
    Ok(&months[start..])
}

/// Sorts newest first. The sort is stable, so games sharing an end time keep
/// the order in which they were fetched.
pub fn merge_by_end_time(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| b.end_time.cmp(&a.end_time));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSide {
    pub username: String,
    pub rating: u32,
    /// Source result code such as `win`, `resigned`, `agreed` or `timeout`.
    pub result: String,
}

impl PlayerSide {
    pub fn won(&self) -> bool {
        self.result.eq_ignore_ascii_case("win")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    LostOrDrew,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Won => write!(f, "Won"),
            Outcome::LostOrDrew => write!(f, "Lost/Draw"),
        }
    }
}

/// One finished game as fetched from a monthly archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub white: PlayerSide,
    pub black: PlayerSide,
    /// Epoch seconds.
    pub end_time: i64,
    /// Full PGN transcript.
    pub pgn: String,
    pub month: MonthKey,
    pub url: Option<String>,
    pub time_class: Option<String>,
}

impl MatchRecord {
    /// Result from `username`'s point of view; `None` if they played neither side.
    pub fn outcome_for(&self, username: &str) -> Option<Outcome> {
        let side = if self.white.username.eq_ignore_ascii_case(username) {
            &self.white
        } else if self.black.username.eq_ignore_ascii_case(username) {
            &self.black
        } else {
            return None;
        };
        Some(if side.won() {
            Outcome::Won
        } else {
            Outcome::LostOrDrew
        })
    }
}
