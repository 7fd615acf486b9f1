use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::{self, ProgressError};

pub const MAX_TITLE_LEN: usize = 100;

/// Airing state of an entry. The Spanish labels are the stored and
/// wire representation; they predate this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiringStatus {
    #[serde(rename = "En Emisión")]
    Airing,
    #[serde(rename = "Finalizado")]
    Finished,
    #[serde(rename = "Próximamente")]
    Upcoming,
}

impl AiringStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Airing => "En Emisión",
            Self::Finished => "Finalizado",
            Self::Upcoming => "Próximamente",
        }
    }
}

impl fmt::Display for AiringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiringStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "En Emisión" => Ok(Self::Airing),
            "Finalizado" => Ok(Self::Finished),
            "Próximamente" => Ok(Self::Upcoming),
            _ => Err(()),
        }
    }
}

/// An anime entry in one user's collection. Entries are never shared:
/// every read and write is scoped by `owner_id`.
///
/// Invariants held by every constructor and patch:
/// `episodes == season_distribution.sum()`,
/// `seasons == season_distribution.len()`,
/// `0 <= watched_episodes <= episodes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimeEntry {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub season_distribution: Vec<i32>,
    pub episodes: i32,
    pub seasons: i32,
    pub rating: f32,
    pub status: AiringStatus,
    pub cover: String,
    pub description: String,
    pub watched_episodes: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidAnime {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Title cannot be more than {MAX_TITLE_LEN} characters")]
    TitleTooLong,

    #[error("Cover URL is required")]
    EmptyCover,

    #[error("Description is required")]
    EmptyDescription,

    #[error("Rating must be between 0 and 5")]
    RatingOutOfRange,

    #[error("Season lengths must be non-negative")]
    NegativeSeasonLength,

    #[error("Total episode count is too large")]
    EpisodesOverflow,

    #[error("Season count {seasons} does not match distribution length {length}")]
    SeasonCountMismatch { seasons: i32, length: usize },

    #[error("Watched episodes {watched} is outside 0..={total}")]
    WatchedOutOfRange { watched: i32, total: i32 },
}

/// Payload for creating an entry.
#[derive(Debug, Deserialize)]
pub struct NewAnime {
    pub title: String,
    pub season_distribution: Vec<i32>,
    pub seasons: Option<i32>,
    #[serde(default)]
    pub rating: f32,
    pub status: AiringStatus,
    pub cover: String,
    pub description: String,
    #[serde(default)]
    pub watched_episodes: i32,
}

/// Partial update of an entry. Absent fields keep their current value;
/// derived fields (`episodes`, `seasons`) are always recomputed from
/// the effective distribution, never taken from the client.
#[derive(Debug, Default, Deserialize)]
pub struct AnimePatch {
    pub title: Option<String>,
    pub season_distribution: Option<Vec<i32>>,
    pub seasons: Option<i32>,
    pub rating: Option<f32>,
    pub status: Option<AiringStatus>,
    pub cover: Option<String>,
    pub description: Option<String>,
    pub watched_episodes: Option<i32>,
}

impl AnimePatch {
    #[must_use]
    pub const fn set_watched(watched: i32) -> Self {
        Self {
            title: None,
            season_distribution: None,
            seasons: None,
            rating: None,
            status: None,
            cover: None,
            description: None,
            watched_episodes: Some(watched),
        }
    }

    /// Applies this patch to `current`, restoring the entry invariants
    /// or rejecting the patch. Out-of-range watched counts are an
    /// error, never silently clamped; the clamp in the tracking UI is
    /// a client convenience this trust boundary does not rely on.
    pub fn apply(&self, current: &AnimeEntry) -> Result<AnimeEntry, InvalidAnime> {
        let title = match &self.title {
            Some(t) => validate_title(t)?,
            None => current.title.clone(),
        };

        // The distribution wins over a bare season count; a season
        // count alone resizes the current distribution.
        let distribution = match (&self.season_distribution, self.seasons) {
            (Some(dist), seasons) => {
                if let Some(seasons) = seasons
                    && seasons as usize != dist.len()
                {
                    return Err(InvalidAnime::SeasonCountMismatch {
                        seasons,
                        length: dist.len(),
                    });
                }
                dist.clone()
            }
            (None, Some(seasons)) => {
                if seasons < 0 {
                    return Err(InvalidAnime::SeasonCountMismatch {
                        seasons,
                        length: current.season_distribution.len(),
                    });
                }
                progress::resize_distribution(&current.season_distribution, seasons as usize)
            }
            (None, None) => current.season_distribution.clone(),
        };

        progress::validate_distribution(&distribution).map_err(invalid_distribution)?;
        let episodes = progress::total_episodes(&distribution);

        let rating = self.rating.unwrap_or(current.rating);
        validate_rating(rating)?;

        let watched = self.watched_episodes.unwrap_or(current.watched_episodes);
        if watched < 0 || watched > episodes {
            return Err(InvalidAnime::WatchedOutOfRange {
                watched,
                total: episodes,
            });
        }

        let cover = match &self.cover {
            Some(c) => validate_required(c, InvalidAnime::EmptyCover)?,
            None => current.cover.clone(),
        };
        let description = match &self.description {
            Some(d) => validate_required(d, InvalidAnime::EmptyDescription)?,
            None => current.description.clone(),
        };

        Ok(AnimeEntry {
            id: current.id,
            owner_id: current.owner_id,
            title,
            seasons: distribution.len() as i32,
            episodes,
            season_distribution: distribution,
            rating,
            status: self.status.unwrap_or(current.status),
            cover,
            description,
            watched_episodes: watched,
            created_at: current.created_at.clone(),
            updated_at: current.updated_at.clone(),
        })
    }
}

impl NewAnime {
    /// Validates the payload and returns it with derived fields
    /// normalized (`episodes`, `seasons` computed from the
    /// distribution).
    pub fn validate(&self) -> Result<ValidatedAnime, InvalidAnime> {
        let title = validate_title(&self.title)?;

        if let Some(seasons) = self.seasons
            && seasons as usize != self.season_distribution.len()
        {
            return Err(InvalidAnime::SeasonCountMismatch {
                seasons,
                length: self.season_distribution.len(),
            });
        }
        progress::validate_distribution(&self.season_distribution)
            .map_err(invalid_distribution)?;

        let episodes = progress::total_episodes(&self.season_distribution);
        if self.watched_episodes < 0 || self.watched_episodes > episodes {
            return Err(InvalidAnime::WatchedOutOfRange {
                watched: self.watched_episodes,
                total: episodes,
            });
        }

        validate_rating(self.rating)?;
        let cover = validate_required(&self.cover, InvalidAnime::EmptyCover)?;
        let description = validate_required(&self.description, InvalidAnime::EmptyDescription)?;

        Ok(ValidatedAnime {
            title,
            season_distribution: self.season_distribution.clone(),
            episodes,
            seasons: self.season_distribution.len() as i32,
            rating: self.rating,
            status: self.status,
            cover,
            description,
            watched_episodes: self.watched_episodes,
        })
    }
}

/// A `NewAnime` that passed validation, with derived fields filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnime {
    pub title: String,
    pub season_distribution: Vec<i32>,
    pub episodes: i32,
    pub seasons: i32,
    pub rating: f32,
    pub status: AiringStatus,
    pub cover: String,
    pub description: String,
    pub watched_episodes: i32,
}

fn invalid_distribution(err: ProgressError) -> InvalidAnime {
    match err {
        ProgressError::NegativeSeasonLength(_) => InvalidAnime::NegativeSeasonLength,
        _ => InvalidAnime::EpisodesOverflow,
    }
}

fn validate_title(title: &str) -> Result<String, InvalidAnime> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(InvalidAnime::EmptyTitle);
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(InvalidAnime::TitleTooLong);
    }
    Ok(trimmed.to_string())
}

fn validate_rating(rating: f32) -> Result<(), InvalidAnime> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(InvalidAnime::RatingOutOfRange);
    }
    Ok(())
}

fn validate_required(value: &str, err: InvalidAnime) -> Result<String, InvalidAnime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AnimeEntry {
        AnimeEntry {
            id: 1,
            owner_id: 10,
            title: "Frieren".to_string(),
            season_distribution: vec![12, 24],
            episodes: 36,
            seasons: 2,
            rating: 4.5,
            status: AiringStatus::Airing,
            cover: "https://example.com/cover.jpg".to_string(),
            description: "A journey after the journey.".to_string(),
            watched_episodes: 12,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn patching_the_distribution_rederives_episodes_and_seasons() {
        let patch = AnimePatch {
            season_distribution: Some(vec![12, 24, 13]),
            ..Default::default()
        };
        let updated = patch.apply(&entry()).unwrap();
        assert_eq!(updated.episodes, 49);
        assert_eq!(updated.seasons, 3);
    }

    #[test]
    fn season_count_alone_resizes_the_distribution() {
        let patch = AnimePatch {
            seasons: Some(3),
            ..Default::default()
        };
        let updated = patch.apply(&entry()).unwrap();
        assert_eq!(updated.season_distribution, vec![12, 24, 0]);
        assert_eq!(updated.episodes, 36);

        let patch = AnimePatch {
            seasons: Some(1),
            ..Default::default()
        };
        let shrunk = patch.apply(&entry()).unwrap();
        assert_eq!(shrunk.season_distribution, vec![12]);
        assert_eq!(shrunk.episodes, 12);
        assert_eq!(shrunk.watched_episodes, 12);
    }

    #[test]
    fn shrinking_below_watched_count_is_rejected() {
        let current = AnimeEntry {
            watched_episodes: 20,
            ..entry()
        };
        let patch = AnimePatch {
            seasons: Some(1),
            ..Default::default()
        };
        assert_eq!(
            patch.apply(&current),
            Err(InvalidAnime::WatchedOutOfRange {
                watched: 20,
                total: 12
            })
        );
    }

    #[test]
    fn watched_is_never_silently_clamped() {
        let patch = AnimePatch::set_watched(37);
        assert_eq!(
            patch.apply(&entry()),
            Err(InvalidAnime::WatchedOutOfRange {
                watched: 37,
                total: 36
            })
        );
    }

    #[test]
    fn negative_season_lengths_are_rejected() {
        let patch = AnimePatch {
            season_distribution: Some(vec![12, -4]),
            ..Default::default()
        };
        assert_eq!(patch.apply(&entry()), Err(InvalidAnime::NegativeSeasonLength));
    }

    #[test]
    fn overflowing_episode_totals_are_rejected() {
        let patch = AnimePatch {
            season_distribution: Some(vec![i32::MAX, 1]),
            ..Default::default()
        };
        assert_eq!(patch.apply(&entry()), Err(InvalidAnime::EpisodesOverflow));

        let draft = NewAnime {
            title: "Endless".to_string(),
            season_distribution: vec![i32::MAX, 1],
            seasons: None,
            rating: 0.0,
            status: AiringStatus::Airing,
            cover: "c".to_string(),
            description: "d".to_string(),
            watched_episodes: 0,
        };
        assert_eq!(draft.validate(), Err(InvalidAnime::EpisodesOverflow));
    }

    #[test]
    fn mismatched_season_count_is_rejected() {
        let patch = AnimePatch {
            season_distribution: Some(vec![12, 24]),
            seasons: Some(3),
            ..Default::default()
        };
        assert_eq!(
            patch.apply(&entry()),
            Err(InvalidAnime::SeasonCountMismatch {
                seasons: 3,
                length: 2
            })
        );
    }

    #[test]
    fn new_anime_derives_totals() {
        let draft = NewAnime {
            title: "  Mushishi  ".to_string(),
            season_distribution: vec![26, 10],
            seasons: None,
            rating: 5.0,
            status: AiringStatus::Finished,
            cover: "https://example.com/m.jpg".to_string(),
            description: "Quiet wandering.".to_string(),
            watched_episodes: 0,
        };
        let validated = draft.validate().unwrap();
        assert_eq!(validated.title, "Mushishi");
        assert_eq!(validated.episodes, 36);
        assert_eq!(validated.seasons, 2);
    }

    #[test]
    fn new_anime_rejects_bad_fields() {
        let base = NewAnime {
            title: "T".repeat(101),
            season_distribution: vec![12],
            seasons: None,
            rating: 0.0,
            status: AiringStatus::Airing,
            cover: "c".to_string(),
            description: "d".to_string(),
            watched_episodes: 0,
        };
        assert_eq!(base.validate(), Err(InvalidAnime::TitleTooLong));

        let bad_rating = NewAnime {
            title: "Ok".to_string(),
            rating: 5.5,
            ..base
        };
        assert_eq!(bad_rating.validate(), Err(InvalidAnime::RatingOutOfRange));
    }

    #[test]
    fn status_serializes_to_the_stored_labels() {
        assert_eq!(
            serde_json::to_string(&AiringStatus::Airing).unwrap(),
            "\"En Emisión\""
        );
        assert_eq!("Finalizado".parse::<AiringStatus>(), Ok(AiringStatus::Finished));
        assert!("Cancelled".parse::<AiringStatus>().is_err());
    }
}
