//! Season/episode progress model.
//!
//! An anime entry stores a flat `watched_episodes` counter plus a
//! per-season partition of its total episodes (`season_distribution`).
//! This module converts between the flat counter and a 1-based
//! (season, episode-within-season) position.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("season {0} is out of range")]
    SeasonOutOfRange(i32),

    #[error("episode {episode} is outside season length {length}")]
    EpisodeOutOfRange { episode: i32, length: i32 },

    #[error("season lengths must be non-negative, got {0}")]
    NegativeSeasonLength(i32),

    #[error("total episode count exceeds the supported range")]
    TotalTooLarge,
}

/// A 1-based position within a season distribution.
///
/// `episode == 0` means "season selected, nothing watched in it yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonPosition {
    pub season: i32,
    pub episode: i32,
}

/// Total episode count implied by a distribution.
///
/// Summed in i64 and clamped at `i32::MAX` so hostile inputs cannot
/// panic the process; [`validate_distribution`] rejects such totals
/// before they are ever stored.
#[must_use]
pub fn total_episodes(distribution: &[i32]) -> i32 {
    let total: i64 = distribution.iter().map(|&len| i64::from(len)).sum();
    i32::try_from(total).unwrap_or(i32::MAX)
}

/// Rejects distributions containing negative season lengths, or whose
/// total does not fit in an `i32` episode counter.
///
/// An empty distribution is legal: progress tracking is simply
/// unavailable for such an entry.
pub fn validate_distribution(distribution: &[i32]) -> Result<(), ProgressError> {
    let mut total: i64 = 0;
    for &len in distribution {
        if len < 0 {
            return Err(ProgressError::NegativeSeasonLength(len));
        }
        total += i64::from(len);
    }
    if total > i64::from(i32::MAX) {
        return Err(ProgressError::TotalTooLarge);
    }
    Ok(())
}

/// Maps a flat watched-episode count to a (season, episode) position.
///
/// Walks the partition front-to-back with a strict `>` test, so a
/// count that exactly fills season N reports "season N, episode L_N"
/// rather than rolling over to "season N+1, episode 0". A count past
/// the end clamps to the last episode of the last season.
///
/// Returns `None` for an empty distribution.
#[must_use]
pub fn season_position(watched: i32, distribution: &[i32]) -> Option<SeasonPosition> {
    if distribution.is_empty() {
        return None;
    }

    let mut remaining = watched.max(0);
    let mut season = 1_usize;

    for &length in distribution {
        if remaining > length {
            remaining -= length;
            season += 1;
        } else {
            break;
        }
    }

    if season > distribution.len() {
        season = distribution.len();
        remaining = distribution[season - 1];
    }

    Some(SeasonPosition {
        season: i32::try_from(season).unwrap_or(i32::MAX),
        episode: remaining,
    })
}

/// Maps a (season, episode) position back to a flat watched count:
/// all prior complete seasons plus the episode within the current one.
///
/// The position must lie inside the distribution; out-of-range values
/// are rejected rather than clamped, since callers past the UI are a
/// trust boundary.
pub fn watched_total(
    season: i32,
    episode: i32,
    distribution: &[i32],
) -> Result<i32, ProgressError> {
    if season < 1 {
        return Err(ProgressError::SeasonOutOfRange(season));
    }
    let index = (season - 1) as usize;
    let Some(&length) = distribution.get(index) else {
        return Err(ProgressError::SeasonOutOfRange(season));
    };
    if episode < 0 || episode > length {
        return Err(ProgressError::EpisodeOutOfRange { episode, length });
    }

    let prior: i64 = distribution[..index].iter().map(|&len| i64::from(len)).sum();
    i32::try_from(prior + i64::from(episode)).map_err(|_| ProgressError::TotalTooLarge)
}

/// Resizes a distribution to a new season count: appends zero-length
/// seasons when growing, truncates from the end when shrinking.
///
/// Callers must re-derive `episodes` from the result; the services do
/// this on every distribution change.
#[must_use]
pub fn resize_distribution(current: &[i32], new_season_count: usize) -> Vec<i32> {
    let mut resized = current.to_vec();
    resized.resize(new_season_count, 0);
    resized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_season_boundary_stays_on_that_season() {
        // Finishing season 1 of [12, 24] lands on its last episode,
        // not on episode 0 of season 2.
        let pos = season_position(12, &[12, 24]).unwrap();
        assert_eq!(pos, SeasonPosition { season: 1, episode: 12 });
    }

    #[test]
    fn one_past_the_boundary_rolls_into_next_season() {
        let pos = season_position(13, &[12, 24]).unwrap();
        assert_eq!(pos, SeasonPosition { season: 2, episode: 1 });
    }

    #[test]
    fn overflow_clamps_to_last_episode_of_last_season() {
        let pos = season_position(40, &[12, 24]).unwrap();
        assert_eq!(pos, SeasonPosition { season: 2, episode: 24 });
    }

    #[test]
    fn zero_watched_is_start_of_first_season() {
        let pos = season_position(0, &[12, 24]).unwrap();
        assert_eq!(pos, SeasonPosition { season: 1, episode: 0 });
    }

    #[test]
    fn empty_distribution_has_no_position() {
        assert_eq!(season_position(5, &[]), None);
    }

    #[test]
    fn negative_watched_is_treated_as_zero() {
        let pos = season_position(-3, &[12]).unwrap();
        assert_eq!(pos, SeasonPosition { season: 1, episode: 0 });
    }

    #[test]
    fn round_trip_holds_for_every_valid_count() {
        let distributions: &[&[i32]] = &[&[12, 24], &[1], &[0, 5, 0, 7], &[3, 3, 3]];

        for dist in distributions {
            for watched in 0..=total_episodes(dist) {
                let pos = season_position(watched, dist).unwrap();
                let back = watched_total(pos.season, pos.episode, dist).unwrap();
                assert_eq!(back, watched, "round trip failed for {watched} over {dist:?}");
            }
        }
    }

    #[test]
    fn watched_total_rejects_out_of_range_positions() {
        assert_eq!(
            watched_total(0, 0, &[12]),
            Err(ProgressError::SeasonOutOfRange(0))
        );
        assert_eq!(
            watched_total(3, 0, &[12, 24]),
            Err(ProgressError::SeasonOutOfRange(3))
        );
        assert_eq!(
            watched_total(1, 13, &[12, 24]),
            Err(ProgressError::EpisodeOutOfRange {
                episode: 13,
                length: 12
            })
        );
        assert_eq!(
            watched_total(1, -1, &[12, 24]),
            Err(ProgressError::EpisodeOutOfRange {
                episode: -1,
                length: 12
            })
        );
    }

    #[test]
    fn resize_grows_with_zero_length_seasons() {
        assert_eq!(resize_distribution(&[12, 24], 4), vec![12, 24, 0, 0]);
    }

    #[test]
    fn resize_truncates_from_the_end() {
        assert_eq!(resize_distribution(&[12, 24, 13], 1), vec![12]);
    }

    #[test]
    fn resize_to_zero_disables_tracking() {
        let resized = resize_distribution(&[12, 24], 0);
        assert!(resized.is_empty());
        assert_eq!(season_position(0, &resized), None);
    }

    #[test]
    fn growing_preserves_existing_seasons() {
        let original = vec![12, 24];
        let grown = resize_distribution(&original, 5);
        assert_eq!(&grown[..2], &original[..]);
        assert_eq!(total_episodes(&grown), total_episodes(&original));
    }

    #[test]
    fn totals_past_i32_max_are_rejected_not_panicked() {
        assert_eq!(
            validate_distribution(&[i32::MAX, 1]),
            Err(ProgressError::TotalTooLarge)
        );
        assert_eq!(total_episodes(&[i32::MAX, 1]), i32::MAX);
        assert_eq!(
            watched_total(2, 1, &[i32::MAX, 5]),
            Err(ProgressError::TotalTooLarge)
        );
    }

    #[test]
    fn validate_rejects_negative_lengths() {
        assert_eq!(
            validate_distribution(&[12, -1]),
            Err(ProgressError::NegativeSeasonLength(-1))
        );
        assert_eq!(validate_distribution(&[]), Ok(()));
        assert_eq!(validate_distribution(&[0, 0]), Ok(()));
    }
}
