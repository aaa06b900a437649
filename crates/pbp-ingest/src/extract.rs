//! Pure extraction of the derived record families
//!
//! One [`GameFeed`] yields one [`GameSummary`] and one [`PlayEvent`] per
//! entry of the source's ordered play list. Both functions are deterministic
//! and side-effect-free; required-field failures are caught earlier, when
//! the typed model is parsed.

use std::collections::BTreeMap;

use crate::models::{
    GameFeed, GameSummary, IceTime, PlayEvent, PlayParticipantSummary, PlayerSummary,
};

/// Roster status marking a player as on the active roster
const ON_ROSTER: &str = "Y";

/// Build the per-game summary: roster-derived player map merged with
/// on-ice-time fields from both boxscores.
pub fn extract_summary(feed: &GameFeed) -> GameSummary {
    let mut players = BTreeMap::new();

    for (id, roster) in &feed.game_data.players {
        // Players without a roster status are not summarized at all.
        let Some(roster_status) = roster.roster_status.clone() else {
            continue;
        };

        let current_team_name = if roster_status == ON_ROSTER && roster.active {
            roster.current_team.as_ref().map(|team| team.name.clone())
        } else {
            None
        };

        players.insert(
            id.clone(),
            PlayerSummary {
                full_name: roster.full_name.clone(),
                roster_status,
                active: roster.active,
                current_team_name,
                ice_time: None,
            },
        );
    }

    // Attach ice time for players found in either boxscore. Boxscore entries
    // with no roster counterpart are ignored, not created.
    let teams = &feed.live_data.boxscore.teams;
    for side in [&teams.away, &teams.home] {
        for (id, boxscore) in &side.players {
            let Some(entry) = players.get_mut(id) else {
                continue;
            };
            entry.ice_time = Some(match &boxscore.stats.skater_stats {
                Some(stats) => IceTime {
                    time_on_ice: Some(stats.time_on_ice.clone()),
                    power_play_time_on_ice: Some(stats.power_play_time_on_ice.clone()),
                    short_handed_time_on_ice: Some(stats.short_handed_time_on_ice.clone()),
                },
                // Goaltenders and non-participants get explicit nulls.
                None => IceTime {
                    time_on_ice: None,
                    power_play_time_on_ice: None,
                    short_handed_time_on_ice: None,
                },
            });
        }
    }

    GameSummary {
        game_pk: feed.game_pk,
        season: feed.game_data.game.season.clone(),
        date_time: feed.game_data.datetime.date_time.clone(),
        away_team: feed.game_data.teams.away.name.clone(),
        home_team: feed.game_data.teams.home.name.clone(),
        players,
    }
}

/// Build one play-by-play record per source play, preserving source order.
pub fn extract_plays(feed: &GameFeed) -> Vec<PlayEvent> {
    feed.live_data
        .plays
        .all_plays
        .iter()
        .map(|play| {
            let players = play
                .players
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|participant| {
                    (
                        participant.player.id.to_string(),
                        PlayParticipantSummary {
                            full_name: participant.player.full_name.clone(),
                            player_type: participant.player_type.clone(),
                        },
                    )
                })
                .collect();

            PlayEvent {
                game_pk: feed.game_pk,
                event: play.result.event.clone(),
                description: play.result.description.clone(),
                period: play.about.period,
                period_time: play.about.period_time.clone(),
                goals_away: play.about.goals.away,
                goals_home: play.about.goals.home,
                x: play.coordinates.x,
                y: play.coordinates.y,
                team: play.team.as_ref().map(|team| team.name.clone()),
                players,
            }
        })
        .collect()
}
