//! Record models for the ingestion pipeline
//!
//! The raw live-feed payload travels as a BSON [`Document`] so it can be
//! stored unmodified. The extractor never touches it by string key: a fetched
//! record that survives the status and dedup checks is parsed into
//! [`GameFeed`], a typed view of exactly the fields the extraction reads.
//! Parsing a record in a final state that is missing a required field fails
//! with [`IngestError::MalformedRecord`].

use std::collections::BTreeMap;

use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Detailed state the source reports once a game has concluded
pub const FINAL_STATE: &str = "Final";

/// Field holding the globally unique game key in every collection
pub const GAME_KEY_FIELD: &str = "gamePk";

/// Detailed game state, readable before the full typed parse.
pub fn detailed_state(doc: &Document) -> Option<&str> {
    doc.get_document("gameData")
        .ok()?
        .get_document("status")
        .ok()?
        .get_str("detailedState")
        .ok()
}

/// Game key probe, tolerant of the integer width the decoder picked.
pub fn game_pk(doc: &Document) -> Option<i64> {
    match doc.get(GAME_KEY_FIELD)? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

// ============================================================================
// Typed view of the live feed (input)
// ============================================================================

/// Typed view of one live-feed document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFeed {
    pub game_pk: i64,
    pub game_data: GameData,
    pub live_data: LiveData,
}

impl GameFeed {
    /// Parse the fields extraction needs out of a raw payload.
    pub fn from_document(doc: &Document, game_pk: i64) -> Result<Self, IngestError> {
        bson::from_document(doc.clone()).map_err(|e| IngestError::MalformedRecord {
            game_pk,
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub game: GameInfo,
    pub datetime: GameDateTime,
    pub teams: GameTeams,
    #[serde(default)]
    pub players: BTreeMap<String, RosterPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameInfo {
    pub season: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDateTime {
    pub date_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameTeams {
    pub away: TeamName,
    pub home: TeamName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamName {
    pub name: String,
}

/// Roster entry under `gameData.players`. Entries without a roster status
/// are not carried into the summary at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub full_name: String,
    pub roster_status: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub current_team: Option<TeamName>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
    pub plays: Plays,
    pub boxscore: Boxscore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plays {
    #[serde(default)]
    pub all_plays: Vec<Play>,
}

/// One entry of the ordered `allPlays` list. `result`, `about` and the
/// score are required on final records; coordinates, team attribution and
/// participants are optional in the source.
#[derive(Debug, Clone, Deserialize)]
pub struct Play {
    pub result: PlayResult,
    pub about: PlayAbout,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub team: Option<TeamName>,
    pub players: Option<Vec<PlayParticipant>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayResult {
    pub event: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAbout {
    pub period: i32,
    pub period_time: String,
    pub goals: Goals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Goals {
    pub away: i32,
    pub home: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coordinates {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayParticipant {
    pub player: ParticipantRef,
    pub player_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRef {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Boxscore {
    pub teams: BoxscoreTeams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxscoreTeams {
    pub away: BoxscoreTeam,
    pub home: BoxscoreTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxscoreTeam {
    #[serde(default)]
    pub players: BTreeMap<String, BoxscorePlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxscorePlayer {
    #[serde(default)]
    pub stats: BoxscoreStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxscoreStats {
    pub skater_stats: Option<SkaterStats>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkaterStats {
    pub time_on_ice: String,
    pub power_play_time_on_ice: String,
    pub short_handed_time_on_ice: String,
}

// ============================================================================
// Derived records (output)
// ============================================================================

/// One document of the games collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_pk: i64,
    pub season: String,
    pub date_time: String,
    pub away_team: String,
    pub home_team: String,
    pub players: BTreeMap<String, PlayerSummary>,
}

/// Per-player entry of a [`GameSummary`]
///
/// `ice_time` is `None` for players absent from both boxscores, which omits
/// the three fields from the stored document entirely. A player present in a
/// boxscore always gets the block, with explicit nulls when the source has
/// no skater statistics for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub full_name: String,
    pub roster_status: String,
    pub active: bool,
    pub current_team_name: Option<String>,
    #[serde(flatten)]
    pub ice_time: Option<IceTime>,
}

/// On-ice-time fields merged in from a boxscore
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IceTime {
    pub time_on_ice: Option<String>,
    pub power_play_time_on_ice: Option<String>,
    pub short_handed_time_on_ice: Option<String>,
}

/// One document of the play-by-play collection, in source event order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    pub game_pk: i64,
    pub event: String,
    pub description: String,
    pub period: i32,
    pub period_time: String,
    pub goals_away: i32,
    pub goals_home: i32,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub team: Option<String>,
    pub players: BTreeMap<String, PlayParticipantSummary>,
}

/// Participant role entry of a [`PlayEvent`], keyed by player id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayParticipantSummary {
    pub full_name: String,
    pub player_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_document(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_detailed_state_probe() {
        let doc = to_document(json!({
            "gameData": {"status": {"detailedState": "Final"}}
        }));
        assert_eq!(detailed_state(&doc), Some("Final"));

        let in_progress = to_document(json!({
            "gameData": {"status": {"detailedState": "In Progress"}}
        }));
        assert_eq!(detailed_state(&in_progress), Some("In Progress"));

        assert_eq!(detailed_state(&Document::new()), None);
    }

    #[test]
    fn test_game_pk_probe_integer_widths() {
        let wide = to_document(json!({"gamePk": 2021020004i64}));
        assert_eq!(game_pk(&wide), Some(2021020004));

        let mut narrow = Document::new();
        narrow.insert(GAME_KEY_FIELD, Bson::Int32(42));
        assert_eq!(game_pk(&narrow), Some(42));

        let mut double = Document::new();
        double.insert(GAME_KEY_FIELD, Bson::Double(7.0));
        assert_eq!(game_pk(&double), Some(7));

        assert_eq!(game_pk(&Document::new()), None);
    }

    #[test]
    fn test_from_document_rejects_missing_required_field() {
        // periodTime missing from the play
        let doc = to_document(json!({
            "gamePk": 2021020001i64,
            "gameData": {
                "game": {"season": "20212022"},
                "datetime": {"dateTime": "2021-10-12T23:00:00Z"},
                "status": {"detailedState": "Final"},
                "teams": {"away": {"name": "A"}, "home": {"name": "H"}},
                "players": {}
            },
            "liveData": {
                "plays": {"allPlays": [
                    {"result": {"event": "Goal", "description": "d"},
                     "about": {"period": 1, "goals": {"away": 1, "home": 0}}}
                ]},
                "boxscore": {"teams": {"away": {"players": {}}, "home": {"players": {}}}}
            }
        }));

        let err = GameFeed::from_document(&doc, 2021020001).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRecord { game_pk: 2021020001, .. }
        ));
    }

    #[test]
    fn test_player_summary_ice_time_serialization() {
        let merged = PlayerSummary {
            full_name: "Goalie Example".to_string(),
            roster_status: "Y".to_string(),
            active: true,
            current_team_name: None,
            ice_time: Some(IceTime {
                time_on_ice: None,
                power_play_time_on_ice: None,
                short_handed_time_on_ice: None,
            }),
        };
        let doc = bson::to_document(&merged).unwrap();
        // No skater stats: the three fields are stored as explicit nulls.
        assert_eq!(doc.get("timeOnIce"), Some(&Bson::Null));
        assert_eq!(doc.get("powerPlayTimeOnIce"), Some(&Bson::Null));
        assert_eq!(doc.get("shortHandedTimeOnIce"), Some(&Bson::Null));
        assert_eq!(doc.get("currentTeamName"), Some(&Bson::Null));

        let unmerged = PlayerSummary {
            ice_time: None,
            ..merged
        };
        let doc = bson::to_document(&unmerged).unwrap();
        // Not in any boxscore: the fields are absent, not null.
        assert!(!doc.contains_key("timeOnIce"));
        assert!(!doc.contains_key("powerPlayTimeOnIce"));
        assert!(!doc.contains_key("shortHandedTimeOnIce"));
    }
}
