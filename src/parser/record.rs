//! Decoded match record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mapping;
use super::replay::{MatchStatistics, RawPlayerResult, Replay, TeamResult};
use crate::error::ParseError;

/// One decoded match, as persisted and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub home: TeamStats,
    pub away: TeamStats,
}

/// Everything recorded for one side of a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub name: String,
    pub coach_name: String,
    pub race: String,
    pub value: i64,
    pub score: i64,
    pub cheerleaders: i64,
    pub supporters: i64,
    pub nb_supporters: i64,
    pub popularity: i64,
    pub popularity_before_match: i64,
    pub popularity_gain: i64,
    pub winnings_dice: i64,
    pub cash_before_match: i64,
    pub cash_earned_before_concession: i64,
    pub cash_earned: i64,
    pub possession_ball: i64,
    pub occupation_own: i64,
    pub occupation_their: i64,
    pub inflicted_meters_running: i64,
    pub inflicted_touchdowns: i64,
    pub inflicted_tackles: i64,
    pub sustained_tackles: i64,
    pub inflicted_injuries: i64,
    pub sustained_injuries: i64,
    pub inflicted_casualties: i64,
    pub sustained_casualties: i64,
    pub inflicted_ko: i64,
    pub sustained_ko: i64,
    /// Name of the side's most valuable player, empty when none was awarded.
    pub mvp: String,
    pub players: Vec<PlayerResult>,
}

/// Per-player line of a match result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub name: String,
    #[serde(rename = "type")]
    pub player_type: String,
    pub movement: i64,
    pub agility: i64,
    pub armor: i64,
    pub strength: i64,
    pub skills: Vec<String>,
    pub xp: i64,
    pub inflicted_tackles: i64,
    pub sustained_tackles: i64,
    pub inflicted_injuries: i64,
    pub sustained_injuries: i64,
    pub inflicted_casualties: i64,
    pub sustained_casualties: i64,
    pub mvp: bool,
    pub casualties: Vec<String>,
}

impl From<RawPlayerResult> for PlayerResult {
    fn from(raw: RawPlayerResult) -> Self {
        let casualties = [raw.casualty1, raw.casualty2]
            .into_iter()
            .filter(|c| *c != 0)
            .map(|c| c.to_string())
            .collect();

        Self {
            name: raw.player_data.name,
            player_type: raw.player_data.id_player_types.trim().to_string(),
            movement: raw.player_data.ma,
            agility: raw.player_data.ag,
            armor: raw.player_data.av,
            strength: raw.player_data.st,
            skills: mapping::split_skills(&raw.player_data.list_skills),
            xp: raw.xp,
            inflicted_tackles: raw.statistics.inflicted_tackles,
            sustained_tackles: raw.statistics.sustained_tackles,
            inflicted_injuries: raw.statistics.inflicted_injuries,
            sustained_injuries: raw.statistics.sustained_injuries,
            inflicted_casualties: raw.statistics.inflicted_casualties,
            sustained_casualties: raw.statistics.sustained_casualties,
            mvp: raw.statistics.mvp == 1,
            casualties,
        }
    }
}

/// Which half of the match summary row to read.
#[derive(Clone, Copy)]
enum Side {
    Home,
    Away,
}

impl Record {
    /// Build a record from the last finished-game event in the replay.
    pub fn from_replay(replay: Replay) -> Result<Self, ParseError> {
        let finished = replay
            .steps
            .into_iter()
            .rev()
            .find_map(|step| step.game_finished)
            .ok_or(ParseError::MissingMatchResult)?;

        let result = finished.match_result;
        let found = result.coach_results.coaches.len();
        if found < 2 {
            return Err(ParseError::MissingCoaches { found });
        }

        let mut coaches = result.coach_results.coaches.into_iter();
        let (Some(home_coach), Some(away_coach)) = (coaches.next(), coaches.next()) else {
            return Err(ParseError::MissingCoaches { found });
        };

        let home = team_stats(&result.row, home_coach.team, Side::Home);
        let away = team_stats(&result.row, away_coach.team, Side::Away);

        Ok(Self {
            id: record_id(&home, &away),
            home,
            away,
        })
    }
}

/// Stable id for a match: the same teams and coaches always hash to the same id.
pub fn record_id(home: &TeamStats, away: &TeamStats) -> Uuid {
    let key = format!(
        "{}-{}:{}-{}",
        home.name, home.coach_name, away.name, away.coach_name
    );
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.as_bytes())
}

fn team_stats(row: &MatchStatistics, team: TeamResult, side: Side) -> TeamStats {
    let players: Vec<PlayerResult> = team
        .player_results
        .players
        .into_iter()
        .map(PlayerResult::from)
        .collect();

    let mvp = players
        .iter()
        .rev()
        .find(|p| p.mvp)
        .map(|p| p.name.clone())
        .unwrap_or_default();

    let common = TeamStats {
        cheerleaders: team.team_data.cheerleaders,
        supporters: team.no_supporters,
        popularity: team.team_data.popularity,
        race: mapping::race_name(&team.team_data.id_race),
        mvp,
        players,
        ..TeamStats::default()
    };

    match side {
        Side::Home => TeamStats {
            name: row.team_home_name.clone(),
            coach_name: row.coach_home_name.clone(),
            value: row.home_value,
            score: row.home_score,
            nb_supporters: row.home_nb_supporters,
            popularity_before_match: row.home_popularity_before_match,
            popularity_gain: row.home_popularity_gain,
            winnings_dice: row.home_winnings_dice,
            cash_before_match: row.home_cash_before_match,
            cash_earned_before_concession: row.home_cash_earned_before_concession,
            cash_earned: row.home_cash_earned,
            possession_ball: row.home_possession_ball,
            occupation_own: row.home_occupation_own,
            occupation_their: row.home_occupation_their,
            inflicted_meters_running: row.home_inflicted_meters_running,
            inflicted_touchdowns: row.home_inflicted_touchdowns,
            inflicted_tackles: row.home_inflicted_tackles,
            sustained_tackles: row.home_sustained_tackles,
            inflicted_injuries: row.home_inflicted_injuries,
            sustained_injuries: row.home_sustained_injuries,
            inflicted_casualties: row.home_inflicted_casualties,
            sustained_casualties: row.home_sustained_casualties,
            inflicted_ko: row.home_inflicted_ko,
            sustained_ko: row.home_sustained_ko,
            ..common
        },
        Side::Away => TeamStats {
            name: row.team_away_name.clone(),
            coach_name: row.coach_away_name.clone(),
            value: row.away_value,
            score: row.away_score,
            nb_supporters: row.away_nb_supporters,
            popularity_before_match: row.away_popularity_before_match,
            popularity_gain: row.away_popularity_gain,
            winnings_dice: row.away_winnings_dice,
            cash_before_match: row.away_cash_before_match,
            cash_earned_before_concession: row.away_cash_earned_before_concession,
            cash_earned: row.away_cash_earned,
            possession_ball: row.away_possession_ball,
            occupation_own: row.away_occupation_own,
            occupation_their: row.away_occupation_their,
            inflicted_meters_running: row.away_inflicted_meters_running,
            inflicted_touchdowns: row.away_inflicted_touchdowns,
            inflicted_tackles: row.away_inflicted_tackles,
            sustained_tackles: row.away_sustained_tackles,
            inflicted_injuries: row.away_inflicted_injuries,
            sustained_injuries: row.away_sustained_injuries,
            inflicted_casualties: row.away_inflicted_casualties,
            sustained_casualties: row.away_sustained_casualties,
            inflicted_ko: row.away_inflicted_ko,
            sustained_ko: row.away_sustained_ko,
            ..common
        },
    }
}
