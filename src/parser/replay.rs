//! Raw replay XML shape.
//!
//! Only the parts of the replay needed to build a [`Record`](super::Record)
//! are modelled; every other element is skipped by the deserializer.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Replay {
    #[serde(rename = "ReplayStep")]
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplayStep {
    #[serde(rename = "RulesEventGameFinished")]
    pub game_finished: Option<GameFinished>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GameFinished {
    #[serde(rename = "MatchResult")]
    pub match_result: MatchResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MatchResult {
    #[serde(rename = "CoachResults")]
    pub coach_results: CoachResults,
    #[serde(rename = "Row")]
    pub row: MatchStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoachResults {
    #[serde(rename = "CoachResult")]
    pub coaches: Vec<CoachResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoachResult {
    #[serde(rename = "TeamResult")]
    pub team: TeamResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TeamResult {
    pub popularity_before_match: i64,
    pub team_data: TeamData,
    pub no_supporters: i64,
    pub cash_before_match: i64,
    pub cash_earned_before_concession: i64,
    pub winnings_dice: i64,
    pub cash_earned: i64,
    pub player_results: PlayerResults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TeamData {
    pub name: String,
    pub value: i64,
    pub cheerleaders: i64,
    pub popularity: i64,
    pub id_race: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerResults {
    #[serde(rename = "PlayerResult")]
    pub players: Vec<RawPlayerResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawPlayerResult {
    pub player_data: PlayerData,
    #[serde(alias = "XP")]
    pub xp: i64,
    pub statistics: PlayerStatistics,
    pub casualty1: i64,
    pub casualty2: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PlayerData {
    pub name: String,
    pub id_player_types: String,
    pub ma: i64,
    pub ag: i64,
    pub av: i64,
    pub st: i64,
    /// Comma separated skill ids wrapped in parentheses, e.g. `(12,54)`.
    pub list_skills: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PlayerStatistics {
    pub inflicted_tackles: i64,
    pub sustained_tackles: i64,
    pub inflicted_injuries: i64,
    pub sustained_injuries: i64,
    pub inflicted_casualties: i64,
    pub sustained_casualties: i64,
    #[serde(rename = "MVP")]
    pub mvp: i64,
}

/// The match summary row, one counter per side.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MatchStatistics {
    pub team_home_name: String,
    pub team_away_name: String,
    pub coach_home_name: String,
    pub coach_away_name: String,

    pub home_score: i64,
    pub away_score: i64,
    pub home_value: i64,
    pub away_value: i64,
    pub home_winnings_dice: i64,
    pub away_winnings_dice: i64,
    pub home_nb_supporters: i64,
    pub away_nb_supporters: i64,
    pub home_popularity_before_match: i64,
    pub away_popularity_before_match: i64,
    pub home_popularity_gain: i64,
    pub away_popularity_gain: i64,
    pub home_cash_before_match: i64,
    pub away_cash_before_match: i64,
    pub home_cash_earned_before_concession: i64,
    pub away_cash_earned_before_concession: i64,
    pub home_cash_earned: i64,
    pub away_cash_earned: i64,

    pub home_possession_ball: i64,
    pub away_possession_ball: i64,
    pub home_occupation_own: i64,
    pub away_occupation_own: i64,
    pub home_occupation_their: i64,
    pub away_occupation_their: i64,
    pub home_inflicted_meters_running: i64,
    pub away_inflicted_meters_running: i64,
    pub home_inflicted_touchdowns: i64,
    pub away_inflicted_touchdowns: i64,

    pub home_inflicted_tackles: i64,
    pub away_inflicted_tackles: i64,
    pub home_sustained_tackles: i64,
    pub away_sustained_tackles: i64,
    pub home_inflicted_injuries: i64,
    pub away_inflicted_injuries: i64,
    pub home_sustained_injuries: i64,
    pub away_sustained_injuries: i64,
    pub home_inflicted_casualties: i64,
    pub away_inflicted_casualties: i64,
    pub home_sustained_casualties: i64,
    pub away_sustained_casualties: i64,
    #[serde(rename = "HomeInflictedKO")]
    pub home_inflicted_ko: i64,
    #[serde(rename = "AwayInflictedKO")]
    pub away_inflicted_ko: i64,
    #[serde(rename = "HomeSustainedKO")]
    pub home_sustained_ko: i64,
    #[serde(rename = "AwaySustainedKO")]
    pub away_sustained_ko: i64,
    #[serde(rename = "HomeMVP")]
    pub home_mvp: i64,
    #[serde(rename = "AwayMVP")]
    pub away_mvp: i64,
}
