use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One verified attempt on a leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub weblink: Option<String>,
    /// Date the run was performed; the date axis of the timeline
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub submitted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times: Option<RunTimes>,
    #[serde(default)]
    pub players: Players,
    /// Sub-category selections: variable id -> value id
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl Run {
    /// Primary time in seconds, if the API reported one.
    pub fn primary_seconds(&self) -> Option<f64> {
        self.times.as_ref().and_then(|t| t.primary_t)
    }

    /// Display names in the order the run lists its players.
    ///
    /// `None` when players were not embedded (`embed=players` missing) or the
    /// list is empty.
    pub fn player_names(&self) -> Option<Vec<&str>> {
        match &self.players {
            Players::Embedded { data } if !data.is_empty() => {
                Some(data.iter().map(Player::display_name).collect())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunTimes {
    #[serde(default)]
    pub primary_t: Option<f64>,
}

/// `players` is either a bare list of references or, with `embed=players`,
/// an object wrapping the resolved players.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Players {
    Embedded { data: Vec<Player> },
    Refs(Vec<PlayerRef>),
}

impl Default for Players {
    fn default() -> Self {
        Players::Refs(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rel", rename_all = "lowercase")]
pub enum Player {
    User { id: String, names: Names },
    Guest { name: String },
}

impl Player {
    pub fn display_name(&self) -> &str {
        match self {
            Player::User { names, .. } => &names.international,
            Player::Guest { name } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRef {
    pub rel: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Names {
    pub international: String,
    #[serde(default)]
    pub japanese: Option<String>,
}

/// One response page of a paginated collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn next_uri(&self) -> Option<&str> {
        self.pagination
            .as_ref()?
            .links
            .iter()
            .find(|link| link.rel == "next")
            .map(|link| link.uri.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub uri: String,
}

/// Single-resource envelope (`{ "data": ... }`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

// Catalog resources used to pick a leaderboard

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    pub names: Names,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `per-game` or `per-level`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub variables: Option<Envelope<Vec<Variable>>>,
}

impl Category {
    pub fn is_full_game(&self) -> bool {
        self.kind == "per-game"
    }

    /// Embedded variables that split the leaderboard into sub-categories.
    pub fn subcategory_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .flat_map(|v| v.data.iter())
            .filter(|v| v.is_subcategory)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(rename = "is-subcategory", default)]
    pub is_subcategory: bool,
    pub values: VariableValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableValues {
    #[serde(default)]
    pub values: BTreeMap<String, VariableValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableValue {
    pub label: String,
}

/// A required sub-category choice: runs must select `value_id` for `variable_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableConstraint {
    pub variable_id: String,
    pub value_id: String,
}

impl VariableConstraint {
    pub fn new(variable_id: impl Into<String>, value_id: impl Into<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
            value_id: value_id.into(),
        }
    }
}

impl std::str::FromStr for VariableConstraint {
    type Err = String;

    /// Parses `VARIABLE=VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((var, val)) if !var.trim().is_empty() && !val.trim().is_empty() => {
                Ok(Self::new(var.trim(), val.trim()))
            }
            _ => Err(format!("expected VARIABLE=VALUE, got '{}'", s)),
        }
    }
}

/// The leaderboard picked by the (external) selection step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardSelection {
    pub game_id: String,
    #[serde(default)]
    pub level_id: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub variables: Vec<(String, String)>,
}

impl LeaderboardSelection {
    pub fn constraints(&self) -> Vec<VariableConstraint> {
        self.variables
            .iter()
            .map(|(var, val)| VariableConstraint::new(var.as_str(), val.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBEDDED_RUN: &str = r#"{
        "id": "y8dwozoj",
        "weblink": "https://www.speedrun.com/run/y8dwozoj",
        "date": "2019-10-19",
        "submitted": "2019-10-20T08:15:00Z",
        "times": { "primary": "PT22M59S", "primary_t": 1379.0 },
        "players": { "data": [
            { "rel": "user", "id": "x7q9", "names": { "international": "Skejven", "japanese": null } },
            { "rel": "guest", "name": "diggity" }
        ] },
        "values": { "p854r2vl": "5q8e7y3q" }
    }"#;

    #[test]
    fn decodes_embedded_run() {
        let run: Run = serde_json::from_str(EMBEDDED_RUN).unwrap();
        assert_eq!(run.date, NaiveDate::from_ymd_opt(2019, 10, 19));
        assert_eq!(run.primary_seconds(), Some(1379.0));
        assert_eq!(run.player_names(), Some(vec!["Skejven", "diggity"]));
        assert_eq!(run.values.get("p854r2vl").map(String::as_str), Some("5q8e7y3q"));
    }

    #[test]
    fn unembedded_players_have_no_names() {
        let run: Run = serde_json::from_str(
            r#"{ "id": "a", "date": null, "players": [ { "rel": "user", "id": "x", "uri": "u" } ] }"#,
        )
        .unwrap();
        assert!(run.date.is_none());
        assert!(run.player_names().is_none());
        assert!(run.primary_seconds().is_none());
    }

    #[test]
    fn page_finds_next_link() {
        let page: Page<Run> = serde_json::from_str(
            r#"{ "data": [], "pagination": { "offset": 0, "max": 20, "size": 0, "links": [
                { "rel": "prev", "uri": "https://x/runs?offset=0" },
                { "rel": "next", "uri": "https://x/runs?offset=40" }
            ] } }"#,
        )
        .unwrap();
        assert_eq!(page.next_uri(), Some("https://x/runs?offset=40"));
    }

    #[test]
    fn parses_constraint_argument() {
        let c: VariableConstraint = "var1=valA".parse().unwrap();
        assert_eq!(c, VariableConstraint::new("var1", "valA"));
        assert!("var1".parse::<VariableConstraint>().is_err());
        assert!("=valA".parse::<VariableConstraint>().is_err());
    }

    #[test]
    fn subcategory_variables_skip_plain_variables() {
        let cat: Category = serde_json::from_str(
            r#"{ "id": "c1", "name": "Any%", "type": "per-game", "variables": { "data": [
                { "id": "v1", "name": "Platform", "is-subcategory": true,
                  "values": { "values": { "a": { "label": "PC" }, "b": { "label": "Console" } } } },
                { "id": "v2", "name": "Emulator", "is-subcategory": false,
                  "values": { "values": {} } }
            ] } }"#,
        )
        .unwrap();
        let subs: Vec<&str> = cat.subcategory_variables().map(|v| v.id.as_str()).collect();
        assert_eq!(subs, vec!["v1"]);
        assert!(cat.is_full_game());
    }
}
