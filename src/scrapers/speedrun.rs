//! speedrun.com REST client
//!
//! Runs are pulled exhaustively through the paginator; catalog lookups
//! (games, levels, categories) are single requests.

use anyhow::Result;

use super::fetcher::Fetcher;
use super::paginator::{collection_url, fetch_all};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Category, Envelope, Game, LeaderboardSelection, Level, Run};

/// Query for one leaderboard's verified runs, oldest submission first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunsQuery {
    pub game: String,
    pub category: String,
    pub level: Option<String>,
    /// Page size hint (`max`); the API default applies when unset
    pub page_size: Option<u32>,
}

impl RunsQuery {
    pub fn new(game: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Option<String>) -> Self {
        self.level = level;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn from_selection(selection: &LeaderboardSelection) -> Self {
        Self::new(selection.game_id.as_str(), selection.category_id.as_str())
            .with_level(selection.level_id.clone())
    }

    /// Query parameters, including the ordering the timeline relies on.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut qp: Vec<(&'static str, String)> = Vec::with_capacity(8);
        qp.push(("game", self.game.clone()));
        qp.push(("category", self.category.clone()));
        if let Some(level) = &self.level {
            qp.push(("level", level.clone()));
        }
        qp.push(("status", "verified".to_string()));
        qp.push(("orderby", "submitted".to_string()));
        qp.push(("direction", "asc".to_string()));
        qp.push(("embed", "players".to_string()));
        if let Some(max) = self.page_size {
            qp.push(("max", max.to_string()));
        }
        qp
    }
}

pub struct SpeedrunClient {
    fetcher: Fetcher,
    base_url: String,
    /// Applied to run queries that don't set their own page size
    page_size: Option<u32>,
}

impl SpeedrunClient {
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: None,
        }
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Fetcher::from_config(config)?, config.api_base.as_str())
            .with_page_size(config.page_size))
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        collection_url(&self.base_url, path, params)
    }

    /// Every run on the leaderboard, in the order the API returns them.
    pub async fn runs(&self, query: &RunsQuery) -> Result<Vec<Run>, ApiError> {
        let params = match query.page_size {
            Some(_) => query.params(),
            None => query.clone().with_page_size(self.page_size).params(),
        };
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let url = self.url("/runs", &borrowed)?;
        fetch_all(&self.fetcher, &url).await
    }

    /// Look up a game by id or abbreviation.
    pub async fn game(&self, id_or_abbreviation: &str) -> Result<Game, ApiError> {
        let url = self.url(&format!("/games/{}", id_or_abbreviation), &[])?;
        let env: Envelope<Game> = self.fetcher.get_json(&url).await?;
        Ok(env.data)
    }

    pub async fn levels(&self, game_id: &str) -> Result<Vec<Level>, ApiError> {
        let url = self.url(&format!("/games/{}/levels", game_id), &[])?;
        let env: Envelope<Vec<Level>> = self.fetcher.get_json(&url).await?;
        Ok(env.data)
    }

    /// Full-game (`per-game`) categories with their variables embedded.
    pub async fn full_game_categories(&self, game_id: &str) -> Result<Vec<Category>, ApiError> {
        let url = self.url(
            &format!("/games/{}/categories", game_id),
            &[("embed", "variables")],
        )?;
        let env: Envelope<Vec<Category>> = self.fetcher.get_json(&url).await?;
        Ok(env.data.into_iter().filter(Category::is_full_game).collect())
    }

    pub async fn level_categories(&self, level_id: &str) -> Result<Vec<Category>, ApiError> {
        let url = self.url(
            &format!("/levels/{}/categories", level_id),
            &[("embed", "variables")],
        )?;
        let env: Envelope<Vec<Category>> = self.fetcher.get_json(&url).await?;
        Ok(env.data)
    }
}
