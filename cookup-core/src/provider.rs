//! Recipe provider contract and the hosted API's wire format.
//!
//! The core never performs I/O: platform shells implement
//! [`RecipeProvider`] (the web crate over `fetch`) and use
//! [`SpoonacularEndpoints`] to build request URLs and decode responses.
use std::cell::Cell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::recipes::RecipeSummary;
use crate::store::lenient;

pub const DEFAULT_API_BASE: &str = "https://api.spoonacular.com/";
pub const SEARCH_PAGE_SIZE: u32 = 18;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("recipe API credential is not configured")]
    MissingCredential,
    #[error("network error: {0}")]
    Network(String),
    #[error("recipe API returned HTTP {0}")]
    Status(u16),
    #[error("recipe API response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid recipe API url: {0}")]
    Url(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub cuisines: Vec<String>,
    pub offset: u32,
    pub number: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            cuisines: Vec::new(),
            offset: 0,
            number: SEARCH_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    /// Query for the 1-based `page` of results.
    #[must_use]
    pub fn page(text: impl Into<String>, cuisines: Vec<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            cuisines,
            offset: page.saturating_sub(1).saturating_mul(SEARCH_PAGE_SIZE),
            number: SEARCH_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub results: Vec<RecipeSummary>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    /// Display line, e.g. "2 cups flour".
    #[serde(default)]
    pub original: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub step: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<InstructionStep>,
}

#[async_trait(?Send)]
pub trait RecipeProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError>;
    async fn detail(&self, id: u64) -> Result<RecipeDetail, ProviderError>;
    /// One random recipe; the daily mission source.
    async fn random_recipe(&self) -> Result<RecipeSummary, ProviderError>;
}

/// URL builder and response decoder for the hosted recipe API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoonacularEndpoints {
    base: Url,
    api_key: String,
}

impl SpoonacularEndpoints {
    /// # Errors
    ///
    /// [`ProviderError::MissingCredential`] if `api_key` is blank.
    pub fn new(api_key: &str) -> Result<Self, ProviderError> {
        Self::with_base(DEFAULT_API_BASE, api_key)
    }

    /// # Errors
    ///
    /// Missing credential or an unparsable base URL.
    pub fn with_base(base: &str, api_key: &str) -> Result<Self, ProviderError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredential);
        }
        Ok(Self {
            base: Url::parse(base)?,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        let mut url = self.base.join(path)?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        Ok(url)
    }

    /// # Errors
    ///
    /// Only if the endpoint path cannot be joined onto the base URL.
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let mut url = self.endpoint("recipes/complexSearch")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("number", &query.number.to_string())
                .append_pair("offset", &query.offset.to_string())
                .append_pair("addRecipeInformation", "true");
            if !query.cuisines.is_empty() {
                pairs.append_pair("cuisine", &query.cuisines.join(","));
            }
            let text = query.text.trim();
            if !text.is_empty() {
                pairs.append_pair("query", text);
            }
        }
        Ok(url)
    }

    /// # Errors
    ///
    /// Only if the endpoint path cannot be joined onto the base URL.
    pub fn detail_url(&self, id: u64) -> Result<Url, ProviderError> {
        self.endpoint(&format!("recipes/{id}/information"))
    }

    /// # Errors
    ///
    /// Only if the endpoint path cannot be joined onto the base URL.
    pub fn random_url(&self) -> Result<Url, ProviderError> {
        let mut url = self.endpoint("recipes/random")?;
        url.query_pairs_mut().append_pair("number", "1");
        Ok(url)
    }

    /// # Errors
    ///
    /// [`ProviderError::Decode`] if the body is not a JSON object.
    pub fn decode_search(body: &str) -> Result<SearchPage, ProviderError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Ingredients and the first instruction set's steps.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Decode`] if the body is not valid JSON.
    pub fn decode_detail(body: &str) -> Result<RecipeDetail, ProviderError> {
        let value: Value = serde_json::from_str(body)?;
        let ingredients = value
            .get("extendedIngredients")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let steps = value
            .pointer("/analyzedInstructions/0/steps")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Ok(RecipeDetail { ingredients, steps })
    }

    /// # Errors
    ///
    /// [`ProviderError::Decode`] when the body holds no recipe.
    pub fn decode_random(body: &str) -> Result<RecipeSummary, ProviderError> {
        #[derive(Deserialize)]
        struct RandomResponse {
            #[serde(default)]
            recipes: Vec<RecipeSummary>,
        }
        let response: RandomResponse = serde_json::from_str(body)?;
        response
            .recipes
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("random response held no recipes".into()))
    }
}

/// In-memory provider serving a fixed recipe list. Used by the scenario
/// runner and tests; `set_offline(true)` makes every call fail.
#[derive(Debug, Default)]
pub struct FixtureProvider {
    recipes: Vec<RecipeSummary>,
    offline: Cell<bool>,
    calls: Cell<u32>,
}

impl FixtureProvider {
    #[must_use]
    pub fn new(recipes: Vec<RecipeSummary>) -> Self {
        Self {
            recipes,
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Number of provider calls made so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    fn begin(&self) -> Result<(), ProviderError> {
        self.calls.set(self.calls.get().saturating_add(1));
        if self.offline.get() {
            Err(ProviderError::Network("fixture provider offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl RecipeProvider for FixtureProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        self.begin()?;
        let needle = query.text.trim().to_lowercase();
        let matches: Vec<&RecipeSummary> = self
            .recipes
            .iter()
            .filter(|r| needle.is_empty() || r.title.to_lowercase().contains(&needle))
            .filter(|r| {
                query.cuisines.is_empty()
                    || r.cuisines
                        .iter()
                        .any(|c| query.cuisines.iter().any(|q| q.eq_ignore_ascii_case(c)))
            })
            .collect();
        let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let take = usize::try_from(query.number).unwrap_or(usize::MAX);
        Ok(SearchPage {
            results: matches.into_iter().skip(skip).take(take).cloned().collect(),
            total_results: Some(total),
        })
    }

    async fn detail(&self, id: u64) -> Result<RecipeDetail, ProviderError> {
        self.begin()?;
        if self.recipes.iter().any(|r| r.id == id) {
            Ok(RecipeDetail::default())
        } else {
            Err(ProviderError::Status(404))
        }
    }

    async fn random_recipe(&self) -> Result<RecipeSummary, ProviderError> {
        self.begin()?;
        let count = u32::try_from(self.recipes.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return Err(ProviderError::Status(404));
        }
        let idx = usize::try_from(self.calls.get() % count).unwrap_or(0);
        self.recipes
            .get(idx)
            .cloned()
            .ok_or(ProviderError::Status(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn blank_credentials_are_rejected() {
        assert_eq!(
            SpoonacularEndpoints::new("  ").unwrap_err(),
            ProviderError::MissingCredential
        );
    }

    #[test]
    fn search_url_carries_filters() {
        let endpoints = SpoonacularEndpoints::new("k3y").unwrap();
        let query = SearchQuery::page(" pasta bake ", vec!["italian".into(), "greek".into()], 3);
        let url = endpoints.search_url(&query).unwrap();
        assert_eq!(url.path(), "/recipes/complexSearch");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("apiKey".into(), "k3y".into())));
        assert!(pairs.contains(&("offset".into(), "36".into())));
        assert!(pairs.contains(&("cuisine".into(), "italian,greek".into())));
        assert!(pairs.contains(&("query".into(), "pasta bake".into())));
    }

    #[test]
    fn detail_and_random_urls() {
        let endpoints = SpoonacularEndpoints::new("k").unwrap();
        assert_eq!(
            endpoints.detail_url(42).unwrap().path(),
            "/recipes/42/information"
        );
        assert!(
            endpoints
                .random_url()
                .unwrap()
                .query()
                .is_some_and(|q| q.contains("number=1"))
        );
    }

    #[test]
    fn decodes_detail_and_random_bodies() {
        let detail = SpoonacularEndpoints::decode_detail(
            r#"{"extendedIngredients":[{"name":"flour","original":"2 cups flour"}],
                "analyzedInstructions":[{"steps":[{"number":1,"step":"Mix."}]}]}"#,
        )
        .unwrap();
        assert_eq!(detail.ingredients[0].original, "2 cups flour");
        assert_eq!(detail.steps[0].step, "Mix.");

        assert!(SpoonacularEndpoints::decode_random(r#"{"recipes":[]}"#).is_err());
        let recipe =
            SpoonacularEndpoints::decode_random(r#"{"recipes":[{"id":9,"title":"Toast"}]}"#)
                .unwrap();
        assert_eq!(recipe.id, 9);
    }

    #[test]
    fn fixture_provider_filters_and_fails_on_demand() {
        let provider = FixtureProvider::new(vec![
            RecipeSummary {
                id: 1,
                title: "Pad Thai".into(),
                cuisines: vec!["Thai".into()],
                ..RecipeSummary::default()
            },
            RecipeSummary {
                id: 2,
                title: "Paella".into(),
                cuisines: vec!["Spanish".into()],
                ..RecipeSummary::default()
            },
        ]);
        let page = block_on(provider.search(&SearchQuery {
            cuisines: vec!["thai".into()],
            ..SearchQuery::default()
        }))
        .unwrap();
        assert_eq!(page.total_results, Some(1));
        assert_eq!(page.results[0].id, 1);

        provider.set_offline(true);
        assert!(matches!(
            block_on(provider.random_recipe()),
            Err(ProviderError::Network(_))
        ));
        assert_eq!(provider.calls(), 2);
    }
}
