use async_trait::async_trait;
use cookup_core::{
    ProviderError, RecipeDetail, RecipeProvider, RecipeSummary, SearchPage, SearchQuery,
    SpoonacularEndpoints,
};

/// Build-time API key; the client reports [`ProviderError::MissingCredential`]
/// on every call when it is absent.
const API_KEY: Option<&str> = option_env!("COOKUP_SPOONACULAR_KEY");

/// [`RecipeProvider`] over the browser `fetch` API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoonacularClient {
    endpoints: Option<SpoonacularEndpoints>,
}

impl Default for SpoonacularClient {
    fn default() -> Self {
        Self::from_key(API_KEY)
    }
}

impl SpoonacularClient {
    #[must_use]
    pub fn from_key(key: Option<&str>) -> Self {
        let endpoints = key
            .filter(|key| !key.trim().is_empty())
            .and_then(|key| match SpoonacularEndpoints::new(key) {
                Ok(endpoints) => Some(endpoints),
                Err(err) => {
                    log::warn!("recipe client disabled: {err}");
                    None
                }
            });
        Self { endpoints }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.endpoints.is_some()
    }

    fn endpoints(&self) -> Result<&SpoonacularEndpoints, ProviderError> {
        self.endpoints
            .as_ref()
            .ok_or(ProviderError::MissingCredential)
    }
}

#[cfg(target_arch = "wasm32")]
async fn get(url: &url::Url) -> Result<String, ProviderError> {
    let (status, body) = crate::dom::fetch_text(url.as_str())
        .await
        .map_err(|err| ProviderError::Network(crate::dom::js_error_message(&err)))?;
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(ProviderError::Status(status))
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[allow(clippy::unused_async)]
async fn get(_url: &url::Url) -> Result<String, ProviderError> {
    Err(ProviderError::Network(
        "fetch is only available in the browser".to_string(),
    ))
}

#[async_trait(?Send)]
impl RecipeProvider for SpoonacularClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        let url = self.endpoints()?.search_url(query)?;
        SpoonacularEndpoints::decode_search(&get(&url).await?)
    }

    async fn detail(&self, id: u64) -> Result<RecipeDetail, ProviderError> {
        let url = self.endpoints()?.detail_url(id)?;
        SpoonacularEndpoints::decode_detail(&get(&url).await?)
    }

    async fn random_recipe(&self) -> Result<RecipeSummary, ProviderError> {
        let url = self.endpoints()?.random_url()?;
        SpoonacularEndpoints::decode_random(&get(&url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn missing_key_reports_credential_error() {
        let client = SpoonacularClient::from_key(None);
        assert!(!client.is_configured());
        assert_eq!(
            block_on(client.random_recipe()),
            Err(ProviderError::MissingCredential)
        );
        let blank = SpoonacularClient::from_key(Some("  "));
        assert!(!blank.is_configured());
    }

    #[test]
    fn native_fetch_is_a_network_error() {
        let client = SpoonacularClient::from_key(Some("demo-key"));
        assert!(client.is_configured());
        let err = block_on(client.detail(42)).unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
