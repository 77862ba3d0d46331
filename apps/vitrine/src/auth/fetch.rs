use crate::auth::error::AuthError;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, RequestBuilder};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;
use vitrine_iiif::{AccessToken, CapabilityDocument};

/// Fetches image-information documents, with and without a credential.
///
/// The same resource answers differently depending on the `Authorization`
/// header, so every request carries a fresh cache-busting query parameter and
/// explicit no-cache headers.
#[derive(Debug, Clone)]
pub struct InfoFetcher {
    client: Client,
}

impl InfoFetcher {
    pub fn new(http_timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|err| AuthError::Config(err.to_string()))?;
        Ok(Self { client })
    }

    fn info_url(resource_uri: &str) -> Result<Url, AuthError> {
        let base = resource_uri.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/info.json")).map_err(|err| {
            AuthError::Config(format!("invalid resource uri '{resource_uri}': {err}"))
        })?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        url.query_pairs_mut().append_pair("t", &millis.to_string());
        Ok(url)
    }

    fn uncached(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
    }

    /// Fetches the document a resource serves to anonymous clients.
    pub async fn fetch_info(&self, resource_uri: &str) -> Result<CapabilityDocument, AuthError> {
        let url = Self::info_url(resource_uri)?;
        debug!(url = %url, "fetching image information");
        let info_fetch = |reason: String| AuthError::InfoFetch {
            uri: resource_uri.to_string(),
            reason,
        };

        let response = self
            .uncached(url)
            .send()
            .await
            .map_err(|err| info_fetch(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(info_fetch(format!("unexpected status {status}")));
        }
        response
            .json::<CapabilityDocument>()
            .await
            .map_err(|err| info_fetch(format!("invalid body: {err}")))
    }

    /// Re-fetches the document with the access token attached.
    ///
    /// The token goes into the `Authorization` header verbatim; its format is
    /// the token service's business, not ours.
    pub async fn fetch_info_authorized(
        &self,
        resource_uri: &str,
        token: &AccessToken,
    ) -> Result<CapabilityDocument, AuthError> {
        let url = Self::info_url(resource_uri)?;
        debug!(url = %url, "fetching image information with credential");
        let authorization_failed = |reason: String| AuthError::AuthorizationFailed { reason };

        let response = self
            .uncached(url)
            .header(AUTHORIZATION, token.as_str())
            .send()
            .await
            .map_err(|err| authorization_failed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(authorization_failed(format!("unexpected status {status}")));
        }
        response
            .json::<CapabilityDocument>()
            .await
            .map_err(|err| authorization_failed(format!("invalid body: {err}")))
    }
}
