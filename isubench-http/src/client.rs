//! HTTP agent implementation

use crate::assets::AssetCache;
use crate::config::AgentConfig;
use crate::errors::{HttpError, HttpResult};
use crate::response::Response;
use reqwest::{multipart, redirect, Client, Request};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// One simulated browser session against the target
#[derive(Debug)]
pub struct Agent {
    client: Client,
    config: AgentConfig,
    pub(crate) assets: AssetCache,
}

impl Agent {
    /// Create an agent with a fresh cookie store
    pub fn new(config: AgentConfig) -> HttpResult<Self> {
        debug!(
            "Creating agent for {} with timeout: {:?}",
            config.base_url, config.timeout
        );

        // Scenarios assert on 302s themselves, so redirects are never followed
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()?;

        Ok(Self {
            client,
            config,
            assets: AssetCache::default(),
        })
    }

    /// Resolve a path against the base URL
    pub fn url(&self, path: &str) -> HttpResult<Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Build a GET request for `path`
    pub fn get(&self, path: &str) -> HttpResult<Request> {
        Ok(self.client.get(self.url(path)?).build()?)
    }

    /// Build a url-encoded POST request for `path`
    pub fn post_form(&self, path: &str, form: &[(&str, &str)]) -> HttpResult<Request> {
        Ok(self.client.post(self.url(path)?).form(form).build()?)
    }

    /// Build a multipart POST request for `path`
    pub fn post_multipart(&self, path: &str, form: multipart::Form) -> HttpResult<Request> {
        Ok(self.client.post(self.url(path)?).multipart(form).build()?)
    }

    /// Send `request` and buffer its body, giving up as soon as `cancel` fires
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: Request,
    ) -> HttpResult<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{} {}", method, url);

        let exchange = async {
            let res = self.client.execute(request).await?;
            let status = res.status();
            let headers = res.headers().clone();
            let body = res.bytes().await.map_err(HttpError::from);
            Ok::<_, HttpError>(Response::new(method, url, status, headers, body))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HttpError::Cancelled),
            res = exchange => res,
        }
    }
}
