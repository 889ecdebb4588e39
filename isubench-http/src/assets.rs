//! Static asset crawling
//!
//! Collects the stylesheets, icons, scripts and images a page links to,
//! fetches every same-origin resource concurrently, and replays the
//! validators the target returned earlier so unchanged resources may come
//! back as `304 Not Modified`.

use crate::client::Agent;
use crate::errors::{HttpError, HttpResult};
use crate::response::Response;
use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::header::{HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

static ASSET_SELECTORS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    [
        (r#"link[rel~="stylesheet"][href], link[rel~="icon"][href]"#, "href"),
        ("script[src]", "src"),
        ("img[src]", "src"),
    ]
    .into_iter()
    .map(|(css, attr)| (Selector::parse(css).expect("asset selector is valid"), attr))
    .collect()
});

/// One fetched asset
#[derive(Debug)]
pub struct AssetResource {
    pub url: Url,
    pub response: HttpResult<Response>,
}

impl AssetResource {
    /// Path relative to the site root, e.g. `css/style.css`
    pub fn path(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }
}

#[derive(Debug, Clone, Default)]
struct Validators {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
}

/// Per-agent cache of the conditional-request validators seen for each asset
#[derive(Debug, Default)]
pub(crate) struct AssetCache {
    entries: Mutex<HashMap<Url, Validators>>,
}

impl AssetCache {
    fn get(&self, url: &Url) -> Option<Validators> {
        self.entries.lock().get(url).cloned()
    }

    fn store(&self, url: &Url, res: &Response) {
        let validators = Validators {
            etag: res.headers.get(ETAG).cloned(),
            last_modified: res.headers.get(LAST_MODIFIED).cloned(),
        };
        if validators.etag.is_some() || validators.last_modified.is_some() {
            self.entries.lock().insert(url.clone(), validators);
        }
    }
}

impl Agent {
    /// Fetch every asset linked from the HTML body of `res`
    ///
    /// Fails as a whole only when the page itself cannot be read; individual
    /// fetch failures are reported per resource.
    pub async fn process_html(
        &self,
        cancel: &CancellationToken,
        res: &Response,
    ) -> HttpResult<Vec<AssetResource>> {
        let html = match res.text() {
            Ok(text) => text,
            Err(HttpError::Cancelled) => return Err(HttpError::Cancelled),
            Err(e) => return Err(HttpError::BodyUnavailable(e.to_string())),
        };

        let urls = asset_urls(&res.url, &html);
        debug!("Crawling {} assets linked from {}", urls.len(), res.url);

        let fetches = urls.into_iter().map(|url| async move {
            let response = self.fetch_asset(cancel, &url).await;
            AssetResource { url, response }
        });

        Ok(join_all(fetches).await)
    }

    async fn fetch_asset(&self, cancel: &CancellationToken, url: &Url) -> HttpResult<Response> {
        let mut request = self.get(url.as_str())?;
        if let Some(validators) = self.assets.get(url) {
            let headers = request.headers_mut();
            if let Some(etag) = validators.etag {
                headers.insert(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = validators.last_modified {
                headers.insert(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let res = self.execute(cancel, request).await?;
        if res.status == StatusCode::OK {
            self.assets.store(url, &res);
        }
        Ok(res)
    }
}

/// Same-origin asset URLs linked from `html`, resolved against `base` and
/// de-duplicated; stylesheets and icons come first, then scripts, then images
pub fn asset_urls(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for (selector, attr) in ASSET_SELECTORS.iter() {
        for element in document.select(selector) {
            let Some(link) = element.value().attr(attr) else {
                continue;
            };
            let Ok(url) = base.join(link.trim()) else {
                continue;
            };
            if url.origin() == base.origin() && seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }

    urls
}
