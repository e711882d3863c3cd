use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use url::Url;

use crate::auth::handlers::VerifyResponse;
use crate::error::{AppError, AppResult};
use crate::gate::BACKEND_PREFIX;
use crate::models::{Favorite, Showtime, Status};

/// The calls the shell makes. Everything except `logout` goes through the
/// gated `/backend` namespace.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn movies(&self) -> AppResult<Vec<Showtime>>;
    async fn favorites(&self) -> AppResult<Vec<Favorite>>;
    async fn add_favorite(&self, title: &str) -> AppResult<()>;
    async fn remove_favorite(&self, title: &str) -> AppResult<()>;
    async fn status(&self) -> AppResult<Status>;
    async fn trigger_scrape(&self) -> AppResult<()>;
    async fn logout(&self) -> AppResult<()>;
}

/// Talks to the gate the way a browser does: same origin, cookie jar,
/// no API key.
pub struct HttpBackend {
    client: Client,
    origin: Url,
}

impl HttpBackend {
    pub fn new(origin: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self { client, origin })
    }

    /// Submit the passcode; on success the cookie lands in the client's jar.
    pub async fn login(&self, passcode: &str) -> AppResult<VerifyResponse> {
        let response = self
            .client
            .post(self.url(&["auth", "verify"])?)
            .json(&json!({ "passcode": passcode }))
            .send()
            .await?;
        Ok(expect_success(response)?.json().await?)
    }

    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration(format!("{} cannot be a base URL", self.origin)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/backend/<segments>`; each segment is percent-encoded.
    fn backend_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut all = vec![BACKEND_PREFIX.trim_start_matches('/')];
        all.extend_from_slice(segments);
        self.url(&all)
    }
}

fn expect_success(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::UpstreamStatus(status))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn movies(&self) -> AppResult<Vec<Showtime>> {
        let response = self.client.get(self.backend_url(&["movies"])?).send().await?;
        Ok(expect_success(response)?.json().await?)
    }

    async fn favorites(&self) -> AppResult<Vec<Favorite>> {
        let response = self
            .client
            .get(self.backend_url(&["favorites"])?)
            .send()
            .await?;
        Ok(expect_success(response)?.json().await?)
    }

    async fn add_favorite(&self, title: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.backend_url(&["favorites"])?)
            .json(&Favorite {
                movie_title: title.to_string(),
            })
            .send()
            .await?;
        expect_success(response)?;
        Ok(())
    }

    async fn remove_favorite(&self, title: &str) -> AppResult<()> {
        let response = self
            .client
            .delete(self.backend_url(&["favorites", title])?)
            .send()
            .await?;
        expect_success(response)?;
        Ok(())
    }

    async fn status(&self) -> AppResult<Status> {
        let response = self.client.get(self.backend_url(&["status"])?).send().await?;
        Ok(expect_success(response)?.json().await?)
    }

    async fn trigger_scrape(&self) -> AppResult<()> {
        let response = self.client.post(self.backend_url(&["scrape"])?).send().await?;
        expect_success(response)?;
        Ok(())
    }

    async fn logout(&self) -> AppResult<()> {
        let response = self.client.post(self.url(&["auth", "logout"])?).send().await?;
        expect_success(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(origin: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(origin).unwrap()).unwrap()
    }

    #[test]
    fn backend_urls_live_under_the_gate_prefix() {
        let url = backend("http://localhost:3000").backend_url(&["movies"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/backend/movies");
    }

    #[test]
    fn favorite_titles_are_percent_encoded() {
        let url = backend("http://localhost:3000/")
            .backend_url(&["favorites", "Ágnes / 2"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/backend/favorites/%C3%81gnes%20%2F%202"
        );
    }

    #[test]
    fn auth_urls_bypass_the_gate() {
        let url = backend("http://localhost:3000").url(&["auth", "logout"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/auth/logout");
    }
}
