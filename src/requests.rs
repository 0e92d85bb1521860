use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Response};

use crate::session_jar::SessionJar;

pub struct RequestClient {
    client: Client,
    jar: Arc<SessionJar>,
}

impl RequestClient {
    pub fn new(accept_invalid_certs: bool) -> reqwest::Result<Self> {
        let jar = Arc::new(SessionJar::new());
        let client = ClientBuilder::new()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self { client, jar })
    }

    pub fn jar(&self) -> &SessionJar {
        &self.jar
    }

    pub async fn fetch_url_response(&self, url: &str) -> reqwest::Result<Response> {
        self.client.get(url).send().await
    }

    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> reqwest::Result<Response> {
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(form)
            .send()
            .await
    }
}
