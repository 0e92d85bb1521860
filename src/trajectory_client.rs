//! Client for the "mijn trajecten" pages of verkeerscentrum.be.
//!
//! The site has no API. The client logs in through the regular Drupal login
//! form, keeps the session cookie in its own jar and scrapes the trajectories
//! dashboard. It logs in again whenever the session cookie is missing or has
//! expired, right before fetching.

use std::fmt;

use chrono::Utc;
use log::{debug, info, warn};
use scraper::Html;

use crate::Result;
use crate::error::ApiError;
use crate::markup::MarkupFragment;
use crate::requests::RequestClient;
use crate::trajectory::{Trajectory, TrajectoryFields};
use crate::trajectory_extractors::{
    extract_actual_travel_time, extract_delay, extract_description, extract_title,
    extract_trajectory_id,
};

pub const DEFAULT_BASE_URL: &str = "https://www.verkeerscentrum.be";
const LOGIN_PATH: &str = "/user/login";
const USER_TRAJECTORIES_PATH: &str = "/mijn-trajecten";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accept_invalid_certs: false,
        }
    }
}

pub struct VerkeerscentrumClient {
    credentials: Credentials,
    base_url: String,
    requests: RequestClient,
}

impl fmt::Debug for VerkeerscentrumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerkeerscentrumClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VerkeerscentrumClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    pub fn with_options(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let requests = RequestClient::new(options.accept_invalid_certs)?;
        Ok(Self {
            credentials,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            requests,
        })
    }

    pub fn email(&self) -> &str {
        &self.credentials.email
    }

    /// Swaps the account credentials. The current session is dropped, so the
    /// next fetch logs in with the new ones.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.requests.jar().clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts the login form. A non-success status and a page without the
    /// account link both mean the credentials were refused.
    pub async fn login(&mut self) -> Result<()> {
        info!("Logging in to Verkeerscentrum as {}", self.credentials.email);
        let form = [
            ("form_id", "user_login_form"),
            ("op", "Inloggen"),
            ("name", self.credentials.email.as_str()),
            ("pass", self.credentials.password.as_str()),
        ];
        let response = self.requests.post_form(&self.url(LOGIN_PATH), &form).await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Login rejected with status {status}");
            return Err(ApiError::InvalidCredentials);
        }

        let body = response.text().await?;
        if !is_logged_in_page(&body) {
            warn!("Login page returned without an account link, credentials refused");
            return Err(ApiError::InvalidCredentials);
        }

        info!("Logged in to Verkeerscentrum");
        Ok(())
    }

    /// Whether the jar holds a session cookie that has not expired yet.
    pub fn session_is_valid(&self) -> bool {
        self.requests.jar().session_is_valid(Utc::now())
    }

    /// Every trajectory saved on the account, logging in first if needed.
    ///
    /// A listing answered with a non-success status yields an empty list;
    /// transport errors and refused credentials are returned as errors.
    pub async fn get_user_trajectories(&mut self) -> Result<Vec<Trajectory>> {
        if self.session_is_valid() {
            debug!("Reusing existing session");
        } else {
            self.login().await?;
        }

        let response = self
            .requests
            .fetch_url_response(&self.url(USER_TRAJECTORIES_PATH))
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Trajectories page returned status {status}, no trajectories available");
            return Ok(vec![]);
        }

        let html = response.text().await?;
        let trajectories = parse_trajectories_from_html(&html);
        info!("Fetched {} trajectories", trajectories.len());
        Ok(trajectories)
    }

    pub async fn find_user_trajectory(&mut self, trajectory_id: &str) -> Result<Option<Trajectory>> {
        let trajectories = self.get_user_trajectories().await?;
        Ok(trajectories
            .into_iter()
            .find(|trajectory| trajectory.id.as_deref() == Some(trajectory_id)))
    }

    /// Looks up one trajectory and returns it as a plain field mapping.
    pub async fn get_user_trajectory(
        &mut self,
        trajectory_id: &str,
    ) -> Result<Option<TrajectoryFields>> {
        let trajectory = self.find_user_trajectory(trajectory_id).await?;
        if trajectory.is_none() {
            debug!("Trajectory {trajectory_id} not found on account");
        }
        Ok(trajectory.map(|trajectory| trajectory.to_fields()))
    }

    /// Ends the client's life. Session cookies are forgotten and the
    /// connection pool is released when the client is dropped here.
    pub fn close(self) {
        self.requests.jar().clear();
        debug!("Closed Verkeerscentrum client for {}", self.credentials.email);
    }
}

/// The account link only shows up in the header for a logged-in user.
pub fn is_logged_in_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    document
        .root_element()
        .first_match("a", Some("account"))
        .is_some()
}

pub fn parse_trajectories_from_html(html: &str) -> Vec<Trajectory> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .all_matches("div", Some("user-trajectory"))
        .iter()
        .map(|element| Trajectory {
            id: extract_trajectory_id(element),
            name: extract_title(element),
            description: extract_description(element),
            actual_travel_time: extract_actual_travel_time(element),
            delay: extract_delay(element).unwrap_or(0),
        })
        .collect()
}
