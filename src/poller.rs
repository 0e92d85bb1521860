//! Periodic refresh of the selected trajectories.
//!
//! This sits outside the client: it decides how often to fetch, what to do
//! with refused credentials and how the data is presented as sensors.

use std::collections::HashMap;
use std::time::Duration;

use log::{error, info, warn};
use serde::Serialize;
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::ApiError;
use crate::trajectory::Trajectory;
use crate::trajectory_client::{Credentials, VerkeerscentrumClient};

pub const APP_NAME: &str = "Vlaams Verkeerscentrum";
const SENSOR_ID_PREFIX: &str = "vlaams_verkeerscentrum";
const TRAVEL_TIME_UNIT: &str = "min";
const INVALID_CREDENTIALS_MESSAGE: &str = "Please check your credentials and try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Fresh data for the selected trajectories that the account still has.
    Updated(HashMap<String, Trajectory>),
    /// The fetch failed for another reason than the credentials. The last
    /// good data is kept and the credentials stay in place.
    UpdateFailed(String),
    /// The site refused the credentials; polling stops until they are replaced.
    CredentialsRejected,
    /// Polling was stopped earlier by refused credentials.
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorAttributes {
    pub trajectory_id: String,
    pub description: Option<String>,
    pub name: Option<String>,
    pub delay: u32,
}

/// Travel time of one trajectory, shaped the way a home automation sensor expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrajectorySensor {
    pub name: String,
    pub unique_id: String,
    pub state: Option<u32>,
    pub unit_of_measurement: &'static str,
    pub attributes: SensorAttributes,
    pub available: bool,
}

impl TrajectorySensor {
    fn new(trajectory_id: &str, trajectory: &Trajectory, available: bool) -> Self {
        Self {
            name: format!(
                "{APP_NAME} {}",
                trajectory.description.as_deref().unwrap_or(trajectory_id)
            ),
            unique_id: format!("{SENSOR_ID_PREFIX}_{trajectory_id}"),
            state: trajectory.actual_travel_time,
            unit_of_measurement: TRAVEL_TIME_UNIT,
            attributes: SensorAttributes {
                trajectory_id: trajectory_id.to_string(),
                description: trajectory.description.clone(),
                name: trajectory.name.clone(),
                delay: trajectory.delay,
            },
            available,
        }
    }
}

pub struct TrajectoryPoller {
    client: VerkeerscentrumClient,
    trajectory_ids: Vec<String>,
    data: HashMap<String, Trajectory>,
    last_update_success: bool,
    halted: bool,
}

impl TrajectoryPoller {
    pub fn new(client: VerkeerscentrumClient, trajectory_ids: Vec<String>) -> Self {
        Self {
            client,
            trajectory_ids,
            data: HashMap::new(),
            last_update_success: false,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    pub fn data(&self) -> &HashMap<String, Trajectory> {
        &self.data
    }

    /// One update cycle: a single listing fetch, narrowed down to the selected ids.
    pub async fn refresh(&mut self) -> PollOutcome {
        if self.halted {
            return PollOutcome::Halted;
        }

        match self.client.get_user_trajectories().await {
            Ok(trajectories) => {
                let data = select_tracked(trajectories, &self.trajectory_ids);
                if data.len() < self.trajectory_ids.len() {
                    warn!(
                        "{} of {} selected trajectories not found on the account",
                        self.trajectory_ids.len() - data.len(),
                        self.trajectory_ids.len()
                    );
                }
                self.data = data.clone();
                self.last_update_success = true;
                PollOutcome::Updated(data)
            }
            Err(ApiError::InvalidCredentials) => {
                error!("Invalid credentials for {}", self.client.email());
                error!("{APP_NAME} - Invalid credentials: {INVALID_CREDENTIALS_MESSAGE}");
                self.last_update_success = false;
                self.halted = true;
                PollOutcome::CredentialsRejected
            }
            Err(err) => {
                warn!("Error fetching data: {err}");
                self.last_update_success = false;
                PollOutcome::UpdateFailed(format!("Error fetching data: {err}"))
            }
        }
    }

    /// Installs new credentials and lets polling resume.
    pub fn reset_credentials(&mut self, credentials: Credentials) {
        self.client.set_credentials(credentials);
        self.halted = false;
    }

    /// One sensor per selected trajectory that has been seen at least once.
    pub fn sensors(&self) -> Vec<TrajectorySensor> {
        self.trajectory_ids
            .iter()
            .filter_map(|id| {
                self.data
                    .get(id)
                    .map(|trajectory| TrajectorySensor::new(id, trajectory, self.last_update_success))
            })
            .collect()
    }

    /// Refreshes every `period` until the credentials are refused.
    pub async fn run(&mut self, period: Duration) {
        let mut ticker = poll_ticker(period);
        loop {
            ticker.tick().await;
            match self.refresh().await {
                PollOutcome::Updated(_) => {
                    for sensor in self.sensors() {
                        match sensor.state {
                            Some(minutes) => info!(
                                "{}: {} {} (delay {} {})",
                                sensor.name,
                                minutes,
                                sensor.unit_of_measurement,
                                sensor.attributes.delay,
                                sensor.unit_of_measurement
                            ),
                            None => info!("{}: travel time unknown", sensor.name),
                        }
                    }
                }
                PollOutcome::UpdateFailed(_) => {}
                PollOutcome::CredentialsRejected | PollOutcome::Halted => return,
            }
        }
    }

    pub fn into_client(self) -> VerkeerscentrumClient {
        self.client
    }
}

/// Ticks every `period`. A cycle that overruns pushes the next one back
/// instead of firing the missed ticks in a burst.
fn poll_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn select_tracked(trajectories: Vec<Trajectory>, ids: &[String]) -> HashMap<String, Trajectory> {
    trajectories
        .into_iter()
        .filter_map(|trajectory| {
            let id = trajectory.id.clone()?;
            ids.contains(&id).then_some((id, trajectory))
        })
        .collect()
}
