mod error;
mod markup;
mod requests;
mod text_manipulators;
mod trajectory;

pub mod config;
pub mod poller;
pub mod session_jar;
pub mod trajectory_client;
pub mod trajectory_extractors;

pub use error::ApiError;
pub use markup::MarkupFragment;
pub use poller::{PollOutcome, TrajectoryPoller, TrajectorySensor};
pub use trajectory::{Trajectory, TrajectoryFields};
pub use trajectory_client::{ClientOptions, Credentials, VerkeerscentrumClient};

pub type Result<T> = std::result::Result<T, ApiError>;
