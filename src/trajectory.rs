use serde::Serialize;
use serde_json::{Map, Value};

/// Field mapping handed to consumers that want a record without the type,
/// keyed `id`, `name`, `description`, `actual_travel_time` and `delay`.
pub type TrajectoryFields = Map<String, Value>;

/// A route saved on the user's Verkeerscentrum account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trajectory {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Current travel time in minutes.
    pub actual_travel_time: Option<u32>,
    /// Minutes on top of the usual travel time, 0 when the site shows no delay.
    pub delay: u32,
}

impl Trajectory {
    pub fn to_fields(&self) -> TrajectoryFields {
        let mut fields = Map::new();
        fields.insert("id".to_string(), self.id.clone().into());
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert("description".to_string(), self.description.clone().into());
        fields.insert(
            "actual_travel_time".to_string(),
            self.actual_travel_time.into(),
        );
        fields.insert("delay".to_string(), self.delay.into());
        fields
    }

    /// Label used when offering the trajectory for selection, `"<description> (<name>)"`.
    pub fn option_label(&self) -> String {
        format!(
            "{} ({})",
            self.description.as_deref().unwrap_or("?"),
            self.name.as_deref().unwrap_or("?")
        )
    }
}
