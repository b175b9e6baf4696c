use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{location::Location, path::PathId, ExampleData};

pub const VEHICLE_NAME_MAX_LEN: usize = 10;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub name: String,
    /// The route used for along-route distance lookups. Fixed at creation.
    pub path_id: PathId,
    /// Current position. `None` until the first report or after the
    /// referenced location was deleted.
    pub location: Option<Id<Location>>,
}

impl HasId for Vehicle {
    type IdType = i32;
}

impl ExampleData for Vehicle {
    fn example_data() -> Self {
        Vehicle {
            name: "31".to_owned(),
            path_id: 1,
            location: Some(Id::new(1)),
        }
    }
}
