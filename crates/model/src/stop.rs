use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{location::Location, ExampleData};

pub const STOP_NAME_MAX_LEN: usize = 128;

/// A bus stop. The stop owns its location: deleting the location deletes the
/// stop. The buses serving a stop are stored as a separate association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusStop {
    pub name: String,
    pub location: Id<Location>,
}

impl HasId for BusStop {
    type IdType = i32;
}

impl ExampleData for BusStop {
    fn example_data() -> Self {
        BusStop {
            name: "Raisdorf, Bahnhof".to_owned(),
            location: Id::new(1),
        }
    }
}
