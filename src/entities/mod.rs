pub mod artist;
pub mod show;
pub mod venue;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered genre tags, stored as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Genres(pub Vec<String>);
