pub mod health;
pub mod jobs;
pub mod photos;
pub mod progress;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Caller identity. Authentication is out of scope; the identity arrives
/// as an explicit parameter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    pub user_id: Uuid,
}
