pub mod health;
pub mod conversations;
pub mod messages;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub(crate) fn parse_conversation_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))
}
