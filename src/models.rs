use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    /// Student number; doubles as the login name.
    #[schema(example = "20240101")]
    pub username: String,
    pub password: String,
    #[schema(example = "Alice Zhang")]
    pub display_name: String,
    /// Class the student belongs to, snapshotted onto every leave record.
    #[schema(example = "CS-2401")]
    pub class_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    /// Name stamped into `approver` on workflow transitions.
    pub display_name: String,
    /// Role ids; decoded to the typed `Role` enum at the boundary.
    pub roles: Vec<u8>,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
