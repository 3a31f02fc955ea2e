use sqlx::FromRow;

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // matches BIGINT UNSIGNED
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Student profile row; `advisor_id` is the advisor relationship the
/// listing scope joins against.
#[derive(FromRow)]
pub struct StudentProfile {
    pub user_id: u64,
    pub class_name: String,
    pub advisor_id: Option<u64>,
}
