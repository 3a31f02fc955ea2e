pub mod admin;
pub mod leave;
pub mod statistics;
pub mod transition;
pub mod users;
