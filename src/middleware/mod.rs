pub mod auth;
pub mod json;

pub use auth::{staff_auth_middleware, StaffUser};
pub use json::{Validate, ValidJson, ValidPath, ValidQuery};
