// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require a bearer token.

pub mod login;   // POST /api/auth/login - authenticate and get tokens
pub mod refresh; // POST /api/auth/refresh - new access token from refresh token

pub use login::login;
pub use refresh::refresh;
