// handlers/mod.rs - Two handler tiers
//
// Public (no auth) → Staff (bearer access token + staff flag re-checked per request)
pub mod public; // /api/auth/*
pub mod staff;  // /staff/*
