//! Middleware layer.
//!
//! Cross-cutting concerns that run outside any one handler. The only
//! middleware this service needs is CORS: browser clients (the Expo app and
//! its web build) talk to the API from a different origin, so every response
//! must carry the allow headers and `OPTIONS` preflights must short-circuit
//! before routing.

mod cors;

pub use cors::Cors;
