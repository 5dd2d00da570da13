//! REST-Handler der Chimecast-API

pub mod auth;
pub mod raeume;
pub mod ws;
