//! School management backend: records attendance, participation, grades,
//! homework and messages, and predicts each student's final grade from
//! their recorded data.

pub mod config;
pub mod data;
pub mod database;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod notifications;
pub mod password;
pub mod routes;
