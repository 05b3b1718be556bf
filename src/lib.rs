pub mod client;
pub mod db;
pub mod error;
pub mod notification;
pub mod reminder;
pub mod routes;
pub mod state;
pub mod workflow;
