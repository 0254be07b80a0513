pub mod config;
pub mod controller;
pub mod events;
pub mod lifecycle;
pub mod registration;

mod checkin;
mod poller;
mod updates;
