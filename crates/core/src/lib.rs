//! Face check-in orchestration.
//!
//! A [`session::controller::Session`] owns the capture mode, the live
//! detection polling loop, the auto-submit debounce and the check-in /
//! registration request lifecycles. Detection engines, capture devices and
//! the verification backend plug in through the domain traits in
//! [`detection`], [`capture`] and [`backend`]; subscribers observe the
//! session through its single event channel.

pub mod backend;
pub mod capture;
pub mod detection;
pub mod session;
pub mod shared;
