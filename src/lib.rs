//! Works out where a request comes from and which local community it
//! belongs to.
//!
//! [`state::LocationResolver`] always yields a [`model::Location`], falling
//! back through a saved cookie, edge network headers, an IP lookup and a
//! fixed default. [`state::CommunityMatcher`] then maps that location onto
//! the community catalog.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod state;
