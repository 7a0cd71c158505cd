mod auth;
mod client_ip;
mod edge_geo;
mod location;
mod saved_location;

pub use auth::*;
pub use client_ip::*;
pub use edge_geo::*;
pub use location::*;
pub use saved_location::*;
