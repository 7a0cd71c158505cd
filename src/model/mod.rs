mod api;
mod errors;
mod location;
mod providers;

pub use api::*;
pub use errors::*;
pub use location::*;
pub use providers::*;
