//! Type definitions for the HOS planning core.

pub mod duty;
pub mod error;
pub mod geo;
pub mod logday;
pub mod route;
pub mod rules;
pub mod trip;

pub use duty::*;
pub use error::*;
pub use geo::*;
pub use logday::*;
pub use route::*;
pub use rules::*;
pub use trip::*;
