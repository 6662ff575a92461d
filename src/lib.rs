//! Vessel-to-cargo allocation for a small owned fleet.
//!
//! [`voyage`] prices one vessel on one cargo, [`charter`] prices handing a
//! committed cargo to a hired ship, and [`optimizer`] searches assignments
//! of cargoes to the fleet for the best portfolio profit.

pub mod assignment;
pub mod charter;
pub mod distance;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod scenario;
pub mod voyage;

pub use charter::{estimate_outsource, estimate_outsource_profit};
pub use distance::{DistanceTable, RouteDistance, FALLBACK_DISTANCE_NM};
pub use error::{AllocError, Result};
pub use models::*;
pub use optimizer::{candidate_count, optimize, PortfolioProblem};
pub use voyage::{evaluate_voyage, VoyageModel};
