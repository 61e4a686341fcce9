//! Routing: route surface, guard and navigator

pub mod guard;
pub mod navigator;
pub mod route;

pub use guard::{GuardDecision, RouteGuard};
pub use navigator::Navigator;
pub use route::Route;
