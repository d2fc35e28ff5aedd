//! Business logic services

pub mod estimator;
pub mod geo;
pub mod mock;
pub mod packing;
pub mod planner;
pub mod routing;
pub mod vrp;
