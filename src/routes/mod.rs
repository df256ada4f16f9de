//! Router assembly: generated resource routes and the fixed service routes.

mod common;
pub mod resource;

pub use common::common_routes;
pub use resource::{AxumRouteTable, RouteName, RouteRegistrar, RouteTable};
