//! Domain layer: payment types, routing state, health policy and the ports
//! implemented by the infrastructure adapters.

pub mod health;
pub mod payment;
pub mod ports;
pub mod route;
pub mod summary;
