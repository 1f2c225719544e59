//! Command gateway façade
//!
//! Ties the classifier, the confirmation gate, and the transport into a
//! single dispatch surface for calling tools.

mod facade;

pub use facade::{CommandGateway, CommandRequest, Dispatch, GatewayStatus};
