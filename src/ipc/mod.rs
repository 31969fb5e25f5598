//! Inter-process bus subsystem.
//!
//! # Data Flow
//! ```text
//! caller (gateway, tests, other services)
//!     → bus.rs (destination name → owner's queue)
//!     → dispatcher.rs (path + interface + member → coordinator)
//!     → Handling::Handled(reply) | Handling::NotHandled
//!     → bus.rs (method return or unknown-method error)
//! ```
//!
//! # Design Decisions
//! - The dispatcher is the only task running coordinator operations
//! - Its wait is bounded so deferred signal requests are never starved
//! - Unknown calls are declined, not treated as errors

pub mod bus;
pub mod dispatcher;
pub mod message;

pub use bus::{Bus, BusError, Endpoint, Incoming};
pub use dispatcher::Dispatcher;
pub use message::{Handling, Method, MethodCall, Reply, INTROSPECTABLE_INTERFACE, INTROSPECTION_XML, SERVICE_INTERFACE};
