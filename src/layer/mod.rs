//! Tower layer that attaches a negotiator to requests

pub mod negotiation;

pub use negotiation::{NegotiationLayer, NegotiationService};
