//! Assistant fulfillment webhook: wire schema, dispatch, and replies.

pub mod dispatcher;
pub mod envelope;
pub mod response;
pub mod routes;
pub mod schema;

pub use dispatcher::{Dispatch, DispatchState, IntentDispatcher, Rejection};
pub use envelope::IntentEnvelope;
pub use response::{OutgoingEnvelope, ResponseBuilder, SUGGESTION_CHIPS};
pub use routes::webhook_routes;
