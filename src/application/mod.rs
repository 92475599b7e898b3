pub mod dispatcher;
pub mod errors;
pub mod registry;
pub mod router;
pub mod scheduler;
