pub mod session;
pub mod worker;

pub use session::{GenerationRequest, ModelFlag, Session};
pub use worker::{Job, Worker};
