pub mod protocol;
mod session;

pub use protocol::{Action, Request, RequestQuery, Response, ResponseData};
pub use session::Session;
