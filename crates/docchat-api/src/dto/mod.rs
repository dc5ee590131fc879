mod request;
mod response;

pub use request::ChatQuery;
pub use response::{HealthResponse, RootResponse};
