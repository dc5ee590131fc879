mod chat;
mod health;

pub use chat::{chat, chat_stream, NDJSON_CONTENT_TYPE, REQUEST_ID_HEADER};
pub use health::{health_check, root};
