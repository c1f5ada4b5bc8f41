pub mod analyst;
pub mod message;

pub use analyst::{Analyst, Perspectives, SearchQuery};
pub use message::{Message, MessageRole, get_buffer_string};
