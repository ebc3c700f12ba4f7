pub mod builder;
pub mod frontend;
pub mod handler;
pub mod listener;

pub use builder::ServerBuilder;
pub use frontend::Frontend;
pub use handler::RequestHandler;
pub use listener::{parse_bind, Accept};
