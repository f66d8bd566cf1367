pub mod encoding;
pub mod server;

pub use encoding::with_access_token;
pub use server::{routes, Server};
