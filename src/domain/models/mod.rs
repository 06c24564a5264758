pub mod payload;

pub use payload::{Arg, Listener, Payload, SharedError, listener};
