pub mod emitter;
pub mod events;
