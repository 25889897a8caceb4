//! gRPC services.

mod channel;

pub use channel::ChannelServiceImpl;
