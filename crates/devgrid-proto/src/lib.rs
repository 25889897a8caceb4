//! Generated gRPC code and converters for DevGrid.
//!
//! This crate contains:
//! - Generated protobuf message types
//! - Generated gRPC service stubs (client and server)
//! - Converters between proto types and domain types

pub mod convert;

/// Generated protobuf types and services.
pub mod pb {
    // Include the generated code
    // The path matches the proto package: devgrid.v1
    include!("gen/devgrid.v1.rs");
}

// Re-export commonly used types
pub use pb::channel_service_client::ChannelServiceClient;
pub use pb::channel_service_server::{ChannelService, ChannelServiceServer};
