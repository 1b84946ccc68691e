#![forbid(unsafe_code)]

pub mod gateway;
pub mod http;
pub mod memory;

pub use gateway::{
    ActivityGateway, ProgressionGateway, Remote, RemoteError, SectionCompletion, SectionGateway,
    XpHistoryGateway,
};
pub use http::{HttpConfig, HttpConfigError, HttpGateway};
pub use memory::{ActivityRecord, CallCounts, InMemoryBackend, Operation};
