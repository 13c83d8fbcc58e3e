pub mod realtime;
pub mod streaming;

pub use realtime::{RealtimeAuth, TokenRequest};
pub use streaming::{
    LatencyMode, MuxProvider, PlaybackPolicy, StreamAsset, StreamSpec, StreamingProvider,
    WebhookEvent, WebhookKind,
};
