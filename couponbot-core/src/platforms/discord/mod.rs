pub mod runtime;
pub mod sink;

pub use runtime::DiscordPlatform;
pub use sink::DiscordSink;
