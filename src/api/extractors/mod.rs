//! Custom request extractors.

mod client;
mod locale;
mod validated_json;

pub use client::ClientInfo;
pub use locale::Locale;
pub use validated_json::ValidatedJson;
