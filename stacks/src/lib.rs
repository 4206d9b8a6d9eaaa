pub mod analytics;
pub mod assertions;
pub mod context;
pub mod suppressions;
pub mod tagging;
pub mod template;

pub use analytics::AnalyticsStack;
pub use context::Context;
pub use tagging::{TaggingOutputs, TaggingStack};
pub use template::Template;
