pub mod output;
pub mod progress;
pub mod prompt;
pub mod signals;

pub use output::{format_bytes, format_duration, OutputFormatter, OutputMode, ProgressAwareOutput};
pub use progress::ProgressManager;
pub use prompt::DialoguerPrompt;
pub use signals::GracefulShutdown;
