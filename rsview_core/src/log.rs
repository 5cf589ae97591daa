//! Logging utils.

use tracing_subscriber::EnvFilter;

/// Initialize logging to `stderr`.
///
/// It uses `RSVIEW_LOG` environment variable to control the logging level.
/// Defaults to `error`.
pub fn init() {
  let env_filter = EnvFilter::try_from_env("RSVIEW_LOG")
    .unwrap_or_else(|_| EnvFilter::new("error"));

  let subscriber = tracing_subscriber::FmtSubscriber::builder()
    .with_line_number(true)
    .with_level(true)
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber).unwrap();
}
