use env_logger::{Builder, Env};

/// Filter for diagnostics on stderr, in `env_logger` syntax (`debug`,
/// `crash_replay=info`, ...).
pub const LOG_ENV: &str = "CRASH_REPLAY_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Stdout is reserved for UCI commands, so everything logged goes to stderr.
pub fn init() {
    let env = Env::new().filter_or(LOG_ENV, DEFAULT_FILTER);
    let _ = Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
