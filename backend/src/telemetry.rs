//! Tracing subscriber setup shared by the binaries.

use mockable::Env;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FORMAT_ENV: &str = "CURATION_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Read `CURATION_LOG_FORMAT`; anything other than `text` means JSON.
    pub fn from_env<E: Env>(env: &E) -> Self {
        match env.string(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("text") => Self::Text,
            _ => Self::Json,
        }
    }
}

/// Install the global subscriber, filtered by `RUST_LOG`.
///
/// A second call, or a subscriber installed elsewhere, only logs a warning.
pub fn init<E: Env>(env: &E) {
    let builder = fmt().with_env_filter(EnvFilter::from_default_env());
    let result = match LogFormat::from_env(env) {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;

    #[rstest]
    #[case(None, LogFormat::Json)]
    #[case(Some("json"), LogFormat::Json)]
    #[case(Some(" TEXT "), LogFormat::Text)]
    #[case(Some("yaml"), LogFormat::Json)]
    fn format_follows_environment(#[case] value: Option<&'static str>, #[case] expected: LogFormat) {
        let mut env = MockEnv::new();
        env.expect_string()
            .returning(move |_| value.map(str::to_owned));

        assert_eq!(LogFormat::from_env(&env), expected);
    }
}
