//! # Structured Logging
//!
//! Logging setup and span macros for resolution passes.
//!
//! Logs always go to stderr; stdout belongs to the `secretenv` binary's output.
//! Secret values never appear in log fields, only keys, backends and targets.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create a tracing span for one resolution pass.
///
/// Every pass gets a fresh `pass_id` so concurrent passes can be told apart.
///
/// ```rust,ignore
/// let span = pass_span!(snapshot.len());
/// let span = pass_span!(snapshot.len(), dry_run = true);
/// ```
#[macro_export]
macro_rules! pass_span {
    ($vars:expr) => {
        tracing::info_span!(
            "resolve_env",
            pass_id = %uuid::Uuid::new_v4(),
            vars = $vars,
            references = tracing::field::Empty
        )
    };
    ($vars:expr, $($field:tt)*) => {
        tracing::info_span!(
            "resolve_env",
            pass_id = %uuid::Uuid::new_v4(),
            vars = $vars,
            references = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a tracing span for a single backend lookup
#[macro_export]
macro_rules! lookup_span {
    ($key:expr, $backend:expr) => {
        tracing::debug_span!("secret_lookup", key = %$key, backend = %$backend)
    };
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `verbose` when set. Installing twice is not an error;
/// the first subscriber stays in place.
pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if installed.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = pass_span!(3usize);
        let _span = pass_span!(3usize, dry_run = true);
        let _span = lookup_span!("DATABASE_PASSWORD", "aws_ssm");
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging(true, false);
        init_logging(false, true);
        tracing::info!("still logging");
    }
}
