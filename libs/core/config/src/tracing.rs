use crate::Environment;
use tracing::debug;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with file locations shown and the env section hidden.
///
/// Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Default filter when `RUST_LOG` is not set.
fn default_filter(environment: &Environment) -> EnvFilter {
    if environment.is_production() {
        EnvFilter::new("warn,mailer=info")
    } else {
        EnvFilter::new("info,mailer=debug")
    }
}

/// Initialize tracing with an `ErrorLayer` for span capture.
///
/// - **Production**: flattened JSON events without module targets.
/// - **Development**: pretty, human-readable output.
///
/// `RUST_LOG` overrides the default filter. Repeated calls are no-ops, which
/// keeps tests that initialise tracing independent of each other.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(environment));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    if result.is_err() {
        debug!("Tracing already initialized, skipping re-initialization");
    } else {
        debug!(environment = ?environment, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_development() {
        init_tracing(&Environment::Development);
    }

    #[test]
    fn test_init_tracing_production() {
        init_tracing(&Environment::Production);
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        let env = Environment::Development;
        init_tracing(&env);
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("mailer=trace"), || {
            init_tracing(&Environment::Production);
        });
    }

    #[test]
    fn test_install_color_eyre_twice() {
        install_color_eyre();
        install_color_eyre();
    }
}
