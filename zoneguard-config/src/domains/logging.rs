use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use zoneguard_logging::LoggingConfig;

impl Validatable for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.event_buffer, "event_buffer", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "logging"
    }
}
