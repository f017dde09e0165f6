use kronos_api::KronosError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("conversion error: {0}")]
    Kronos(#[from] KronosError),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Kronos` variant, context is added to the inner `KronosError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Kronos(e) => EngineError::Kronos(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_reaches_inner_error() {
        let err = EngineError::from(KronosError::zone("unknown zone id 'Moon'"))
            .with_context("backend_zone_id");
        assert_eq!(
            err.to_string(),
            "conversion error: zone: backend_zone_id: unknown zone id 'Moon'"
        );
        let err = EngineError::Config("missing".into()).with_context("kronos.toml");
        assert_eq!(err.to_string(), "config error: kronos.toml: missing");
    }
}
