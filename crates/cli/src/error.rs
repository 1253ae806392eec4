// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Each error says what went wrong, why it might have happened, and how to
//! fix it.

use mq_core::ConfigError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct MqError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MqError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for MqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for MqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for configuration failures.
impl MqError {
    /// Error for a configuration file that cannot be read or parsed.
    pub fn config_invalid(path: &Path, err: ConfigError) -> Self {
        let base = MqError::new(format!(
            "Failed to load configuration from '{}'",
            path.display()
        ));
        let base = match &err {
            ConfigError::Read { .. } => base
                .with_context("The file does not exist or is not readable")
                .with_suggestion("Check the path passed to --config"),
            ConfigError::Parse(_) => base
                .with_context(err.to_string())
                .with_suggestion("Known keys are namespace, unlock_timeout and max_history")
                .with_suggestion("Durations use humantime syntax such as \"30s\" or \"1m\""),
            ConfigError::Invalid(reason) => base
                .with_context(reason.clone())
                .with_suggestion("Show the defaults with: mq config show"),
        };
        base.with_source(err)
    }

    /// Error for command-line overrides that fail validation.
    pub fn override_invalid(err: ConfigError) -> Self {
        MqError::new("Invalid coordinator configuration")
            .with_context(err.to_string())
            .with_suggestion("Check --namespace, --unlock-timeout and --max-history")
            .with_source(err)
    }
}
