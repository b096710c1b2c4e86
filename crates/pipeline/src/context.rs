use std::{sync::Arc, time::Duration};

use {
    reelbot_channels::ChatOutbound,
    reelbot_config::ReelbotConfig,
    reelbot_media::{Converter, MediaSource, SelectionPolicy, Stager},
};

/// Immutable knobs for every pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub selection: SelectionPolicy,
    pub metadata_timeout: Duration,
    pub delivery_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            metadata_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(300),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &ReelbotConfig) -> Self {
        Self {
            selection: SelectionPolicy {
                prefer: config.source.prefer,
                tie_break: config.source.tie_break,
                max_height: config.source.max_height,
            },
            metadata_timeout: config.timeouts.metadata(),
            delivery_timeout: config.timeouts.delivery(),
        }
    }
}

/// Shared handles for all pipeline runs. Holds no per-request state.
#[derive(Clone)]
pub struct PipelineContext {
    pub source: Arc<dyn MediaSource>,
    pub converter: Arc<dyn Converter>,
    pub outbound: Arc<dyn ChatOutbound>,
    pub stager: Stager,
    pub settings: PipelineSettings,
}

impl PipelineContext {
    #[must_use]
    pub fn new(
        source: Arc<dyn MediaSource>,
        converter: Arc<dyn Converter>,
        outbound: Arc<dyn ChatOutbound>,
        stager: Stager,
    ) -> Self {
        Self {
            source,
            converter,
            outbound,
            stager,
            settings: PipelineSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("stager", &self.stager)
            .field("converter_available", &self.converter.is_available())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        reelbot_common::types::{QualityPreference, TieBreak},
    };

    #[test]
    fn settings_follow_config() {
        let mut config = ReelbotConfig::default();
        config.source.tie_break = TieBreak::LastListed;
        config.source.prefer = QualityPreference::FirstListed;
        config.source.max_height = Some(720);
        config.timeouts.metadata_secs = 5;
        config.timeouts.delivery_secs = 60;

        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.selection.tie_break, TieBreak::LastListed);
        assert_eq!(settings.selection.prefer, QualityPreference::FirstListed);
        assert_eq!(settings.selection.max_height, Some(720));
        assert_eq!(settings.metadata_timeout, Duration::from_secs(5));
        assert_eq!(settings.delivery_timeout, Duration::from_secs(60));
    }
}
