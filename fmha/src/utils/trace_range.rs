use std::time::Instant;

use super::FmhaEnvVar;

const RANGE_PREFIX: &str = "FMHA";

/// Named range around a host-side operation, reported through `log` at trace level.
///
/// Ranges are inert unless `FMHA_TRACE_RANGES` is enabled.
pub struct TraceRange {
    name: String,
    started_at: Option<Instant>,
}

impl TraceRange {
    pub fn new(name: &str) -> Self {
        Self::with_enabled(name, FmhaEnvVar::TraceRanges.is_enabled())
    }

    pub fn with_enabled(
        name: &str,
        enabled: bool,
    ) -> Self {
        let name = format!("{RANGE_PREFIX}:{name}");
        let started_at = if enabled {
            log::trace!(target: "fmha::trace", "range push {name}");
            Some(Instant::now())
        } else {
            None
        };
        Self {
            name,
            started_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }
}

impl Drop for TraceRange {
    fn drop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            let elapsed_ms = started_at.elapsed().as_secs_f64() * 1e3;
            log::trace!(target: "fmha::trace", "range pop {} ({elapsed_ms:.3} ms)", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_name_is_prefixed() {
        let range = TraceRange::with_enabled("launch", true);
        assert_eq!(range.name(), "FMHA:launch");
        assert!(range.is_active());
    }

    #[test]
    fn test_disabled_range_is_inert() {
        let range = TraceRange::with_enabled("launch", false);
        assert!(!range.is_active());
    }
}
