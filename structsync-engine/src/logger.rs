//! Run logger — the `log(message, severity)` collaborator.
//!
//! The enable flag is persisted alongside the snapshot and passed in
//! explicitly at run start; it gates `info` and `warning` lines, never
//! `error` lines. Output goes to the `log` facade.

use structsync_core::Severity;

/// Per-run logger carrying the persisted enable flag.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    enabled: bool,
}

impl Logger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn log(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => self.info(message),
            Severity::Warning => self.warning(message),
            Severity::Error => self.error(message),
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            tracing::info!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.enabled {
            tracing::warn!("{message}");
        }
    }

    /// Errors are always emitted, even with logging disabled.
    pub fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Capture;

    static CAPTURE: Capture = Capture;
    static CAPTURED: Mutex<Vec<(tracing::Level, String)>> = Mutex::new(Vec::new());

    impl tracing::Log for Capture {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &tracing::Record<'_>) {
            CAPTURED
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    // The global logger can only be installed once per process, so severity
    // routing and the enable flag share one test. Lines from other tests
    // in this binary may land in the capture; filter on our marker.
    #[test]
    fn severity_routing_and_enable_flag() {
        tracing::set_logger(&CAPTURE).expect("install capture logger");
        tracing::set_max_level(tracing::LevelFilter::Trace);

        let on = Logger::new(true);
        on.log("sev info", Severity::Info);
        on.log("sev warning", Severity::Warning);
        on.log("sev error", Severity::Error);

        let off = Logger::new(false);
        off.log("sev muted info", Severity::Info);
        off.log("sev muted warning", Severity::Warning);
        off.log("sev error anyway", Severity::Error);

        let captured = CAPTURED.lock().unwrap();
        let ours: Vec<(tracing::Level, &str)> = captured
            .iter()
            .filter(|(_, m)| m.starts_with("sev "))
            .map(|(level, m)| (*level, m.as_str()))
            .collect();
        assert_eq!(
            ours,
            vec![
                (tracing::Level::Info, "sev info"),
                (tracing::Level::Warn, "sev warning"),
                (tracing::Level::Error, "sev error"),
                (tracing::Level::Error, "sev error anyway"),
            ]
        );
    }
}
