//! Prometheus metrics export.
//!
//! The core library owns the counters; this module registers them and dumps
//! the text exposition format to a file at the end of a run.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in versekit_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}

pub fn write_metrics(path: &Path) -> Result<()> {
    let text = encode_metrics()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        versekit_core::metrics::ACQUISITION_ATTEMPTS
            .with_label_values(&["audio", "downloaded"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("versekit_acquisition_attempts_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_write_metrics_creates_parent() {
        versekit_core::metrics::BYTES_WRITTEN.inc_by(3);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/metrics.prom");
        write_metrics(&path).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("versekit_bytes_written_total"));
    }
}
