// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use ifc_align_geometry::AnalysisConfig;
use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory for the upload cache.
    pub cache_dir: String,
    /// Maximum file size in MB.
    pub max_file_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Number of worker threads for parallel report building.
    pub worker_threads: usize,
    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,
    /// Engine settings (point budget, pattern thresholds, continuity tolerance).
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source; unparsable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
            value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        }

        let mut analysis = AnalysisConfig::default();
        analysis.sampling.point_budget =
            parse_or(lookup("POINT_BUDGET"), analysis.sampling.point_budget);
        analysis.thresholds.civil3d_c0_limit =
            parse_or(lookup("CIVIL3D_C0_LIMIT"), analysis.thresholds.civil3d_c0_limit);
        analysis.thresholds.civil3d_c1_limit =
            parse_or(lookup("CIVIL3D_C1_LIMIT"), analysis.thresholds.civil3d_c1_limit);
        analysis.continuity_tolerance =
            parse_or(lookup("CONTINUITY_TOLERANCE"), analysis.continuity_tolerance);

        Self {
            port: parse_or(lookup("PORT"), 8080),
            cache_dir: lookup("CACHE_DIR").unwrap_or_else(|| {
                // Docker: /app/cache, local dev: ./.cache
                if std::path::Path::new("/.dockerenv").exists() {
                    "/app/cache".into()
                } else {
                    std::env::current_dir()
                        .ok()
                        .and_then(|dir| dir.join(".cache").to_str().map(|s| s.to_string()))
                        .unwrap_or_else(|| "./.cache".into())
                }
            }),
            max_file_size_mb: parse_or(lookup("MAX_FILE_SIZE_MB"), 100),
            request_timeout_secs: parse_or(lookup("REQUEST_TIMEOUT_SECS"), 120),
            worker_threads: parse_or(lookup("WORKER_THREADS"), num_cpus::get()).max(1),
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            analysis,
        }
    }

    /// Upload limit in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
