use anyhow::{Context, Result};
use assessment_core::{AssessmentParams, LanguagePolicy};
use assessment_orchestrator::ExecutionMode;
use benchmark_engine::BenchmarkTable;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub assessment_timeout: Duration,
    pub params_path: Option<PathBuf>,
    pub benchmark_table_path: Option<PathBuf>,
    pub language_policy: LanguagePolicy,
    pub execution_mode: ExecutionMode,
    pub cors_origins: CorsOrigins,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            assessment_timeout: Duration::from_millis(2000),
            params_path: None,
            benchmark_table_path: None,
            language_policy: LanguagePolicy::FallbackToEnglish,
            execution_mode: ExecutionMode::Concurrent,
            cors_origins: CorsOrigins::Any,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let timeout_ms = env::var("ASSESSMENT_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .context("ASSESSMENT_TIMEOUT_MS must be a whole number of milliseconds")?;

        let config = Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse::<SocketAddr>()
                .context("BIND_ADDR must be a socket address such as 0.0.0.0:8000")?,
            assessment_timeout: Duration::from_millis(timeout_ms),
            params_path: env::var("ASSESSMENT_PARAMS_PATH").ok().map(PathBuf::from),
            benchmark_table_path: env::var("BENCHMARK_TABLE_PATH").ok().map(PathBuf::from),
            language_policy: env::var("LANGUAGE_POLICY")
                .unwrap_or_else(|_| "fallback".to_string())
                .parse::<LanguagePolicy>()
                .map_err(anyhow::Error::msg)
                .context("LANGUAGE_POLICY must be 'fallback' or 'strict'")?,
            execution_mode: env::var("ASSESSMENT_EXECUTION")
                .unwrap_or_else(|_| "concurrent".to_string())
                .parse::<ExecutionMode>()
                .map_err(anyhow::Error::msg)
                .context("ASSESSMENT_EXECUTION must be 'concurrent' or 'sequential'")?,
            cors_origins: CorsOrigins::parse(
                &env::var("CORS_ALLOW_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
        };

        if config.assessment_timeout.is_zero() {
            anyhow::bail!("ASSESSMENT_TIMEOUT_MS must be greater than 0");
        }

        Ok(config)
    }

    /// Parameter file if configured, otherwise the built-in calibration.
    pub fn load_params(&self) -> Result<AssessmentParams> {
        match &self.params_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading parameters from {}", path.display()))?;
                AssessmentParams::from_json(&raw)
                    .with_context(|| format!("invalid parameters in {}", path.display()))
            }
            None => Ok(AssessmentParams::default()),
        }
    }

    /// Benchmark table file if configured, otherwise the bundled table.
    pub fn load_benchmarks(&self) -> Result<BenchmarkTable> {
        match &self.benchmark_table_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading benchmark table from {}", path.display()))?;
                BenchmarkTable::from_json(&raw)
                    .with_context(|| format!("invalid benchmark table in {}", path.display()))
            }
            None => BenchmarkTable::bundled().context("bundled benchmark table is invalid"),
        }
    }
}
