use std::env;
use std::fmt;

use crate::analysis::AnalysisThresholds;

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";
const DEFAULT_ZERO_SHOT_MODEL: &str = "facebook/bart-large-mnli";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the analyzer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub thresholds: AnalysisThresholds,
    pub inference: InferenceConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let defaults = AnalysisThresholds::default();
        let thresholds = AnalysisThresholds {
            confidence_threshold: threshold_from_env(
                "SPEVAL_CONF_THRESHOLD",
                defaults.confidence_threshold,
                1.0,
            )?,
            gap_tolerance: threshold_from_env("SPEVAL_GAP_TOLERANCE", defaults.gap_tolerance, 2.0)?,
            misbehaviour_warn_min: threshold_from_env(
                "SPEVAL_MIS_WARN_MIN",
                defaults.misbehaviour_warn_min,
                1.0,
            )?,
        };

        let inference = InferenceConfig {
            base_url: env::var("SPEVAL_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            token: env::var("SPEVAL_INFERENCE_TOKEN")
                .or_else(|_| env::var("HF_TOKEN"))
                .ok()
                .filter(|token| !token.trim().is_empty()),
            sentiment_model: env::var("SPEVAL_SENTIMENT_MODEL")
                .unwrap_or_else(|_| DEFAULT_SENTIMENT_MODEL.to_string()),
            zero_shot_model: env::var("SPEVAL_ZERO_SHOT_MODEL")
                .unwrap_or_else(|_| DEFAULT_ZERO_SHOT_MODEL.to_string()),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            thresholds,
            inference,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn threshold_from_env(name: &'static str, default: f64, max: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_threshold(name, &raw, max),
        Err(_) => Ok(default),
    }
}

/// Parses a threshold that must be finite and within `[0, max]`.
pub fn parse_threshold(name: &'static str, raw: &str, max: f64) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidThreshold {
            name,
            value: raw.to_string(),
        })?;

    if !value.is_finite() || !(0.0..=max).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { name, value, max });
    }
    Ok(value)
}

/// Location and model names of the hosted inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub sentiment_model: String,
    pub zero_shot_model: String,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidThreshold {
        name: &'static str,
        value: String,
    },
    ThresholdOutOfRange {
        name: &'static str,
        value: f64,
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidThreshold { name, value } => {
                write!(f, "{name} must be a number, got '{value}'")
            }
            ConfigError::ThresholdOutOfRange { name, value, max } => {
                write!(f, "{name} must lie between 0 and {max}, got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
