//! Configuration loading from pace.toml
//!
//! Run settings can be specified in a `pace.toml` file in the project root.
//! The file is discovered by walking up from the current directory; every
//! field has a default, so a missing file means default behavior, not an
//! error.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use paceline_core::{CompilationMode, RunConfiguration, StartupMode, WarmupStrategy};
use paceline_launch::CompletionSignal;

/// Paceline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaceConfig {
    /// Shared run settings (both engines)
    #[serde(default)]
    pub run: RunSection,
    /// Macrobenchmark launch settings
    #[serde(default)]
    pub launch: LaunchSection,
}

/// Shared run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Fewest retained samples a run may finish with
    #[serde(default = "default_min_iterations")]
    pub min_iterations: u32,
    /// Retained-sample budget before the run times out
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Cumulative measured time a converged run must exceed (e.g. "100ms")
    #[serde(default = "default_min_measurement")]
    pub min_measurement: String,
    /// Warmup strategy: "stability" or "fixed"
    #[serde(default = "default_warmup")]
    pub warmup: String,
    /// Warmup iterations when `warmup = "fixed"`
    #[serde(default)]
    pub warmup_iterations: u32,
    /// Trailing-window length when `warmup = "stability"`
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,
    /// Coefficient-of-variation bound when `warmup = "stability"`
    #[serde(default = "default_stability_max_cv")]
    pub stability_max_cv: f64,
    /// Warmup iteration cap when `warmup = "stability"`
    #[serde(default = "default_stability_cap")]
    pub stability_cap: u32,
    /// Enable the thermal throttle guard
    #[serde(default = "default_thermal_guard")]
    pub thermal_guard: bool,
    /// Bound on the throttle-discard ratio during measurement
    #[serde(default = "default_max_discard_ratio")]
    pub max_discard_ratio: f64,
    /// Pin the measuring thread to this CPU (microbenchmark, Linux)
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            min_iterations: default_min_iterations(),
            max_iterations: default_max_iterations(),
            min_measurement: default_min_measurement(),
            warmup: default_warmup(),
            warmup_iterations: 0,
            stability_window: default_stability_window(),
            stability_max_cv: default_stability_max_cv(),
            stability_cap: default_stability_cap(),
            thermal_guard: default_thermal_guard(),
            max_discard_ratio: default_max_discard_ratio(),
            pin_cpu: None,
        }
    }
}

fn default_min_iterations() -> u32 {
    50
}
fn default_max_iterations() -> u32 {
    100_000
}
fn default_min_measurement() -> String {
    "100ms".to_string()
}
fn default_warmup() -> String {
    "stability".to_string()
}
fn default_stability_window() -> usize {
    paceline_core::warmup::DEFAULT_STABILITY_WINDOW
}
fn default_stability_max_cv() -> f64 {
    paceline_core::warmup::DEFAULT_MAX_CV
}
fn default_stability_cap() -> u32 {
    paceline_core::warmup::DEFAULT_WARMUP_CAP
}
fn default_thermal_guard() -> bool {
    true
}
fn default_max_discard_ratio() -> f64 {
    paceline_core::throttle::DEFAULT_MAX_DISCARD_RATIO
}

/// Macrobenchmark launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSection {
    /// Startup mode: "cold", "warm", or "hot"
    #[serde(default)]
    pub startup_mode: StartupMode,
    /// Compilation mode: "none", "partial", or "full"
    #[serde(default)]
    pub compilation_mode: CompilationMode,
    /// Per-launch wait budget (e.g. "30s")
    #[serde(default = "default_launch_timeout")]
    pub timeout: String,
    /// Completion signal: "first-frame", "fully-drawn", or a custom marker
    #[serde(default = "default_signal")]
    pub signal: CompletionSignal,
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            startup_mode: StartupMode::default(),
            compilation_mode: CompilationMode::default(),
            timeout: default_launch_timeout(),
            signal: default_signal(),
        }
    }
}

fn default_launch_timeout() -> String {
    "30s".to_string()
}
fn default_signal() -> CompletionSignal {
    CompletionSignal::FirstFrame
}

impl PaceConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the current
    /// directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("pace.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Build the engine-level run configuration, validated.
    pub fn run_configuration(&self) -> anyhow::Result<RunConfiguration> {
        let warmup = match self.run.warmup.as_str() {
            "fixed" => WarmupStrategy::Fixed {
                iterations: self.run.warmup_iterations,
            },
            "stability" => WarmupStrategy::Stability {
                window: self.run.stability_window,
                max_cv: self.run.stability_max_cv,
                cap: self.run.stability_cap,
            },
            other => anyhow::bail!("unknown warmup strategy: {other}"),
        };
        let config = RunConfiguration {
            min_iterations: self.run.min_iterations,
            max_iterations: self.run.max_iterations,
            min_measurement_ns: Self::parse_duration(&self.run.min_measurement)?,
            warmup,
            startup_mode: self.launch.startup_mode,
            compilation_mode: self.launch.compilation_mode,
            thermal_guard: self.run.thermal_guard,
            max_discard_ratio: self.run.max_discard_ratio,
            pin_cpu: self.run.pin_cpu,
        };
        config.validate()?;
        Ok(config)
    }

    /// Per-launch wait budget for the macrobenchmark controller.
    pub fn launch_timeout(&self) -> anyhow::Result<Duration> {
        Ok(Duration::from_nanos(Self::parse_duration(
            &self.launch.timeout,
        )?))
    }

    /// Completion signal for macrobenchmark runs.
    pub fn completion_signal(&self) -> CompletionSignal {
        self.launch.signal.clone()
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Paceline Configuration

[run]
# Fewest retained samples a run may finish with
min_iterations = 50
# Retained-sample budget before the run times out
max_iterations = 100000
# Cumulative measured time a converged run must exceed
min_measurement = "100ms"
# Warmup strategy: "stability" or "fixed"
warmup = "stability"
# Warmup iterations when warmup = "fixed" (uncomment to enable)
# warmup_iterations = 100
# Trailing-window length for stability warmup
stability_window = 10
# Coefficient-of-variation bound for stability warmup
stability_max_cv = 0.05
# Stability warmup gives up after this many iterations
stability_cap = 10000
# Discard samples taken under thermal throttling
thermal_guard = true
# Fail the run once this fraction of measured samples is discarded
max_discard_ratio = 0.25
# Pin the measuring thread to a CPU (uncomment to enable)
# pin_cpu = 0

[launch]
# Startup mode: "cold", "warm", or "hot"
startup_mode = "cold"
# Compilation mode: "none", "partial", or "full"
compilation_mode = "full"
# Per-launch wait budget
timeout = "30s"
# Completion signal: "first-frame", "fully-drawn", or { custom = "marker" }
signal = "first-frame"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
