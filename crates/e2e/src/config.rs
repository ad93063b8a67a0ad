//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Top-level suite configuration, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Site under test
    pub target: TargetConfig,

    /// Fixed delays and poll bounds
    pub timeouts: Timeouts,

    /// How to decide that a translation has finished rendering
    pub readiness: Readiness,

    /// Browser engine to drive
    pub browser: Browser,

    /// Run the browser without a window
    pub headless: bool,

    pub viewport: Viewport,

    /// Directory for the JSON report and failure screenshots
    pub output_dir: PathBuf,

    /// Capture a page screenshot when a case fails
    pub screenshots_on_failure: bool,

    /// Translate every input twice and require identical output
    pub verify_idempotence: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            timeouts: Timeouts::default(),
            readiness: Readiness::default(),
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            output_dir: PathBuf::from("test-results"),
            screenshots_on_failure: true,
            verify_idempotence: false,
        }
    }
}

/// Where the translator lives and how to find its controls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub url: String,
    pub selectors: Selectors,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: "https://www.swifttranslator.com/".to_string(),
            selectors: Selectors::default(),
        }
    }
}

/// DOM signatures of the input and output regions.
///
/// The site has no stable ids, so the input is found by accessible name and
/// the output by its utility-class fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Accessible name of the input textbox
    pub input_name: String,

    /// CSS selector shared by the output region (and the input's wrapper)
    pub output_container: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            input_name: "Input Your Singlish Text Here.".to_string(),
            output_container: "div.w-full.h-80.p-3.rounded-lg.ring-1.ring-slate-300.whitespace-pre-wrap"
                .to_string(),
        }
    }
}

/// Delays and bounds, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Extra delay after the page reaches network idle
    pub page_load: u64,

    /// Delay after clearing the input so a debounced re-render settles
    pub after_clear: u64,

    /// Delay after output first appears, for streamed output to finish
    pub translation: u64,

    /// Pause between consecutive cases
    pub between_tests: u64,

    /// Upper bound on waiting for any output to appear
    pub output_wait: u64,

    /// Upper bound on page navigation
    pub navigation: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load: 2000,
            after_clear: 1000,
            translation: 3000,
            between_tests: 2000,
            output_wait: 10_000,
            navigation: 30_000,
        }
    }
}

impl Timeouts {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load)
    }

    pub fn after_clear(&self) -> Duration {
        Duration::from_millis(self.after_clear)
    }

    pub fn translation(&self) -> Duration {
        Duration::from_millis(self.translation)
    }

    pub fn between_tests(&self) -> Duration {
        Duration::from_millis(self.between_tests)
    }

    pub fn output_wait(&self) -> Duration {
        Duration::from_millis(self.output_wait)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation)
    }
}

/// Completion heuristic used once output text first appears
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Readiness {
    /// Sleep `timeouts.translation` and read whatever is there
    #[default]
    Settle,

    /// Poll the output until it stops changing for `quiet_ms`
    Stable { quiet_ms: u64, poll_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.target.url.trim().is_empty() {
            return Err(E2eError::Config("target.url is empty".into()));
        }
        if self.target.selectors.input_name.is_empty() {
            return Err(E2eError::Config("target.selectors.input_name is empty".into()));
        }
        if self.target.selectors.output_container.is_empty() {
            return Err(E2eError::Config("target.selectors.output_container is empty".into()));
        }
        if self.timeouts.output_wait == 0 {
            return Err(E2eError::Config("timeouts.output_wait must be positive".into()));
        }
        if let Readiness::Stable { quiet_ms, poll_ms } = self.readiness {
            if poll_ms == 0 || quiet_ms < poll_ms {
                return Err(E2eError::Config(format!(
                    "readiness: quiet_ms ({}) must be at least poll_ms ({}) and poll_ms positive",
                    quiet_ms, poll_ms
                )));
            }
        }
        Ok(())
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }
}
