//! Page-object for the SwiftTranslator site
//!
//! All interaction with the page under test goes through [`TranslatorPage`].
//! The site exposes no completion signal, so readiness is a bounded poll for
//! non-empty output followed by a settle heuristic (see [`Readiness`]).

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::{Readiness, SuiteConfig, TargetConfig, Timeouts};
use crate::error::{E2eError, E2eResult};
use crate::page::{BrowserPage, LoadState, Locator};

/// True once some output-styled element that is not an input control holds
/// non-whitespace text.
const OUTPUT_READY_SCRIPT: &str = r#"({ selector }) => {
  const elements = Array.from(document.querySelectorAll(selector));
  return elements.some((el) => {
    const isInputField = el.tagName === 'TEXTAREA' || el.getAttribute('role') === 'textbox';
    return !isInputField && !!el.textContent && el.textContent.trim().length > 0;
  });
}"#;

/// Page-object bound to one browser page
pub struct TranslatorPage<P> {
    page: P,
    target: TargetConfig,
    timeouts: Timeouts,
    readiness: Readiness,
}

impl<P: BrowserPage> TranslatorPage<P> {
    pub fn new(page: P, config: &SuiteConfig) -> Self {
        Self {
            page,
            target: config.target.clone(),
            timeouts: config.timeouts.clone(),
            readiness: config.readiness.clone(),
        }
    }

    /// Load the site, wait for network idle, then let client scripts settle
    pub async fn navigate(&mut self) -> E2eResult<()> {
        let url = self.target.url.clone();
        debug!("Navigating to {}", url);

        self.page
            .goto(&url, self.timeouts.navigation())
            .await
            .map_err(|e| navigation_error(&url, e))?;
        self.page
            .wait_for_load_state(LoadState::NetworkIdle, self.timeouts.navigation())
            .await
            .map_err(|e| navigation_error(&url, e))?;

        sleep(self.timeouts.page_load()).await;
        Ok(())
    }

    /// The Singlish input textbox, by role and accessible name
    pub fn locate_input(&self) -> Locator {
        Locator::role("textbox", self.target.selectors.input_name.as_str())
    }

    /// The first output-styled region that does not wrap a textarea
    pub fn locate_output(&self) -> Locator {
        Locator::css(self.target.selectors.output_container.as_str())
            .without("textarea")
            .first()
    }

    /// Empty the input and give the debounced re-render time to settle, so
    /// output from a previous input cannot leak into the next read.
    pub async fn clear_and_wait(&mut self) -> E2eResult<()> {
        let input = self.locate_input();
        self.page.clear(&input).await?;
        sleep(self.timeouts.after_clear()).await;
        Ok(())
    }

    pub async fn type_input(&mut self, text: &str) -> E2eResult<()> {
        let input = self.locate_input();
        self.page.fill(&input, text).await
    }

    /// Wait until output text appears, then until it is considered complete
    pub async fn wait_for_output(&mut self) -> E2eResult<()> {
        let arg = serde_json::json!({ "selector": self.target.selectors.output_container });

        match self
            .page
            .wait_for_function(OUTPUT_READY_SCRIPT, arg, self.timeouts.output_wait())
            .await
        {
            Ok(()) => {}
            Err(E2eError::Timeout(reason)) => {
                warn!("No output after {} ms: {}", self.timeouts.output_wait, reason);
                return Err(E2eError::OutputTimeout {
                    timeout_ms: self.timeouts.output_wait,
                });
            }
            Err(e) => return Err(e),
        }

        match self.readiness {
            Readiness::Settle => {
                sleep(self.timeouts.translation()).await;
                Ok(())
            }
            Readiness::Stable { quiet_ms, poll_ms } => {
                self.wait_until_stable(Duration::from_millis(quiet_ms), Duration::from_millis(poll_ms))
                    .await
            }
        }
    }

    /// Poll the output until it has not changed for `quiet`
    async fn wait_until_stable(&mut self, quiet: Duration, poll: Duration) -> E2eResult<()> {
        let deadline = Instant::now() + self.timeouts.output_wait();
        let mut last = self.output_text().await?;
        let mut unchanged_since = Instant::now();

        loop {
            if unchanged_since.elapsed() >= quiet {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::OutputTimeout {
                    timeout_ms: self.timeouts.output_wait,
                });
            }

            sleep(poll).await;

            let current = self.output_text().await?;
            if current != last {
                debug!("Output still changing ({} chars)", current.chars().count());
                last = current;
                unchanged_since = Instant::now();
            }
        }
    }

    /// Rendered output, trimmed the way the browser's `String.trim` does
    pub async fn output_text(&mut self) -> E2eResult<String> {
        let output = self.locate_output();
        let text = self.page.text_content(&output).await?;
        Ok(trim_rendered(text.as_deref().unwrap_or_default()).to_string())
    }

    /// Clear, type, wait, and read back the translation of `input`
    pub async fn perform_translation(&mut self, input: &str) -> E2eResult<String> {
        self.clear_and_wait().await?;
        self.type_input(input).await?;
        self.wait_for_output().await?;
        self.output_text().await
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }
}

fn navigation_error(url: &str, error: E2eError) -> E2eError {
    match error {
        E2eError::DriverExited => error,
        other => E2eError::Navigation {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Strip leading and trailing whitespace the way JavaScript's `trim` does:
/// U+FEFF counts, U+0085 does not
pub fn trim_rendered(text: &str) -> &str {
    text.trim_matches(|c: char| (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}')
}
