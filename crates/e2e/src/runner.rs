//! Suite runner: drives the fixture table through the translator page-object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use swiftcheck_fixtures::{Category, Fixture, FixtureTable, Selection};

use crate::config::SuiteConfig;
use crate::diff::describe_mismatch;
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::page::{BrowserPage, PageSource};
use crate::translator::TranslatorPage;

/// Result of running a single fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub id: String,
    pub name: String,
    pub title: String,
    pub category: Category,
    pub input: String,
    pub expected: String,
    pub actual: Option<String>,
    pub success: bool,
    pub failure: Option<FailureKind>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub screenshot: Option<ScreenshotRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub title: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Result of running the selected fixtures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub target_url: String,
    pub fixture_version: u32,
    pub fixture_digest: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub categories: Vec<CategorySummary>,
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Write the report as `test-results.json` under `dir`
    pub fn write(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Runs fixtures one at a time, each on a freshly opened page
pub struct SuiteRunner<S> {
    source: S,
    config: SuiteConfig,
}

impl<S: PageSource> SuiteRunner<S> {
    pub fn new(source: S, config: SuiteConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Run every selected fixture in category, then table, order
    pub async fn run(&mut self, table: &FixtureTable, selection: &Selection) -> SuiteReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let cases: Vec<(Category, &Fixture)> = table.select(selection).collect();
        let skipped = table.len() - cases.len();

        info!(
            "Running {} case(s) against {} (fixtures v{}, {} skipped)",
            cases.len(),
            self.config.target.url,
            table.version(),
            skipped
        );

        let mut results = Vec::with_capacity(cases.len());
        let mut current: Option<Category> = None;

        for (index, (category, fixture)) in cases.iter().enumerate() {
            if current != Some(*category) {
                info!("── {} ──", category.title());
                current = Some(*category);
            }

            if index > 0 {
                // Spread load on the shared remote site
                tokio::time::sleep(self.config.timeouts.between_tests()).await;
            }

            let result = self.run_case(*category, fixture).await;
            if result.success {
                info!("✓ {} ({} ms)", result.title, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.title,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;
        let categories = summarize(&results);

        info!("");
        for summary in &categories {
            info!("{}: {}/{} passed", summary.title, summary.passed, summary.total);
        }
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        SuiteReport {
            started_at,
            target_url: self.config.target.url.clone(),
            fixture_version: table.version(),
            fixture_digest: table.digest().to_string(),
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            categories,
            results,
        }
    }

    /// Run one fixture on a fresh page. Never fails: errors land in the result.
    pub async fn run_case(&mut self, category: Category, fixture: &Fixture) -> CaseResult {
        let start = Instant::now();
        debug!("Running {}", fixture.title());

        let mut actual = None;
        let mut screenshot = None;

        let outcome = match self.source.open_page().await {
            Ok(page) => {
                let mut translator = TranslatorPage::new(page, &self.config);
                let outcome = self.exercise(&mut translator, fixture, &mut actual).await;

                if outcome.is_err() && self.config.screenshots_on_failure {
                    screenshot = self.capture(translator.page_mut(), category, fixture).await;
                }

                if let Err(e) = translator.into_page().close().await {
                    warn!("Failed to close page for {}: {}", fixture.id, e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let (failure, error) = match outcome {
            Ok(()) => (None, None),
            Err(e) => (Some(e.kind()), Some(e.to_string())),
        };

        CaseResult {
            id: fixture.id.clone(),
            name: fixture.name.clone(),
            title: fixture.title(),
            category,
            input: fixture.input.clone(),
            expected: fixture.expected.clone(),
            actual,
            success: failure.is_none(),
            failure,
            error,
            duration_ms: start.elapsed().as_millis() as u64,
            screenshot,
        }
    }

    async fn exercise(
        &self,
        translator: &mut TranslatorPage<S::Page>,
        fixture: &Fixture,
        actual: &mut Option<String>,
    ) -> E2eResult<()> {
        translator.navigate().await?;

        let output = translator.perform_translation(&fixture.input).await?;
        *actual = Some(output.clone());

        // Exact comparison: no whitespace or Unicode normalization
        if output != fixture.expected {
            return Err(E2eError::Mismatch {
                expected: fixture.expected.clone(),
                actual: output.clone(),
                detail: describe_mismatch(&fixture.expected, &output),
            });
        }

        if self.config.verify_idempotence {
            let again = translator.perform_translation(&fixture.input).await?;
            if again != output {
                return Err(E2eError::Idempotence {
                    first: output,
                    second: again,
                });
            }
        }

        Ok(())
    }

    async fn capture(
        &self,
        page: &mut S::Page,
        category: Category,
        fixture: &Fixture,
    ) -> Option<ScreenshotRef> {
        let path = self
            .config
            .screenshot_dir()
            .join(category.as_str())
            .join(format!("{}.png", fixture.id));

        let result = async {
            page.screenshot(&path).await?;
            let bytes = std::fs::read(&path)?;
            Ok::<_, E2eError>(hex::encode(Sha256::digest(&bytes)))
        }
        .await;

        match result {
            Ok(sha256) => Some(ScreenshotRef {
                path: path.to_string_lossy().to_string(),
                sha256,
            }),
            Err(e) => {
                warn!("Screenshot for {} failed: {}", fixture.id, e);
                None
            }
        }
    }
}

fn summarize(results: &[CaseResult]) -> Vec<CategorySummary> {
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let total = results.iter().filter(|r| r.category == category).count();
            if total == 0 {
                return None;
            }
            let passed = results
                .iter()
                .filter(|r| r.category == category && r.success)
                .count();
            Some(CategorySummary {
                category,
                title: category.title().to_string(),
                total,
                passed,
                failed: total - passed,
            })
        })
        .collect()
}
