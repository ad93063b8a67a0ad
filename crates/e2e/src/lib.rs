//! swiftcheck E2E suite
//!
//! Browser-driven regression tests for the SwiftTranslator Singlish to
//! Sinhala transliteration site. The crate:
//! - Drives a real browser through a Playwright bridge process
//! - Wraps the site's controls in a page-object
//! - Runs the versioned fixture table case by case on fresh pages
//! - Reports exact-match results as JSON, with screenshots of failures
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Suite Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SuiteRunner<S: PageSource>                                 │
//! │    ├── open_page() -> BrowserPage        (fresh per case)   │
//! │    ├── TranslatorPage::navigate()                           │
//! │    ├── TranslatorPage::perform_translation(input)           │
//! │    │     clear -> settle -> fill -> poll output -> read     │
//! │    └── exact compare against Fixture::expected              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightDriver  (node + playwright, JSON lines)          │
//! │    new_page, goto, wait_for_load_state, clear, fill,        │
//! │    wait_for_function, text_content, screenshot              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod harness;
pub mod page;
pub mod playwright;
pub mod probe;
pub mod runner;
pub mod translator;

#[cfg(test)]
mod testing;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult, FailureKind};
pub use page::{BrowserPage, Locator, PageSource};
pub use playwright::{Browser, DriverConfig, PlaywrightDriver};
pub use runner::{SuiteReport, SuiteRunner};
pub use translator::TranslatorPage;
