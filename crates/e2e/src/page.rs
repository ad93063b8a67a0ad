//! Browser page abstraction
//!
//! [`BrowserPage`] is the narrow set of page operations the translator
//! page-object needs. The Playwright bridge implements it for real runs; unit
//! tests substitute an in-memory page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// How to find an element, resolved by the browser side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// By ARIA role and accessible name
    Role { role: String, name: String },

    /// By CSS selector, optionally dropping matches that contain `has_not`
    Css {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_not: Option<String>,
        #[serde(default)]
        first: bool,
    },
}

impl Locator {
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
            has_not: None,
            first: false,
        }
    }

    /// Exclude matches containing an element matching `selector`
    pub fn without(self, selector: impl Into<String>) -> Self {
        match self {
            Locator::Css { selector: s, first, .. } => Locator::Css {
                selector: s,
                has_not: Some(selector.into()),
                first,
            },
            other => other,
        }
    }

    /// Keep only the first match
    pub fn first(self) -> Self {
        match self {
            Locator::Css { selector, has_not, .. } => Locator::Css {
                selector,
                has_not,
                first: true,
            },
            other => other,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Role { role, name } => write!(f, "role={}[name={:?}]", role, name),
            Locator::Css { selector, has_not, first } => {
                write!(f, "{}", selector)?;
                if let Some(h) = has_not {
                    write!(f, ":not(:has({}))", h)?;
                }
                if *first {
                    write!(f, " >> nth=0")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// One open browser page
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate to `url`
    async fn goto(&mut self, url: &str, timeout: Duration) -> E2eResult<()>;

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> E2eResult<()>;

    /// Empty an input control
    async fn clear(&mut self, locator: &Locator) -> E2eResult<()>;

    /// Replace an input control's value
    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Block until the JavaScript function expression `script`, called with
    /// `arg`, returns a truthy value in the page. Times out with
    /// [`E2eError::Timeout`](crate::E2eError::Timeout).
    async fn wait_for_function(
        &mut self,
        script: &str,
        arg: serde_json::Value,
        timeout: Duration,
    ) -> E2eResult<()>;

    /// Text content of the first element matching `locator`
    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>>;

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    async fn close(&mut self) -> E2eResult<()>;
}

/// Something that can open fresh pages
#[async_trait]
pub trait PageSource: Send {
    type Page: BrowserPage;

    async fn open_page(&mut self) -> E2eResult<Self::Page>;
}
