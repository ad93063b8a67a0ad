//! In-memory stand-ins for the browser, used by unit tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::page::{BrowserPage, LoadState, Locator, PageSource};

#[derive(Debug, Default)]
pub struct FakeState {
    pub log: Vec<String>,
    pub input: String,
    pub translations: HashMap<String, String>,
    pub rendered: Option<String>,
    /// Snapshots returned by successive output reads before `rendered`
    pub stream: VecDeque<String>,
    pub fail_goto: Option<String>,
    pub screenshots: Vec<PathBuf>,
    pub closed: bool,
}

/// Page that "translates" by table lookup
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn translate(self, input: &str, output: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .translations
            .insert(input.to_string(), output.to_string());
        self
    }

    pub fn stream<const N: usize>(self, snapshots: [&str; N]) -> Self {
        self.state
            .lock()
            .unwrap()
            .stream
            .extend(snapshots.iter().map(|s| s.to_string()));
        self
    }

    pub fn fail_goto(self, reason: &str) -> Self {
        self.state.lock().unwrap().fail_goto = Some(reason.to_string());
        self
    }

    pub fn state(&self) -> Arc<Mutex<FakeState>> {
        self.state.clone()
    }

    fn log(&self, entry: String) {
        self.state.lock().unwrap().log.push(entry);
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> E2eResult<()> {
        self.log(format!("goto {}", url));
        match self.state.lock().unwrap().fail_goto.clone() {
            Some(reason) => Err(E2eError::Driver(format!("goto: {}", reason))),
            None => Ok(()),
        }
    }

    async fn wait_for_load_state(&mut self, state: LoadState, _timeout: Duration) -> E2eResult<()> {
        let name = serde_json::to_value(state)?;
        self.log(format!("wait_for_load_state {}", name.as_str().unwrap_or_default()));
        Ok(())
    }

    async fn clear(&mut self, _locator: &Locator) -> E2eResult<()> {
        self.log("clear".to_string());
        let mut state = self.state.lock().unwrap();
        state.input.clear();
        state.rendered = None;
        Ok(())
    }

    async fn fill(&mut self, _locator: &Locator, value: &str) -> E2eResult<()> {
        self.log(format!("fill {}", value));
        let mut state = self.state.lock().unwrap();
        state.input = value.to_string();
        state.rendered = state.translations.get(value).cloned();
        Ok(())
    }

    async fn wait_for_function(
        &mut self,
        _script: &str,
        _arg: serde_json::Value,
        timeout: Duration,
    ) -> E2eResult<()> {
        self.log("wait_for_function".to_string());
        let rendered = self.state.lock().unwrap().rendered.clone();
        match rendered {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => {
                tokio::time::sleep(timeout).await;
                Err(E2eError::Timeout(format!(
                    "wait_for_function: Timeout {}ms exceeded.",
                    timeout.as_millis()
                )))
            }
        }
    }

    async fn text_content(&mut self, _locator: &Locator) -> E2eResult<Option<String>> {
        self.log("text_content".to_string());
        let mut state = self.state.lock().unwrap();
        if let Some(snapshot) = state.stream.pop_front() {
            return Ok(Some(snapshot));
        }
        Ok(state.rendered.as_ref().map(|text| format!("\n  {} ", text)))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.log("screenshot".to_string());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG fake")?;
        self.state.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Opens a fresh [`FakePage`] per request, all sharing one translation table
#[derive(Default)]
pub struct FakeSource {
    pub translations: HashMap<String, String>,
    pub fail_goto: Option<String>,
    pub stream: Vec<String>,
    pub opened: Vec<Arc<Mutex<FakeState>>>,
}

impl FakeSource {
    pub fn translate(mut self, input: &str, output: &str) -> Self {
        self.translations.insert(input.to_string(), output.to_string());
        self
    }
}

#[async_trait]
impl PageSource for FakeSource {
    type Page = FakePage;

    async fn open_page(&mut self) -> E2eResult<FakePage> {
        let page = FakePage::new();
        {
            let mut state = page.state.lock().unwrap();
            state.translations = self.translations.clone();
            state.fail_goto = self.fail_goto.clone();
            state.stream = self.stream.iter().cloned().collect();
        }
        self.opened.push(page.state());
        Ok(page)
    }
}
