//! Playwright browser automation
//!
//! Playwright has no Rust API, so the suite runs a small Node.js driver that
//! owns the browser and speaks newline-delimited JSON on stdin/stdout:
//!
//! ```text
//! -> {"id":3,"op":"fill","page":1,"locator":{...},"value":"Api yamu"}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"error":"Timeout 10000ms exceeded.","timeout":true}
//! ```
//!
//! The driver announces itself with an `id: 0` response once the browser is
//! up. Requests are answered strictly in order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{BrowserPage, LoadState, Locator, PageSource};

/// Slack added to each request deadline on top of the browser-side timeout
const RESPONSE_MARGIN: Duration = Duration::from_secs(5);

/// Deadline for requests that carry no browser-side timeout of their own.
/// Playwright's default action timeout is 30 s.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(35);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser: {}", other)),
        }
    }
}

/// Configuration for launching the driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node.js executable
    pub node_binary: PathBuf,

    /// `node_modules` directory that provides the `playwright` package
    pub node_modules: PathBuf,

    /// Upper bound on browser startup
    pub launch_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_modules: PathBuf::from("node_modules"),
            launch_timeout: Duration::from_secs(60),
        }
    }
}

/// A single driver request
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum DriverOp {
    NewPage,
    ClosePage {
        page: u64,
    },
    Goto {
        page: u64,
        url: String,
        timeout_ms: u64,
    },
    WaitForLoadState {
        page: u64,
        state: LoadState,
        timeout_ms: u64,
    },
    Clear {
        page: u64,
        locator: Locator,
    },
    Fill {
        page: u64,
        locator: Locator,
        value: String,
    },
    WaitForFunction {
        page: u64,
        script: String,
        arg: serde_json::Value,
        timeout_ms: u64,
    },
    TextContent {
        page: u64,
        locator: Locator,
    },
    Screenshot {
        page: u64,
        path: PathBuf,
        full_page: bool,
    },
    Shutdown,
}

impl DriverOp {
    fn name(&self) -> &'static str {
        match self {
            DriverOp::NewPage => "new_page",
            DriverOp::ClosePage { .. } => "close_page",
            DriverOp::Goto { .. } => "goto",
            DriverOp::WaitForLoadState { .. } => "wait_for_load_state",
            DriverOp::Clear { .. } => "clear",
            DriverOp::Fill { .. } => "fill",
            DriverOp::WaitForFunction { .. } => "wait_for_function",
            DriverOp::TextContent { .. } => "text_content",
            DriverOp::Screenshot { .. } => "screenshot",
            DriverOp::Shutdown => "shutdown",
        }
    }

    /// How long to wait for the driver to answer
    fn deadline(&self) -> Duration {
        match self {
            DriverOp::Goto { timeout_ms, .. }
            | DriverOp::WaitForLoadState { timeout_ms, .. }
            | DriverOp::WaitForFunction { timeout_ms, .. } => {
                Duration::from_millis(*timeout_ms) + RESPONSE_MARGIN
            }
            _ => DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    op: &'a DriverOp,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

impl Response {
    fn into_result(self, op: &str) -> E2eResult<serde_json::Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.error.unwrap_or_else(|| "unknown error".to_string());
        if self.timeout {
            Err(E2eError::Timeout(format!("{}: {}", op, message)))
        } else {
            Err(E2eError::Driver(format!("{}: {}", op, message)))
        }
    }
}

/// Request/response framing over the driver's stdio
struct Channel<R, W> {
    writer: W,
    reader: Lines<BufReader<R>>,
    next_id: u64,
    closed: bool,
}

impl<R, W> Channel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn new(reader: R, writer: W) -> Self {
        Self {
            writer,
            reader: BufReader::new(reader).lines(),
            next_id: 0,
            closed: false,
        }
    }

    async fn send(&mut self, op: &DriverOp) -> E2eResult<serde_json::Value> {
        if self.closed {
            return Err(E2eError::DriverExited);
        }

        self.next_id += 1;
        let id = self.next_id;
        let mut line = serde_json::to_string(&Request { id, op })?;
        line.push('\n');

        debug!("driver <- #{} {}", id, op.name());
        let written = async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.flush().await
        }
        .await;
        if let Err(e) = written {
            self.closed = true;
            debug!("driver stdin closed: {}", e);
            return Err(E2eError::DriverExited);
        }

        let response = match timeout(op.deadline(), self.read_response(id)).await {
            Ok(response) => response?,
            Err(_) => {
                return Err(E2eError::Timeout(format!(
                    "driver response to {} after {:?}",
                    op.name(),
                    op.deadline()
                )))
            }
        };

        response.into_result(op.name())
    }

    /// Read lines until the response for `id` arrives
    async fn read_response(&mut self, id: u64) -> E2eResult<Response> {
        loop {
            let Some(line) = self.reader.next_line().await? else {
                self.closed = true;
                return Err(E2eError::DriverExited);
            };

            match serde_json::from_str::<Response>(&line) {
                Ok(response) if response.id == Some(id) => return Ok(response),
                Ok(response) => {
                    warn!("Ignoring driver response for #{:?} while waiting for #{}", response.id, id);
                }
                Err(_) => debug!("driver stdout: {}", line),
            }
        }
    }
}

struct Connection {
    child: Child,
    channel: Channel<ChildStdout, ChildStdin>,
    // Holds driver.js on disk for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

/// Handle to a running Playwright driver. Cloning shares the same browser.
#[derive(Clone)]
pub struct PlaywrightDriver {
    conn: Arc<Mutex<Connection>>,
}

impl PlaywrightDriver {
    /// Start node, launch the browser, and wait for the ready signal
    pub async fn launch(config: DriverConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        info!(
            "Launching {} ({})",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" }
        );

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", node_path(&config.node_modules))
            .env("SWIFTCHECK_BROWSER", config.browser.as_str())
            .env("SWIFTCHECK_HEADLESS", if config.headless { "1" } else { "0" })
            .env("SWIFTCHECK_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("SWIFTCHECK_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Driver(format!("failed to spawn {}: {}", config.node_binary.display(), e))
            })?;

        let stdin = child.stdin.take().ok_or(E2eError::DriverExited)?;
        let stdout = child.stdout.take().ok_or(E2eError::DriverExited)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "playwright", "{}", line);
                }
            });
        }

        let mut conn = Connection {
            child,
            channel: Channel::new(stdout, stdin),
            _script_dir: script_dir,
        };

        match timeout(config.launch_timeout, conn.channel.read_response(0)).await {
            Ok(Ok(response)) => {
                response.into_result("launch")?;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(E2eError::Timeout(format!(
                    "browser launch after {:?}",
                    config.launch_timeout
                )))
            }
        }

        debug!("Playwright driver ready (pid: {:?})", conn.child.id());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Check that node can resolve the playwright package
    async fn check_playwright_installed(config: &DriverConfig) -> E2eResult<()> {
        let status = Command::new(&config.node_binary)
            .args(["-e", "require.resolve('playwright')"])
            .env("NODE_PATH", node_path(&config.node_modules))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub(crate) async fn request(&self, op: DriverOp) -> E2eResult<serde_json::Value> {
        let mut conn = self.conn.lock().await;
        conn.channel.send(&op).await
    }

    /// Open a new page in the shared browser context
    pub async fn new_page(&self) -> E2eResult<PlaywrightPage> {
        let value = self.request(DriverOp::NewPage).await?;
        let id = value
            .as_u64()
            .ok_or_else(|| E2eError::Driver(format!("new_page returned {}", value)))?;
        debug!("Opened page {}", id);
        Ok(PlaywrightPage {
            driver: self.clone(),
            id,
            closed: false,
        })
    }

    /// Close the browser and stop the driver process
    pub async fn shutdown(&self) -> E2eResult<()> {
        let mut conn = self.conn.lock().await;
        if !conn.channel.closed {
            if let Err(e) = conn.channel.send(&DriverOp::Shutdown).await {
                debug!("shutdown request failed: {}", e);
            }
            conn.channel.closed = true;
        }

        info!("Stopping Playwright driver (pid: {:?})", conn.child.id());

        if timeout(Duration::from_secs(5), conn.child.wait()).await.is_ok() {
            return Ok(());
        }

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = conn.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(Duration::from_millis(500), conn.child.wait()).await.is_ok()
                {
                    return Ok(());
                }
            }
        }

        // Force kill if still running
        conn.child.kill().await?;
        Ok(())
    }
}

#[async_trait]
impl PageSource for PlaywrightDriver {
    type Page = PlaywrightPage;

    async fn open_page(&mut self) -> E2eResult<PlaywrightPage> {
        self.new_page().await
    }
}

/// A page owned by a [`PlaywrightDriver`]
pub struct PlaywrightPage {
    driver: PlaywrightDriver,
    id: u64,
    closed: bool,
}

impl PlaywrightPage {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait]
impl BrowserPage for PlaywrightPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> E2eResult<()> {
        self.driver
            .request(DriverOp::Goto {
                page: self.id,
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
            .await?;
        Ok(())
    }

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> E2eResult<()> {
        self.driver
            .request(DriverOp::WaitForLoadState {
                page: self.id,
                state,
                timeout_ms: timeout.as_millis() as u64,
            })
            .await?;
        Ok(())
    }

    async fn clear(&mut self, locator: &Locator) -> E2eResult<()> {
        self.driver
            .request(DriverOp::Clear {
                page: self.id,
                locator: locator.clone(),
            })
            .await?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.driver
            .request(DriverOp::Fill {
                page: self.id,
                locator: locator.clone(),
                value: value.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn wait_for_function(
        &mut self,
        script: &str,
        arg: serde_json::Value,
        timeout: Duration,
    ) -> E2eResult<()> {
        self.driver
            .request(DriverOp::WaitForFunction {
                page: self.id,
                script: script.to_string(),
                arg,
                timeout_ms: timeout.as_millis() as u64,
            })
            .await?;
        Ok(())
    }

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self
            .driver
            .request(DriverOp::TextContent {
                page: self.id,
                locator: locator.clone(),
            })
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.driver
            .request(DriverOp::Screenshot {
                page: self.id,
                path: path.to_path_buf(),
                full_page: true,
            })
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.driver.request(DriverOp::ClosePage { page: self.id }).await?;
        debug!("Closed page {}", self.id);
        Ok(())
    }
}

/// NODE_PATH with `node_modules` prepended to any inherited value
fn node_path(node_modules: &Path) -> std::ffi::OsString {
    let modules = std::fs::canonicalize(node_modules).unwrap_or_else(|_| node_modules.to_path_buf());
    let mut paths = vec![modules];
    if let Some(existing) = std::env::var_os("NODE_PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_default()
}

/// Node.js side of the bridge
const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

async function main() {
  const name = process.env.SWIFTCHECK_BROWSER || 'chromium';
  const engine = playwright[name];
  if (!engine) throw new Error('unknown browser: ' + name);

  const browser = await engine.launch({ headless: process.env.SWIFTCHECK_HEADLESS !== '0' });
  const context = await browser.newContext({
    viewport: {
      width: Number(process.env.SWIFTCHECK_VIEWPORT_WIDTH || 1280),
      height: Number(process.env.SWIFTCHECK_VIEWPORT_HEIGHT || 720),
    },
  });

  const pages = new Map();
  let nextPage = 1;

  const page = (id) => {
    const p = pages.get(id);
    if (!p) throw new Error('no such page: ' + id);
    return p;
  };

  const locate = (p, loc) => {
    if (loc.kind === 'role') return p.getByRole(loc.role, { name: loc.name });
    let l = p.locator(loc.selector);
    if (loc.has_not) l = l.filter({ hasNot: p.locator(loc.has_not) });
    return loc.first ? l.first() : l;
  };

  const ops = {
    new_page: async () => {
      const id = nextPage++;
      pages.set(id, await context.newPage());
      return id;
    },
    close_page: async (req) => {
      const p = pages.get(req.page);
      pages.delete(req.page);
      if (p) await p.close();
      return null;
    },
    goto: async (req) => {
      const resp = await page(req.page).goto(req.url, { timeout: req.timeout_ms });
      return resp ? resp.status() : null;
    },
    wait_for_load_state: async (req) => {
      await page(req.page).waitForLoadState(req.state, { timeout: req.timeout_ms });
      return null;
    },
    clear: async (req) => {
      await locate(page(req.page), req.locator).clear();
      return null;
    },
    fill: async (req) => {
      await locate(page(req.page), req.locator).fill(req.value);
      return null;
    },
    wait_for_function: async (req) => {
      const fn = new Function('return (' + req.script + ');')();
      await page(req.page).waitForFunction(fn, req.arg, { timeout: req.timeout_ms });
      return null;
    },
    text_content: async (req) => locate(page(req.page), req.locator).textContent(),
    screenshot: async (req) => {
      await page(req.page).screenshot({ path: req.path, fullPage: req.full_page });
      return req.path;
    },
  };

  send({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin, crlfDelay: Infinity });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      send({ id: null, ok: false, error: 'bad request: ' + e.message });
      continue;
    }
    if (req.op === 'shutdown') {
      send({ id: req.id, ok: true, value: null });
      break;
    }
    const handler = ops[req.op];
    if (!handler) {
      send({ id: req.id, ok: false, error: 'unknown op: ' + req.op });
      continue;
    }
    try {
      send({ id: req.id, ok: true, value: await handler(req) });
    } catch (e) {
      send({ id: req.id, ok: false, error: e.message, timeout: e.name === 'TimeoutError' });
    }
  }

  await browser.close();
}

main().catch((e) => {
  console.error(e && e.stack ? e.stack : String(e));
  process.exit(1);
});
"#;
