//! A live Playwright page driven over the helper's JSON-lines protocol.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::playwright::{
    ensure_node_available, ensure_playwright_available, map_playwright_status_error,
    map_spawn_error, HelperReply, HELPER_SCRIPT,
};
use crate::config::Config;
use crate::dom::{DomQuery, ElementHandle, LoadState, Locator, WaitState};
use crate::{HarnessError, Result, Viewport};

/// Time allowed for chromium to launch and the helper to report ready.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Added to Playwright-side timeouts so the helper reports first.
const REPLY_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub node_command: String,
    pub headless: bool,
    pub viewport: Viewport,
    pub blocked_resources: Vec<String>,
    pub local_storage: BTreeMap<String, String>,
    /// Upper bound for requests that carry no timeout of their own.
    pub request_timeout: Duration,
    /// Bound on the load wait after a reload.
    pub load_timeout: Duration,
    pub launch_timeout: Duration,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            node_command: config.browser.node_command.clone(),
            headless: config.browser.headless,
            viewport: config.browser.viewport,
            blocked_resources: config.browser.blocked_resources.clone(),
            local_storage: config.browser.local_storage.clone(),
            request_timeout: config.timings.element_timeout,
            load_timeout: config.timings.load_timeout,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HelperOptions<'a> {
    headless: bool,
    viewport: Viewport,
    blocked_resources: &'a [String],
    local_storage: &'a BTreeMap<String, String>,
}

struct HelperIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

pub struct PlaywrightSession {
    child: Mutex<Child>,
    io: Mutex<HelperIo>,
    next_id: AtomicU64,
    request_timeout: Duration,
    load_timeout: Duration,
}

impl PlaywrightSession {
    /// Spawn the helper, launch chromium and wait for it to report ready.
    pub async fn launch(options: SessionOptions) -> Result<Self> {
        ensure_node_available(&options.node_command).await?;
        ensure_playwright_available(&options.node_command).await?;

        let helper_options = serde_json::to_string(&HelperOptions {
            headless: options.headless,
            viewport: options.viewport,
            blocked_resources: &options.blocked_resources,
            local_storage: &options.local_storage,
        })?;

        let mut cmd = Command::new(&options.node_command);
        cmd.arg("-e")
            .arg(HELPER_SCRIPT)
            .arg(helper_options)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &options.node_command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::browser("Playwright helper stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::browser("Playwright helper stdout unavailable"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "sfh::playwright", "{line}");
                }
            });
        }

        let mut io = HelperIo {
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let ready = timeout(options.launch_timeout, read_reply(&mut io.stdout))
            .await
            .map_err(|_| {
                HarnessError::Timeout(format!(
                    "Playwright helper did not become ready within {:?}",
                    options.launch_timeout
                ))
            })??;
        if ready.status != "ready" {
            return Err(map_playwright_status_error(
                &ready.status,
                ready.message.unwrap_or_default(),
            ));
        }
        debug!(viewport = ?options.viewport, headless = options.headless, "browser session ready");

        Ok(Self {
            child: Mutex::new(child),
            io: Mutex::new(io),
            next_id: AtomicU64::new(1),
            request_timeout: options.request_timeout,
            load_timeout: options.load_timeout,
        })
    }

    /// Send one request and wait for its reply.
    pub async fn request(&self, op: &str, args: Value, limit: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({ "id": id, "op": op, "args": args }))?;
        line.push('\n');
        trace!(id, op, "helper request");

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        let exchange = async {
            loop {
                let reply = read_reply(&mut io.stdout).await?;
                if reply.id == Some(id) {
                    return Ok::<_, HarnessError>(reply);
                }
                warn!(expected = id, got = ?reply.id, "discarding stale helper reply");
            }
        };
        let reply = timeout(limit, exchange).await.map_err(|_| {
            HarnessError::Timeout(format!("{op} did not complete within {limit:?}"))
        })??;

        match reply.status.as_str() {
            "ok" => Ok(reply.result),
            status => Err(map_playwright_status_error(
                status,
                reply.message.unwrap_or_default(),
            )),
        }
    }

    async fn call<T: DeserializeOwned>(&self, op: &str, args: Value) -> Result<T> {
        let value = self.request(op, args, self.request_timeout).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn call_with_timeout(&self, op: &str, args: Value, limit: Duration) -> Result<()> {
        self.request(op, args, limit + REPLY_GRACE).await?;
        Ok(())
    }

    /// Close the browser and wait for the helper to exit.
    pub async fn close(&self) -> Result<()> {
        self.request("close", json!({}), self.request_timeout).await?;
        let mut child = self.child.lock().await;
        match timeout(REPLY_GRACE, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?status, "browser session closed");
            }
            Err(_) => {
                warn!("Playwright helper did not exit after close, killing it");
                child.kill().await?;
            }
        }
        Ok(())
    }
}

async fn read_reply(lines: &mut Lines<BufReader<ChildStdout>>) -> Result<HelperReply> {
    match lines.next_line().await? {
        Some(line) => Ok(serde_json::from_str(&line)?),
        None => Err(HarnessError::browser("Playwright helper exited unexpectedly")),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl DomQuery for PlaywrightSession {
    async fn goto(&self, url: &str, state: LoadState, limit: Duration) -> Result<()> {
        debug!(url, ?state, "navigating");
        self.call_with_timeout(
            "goto",
            json!({ "url": url, "state": state, "timeoutMs": millis(limit) }),
            limit,
        )
        .await
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        self.call("locate", json!({ "locator": locator })).await
    }

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.call("attribute", json!({ "handle": handle, "name": name }))
            .await
    }

    async fn text(&self, handle: &ElementHandle) -> Result<Option<String>> {
        self.call("text", json!({ "handle": handle })).await
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        self.call("click", json!({ "handle": handle })).await
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()> {
        self.call("fill", json!({ "handle": handle, "value": value }))
            .await
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool> {
        self.call("isVisible", json!({ "handle": handle })).await
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool> {
        self.call("isEnabled", json!({ "handle": handle })).await
    }

    async fn is_checked(&self, handle: &ElementHandle) -> Result<bool> {
        self.call("isChecked", json!({ "handle": handle })).await
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, limit: Duration) -> Result<()> {
        self.call_with_timeout(
            "waitFor",
            json!({ "locator": locator, "state": state, "timeoutMs": millis(limit) }),
            limit,
        )
        .await
    }

    async fn reload(&self, state: LoadState) -> Result<()> {
        debug!(?state, "reloading");
        self.call_with_timeout(
            "reload",
            json!({ "state": state, "timeoutMs": millis(self.load_timeout) }),
            self.load_timeout,
        )
        .await
    }

    async fn wait_for_load_state(&self, state: LoadState, limit: Duration) -> Result<()> {
        self.call_with_timeout(
            "waitForLoadState",
            json!({ "state": state, "timeoutMs": millis(limit) }),
            limit,
        )
        .await
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn current_url(&self) -> Result<String> {
        self.call("url", json!({})).await
    }

    async fn title(&self) -> Result<String> {
        self.call("title", json!({})).await
    }
}
