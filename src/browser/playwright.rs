//! Playwright helper script, error mapping, and availability checks.

use crate::{HarnessError, Result};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Long-lived helper: reads one JSON request per stdin line and answers with
/// one JSON line on stdout. `process.argv[1]` carries the launch options.
pub(crate) const HELPER_SCRIPT: &str = r#"
const readline = require('readline');
const options = JSON.parse(process.argv[1] || '{}');

function reply(payload) {
  process.stdout.write(JSON.stringify(payload) + '\n');
}

async function main() {
  let browser;
  let chromium;
  try {
    ({ chromium } = require('playwright'));
  } catch (err) {
    reply({ status: 'error', message: err && err.message ? err.message : String(err) });
    process.exit(1);
  }

  browser = await chromium.launch({ headless: options.headless !== false });
  const context = await browser.newContext({
    viewport: { width: options.viewport.width, height: options.viewport.height }
  });

  const storage = options.localStorage || {};
  if (Object.keys(storage).length > 0) {
    await context.addInitScript((entries) => {
      for (const [key, value] of Object.entries(entries)) {
        window.localStorage.setItem(key, value);
      }
    }, storage);
  }

  const blocked = options.blockedResources || [];
  if (blocked.length > 0) {
    await context.route('**/*', (route) => {
      const url = route.request().url();
      if (blocked.some((needle) => url.includes(needle))) {
        return route.abort();
      }
      return route.continue();
    });
  }

  const page = await context.newPage();
  const handles = new Map();
  let nextHandle = 0;

  function handle(id) {
    const locator = handles.get(id);
    if (!locator) {
      throw new Error(`unknown element handle ${id}`);
    }
    return locator;
  }

  function resolve(spec) {
    let locator = spec.within ? handle(spec.within).locator(spec.selector) : page.locator(spec.selector);
    if (spec.hasText) {
      locator = locator.filter({ hasText: spec.hasText });
    }
    return locator;
  }

  const ops = {
    goto: async (a) => { await page.goto(a.url, { waitUntil: a.state, timeout: a.timeoutMs }); },
    locate: async (a) => {
      const found = await resolve(a.locator).all();
      return found.map((locator) => {
        const id = `e${nextHandle++}`;
        handles.set(id, locator);
        return id;
      });
    },
    attribute: (a) => handle(a.handle).getAttribute(a.name),
    text: (a) => handle(a.handle).textContent(),
    click: async (a) => { await handle(a.handle).click(); },
    fill: async (a) => { await handle(a.handle).fill(a.value); },
    isVisible: (a) => handle(a.handle).isVisible(),
    isEnabled: (a) => handle(a.handle).isEnabled(),
    isChecked: (a) => handle(a.handle).isChecked(),
    waitFor: async (a) => {
      await resolve(a.locator).first().waitFor({ state: a.state, timeout: a.timeoutMs });
    },
    reload: async (a) => {
      handles.clear();
      await page.reload({ waitUntil: a.state, timeout: a.timeoutMs });
    },
    waitForLoadState: async (a) => { await page.waitForLoadState(a.state, { timeout: a.timeoutMs }); },
    url: async () => page.url(),
    title: () => page.title(),
    close: async () => { await browser.close(); }
  };

  reply({ status: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let request;
    try {
      request = JSON.parse(line);
    } catch (err) {
      reply({ status: 'error', message: `malformed request: ${err.message}` });
      continue;
    }
    const op = ops[request.op];
    if (!op) {
      reply({ id: request.id, status: 'error', message: `unknown op ${request.op}` });
      continue;
    }
    try {
      const result = await op(request.args || {});
      reply({ id: request.id, status: 'ok', result: result === undefined ? null : result });
    } catch (err) {
      const message = err && err.message ? err.message : String(err);
      const status = err && err.name === 'TimeoutError' ? 'timeout' : 'error';
      reply({ id: request.id, status, message });
    }
    if (request.op === 'close') break;
  }
  process.exit(0);
}

main().catch((err) => {
  reply({ status: 'error', message: err && err.message ? err.message : String(err) });
  process.exit(1);
});
"#;

/// Timeout for checking node/playwright availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

const MISSING_PLAYWRIGHT: &str =
    "Playwright npm package is missing; install with `npm install playwright`.";

/// One line written by the helper.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct HelperReply {
    pub id: Option<u64>,
    pub status: String,
    pub message: Option<String>,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Maps a helper spawn failure; a missing binary is a configuration problem.
pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> HarnessError {
    if err.kind() == io::ErrorKind::NotFound {
        HarnessError::Config(format!(
            "Unable to spawn Playwright helper; '{}' was not found on PATH",
            command
        ))
    } else {
        HarnessError::Io(err)
    }
}

/// Maps helper stderr (JSON reply or plain text) to a harness error.
pub(crate) fn map_playwright_error(status_text: impl Into<String>, stderr: &str) -> HarnessError {
    if let Ok(reply) = serde_json::from_str::<HelperReply>(stderr.trim()) {
        return map_playwright_status_error(&reply.status, reply.message.unwrap_or_default());
    }

    if stderr
        .to_ascii_lowercase()
        .contains("cannot find module 'playwright'")
    {
        return HarnessError::browser(MISSING_PLAYWRIGHT);
    }

    HarnessError::browser(format!(
        "Playwright exited with status {}: {}",
        status_text.into(),
        stderr.trim()
    ))
}

/// Maps a non-ok helper status to a harness error.
pub(crate) fn map_playwright_status_error(status: &str, message: String) -> HarnessError {
    if message
        .to_ascii_lowercase()
        .contains("cannot find module 'playwright'")
    {
        HarnessError::browser(MISSING_PLAYWRIGHT)
    } else if status == "timeout" {
        HarnessError::Timeout(message)
    } else {
        HarnessError::browser(format!("Playwright error (status {}): {}", status, message))
    }
}

/// Ensures the configured node binary is available.
pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            HarnessError::browser(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(HarnessError::browser(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }
    Ok(())
}

/// Ensures the Playwright npm package resolves from the node binary.
pub(crate) async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            HarnessError::browser(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_playwright_error(format!("{:?}", output.status), &stderr));
    }
    Ok(())
}
