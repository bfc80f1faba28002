//! Chrome DevTools driver (feature `browser`).
//!
//! Element lookup runs as JavaScript in the page. Every element handed out
//! is tagged with a [`REF_ATTR`] attribute whose value becomes its
//! [`ElementRef`]; later calls resolve the handle by that attribute, and a
//! handle whose element left the document is stale. Native clicks and key
//! presses go through CDP input events.

use crate::config::HarnessConfig;
use crate::driver::{Driver, ElementRef, Key, Screenshot};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams, DispatchMouseEventType,
    InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Attribute carrying the element handle id
pub const REF_ATTR: &str = "data-harness-ref";

/// Extra Chrome switches
const CHROME_ARGS: [&str; 2] = ["--disable-dev-shm-usage", "--disable-gpu"];

/// Tags an array of elements and returns their handle ids
///
/// Ids are prefixed with a per-document token so a handle from a previous
/// page never resolves on the next one.
const TAG_ELEMENTS: &str = "((els) => { \
    window.__harnessDoc = window.__harnessDoc || Math.random().toString(36).slice(2); \
    window.__harnessSeq = window.__harnessSeq || 0; \
    return els.map((e) => { \
        if (!e.hasAttribute('data-harness-ref')) { \
            const ref = window.__harnessDoc + '-' + (++window.__harnessSeq); \
            e.setAttribute('data-harness-ref', ref); \
        } \
        return e.getAttribute('data-harness-ref'); \
    }); })";

/// Scrolls an element to the viewport centre and hit-tests its midpoint
const CLICK_PROBE: &str = "(() => { \
    el.scrollIntoView({ block: 'center', inline: 'center' }); \
    const r = el.getBoundingClientRect(); \
    if (r.width === 0 && r.height === 0) { return { hidden: true }; } \
    if (el.disabled) { return { disabled: true }; } \
    const x = r.left + r.width / 2; \
    const y = r.top + r.height / 2; \
    const hit = document.elementFromPoint(x, y); \
    if (hit && hit !== el && !el.contains(hit)) { \
        const id = hit.id ? '#' + hit.id : ''; \
        const named = typeof hit.className === 'string' && hit.className; \
        const cls = named ? '.' + hit.className.trim().split(/\\s+/).join('.') : ''; \
        return { x, y, blockedBy: hit.tagName.toLowerCase() + id + cls }; \
    } \
    return { x, y }; })()";

/// Sets an input's value through the native setter so framework listeners see it
const CLEAR_VALUE: &str = "(() => { \
    const proto = el instanceof HTMLTextAreaElement \
        ? HTMLTextAreaElement.prototype \
        : HTMLInputElement.prototype; \
    Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, ''); \
    el.dispatchEvent(new Event('input', { bubbles: true })); \
    el.dispatchEvent(new Event('change', { bubbles: true })); \
    return true; })()";

const IS_DISPLAYED: &str = "(() => { \
    const s = getComputedStyle(el); \
    if (s.display === 'none' || s.visibility === 'hidden' || s.opacity === '0') { return false; } \
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); })()";

/// JavaScript string literal for `s`
fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}

/// Script running `body` with `el` bound to the element behind `element`
///
/// Evaluates to `{ stale: true }` when the element is gone, otherwise to
/// `{ value: body }`.
#[must_use]
pub fn element_script(element: &ElementRef, body: &str) -> String {
    let selector = js_string(&format!("[{REF_ATTR}=\"{}\"]", element.id()));
    format!(
        "(() => {{ const el = document.querySelector({selector}); \
         if (!el) {{ return {{ stale: true }}; }} \
         return {{ value: ({body}) }}; }})()"
    )
}

/// Where to click, or why the element cannot take a native click
///
/// # Errors
///
/// Returns [`HarnessError::NotInteractable`] for hidden or disabled elements
/// and [`HarnessError::ClickIntercepted`] when another element is on top.
pub fn click_point(element: &ElementRef, probe: &Value) -> HarnessResult<(f64, f64)> {
    let flag = |name: &str| probe.get(name).and_then(Value::as_bool).unwrap_or(false);
    if flag("hidden") {
        return Err(HarnessError::NotInteractable {
            locator: element.to_string(),
            message: "element has no size".to_string(),
        });
    }
    if flag("disabled") {
        return Err(HarnessError::NotInteractable {
            locator: element.to_string(),
            message: "element is disabled".to_string(),
        });
    }
    if let Some(blocker) = probe.get("blockedBy").and_then(Value::as_str) {
        return Err(HarnessError::ClickIntercepted {
            locator: element.to_string(),
            intercepted_by: blocker.to_string(),
        });
    }
    match (
        probe.get("x").and_then(Value::as_f64),
        probe.get("y").and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(HarnessError::driver(format!("click probe returned {probe}"))),
    }
}

/// DevTools key parameters: key, code, virtual key code, text
const fn key_params(key: Key) -> (&'static str, &'static str, i64, Option<&'static str>) {
    match key {
        Key::Enter => ("Enter", "Enter", 13, Some("\r")),
        Key::Tab => ("Tab", "Tab", 9, None),
        Key::Escape => ("Escape", "Escape", 27, None),
        Key::SelectAll => ("a", "KeyA", 65, None),
    }
}

fn cdp_error(e: CdpError) -> HarnessError {
    match e {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            HarnessError::SessionDead {
                message: e.to_string(),
            }
        }
        other => HarnessError::driver(other.to_string()),
    }
}

fn build_error(message: String) -> HarnessError {
    HarnessError::driver(format!("invalid CDP command: {message}"))
}

/// Chrome session over the DevTools protocol
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chrome and open a blank page
    ///
    /// The window is visible unless `HEADLESS` is set.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::BrowserLaunch`] if Chrome cannot be started.
    pub async fn launch(config: &HarnessConfig) -> HarnessResult<Self> {
        let launch_error = |message: String| HarnessError::BrowserLaunch { message };
        let (width, height) = config.window_size;

        let mut builder = CdpConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .request_timeout(config.page_load_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        for arg in CHROME_ARGS {
            builder = builder.arg(arg);
        }
        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(launch_error)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| launch_error(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| launch_error(e.to_string()))?;

        info!(
            browser = %config.browser,
            headless = config.headless,
            width,
            height,
            "Browser launched"
        );
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        })
    }

    async fn eval(&self, script: &str) -> HarnessResult<Value> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn on_element(&self, element: &ElementRef, body: &str) -> HarnessResult<Value> {
        let result = self.eval(&element_script(element, body)).await?;
        if result.get("stale").and_then(Value::as_bool).unwrap_or(false) {
            return Err(HarnessError::StaleElement {
                id: element.id().to_string(),
            });
        }
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn element_flag(&self, element: &ElementRef, body: &str) -> HarnessResult<bool> {
        Ok(self.on_element(element, body).await?.as_bool().unwrap_or(false))
    }

    async fn element_string(&self, element: &ElementRef, body: &str) -> HarnessResult<String> {
        Ok(self
            .on_element(element, body)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn tagged(&self, expression: &str) -> HarnessResult<Vec<ElementRef>> {
        let ids = self.eval(expression).await?;
        Ok(refs_from(&ids))
    }

    async fn tagged_on(
        &self,
        element: &ElementRef,
        expression: &str,
    ) -> HarnessResult<Vec<ElementRef>> {
        let ids = self
            .on_element(element, &format!("{TAG_ELEMENTS}({expression})"))
            .await?;
        Ok(refs_from(&ids))
    }

    async fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> HarnessResult<()> {
        let mut params = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
        if !matches!(kind, DispatchMouseEventType::MouseMoved) {
            params = params.button(MouseButton::Left).click_count(1);
        }
        self.page
            .execute(params.build().map_err(build_error)?)
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn key_event(&self, kind: DispatchKeyEventType, key: Key) -> HarnessResult<()> {
        let (name, code, virtual_code, text) = key_params(key);
        let mut params = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(name)
            .code(code)
            .windows_virtual_key_code(virtual_code);
        if let (DispatchKeyEventType::KeyDown, Some(text)) = (kind, text) {
            params = params.text(text);
        }
        self.page
            .execute(params.build().map_err(build_error)?)
            .await
            .map_err(cdp_error)?;
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn refs_from(ids: &Value) -> Vec<ElementRef> {
    ids.as_array()
        .map(|ids| ids.iter().filter_map(Value::as_str).map(ElementRef::new).collect())
        .unwrap_or_default()
}

#[async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        self.page.goto(url).await.map_err(|e| match cdp_error(e) {
            dead @ HarnessError::SessionDead { .. } => dead,
            other => HarnessError::Navigation {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;
        Ok(())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn ready_state(&self) -> HarnessResult<String> {
        Ok(self
            .eval("document.readyState")
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn refresh(&self) -> HarnessResult<()> {
        self.page.reload().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>> {
        self.tagged(&format!("{TAG_ELEMENTS}({})", locator.to_query_all("document")))
            .await
    }

    async fn find_within(
        &self,
        scope: &ElementRef,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementRef>> {
        self.tagged_on(scope, &locator.to_query_all("el")).await
    }

    async fn parent(&self, element: &ElementRef) -> HarnessResult<Option<ElementRef>> {
        let parents = self
            .tagged_on(element, "el.parentElement ? [el.parentElement] : []")
            .await?;
        Ok(parents.into_iter().next())
    }

    async fn children(&self, element: &ElementRef) -> HarnessResult<Vec<ElementRef>> {
        self.tagged_on(element, "Array.from(el.children)").await
    }

    async fn tag_name(&self, element: &ElementRef) -> HarnessResult<String> {
        self.element_string(element, "el.tagName.toLowerCase()").await
    }

    async fn text(&self, element: &ElementRef) -> HarnessResult<String> {
        self.element_string(element, "el.innerText || el.textContent || ''").await
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> HarnessResult<Option<String>> {
        let value = self
            .on_element(element, &format!("el.getAttribute({})", js_string(name)))
            .await?;
        Ok(value.as_str().map(ToString::to_string))
    }

    async fn property(&self, element: &ElementRef, name: &str) -> HarnessResult<Value> {
        self.on_element(element, &format!("el[{}]", js_string(name))).await
    }

    async fn css_value(&self, element: &ElementRef, name: &str) -> HarnessResult<String> {
        self.element_string(
            element,
            &format!("getComputedStyle(el).getPropertyValue({})", js_string(name)),
        )
        .await
    }

    async fn is_displayed(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.element_flag(element, IS_DISPLAYED).await
    }

    async fn is_enabled(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.element_flag(element, "!el.disabled").await
    }

    async fn is_selected(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.element_flag(element, "!!(el.checked || el.selected)").await
    }

    async fn is_invalid(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.element_flag(element, "el.matches(':invalid')").await
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> HarnessResult<()> {
        self.on_element(element, "el.scrollIntoView({ block: 'center', inline: 'center' })")
            .await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> HarnessResult<()> {
        let probe = self.on_element(element, CLICK_PROBE).await?;
        let (x, y) = click_point(element, &probe)?;
        self.mouse(DispatchMouseEventType::MouseMoved, x, y).await?;
        self.mouse(DispatchMouseEventType::MousePressed, x, y).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, x, y).await?;
        debug!(element = %element, x, y, "Native click");
        Ok(())
    }

    async fn js_click(&self, element: &ElementRef) -> HarnessResult<()> {
        self.on_element(element, "el.click()").await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> HarnessResult<()> {
        self.on_element(element, CLEAR_VALUE).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> HarnessResult<()> {
        self.on_element(element, "el.focus()").await?;
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn press_key(&self, element: &ElementRef, key: Key) -> HarnessResult<()> {
        if key == Key::SelectAll {
            self.on_element(element, "(el.focus(), el.select ? el.select() : null)")
                .await?;
            return Ok(());
        }
        self.on_element(element, "el.focus()").await?;
        self.key_event(DispatchKeyEventType::KeyDown, key).await?;
        self.key_event(DispatchKeyEventType::KeyUp, key).await
    }

    async fn remove_elements(&self, ids: &[&str]) -> HarnessResult<()> {
        let ids = Value::from(ids.to_vec()).to_string();
        self.eval(&format!(
            "{ids}.forEach((id) => {{ \
                const e = document.getElementById(id); \
                if (e) {{ e.remove(); }} \
            }})"
        ))
        .await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> HarnessResult<Value> {
        self.eval(script).await
    }

    async fn screenshot(&self) -> HarnessResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(|e| HarnessError::Screenshot {
            message: e.to_string(),
        })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| HarnessError::Screenshot {
                message: e.to_string(),
            })?;
        Ok(Screenshot::new(data))
    }

    async fn close(&self) -> HarnessResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        browser.close().await.map_err(cdp_error)?;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        info!("Browser closed");
        Ok(())
    }

    async fn force_close(&self) -> HarnessResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        if let Some(Err(e)) = browser.kill().await {
            return Err(HarnessError::driver(format!("could not kill browser: {e}")));
        }
        self.handler.abort();
        warn!("Browser killed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_script_resolves_by_ref() {
        let script = element_script(&ElementRef::new("abc-7"), "el.tagName");
        assert!(script.contains(r#"[data-harness-ref=\"abc-7\"]"#));
        assert!(script.contains("stale: true"));
        assert!(script.contains("value: (el.tagName)"));
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("it's \"x\""), r#""it's \"x\"""#);
    }

    #[test]
    fn test_click_point() {
        let el = ElementRef::new("d-1");
        assert_eq!(click_point(&el, &json!({"x": 10.5, "y": 20.0})).unwrap(), (10.5, 20.0));
        assert!(matches!(
            click_point(&el, &json!({"x": 1, "y": 2, "blockedBy": "div#fixedban"})),
            Err(HarnessError::ClickIntercepted { intercepted_by, .. })
                if intercepted_by == "div#fixedban"
        ));
        assert!(matches!(
            click_point(&el, &json!({"hidden": true})),
            Err(HarnessError::NotInteractable { .. })
        ));
        assert!(matches!(
            click_point(&el, &json!({"disabled": true})),
            Err(HarnessError::NotInteractable { .. })
        ));
        assert!(click_point(&el, &Value::Null).is_err());
    }

    #[test]
    fn test_refs_from() {
        let refs = refs_from(&json!(["a-1", "a-2", null]));
        assert_eq!(refs, vec![ElementRef::new("a-1"), ElementRef::new("a-2")]);
        assert!(refs_from(&json!({"stale": true})).is_empty());
    }

    #[test]
    fn test_enter_carries_text() {
        assert_eq!(key_params(Key::Enter).3, Some("\r"));
        assert_eq!(key_params(Key::Escape).2, 27);
    }
}
