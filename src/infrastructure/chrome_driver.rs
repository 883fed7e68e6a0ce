//! Chrome 驱动 - 基础设施层
//!
//! 基于 `JsExecutor` 实现 `PageStateProvider` 与 `Driver`。
//! 页面读取和填值都通过注入 JS 完成，导航、按键和文件上传走 CDP。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::BrowserError;
use crate::infrastructure::driver::{Driver, PageStateProvider};
use crate::infrastructure::JsExecutor;
use crate::models::{ClickTarget, DriverAction, PageSnapshot, QuestionKind};

/// 快照中 raw_markup 的最大长度
const MAX_MARKUP_CHARS: usize = 60_000;

/// 读取页面控件快照
///
/// 单选按钮按 name 合并为一组，优先使用所在 fieldset 的 id。
const SNAPSHOT_JS: &str = r#"
(() => {
    const MAX_MARKUP = __MAX_MARKUP__;
    const clean = (s) => (s || '').replace(/\s+/g, ' ').trim();
    const isVisible = (el) => {
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        return style.visibility !== 'hidden' && style.display !== 'none' && (rect.width > 0 || rect.height > 0);
    };
    const labelOf = (el) => {
        if (el.labels && el.labels.length > 0) return clean(el.labels[0].innerText);
        const aria = el.getAttribute('aria-label');
        if (aria) return clean(aria);
        const labelledBy = el.getAttribute('aria-labelledby');
        if (labelledBy) {
            const ref = document.getElementById(labelledBy.split(' ')[0]);
            if (ref) return clean(ref.innerText);
        }
        const fieldset = el.closest('fieldset');
        if (fieldset) {
            const legend = fieldset.querySelector('legend');
            if (legend) return clean(legend.innerText);
        }
        return null;
    };

    const buttons = Array.from(document.querySelectorAll('button, [role="button"], input[type="submit"]'))
        .map((b) => ({
            text: clean(b.innerText || b.value || ''),
            aria_label: b.getAttribute('aria-label'),
            visible: isVisible(b),
            enabled: !b.disabled && b.getAttribute('aria-disabled') !== 'true',
        }))
        .filter((b) => b.text.length > 0 || b.aria_label);

    const links = Array.from(document.querySelectorAll('a'))
        .map((a) => ({ text: clean(a.innerText), href: a.getAttribute('href') }))
        .filter((l) => l.text.length > 0)
        .slice(0, 50);

    const inputs = [];
    const seenGroups = new Set();
    for (const el of document.querySelectorAll('input, select, textarea')) {
        const type = (el.getAttribute('type') || '').toLowerCase();
        if (['hidden', 'submit', 'button', 'reset', 'image'].includes(type)) continue;

        if (type === 'radio') {
            const groupKey = el.name || el.id;
            if (seenGroups.has(groupKey)) continue;
            seenGroups.add(groupKey);
            const members = el.name
                ? Array.from(document.querySelectorAll('input[type="radio"]')).filter((r) => r.name === el.name)
                : [el];
            const fieldset = el.closest('fieldset');
            const legend = fieldset ? fieldset.querySelector('legend') : null;
            inputs.push({
                tag: fieldset && fieldset.id ? 'fieldset' : 'input',
                type: 'radio',
                placeholder: null,
                name: el.name || null,
                id: (fieldset && fieldset.id) || null,
                label: legend ? clean(legend.innerText) : labelOf(el),
                options: members.map((r) => ({
                    label: clean((r.labels && r.labels[0] && r.labels[0].innerText) || r.getAttribute('aria-label') || r.value),
                    value: r.value,
                })),
                visible: members.some(isVisible) || (fieldset ? isVisible(fieldset) : false),
                enabled: members.some((r) => !r.disabled),
            });
            continue;
        }

        const tag = el.tagName.toLowerCase();
        const options = tag === 'select'
            ? Array.from(el.options)
                .filter((o) => o.value !== '')
                .map((o) => ({ label: clean(o.text), value: o.value }))
            : [];
        inputs.push({
            tag,
            type: type || null,
            placeholder: el.getAttribute('placeholder'),
            name: el.name || null,
            id: el.id || null,
            label: labelOf(el),
            options,
            visible: isVisible(el),
            enabled: !el.disabled,
        });
    }

    const container = document.querySelector('[role="dialog"] form')
        || document.querySelector('[role="dialog"]')
        || document.querySelector('form');
    const markup = container ? container.outerHTML : null;

    return {
        url: window.location.href,
        title: document.title,
        buttons,
        links,
        inputs,
        raw_markup: markup ? markup.slice(0, MAX_MARKUP) : null,
    };
})()
"#;

/// 给控件设值；单选组会在组内找到匹配的选项并点击
const SET_VALUE_JS: &str = r#"
(() => {
    const id = __ID__;
    const value = __VALUE__;
    const kind = __KIND__;
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const byName = (name) => Array.from(document.getElementsByName(name));

    let el = document.getElementById(id) || byName(id)[0];
    if (!el) return `Error: element '${id}' not found`;

    let radios = [];
    if (el.matches('input[type="radio"]')) {
        radios = el.name ? byName(el.name).filter((r) => r.type === 'radio') : [el];
    } else if (kind === 'radio' || el.tagName === 'FIELDSET') {
        radios = Array.from(el.querySelectorAll('input[type="radio"]'));
    }

    if (radios.length > 0) {
        const labelOf = (r) => norm(
            (r.labels && r.labels[0] && r.labels[0].innerText)
            || r.getAttribute('data-test-text-selectable-option__input')
            || r.getAttribute('aria-label')
        );
        const target = radios.find((r) => norm(r.value) === norm(value))
            || radios.find((r) => labelOf(r) === norm(value));
        if (!target) return `Error: no radio option '${value}' in '${id}'`;
        if (!target.checked) {
            const label = target.labels && target.labels[0];
            (label || target).click();
        }
        return `Successfully selected radio option '${target.value}' in '${id}'`;
    }

    if (el.tagName === 'SELECT') {
        const options = Array.from(el.options);
        const option = options.find((o) => o.value === value) || options.find((o) => norm(o.text) === norm(value));
        if (!option) return `Error: no option '${value}' in select '${id}'`;
        el.value = option.value;
        el.dispatchEvent(new Event('change', { bubbles: true }));
        return `Successfully selected option '${option.value}' in '${id}'`;
    }

    if (el.type === 'checkbox') {
        const wanted = ['true', 'yes', '1', 'checked', 'on'].includes(norm(value));
        if (el.checked !== wanted) el.click();
        return `Successfully set checkbox '${id}' to ${wanted}`;
    }

    if (el.type === 'file') return `Error: unsupported control kind 'file' for set_value on '${id}'`;
    if (el.tagName !== 'INPUT' && el.tagName !== 'TEXTAREA') {
        return `Error: unsupported control kind '${el.tagName.toLowerCase()}' on '${id}'`;
    }

    const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    el.focus();
    setter.call(el, value);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    el.blur();
    return `Successfully filled field '${id}'`;
})()
"#;

/// 点击按钮或链接：先精确匹配文字，再匹配 aria-label，最后子串匹配
const CLICK_JS: &str = r#"
(() => {
    const target = __TARGET__;
    const identifier = __IDENTIFIER__;
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const wanted = norm(identifier);
    const thirdParty = ['apple', 'google', 'facebook', 'microsoft', 'sso', 'continue with'];
    const isVisible = (el) => {
        const rect = el.getBoundingClientRect();
        return rect.width > 0 || rect.height > 0;
    };

    const selector = target === 'link' ? 'a' : 'button, [role="button"], input[type="submit"]';
    const candidates = Array.from(document.querySelectorAll(selector)).filter(isVisible);
    const textOf = (el) => norm(el.innerText || el.value || '');

    let hit = candidates.find((el) => textOf(el) === wanted)
        || candidates.find((el) => norm(el.getAttribute('aria-label')) === wanted);
    if (!hit) {
        hit = candidates.find((el) => {
            const text = textOf(el);
            if (!text.includes(wanted)) return false;
            return !thirdParty.some((p) => text.includes(p));
        });
    }
    if (!hit && target === 'link') {
        hit = candidates.find((el) => (el.getAttribute('href') || '').includes(identifier));
    }
    if (!hit) return `Error: Could not find ${target} with identifier '${identifier}'`;
    if (hit.disabled) return `Error: ${target} '${identifier}' is disabled`;

    const label = (hit.innerText || hit.value || hit.getAttribute('aria-label') || '').replace(/\s+/g, ' ').trim();
    hit.click();
    return `Successfully clicked ${target}: ${label}`;
})()
"#;

/// Chrome 驱动
///
/// 持有 `JsExecutor`（即唯一的 page），一次申请内由流程层独占使用。
pub struct ChromeDriver {
    executor: JsExecutor,
    settle: Duration,
}

impl ChromeDriver {
    pub fn new(executor: JsExecutor, settle: Duration) -> Self {
        Self { executor, settle }
    }

    /// 确认页面可用，不可用时等待一次再检查
    async fn ensure_page(&self) -> Result<()> {
        if self.executor.is_alive().await {
            return Ok(());
        }
        warn!("页面暂不可用，等待后重新检查...");
        sleep(self.settle * 2).await;
        if self.executor.is_alive().await {
            Ok(())
        } else {
            Err(BrowserError::PageUnavailable {
                reason: "document.readyState 无法读取".to_string(),
            }
            .into())
        }
    }

    async fn set_value(&self, identifier: &str, value: &str, kind: QuestionKind) -> Result<String> {
        let js_code = SET_VALUE_JS
            .replace("__ID__", &serde_json::to_string(identifier)?)
            .replace("__VALUE__", &serde_json::to_string(value)?)
            .replace("__KIND__", &serde_json::to_string(kind.as_str())?);
        let outcome: String = self.executor.eval_as(js_code).await?;
        Ok(outcome)
    }

    async fn click(&self, target: ClickTarget, identifier: &str) -> Result<String> {
        let js_code = CLICK_JS
            .replace("__TARGET__", &serde_json::to_string(target.as_str())?)
            .replace("__IDENTIFIER__", &serde_json::to_string(identifier)?);
        let outcome: String = self.executor.eval_as(js_code).await?;
        // 等待点击后的页面变化
        sleep(self.settle).await;
        Ok(outcome)
    }

    async fn navigate(&self, url: &str) -> Result<String> {
        let page = self.executor.page();
        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        page.wait_for_navigation().await?;
        sleep(self.settle).await;
        info!("已导航到: {}", url);
        Ok(format!("Successfully navigated to: {}", url))
    }

    async fn press_enter(&self, identifier: &str) -> Result<String> {
        let element = match self.executor.page().find_element(element_selector(identifier)).await {
            Ok(element) => element,
            Err(e) => {
                debug!("未找到输入框 {}: {}", identifier, e);
                return Ok(format!("Error: No input found matching identifier '{}'", identifier));
            }
        };
        element.focus().await?;
        element.press_key("Enter").await?;
        sleep(self.settle).await;
        Ok(format!("Successfully pressed Enter on input '{}'", identifier))
    }

    async fn upload_file(&self, identifier: &str, path: &str) -> Result<String> {
        let absolute = tokio::fs::canonicalize(path)
            .await
            .with_context(|| format!("无法找到上传文件: {}", path))?;
        let element = match self.executor.page().find_element(element_selector(identifier)).await {
            Ok(element) => element,
            Err(e) => {
                debug!("未找到文件输入框 {}: {}", identifier, e);
                return Ok(format!("Error: No file input found matching identifier '{}'", identifier));
            }
        };

        let mut params = SetFileInputFilesParams::new(vec![absolute.to_string_lossy().to_string()]);
        params.backend_node_id = Some(element.backend_node_id);
        self.executor.page().execute(params).await?;
        sleep(self.settle).await;
        Ok(format!("Successfully uploaded '{}' to '{}'", path, identifier))
    }
}

#[async_trait]
impl PageStateProvider for ChromeDriver {
    async fn snapshot(&self) -> Result<PageSnapshot> {
        self.ensure_page().await?;
        let js_code = SNAPSHOT_JS.replace("__MAX_MARKUP__", &MAX_MARKUP_CHARS.to_string());
        let snapshot: PageSnapshot = self.executor.eval_as(js_code).await?;
        debug!(
            "页面快照: {} 个按钮, {} 个链接, {} 个输入控件",
            snapshot.buttons.len(),
            snapshot.links.len(),
            snapshot.inputs.len()
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn dispatch(&self, action: &DriverAction) -> Result<String> {
        self.ensure_page().await?;
        debug!("🔧 执行动作: {} {}", action.tag(), action.target_description());
        match action {
            DriverAction::Click { target, identifier } => self.click(*target, identifier).await,
            DriverAction::SetValue {
                identifier,
                value,
                kind,
            } => self.set_value(identifier, value, *kind).await,
            DriverAction::Navigate { url } => self.navigate(url).await,
            DriverAction::PressEnter { identifier } => self.press_enter(identifier).await,
            DriverAction::UploadFile { identifier, path } => self.upload_file(identifier, path).await,
        }
    }
}

/// 按 id 或 name 定位元素的 CSS 选择器
fn element_selector(identifier: &str) -> String {
    let escaped = identifier.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"[id="{0}"], [name="{0}"]"#, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_selector_escapes_quotes() {
        assert_eq!(element_selector("phone"), r#"[id="phone"], [name="phone"]"#);
        assert_eq!(element_selector(r#"a"b"#), r#"[id="a\"b"], [name="a\"b"]"#);
    }

    #[test]
    fn test_scripts_have_no_unfilled_placeholders_after_substitution() {
        let js = SET_VALUE_JS
            .replace("__ID__", "\"x\"")
            .replace("__VALUE__", "\"y\"")
            .replace("__KIND__", "\"text\"");
        assert!(!js.contains("__ID__") && !js.contains("__VALUE__") && !js.contains("__KIND__"));
        let js = CLICK_JS
            .replace("__TARGET__", "\"button\"")
            .replace("__IDENTIFIER__", "\"Next\"");
        assert!(!js.contains("__TARGET__") && !js.contains("__IDENTIFIER__"));
    }
}
