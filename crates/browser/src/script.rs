//! JavaScript evaluated in the page.
//!
//! Elements are addressed by a `data-wa2tg-ref` attribute stamped on the
//! first lookup that matches them. An element keeps its ref for as long as it
//! stays in the DOM.

use crate::types::{ElementRef, Locator};

/// Attribute carrying an element's ref.
pub(crate) const REF_ATTR: &str = "data-wa2tg-ref";

/// Evaluate an XPath, stamp unseen matches with fresh refs starting at
/// `nextRef`, and report the refs plus how many were minted.
///
/// Returns `null` when the scope element is gone.
const FIND_JS: &str = r#"
((xpath, scopeRef, nextRef) => {
    let scope = document;
    if (scopeRef !== null) {
        scope = document.querySelector(`[data-wa2tg-ref="${scopeRef}"]`);
        if (!scope) return null;
    }
    const snapshot = document.evaluate(
        xpath, scope, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null
    );
    const refs = [];
    let minted = 0;
    for (let i = 0; i < snapshot.snapshotLength; i++) {
        const el = snapshot.snapshotItem(i);
        if (!(el instanceof Element)) continue;
        let ref = el.getAttribute('data-wa2tg-ref');
        if (ref === null) {
            ref = String(nextRef + minted);
            minted += 1;
            el.setAttribute('data-wa2tg-ref', ref);
        }
        refs.push(Number(ref));
    }
    return { refs, minted };
})
"#;

/// Locate an element's center, scrolling it into view first.
const CENTER_JS: &str = r#"
((ref) => {
    const el = document.querySelector(`[data-wa2tg-ref="${ref}"]`);
    if (!el) return null;
    el.scrollIntoView({ behavior: 'instant', block: 'center' });
    const rect = el.getBoundingClientRect();
    return { centerX: rect.x + rect.width / 2, centerY: rect.y + rect.height / 2 };
})
"#;

/// Empty an input, textarea, or contenteditable and leave it focused.
const CLEAR_JS: &str = r#"
((ref) => {
    const el = document.querySelector(`[data-wa2tg-ref="${ref}"]`);
    if (!el) return false;
    el.focus();
    if ('value' in el) {
        el.value = '';
    } else if (el.isContentEditable) {
        const selection = window.getSelection();
        const range = document.createRange();
        range.selectNodeContents(el);
        selection.removeAllRanges();
        selection.addRange(range);
        document.execCommand('delete');
    }
    el.dispatchEvent(new Event('input', { bubbles: true }));
    return true;
})
"#;

pub(crate) fn find(locator: &Locator, scope: Option<ElementRef>, next_ref: u32) -> String {
    // serde_json produces a valid, escaped JS string literal.
    let xpath = serde_json::Value::String(locator.xpath.to_string());
    let scope = scope.map_or_else(|| "null".to_string(), |r| r.0.to_string());
    format!("({FIND_JS})({xpath}, {scope}, {next_ref})")
}

pub(crate) fn center(element: ElementRef) -> String {
    format!("({CENTER_JS})({})", element.0)
}

pub(crate) fn clear(element: ElementRef) -> String {
    format!("({CLEAR_JS})({})", element.0)
}

pub(crate) fn focus(element: ElementRef) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('[{REF_ATTR}="{}"]');
            if (!el) return false;
            el.focus();
            return true;
        }})()"#,
        element.0
    )
}

pub(crate) fn inner_text(element: ElementRef) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('[{REF_ATTR}="{}"]');
            return el ? (el.innerText ?? el.textContent ?? '') : null;
        }})()"#,
        element.0
    )
}

/// Evaluates to `{ found, value }` so a missing element and a missing
/// attribute can be told apart.
pub(crate) fn attribute(element: ElementRef, name: &str) -> String {
    let name = serde_json::Value::String(name.to_string());
    format!(
        r#"(() => {{
            const el = document.querySelector('[{REF_ATTR}="{}"]');
            if (!el) return {{ found: false, value: null }};
            return {{ found: true, value: el.getAttribute({name}) }};
        }})()"#,
        element.0
    )
}

pub(crate) fn is_stale(element: ElementRef) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('[{REF_ATTR}="{}"]');
            return !el || !el.isConnected;
        }})()"#,
        element.0
    )
}
