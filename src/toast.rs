//! JavaScript interop for toast notifications.
//! Provides Rust bindings to the helpers defined in toast_helpers.js.

use pp_client::config::TOAST_TIMEOUT_MS;
use pp_client::NotifyKind;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/toast_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = showToast)]
    fn show_toast(kind: &str, message: &str, timeout_ms: u32);

    #[wasm_bindgen(js_name = clearToasts)]
    pub fn clear_toasts();
}

/// Show a toast; persistent toasts stay until [`clear_toasts`] is called.
pub fn notify(kind: NotifyKind, message: &str, persistent: bool) {
    let timeout = if persistent { 0 } else { TOAST_TIMEOUT_MS };
    show_toast(kind.as_str(), message, timeout);
}
