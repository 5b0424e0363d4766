#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the AutoscrollRunner.
//!
//! This module wraps [`super::runner_core::RunnerCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use kinescroll_backend::Action;
use kinescroll_core::config::ScrollConfig;

use super::HostCommand;
use super::runner_core::RunnerCore;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn command_to_js(command: &HostCommand) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "op", JsValue::from_str(command.op()));
    match *command {
        HostCommand::ScrollTo { offset } => set_js(&obj, "offset", JsValue::from_f64(offset)),
        HostCommand::ScrollBy { delta } => set_js(&obj, "delta", JsValue::from_f64(delta)),
        HostCommand::RequestFrame { id } | HostCommand::CancelFrame { id } => {
            set_js(&obj, "id", JsValue::from_f64(id.0 as f64));
        }
    }
    obj.into()
}

fn action_to_js(action: &Action) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "kind", JsValue::from_str(action.kind()));
    match action {
        Action::Activated { speed } | Action::SpeedChanged { speed } => {
            set_js(&obj, "speed", JsValue::from_f64(*speed));
        }
        Action::PausedStateChanged { paused } => {
            set_js(&obj, "paused", JsValue::from_bool(*paused));
        }
        Action::EndOfContent { chain_navigation } => {
            set_js(&obj, "chainNavigation", JsValue::from_bool(*chain_navigation));
        }
        Action::Failure { message } => set_js(&obj, "message", JsValue::from_str(message)),
        Action::Deactivated | Action::ToggleSiteActivation | Action::EnterElementPick => {}
    }
    obj.into()
}

#[wasm_bindgen]
pub struct AutoscrollRunner {
    inner: RunnerCore,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl AutoscrollRunner {
    /// Create a runner. `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        install_panic_hook();
        let config = if config_json.trim().is_empty() {
            ScrollConfig::default()
        } else {
            ScrollConfig::from_json_str(config_json).unwrap_or_else(|err| {
                console_error(&format!("kinescroll: bad config, using defaults: {err}"));
                ScrollConfig::default()
            })
        };
        Self {
            inner: RunnerCore::new(config),
        }
    }

    /// Route a JSON-encoded pointer or wheel event.
    /// Returns `true` if the host should call `preventDefault()`.
    #[wasm_bindgen(js_name = pushInput)]
    pub fn push_input(&mut self, json: &str) -> bool {
        match self.inner.push_input(json) {
            Ok(disposition) => disposition.is_consumed(),
            Err(err) => {
                console_error(&format!("kinescroll: {err}"));
                false
            }
        }
    }

    /// Deliver a `requestAnimationFrame` callback.
    pub fn frame(&mut self, id: f64, now_ms: f64) {
        if id.is_finite() && id >= 0.0 {
            self.inner.frame(id as u64, now_ms);
        }
    }

    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, now_ms: f64) {
        self.inner.set_time_ms(now_ms);
    }

    /// Report `scrollY`, viewport size, and `scrollHeight`.
    #[wasm_bindgen(js_name = setMetrics)]
    pub fn set_metrics(
        &mut self,
        offset: f64,
        viewport_width: f64,
        viewport_height: f64,
        content_height: f64,
    ) {
        self.inner
            .set_metrics(offset, viewport_width, viewport_height, content_height);
    }

    /// Replace the configuration. Returns `false` on malformed JSON.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, json: &str) -> bool {
        match self.inner.set_config_json(json) {
            Ok(()) => true,
            Err(err) => {
                console_error(&format!("kinescroll: {err}"));
                false
            }
        }
    }

    #[wasm_bindgen(js_name = setSiteActive)]
    pub fn set_site_active(&mut self, active: bool) {
        self.inner.set_site_active(active);
    }

    #[wasm_bindgen(js_name = setAttached)]
    pub fn set_attached(&mut self, attached: bool) {
        self.inner.set_attached(attached);
    }

    pub fn stop(&mut self) -> bool {
        self.inner.stop()
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }

    /// `"inactive"`, `"scrolling"`, or `"paused"`.
    pub fn state(&self) -> String {
        self.inner.state().as_str().to_owned()
    }

    pub fn speed(&self) -> f64 {
        self.inner.speed()
    }

    /// Drain queued host commands as `[{op, ...}]`.
    #[wasm_bindgen(js_name = takeCommands)]
    pub fn take_commands(&mut self) -> Array {
        self.inner
            .take_commands()
            .iter()
            .map(command_to_js)
            .collect()
    }

    /// Drain queued actions as `[{kind, ...}]`.
    #[wasm_bindgen(js_name = takeActions)]
    pub fn take_actions(&mut self) -> Array {
        self.inner.take_actions().iter().map(action_to_js).collect()
    }

    /// Latest speed to persist, or `undefined`.
    #[wasm_bindgen(js_name = takePersistedSpeed)]
    pub fn take_persisted_speed(&mut self) -> Option<f64> {
        self.inner.take_persisted_speed()
    }
}
