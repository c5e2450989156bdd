//! Main module for the PP client using Yew.
//! Wires UI components, form state, and the recalculation/simulation flows.

use log::{warn, Level, LevelFilter, Metadata, Record};
use pp_client::config::{BEATMAP_PLACEHOLDER, MODS_PLACEHOLDER};
use pp_client::gateway::browser::{FetchGateway, TimeoutDelay};
use pp_client::{
    submit_simulation, ClientConfig, NotifyKind, RawFields, RecalcPoller, SimulationRequestBuilder,
    SimulationResult, UiSink,
};
use std::rc::Rc;
use wasm_bindgen::JsValue;
use yew::prelude::*;

mod components;
mod hooks;
mod toast;

use components::{render_simulation_result, SubmitButton, Tab, Tabs, TextField};
use hooks::{use_checkbox, use_text_input};

// ──────────────────────────────────────────────────────────────────────────────
// Logging

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// `?user=` from the page URL, so links to the index page can prefill the form.
fn initial_user() -> String {
    gloo_utils::window()
        .location()
        .search()
        .ok()
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("user"))
        .unwrap_or_default()
}

/// Routes client events to toasts, page state and navigation.
#[derive(Clone)]
struct PageSink {
    loading: UseStateHandle<bool>,
    result: Option<UseStateHandle<Option<Rc<SimulationResult>>>>,
}

impl UiSink for PageSink {
    fn on_notify(&self, kind: NotifyKind, message: &str, persistent: bool) {
        if persistent {
            toast::clear_toasts();
        }
        toast::notify(kind, message, persistent);
    }

    fn on_terminal_success(&self, redirect_url: &str) {
        self.loading.set(false);
        toast::clear_toasts();
        if let Err(e) = gloo_utils::window().location().set_href(redirect_url) {
            warn!("Redirect to {} failed: {:?}", redirect_url, e);
        }
    }

    fn on_terminal_failure(&self, message: &str) {
        self.loading.set(false);
        toast::clear_toasts();
        toast::notify(NotifyKind::Error, message, false);
    }

    fn on_simulation_result(&self, result: &SimulationResult) {
        if let Some(handle) = &self.result {
            handle.set(Some(Rc::new(result.clone())));
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────

/// Profile recalculation form: user name, force flag, and the polling session.
#[function_component(RecalcForm)]
fn recalc_form() -> Html {
    let user = use_text_input(initial_user());
    let (force, on_force_change) = use_checkbox(false);
    let loading = use_state(|| false);

    let onsubmit = {
        let user_text = user.text.clone();
        let loading = loading.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let sink = PageSink {
                loading: loading.clone(),
                result: None,
            };
            let user = user_text.clone();
            loading.set(true);

            wasm_bindgen_futures::spawn_local(async move {
                let config = ClientConfig::default();
                let poller = RecalcPoller::new(
                    FetchGateway::new(config.clone()),
                    TimeoutDelay,
                    sink.clone(),
                    config,
                );
                if let Err(err) = poller.start(&user, force).await {
                    warn!("Recalculation not started: {}", err);
                    sink.loading.set(false);
                    toast::notify(NotifyKind::Error, &err.to_string(), false);
                }
            });
        })
    };

    html! {
        <form onsubmit={onsubmit}>
            <TextField id="user"
                label="Username"
                value={user.text.clone()}
                oninput={user.on_input.clone()}
            />
            <div class="field">
                <label class="checkbox">
                    <input type="checkbox" checked={force} onchange={on_force_change} />
                    { " Force recalculation" }
                </label>
            </div>
            <SubmitButton label="Calculate" loading={*loading} />
        </form>
    }
}

/// Play simulation form and its result panel.
#[function_component(SimulateForm)]
fn simulate_form() -> Html {
    let beatmap = use_text_input(String::new());
    let accuracy = use_text_input(String::new());
    let good = use_text_input(String::new());
    let meh = use_text_input(String::new());
    let combo = use_text_input(String::new());
    let misses = use_text_input(String::new());
    let mods = use_text_input(String::new());
    let loading = use_state(|| false);
    let result = use_state(|| None::<Rc<SimulationResult>>);

    let onsubmit = {
        let fields = RawFields {
            beatmap: beatmap.text.clone(),
            accuracy: accuracy.text.clone(),
            good: good.text.clone(),
            meh: meh.text.clone(),
            combo: combo.text.clone(),
            misses: misses.text.clone(),
            mods: mods.text.clone(),
        };
        let loading = loading.clone();
        let result = result.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let builder = SimulationRequestBuilder::from(fields.clone());
            let sink = PageSink {
                loading: loading.clone(),
                result: Some(result.clone()),
            };
            loading.set(true);

            wasm_bindgen_futures::spawn_local(async move {
                let gateway = FetchGateway::new(ClientConfig::default());
                // failures were already reported to the sink
                let _ = submit_simulation(&gateway, &sink, &builder).await;
                sink.loading.set(false);
            });
        })
    };

    html! {
        <>
            <form onsubmit={onsubmit}>
                <TextField id="beatmap"
                    label="Beatmap"
                    placeholder={BEATMAP_PLACEHOLDER}
                    value={beatmap.text.clone()}
                    oninput={beatmap.on_input.clone()}
                />
                <div class="columns">
                    <div class="column">
                        <TextField id="accuracy" label="Accuracy (%)"
                            value={accuracy.text.clone()} oninput={accuracy.on_input.clone()} />
                    </div>
                    <div class="column">
                        <TextField id="good" label="100s"
                            value={good.text.clone()} oninput={good.on_input.clone()} />
                    </div>
                    <div class="column">
                        <TextField id="meh" label="50s"
                            value={meh.text.clone()} oninput={meh.on_input.clone()} />
                    </div>
                </div>
                <div class="columns">
                    <div class="column">
                        <TextField id="combo" label="Combo"
                            value={combo.text.clone()} oninput={combo.on_input.clone()} />
                    </div>
                    <div class="column">
                        <TextField id="misses" label="Misses"
                            value={misses.text.clone()} oninput={misses.on_input.clone()} />
                    </div>
                    <div class="column">
                        <TextField id="mods" label="Mods"
                            placeholder={MODS_PLACEHOLDER}
                            value={mods.text.clone()} oninput={mods.on_input.clone()} />
                    </div>
                </div>
                <SubmitButton label="Simulate" loading={*loading} />
            </form>

            // Results section
            <div class="results-area">
                if let Some(result) = &*result {
                    { render_simulation_result(result) }
                }
            </div>
        </>
    }
}

/// App wrapper switching between the two forms.
#[function_component]
pub fn App() -> Html {
    let tab = use_state(|| Tab::Recalculate);
    let onselect = {
        let tab = tab.clone();
        Callback::from(move |selected: Tab| tab.set(selected))
    };

    html! {
        <section class="section">
            <div class="container">
                <h1 class="title">{ "PP recalculator" }</h1>
                <Tabs active={*tab} onselect={onselect} />
                {
                    match *tab {
                        Tab::Recalculate => html! { <RecalcForm /> },
                        Tab::Simulate => html! { <SimulateForm /> },
                    }
                }
            </div>
        </section>
    }
}

/// Entry point: installs panic hook and logger, then renders the App.
fn main() {
    console_error_panic_hook::set_once();
    init_logging();
    yew::Renderer::<App>::new().render();
}
