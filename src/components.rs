//! Pure Yew view components for the PP client UI.
//!
//! This module contains stateless components that render based on props,
//! making them easy to test and reuse.

use pp_client::mods::format_mods;
use pp_client::SimulationResult;
use yew::prelude::*;

/// Format a PP value the way the profile page does ("1,234.56").
fn format_pp(pp: f64) -> String {
    let fixed = format!("{:.2}", pp.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if pp < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Renders the result of a simulated play.
///
/// Displays:
/// - Beatmap info and mods
/// - Accuracy, combo out of max combo
/// - Judgement counts
/// - Resulting PP, plus per-category values when the server sent them
pub fn render_simulation_result(result: &SimulationResult) -> Html {
    let info = &result.play_info;

    html! {
        <div class="results">
            <h3 class="beatmap-info">{ result.beatmap_info.clone() }</h3>
            <table class="result-table">
                <tbody>
                    <tr><th>{ "Mods" }</th><td>{ format_mods(&result.mods) }</td></tr>
                    <tr>
                        <th>{ "Accuracy" }</th>
                        <td>{ format!("{:.2}%", result.accuracy()) }</td>
                    </tr>
                    <tr>
                        <th>{ "Combo" }</th>
                        <td>{ format!("{}x / {}x", result.combo(), result.max_combo()) }</td>
                    </tr>
                    <tr>
                        <th>{ "Hits" }</th>
                        <td>
                            { format!(
                                "{} / {} / {} / {} miss",
                                info.great, info.good, info.meh, info.miss
                            ) }
                        </td>
                    </tr>
                    { result.category_attribs.iter().map(|(name, value)| html! {
                        <tr><th>{ name.clone() }</th><td>{ format!("{:.2}", value) }</td></tr>
                    }).collect::<Html>() }
                    <tr class="pp-row"><th>{ "PP" }</th><td>{ format_pp(result.pp) }</td></tr>
                </tbody>
            </table>
        </div>
    }
}

/// Labelled text input bound to a caller-owned value.
#[derive(Properties, PartialEq)]
pub struct TextFieldProps {
    pub id: AttrValue,
    pub label: AttrValue,
    pub value: AttrValue,
    #[prop_or_default]
    pub placeholder: AttrValue,
    pub oninput: Callback<InputEvent>,
}

#[function_component(TextField)]
pub fn text_field(props: &TextFieldProps) -> Html {
    html! {
        <div class="field">
            <label class="label" for={props.id.clone()}>{ props.label.clone() }</label>
            <div class="control">
                <input class="input"
                    type="text"
                    id={props.id.clone()}
                    placeholder={props.placeholder.clone()}
                    value={props.value.clone()}
                    oninput={props.oninput.clone()}
                />
            </div>
        </div>
    }
}

/// Submit button showing a spinner while a request is in flight.
#[derive(Properties, PartialEq)]
pub struct SubmitButtonProps {
    pub label: AttrValue,
    pub loading: bool,
}

#[function_component(SubmitButton)]
pub fn submit_button(props: &SubmitButtonProps) -> Html {
    html! {
        <button type="submit"
            class={classes!("button", "is-primary", props.loading.then_some("is-loading"))}
            disabled={props.loading}
        >
            { props.label.clone() }
        </button>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Recalculate,
    Simulate,
}

impl Tab {
    fn label(&self) -> &'static str {
        match self {
            Tab::Recalculate => "Profile",
            Tab::Simulate => "Simulate a play",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct TabsProps {
    pub active: Tab,
    pub onselect: Callback<Tab>,
}

#[function_component(Tabs)]
pub fn tabs(props: &TabsProps) -> Html {
    let items = [Tab::Recalculate, Tab::Simulate];

    html! {
        <div class="tabs">
            <ul>
                { items.iter().map(|&tab| {
                    let onselect = props.onselect.clone();
                    html! {
                        <li class={classes!((tab == props.active).then_some("is-active"))}>
                            <a onclick={Callback::from(move |_| onselect.emit(tab))}>
                                { tab.label() }
                            </a>
                        </li>
                    }
                }).collect::<Html>() }
            </ul>
        </div>
    }
}
