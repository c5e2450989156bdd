use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Holds the state and callbacks for a free-text input field.
///
/// The text is kept exactly as typed; parsing happens when the form is submitted.
#[derive(Clone)]
pub struct TextInput {
    /// The current text content of the input field.
    pub text: String,
    /// Callback for the input's `oninput` event. Updates the internal text state.
    pub on_input: Callback<InputEvent>,
}

/// Custom hook to manage state for a text input field.
#[hook]
pub fn use_text_input(initial: String) -> TextInput {
    let text_state_handle: UseStateHandle<String> = use_state(move || initial);

    let on_input = {
        let text_setter = text_state_handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text_setter.set(input.value());
        })
    };

    TextInput {
        text: (*text_state_handle).clone(),
        on_input,
    }
}

/// Custom hook for a checkbox; returns the current state and its `onchange` callback.
#[hook]
pub fn use_checkbox(initial: bool) -> (bool, Callback<Event>) {
    let checked = use_state(move || initial);

    let on_change = {
        let checked = checked.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            checked.set(input.checked());
        })
    };

    (*checked, on_change)
}
