use shared::Feature;
use shared::schema::Bounds;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::html::Scope;
use yew::prelude::*;

use super::super::{Model, Msg};

fn step_for(feature: Feature) -> &'static str {
    match feature {
        Feature::StudyHours => "0.5",
        _ => "1",
    }
}

pub fn number_field(feature: Feature, bounds: Bounds, value: f64, link: &Scope<Model>) -> Html {
    let id = feature.to_string();
    html! {
        <div class="form-field">
            <label for={id.clone()}>{ feature.title() }</label>
            <input
                id={id}
                type="number"
                min={bounds.min.to_string()}
                max={bounds.max.to_string()}
                step={step_for(feature)}
                value={if value.is_finite() { value.to_string() } else { String::new() }}
                onchange={link.callback(move |e: Event| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    Msg::EditField(feature, input.value())
                })}
            />
        </div>
    }
}

/// Options come straight from the mapping table, so the form can only offer
/// labels the assembler knows.
pub fn select_field(feature: Feature, selected: &str, link: &Scope<Model>) -> Html {
    let Some(category) = feature.category() else {
        return html! {};
    };
    let id = feature.to_string();
    html! {
        <div class="form-field">
            <label for={id.clone()}>{ feature.title() }</label>
            <select
                id={id}
                onchange={link.callback(move |e: Event| {
                    let select: HtmlSelectElement = e.target_unchecked_into();
                    Msg::EditField(feature, select.value())
                })}
            >
                { for category.mapping().labels().map(|label| html! {
                    <option value={label} selected={label == selected}>{ label }</option>
                })}
            </select>
        </div>
    }
}
