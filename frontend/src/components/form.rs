use shared::{FeatureKind, PredictionRequest};
use yew::html::Scope;
use yew::prelude::*;

use super::super::{Model, Msg};
use super::fields::{number_field, select_field};
use super::utils::debounce;

/// One field per schema column, numeric inputs first, then the survey
/// questions in the order the request lists them.
pub fn render_form<R: PredictionRequest>(request: &R, loading: bool, link: &Scope<Model>) -> Html {
    let subject = R::SUBJECT;

    let numeric = request.numeric_inputs().into_iter().map(|(feature, value)| {
        match feature.kind() {
            FeatureKind::Numeric(bounds) => number_field(feature, bounds, value, link),
            FeatureKind::Categorical(_) => html! {},
        }
    });
    let labels = request
        .label_inputs()
        .into_iter()
        .map(|(feature, selected)| select_field(feature, selected, link));

    html! {
        <section class="form-section">
            <h2>{ format!("{} Prediction", subject) }</h2>
            <div class="form-grid">
                { for numeric }
                { for labels }
            </div>
            <button
                class="predict-btn"
                disabled={loading}
                onclick={debounce(300, {
                    let link = link.clone();
                    move || link.send_message(Msg::Submit)
                })}
            >
                {
                    if loading {
                        html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Predicting..."}</> }
                    } else {
                        html! { <><i class="fa-solid fa-calculator"></i>{ format!(" Predict {} Marks", subject) }</> }
                    }
                }
            </button>
        </section>
    }
}
