use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-graduation-cap"></i> {" Student Marks Predictor"}</h1>
            <p class="subtitle">{"Estimate the next term's marks from past results and home background"}</p>
        </header>
    }
}
