use shared::PredictionResponse;
use yew::prelude::*;

pub fn render_result(result: Option<&PredictionResponse>) -> Html {
    let Some(result) = result else {
        return html! {};
    };

    html! {
        <div class={classes!("results-container", (!result.scaled).then_some("degraded"))}>
            <div class="result-header">
                <h2>
                    <i class="fa-solid fa-chart-line"></i>
                    { format!(" Predicted {} Marks: {}", result.subject, result.display_mark()) }
                </h2>
            </div>
            { for result.warnings.iter().map(|warning| html! {
                <div class="warning-message">
                    <i class="fa-solid fa-triangle-exclamation"></i>
                    <p>{ warning }</p>
                </div>
            })}
            <p class="result-meta" title={result.request_id.clone()}>
                { format!("Predicted at {}", result.predicted_at) }
            </p>
        </div>
    }
}
