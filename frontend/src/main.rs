mod api;
mod components;

use shared::{
    Feature, FeatureKind, MathsPredictionRequest, PredictionRequest, PredictionResponse,
    SciencePredictionRequest, Subject,
};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use components::form::render_form;
use components::header::render_header;
use components::results::render_result;
use components::utils::render_error_message;

// Yew msg components
pub enum Msg {
    SelectTab(Subject),
    EditField(Feature, String),
    Submit,
    PredictionReady(PredictionResponse),
    PredictionFailed(Subject, String),
}

// Main component
pub struct Model {
    tab: Subject,
    maths: MathsPredictionRequest,
    science: SciencePredictionRequest,
    /// Subject of the request in flight, if any.
    pending: Option<Subject>,
    result: Option<PredictionResponse>,
    error: Option<String>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SelectTab(subject) => self.handle_select_tab(subject),
            Msg::EditField(feature, value) => self.handle_edit_field(feature, value),
            Msg::Submit => self.handle_submit(ctx),
            Msg::PredictionReady(response) => self.handle_prediction_ready(response),
            Msg::PredictionFailed(subject, message) => {
                self.handle_prediction_failed(subject, message)
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                { self.render_tabs(ctx) }

                <main class="main-content">
                {
                    match self.tab {
                        Subject::Maths => render_form(&self.maths, self.is_loading(), ctx.link()),
                        Subject::Science => render_form(&self.science, self.is_loading(), ctx.link()),
                    }
                }
                { render_error_message(self.error.as_deref()) }
                { render_result(self.result.as_ref()) }
                </main>

                <footer class="app-footer">
                    <p>{"Student Marks Predictor | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }
}

// Handler methods
impl Model {
    fn new() -> Self {
        Self {
            tab: Subject::Maths,
            maths: MathsPredictionRequest::default(),
            science: SciencePredictionRequest::default(),
            pending: None,
            result: None,
            error: None,
        }
    }

    fn is_loading(&self) -> bool {
        self.pending == Some(self.tab)
    }

    fn handle_select_tab(&mut self, subject: Subject) -> bool {
        if self.tab == subject {
            return false;
        }
        self.tab = subject;
        self.result = None;
        self.error = None;
        true
    }

    /// Answers for a subject that is no longer pending, or no longer on
    /// screen, are dropped.
    fn handle_prediction_ready(&mut self, response: PredictionResponse) -> bool {
        if self.pending != Some(response.subject) {
            return false;
        }
        self.pending = None;
        if response.subject != self.tab {
            return false;
        }
        self.error = None;
        self.result = Some(response);
        true
    }

    fn handle_prediction_failed(&mut self, subject: Subject, message: String) -> bool {
        if self.pending != Some(subject) {
            return false;
        }
        self.pending = None;
        if subject != self.tab {
            return false;
        }
        self.error = Some(message);
        true
    }

    fn handle_edit_field(&mut self, feature: Feature, value: String) -> bool {
        let (applied, error) = match feature.kind() {
            FeatureKind::Numeric(_) => {
                let error = value
                    .trim()
                    .parse::<f64>()
                    .is_err()
                    .then(|| format!("{} must be a number", feature.title()));
                (self.set_numeric_text(feature, &value), error)
            }
            FeatureKind::Categorical(_) => (self.set_label(feature, value), None),
        };
        if !applied {
            return false;
        }
        self.error = error;
        true
    }

    fn set_numeric_text(&mut self, feature: Feature, text: &str) -> bool {
        match self.tab {
            Subject::Maths => self.maths.set_numeric_text(feature, text),
            Subject::Science => self.science.set_numeric_text(feature, text),
        }
    }

    fn set_label(&mut self, feature: Feature, label: String) -> bool {
        match self.tab {
            Subject::Maths => self.maths.set_label(feature, label),
            Subject::Science => self.science.set_label(feature, label),
        }
    }

    fn handle_submit(&mut self, ctx: &Context<Self>) -> bool {
        if self.is_loading() {
            return false;
        }
        self.result = None;
        let outcome = match self.tab {
            Subject::Maths => self.send_prediction_request(ctx, self.maths.clone()),
            Subject::Science => self.send_prediction_request(ctx, self.science.clone()),
        };
        match outcome {
            Ok(()) => {
                self.pending = Some(self.tab);
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
        true
    }

    /// Bounds are checked here so an out-of-range mark never leaves the page.
    fn send_prediction_request<R>(&self, ctx: &Context<Self>, request: R) -> Result<(), String>
    where
        R: PredictionRequest + serde::Serialize + 'static,
    {
        request
            .validate()
            .map_err(|e| format!("{} prediction failed: {}", R::SUBJECT, e))?;

        spawn_local({
            let link = ctx.link().clone();

            async move {
                match api::predict(&request).await {
                    Ok(response) => link.send_message(Msg::PredictionReady(response)),
                    Err(message) => link.send_message(Msg::PredictionFailed(R::SUBJECT, message)),
                }
            }
        });
        Ok(())
    }
}

// Rendering methods
impl Model {
    fn render_tabs(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let tab = |subject: Subject| {
            html! {
                <button
                    class={classes!("tab", (self.tab == subject).then_some("active"))}
                    onclick={link.callback(move |_| Msg::SelectTab(subject))}
                >
                    { format!("{} Prediction", subject) }
                </button>
            }
        };

        html! {
            <nav class="tabs">
                { tab(Subject::Maths) }
                { tab(Subject::Science) }
            </nav>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(subject: Subject) -> PredictionResponse {
        PredictionResponse {
            request_id: "00000000-0000-0000-0000-000000000000".into(),
            subject,
            predicted_mark: 68.0,
            raw_estimate: 68.0,
            scaled: true,
            warnings: Vec::new(),
            predicted_at: "2026-10-18T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn cleared_mark_is_not_replaced_by_the_old_value() {
        let mut model = Model::new();
        model.handle_edit_field(Feature::MathsTerm1, "75".into());
        assert_eq!(model.maths.term1, 75.0);

        model.handle_edit_field(Feature::MathsTerm1, "".into());
        assert!(model.error.is_some());
        assert!(model.maths.term1.is_nan());
        assert!(model.maths.validate().is_err());

        model.handle_edit_field(Feature::MathsTerm1, "80".into());
        assert!(model.error.is_none());
        assert_eq!(model.maths.validate(), Ok(()));
    }

    #[test]
    fn answer_for_another_tab_is_not_shown() {
        let mut model = Model::new();
        model.pending = Some(Subject::Maths);
        assert!(model.is_loading());

        model.handle_select_tab(Subject::Science);
        assert!(!model.is_loading());

        assert!(!model.handle_prediction_ready(response(Subject::Maths)));
        assert!(model.result.is_none());
        assert_eq!(model.pending, None);
    }

    #[test]
    fn late_failure_does_not_clobber_the_current_tab() {
        let mut model = Model::new();
        model.pending = Some(Subject::Maths);
        model.handle_select_tab(Subject::Science);
        model.pending = Some(Subject::Science);

        assert!(!model.handle_prediction_failed(Subject::Maths, "Maths prediction failed: x".into()));
        assert!(model.error.is_none());
        assert!(model.is_loading());

        assert!(model.handle_prediction_ready(response(Subject::Science)));
        assert_eq!(model.result.as_ref().map(|r| r.subject), Some(Subject::Science));
        assert!(!model.is_loading());
    }
}
