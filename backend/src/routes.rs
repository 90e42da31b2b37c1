use actix_files::Files;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use lazy_static::lazy_static;
use log::{error, info, warn};
use shared::api::SchemaInfo;
use shared::{
    ErrorKind, ErrorResponse, FormOptions, HealthResponse, MathsPredictionRequest,
    PredictionRequest, PredictionResponse, SciencePredictionRequest, Subject, round_mark,
};
use uuid::Uuid;

use crate::inference::registry::{ModelRegistry, PredictionError};

lazy_static! {
    static ref FORM_OPTIONS: FormOptions = FormOptions::current();
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/options").route(web::get().to(form_options)))
        .service(web::resource("/api/predict/maths").route(web::post().to(predict_maths)))
        .service(web::resource("/api/predict/science").route(web::post().to(predict_science)))
        .service(Files::new("/", frontend_dir).index_file("index.html"));
}

async fn health(registry: web::Data<ModelRegistry>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        artifacts: registry.status(),
        schemas: SchemaInfo::all(),
    })
}

async fn form_options() -> HttpResponse {
    HttpResponse::Ok().json(&*FORM_OPTIONS)
}

async fn predict_maths(
    registry: web::Data<ModelRegistry>,
    request: web::Json<MathsPredictionRequest>,
) -> HttpResponse {
    run_prediction(&registry, &request.into_inner())
}

async fn predict_science(
    registry: web::Data<ModelRegistry>,
    request: web::Json<SciencePredictionRequest>,
) -> HttpResponse {
    run_prediction(&registry, &request.into_inner())
}

fn run_prediction<R: PredictionRequest>(registry: &ModelRegistry, request: &R) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let subject = R::SUBJECT;

    let outcome = request
        .validate()
        .map_err(PredictionError::from)
        .and_then(|()| registry.predict(request));

    match outcome {
        Ok(prediction) => {
            info!(
                "[{}] {} prediction {:.2} (scaled: {})",
                request_id, subject, prediction.estimate, prediction.scaled
            );
            log::debug!(
                "[{}] features: {:?}",
                request_id,
                prediction.record.fields().collect::<Vec<_>>()
            );
            HttpResponse::Ok().json(PredictionResponse {
                request_id: request_id.to_string(),
                subject,
                predicted_mark: round_mark(prediction.estimate),
                raw_estimate: prediction.estimate,
                scaled: prediction.scaled,
                warnings: prediction.warnings,
                predicted_at: Utc::now().to_rfc3339(),
            })
        }
        Err(err) => error_response(request_id, subject, &err),
    }
}

fn error_response(request_id: Uuid, subject: Subject, err: &PredictionError) -> HttpResponse {
    let kind = err.kind();
    let body = ErrorResponse {
        error: format!("{} prediction failed: {}", subject, err),
        kind,
    };
    match kind {
        ErrorKind::InvalidInput | ErrorKind::UnknownLabel => {
            warn!("[{}] rejected {} request: {}", request_id, subject, err);
            HttpResponse::BadRequest().json(body)
        }
        ErrorKind::ModelUnavailable | ErrorKind::ScalerUnavailable => {
            warn!("[{}] {}", request_id, err);
            HttpResponse::ServiceUnavailable().json(body)
        }
        ErrorKind::PredictionFailed => {
            error!("[{}] {} prediction error: {}", request_id, subject, err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::registry::UNSCALED_WARNING;
    use crate::inference::registry::tests::registry;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    macro_rules! app {
        ($registry:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($registry))
                    .configure(|cfg| configure_routes(cfg, std::env::temp_dir().display().to_string())),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn maths_prediction_round_trips_as_json() {
        let app = app!(registry(true, false));
        let request = MathsPredictionRequest {
            term1: 75.0,
            term2: 80.0,
            study_hours: 2.0,
            mother_education: "Pass (O/L)".into(),
            father_education: "Degree holder".into(),
            family_income: "50,000 - 75,000".into(),
            ..Default::default()
        };
        let req = test::TestRequest::post()
            .uri("/api/predict/maths")
            .set_json(&request)
            .to_request();
        let response: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(response.subject, Subject::Maths);
        assert_eq!(response.predicted_mark, 68.0);
        assert_eq!(response.display_mark(), "68.00");
        assert!(Uuid::parse_str(&response.request_id).is_ok());
    }

    #[actix_web::test]
    async fn science_without_scaler_reports_the_degradation() {
        let app = app!(registry(false, false));
        let req = test::TestRequest::post()
            .uri("/api/predict/science")
            .set_json(&SciencePredictionRequest::default())
            .to_request();
        let response: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!response.scaled);
        assert_eq!(response.warnings, vec![UNSCALED_WARNING.to_string()]);
    }

    #[actix_web::test]
    async fn required_scaler_turns_into_service_unavailable() {
        let app = app!(registry(false, true));
        let req = test::TestRequest::post()
            .uri("/api/predict/science")
            .set_json(&SciencePredictionRequest::default())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::ScalerUnavailable);
        assert!(body.error.starts_with("Science prediction failed:"));
    }

    #[actix_web::test]
    async fn out_of_range_marks_are_rejected_before_assembly() {
        let app = app!(registry(true, false));
        let request = SciencePredictionRequest {
            term1: 200.5,
            ..Default::default()
        };
        let req = test::TestRequest::post()
            .uri("/api/predict/science")
            .set_json(&request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::InvalidInput);
    }

    #[actix_web::test]
    async fn unknown_label_is_a_bad_request() {
        let app = app!(registry(true, false));
        let request = MathsPredictionRequest {
            gender: "Unspecified".into(),
            ..Default::default()
        };
        let req = test::TestRequest::post()
            .uri("/api/predict/maths")
            .set_json(&request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::UnknownLabel);
        assert!(body.error.contains("Unspecified"));
    }

    #[actix_web::test]
    async fn health_lists_artifacts_and_schemas() {
        let app = app!(registry(false, false));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.artifacts.len(), 3);
        assert!(!health.artifacts[2].loaded);
        assert_eq!(health.schemas.len(), 2);
        assert_eq!(health.schemas[1].features.len(), 10);
    }

    #[actix_web::test]
    async fn options_expose_the_mapping_labels() {
        let app = app!(registry(true, false));
        let req = test::TestRequest::get().uri("/api/options").to_request();
        let options: FormOptions = test::call_and_read_body_json(&app, req).await;
        assert_eq!(options, FormOptions::current());
    }
}
