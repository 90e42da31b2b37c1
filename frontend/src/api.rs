use gloo_console::error;
use gloo_net::http::Request;
use serde::Serialize;
use shared::{ErrorResponse, PredictionRequest, PredictionResponse, Subject};

fn predict_url(subject: Subject) -> String {
    format!("/api/predict/{}", subject.to_string().to_lowercase())
}

/// Posts one form to the backend. The error string is ready to show as is.
pub async fn predict<R>(request: &R) -> Result<PredictionResponse, String>
where
    R: PredictionRequest + Serialize,
{
    let subject = R::SUBJECT;
    let failed = |detail: String| format!("{} prediction failed: {}", subject, detail);

    let response = Request::post(&predict_url(subject))
        .json(request)
        .map_err(|e| failed(format!("could not encode request: {}", e)))?
        .send()
        .await
        .map_err(|e| {
            error!(format!("Fetch error: {:?}", e));
            failed(format!("network error: {}", e))
        })?;

    if response.ok() {
        return response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| failed(format!("could not parse response: {}", e)));
    }

    // The backend already prefixes its messages with the subject.
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => Err(err.error),
        Err(_) => Err(failed(format!("server error: {} - {}", status, body))),
    }
}
