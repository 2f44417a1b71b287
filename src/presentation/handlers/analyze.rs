use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Classification, ClassificationOrigin, Language};
use crate::domain::SentimentLabel;
use crate::presentation::state::AppState;

use super::ErrorResponse;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub scores: AnalyzeScores,
    pub origin: &'static str,
}

#[derive(Serialize)]
pub struct AnalyzeScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<AnalyzeResult>,
    pub total_processed: usize,
}

#[tracing::instrument(skip(state, request), fields(texts = request.texts.len()))]
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if request.texts.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "texts must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let language = match request.language.as_deref() {
        None | Some("ar") => Language::Arabic,
        Some("en") => Language::English,
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid language: {} (expected ar or en)", other),
                }),
            )
                .into_response();
        }
    };

    let classifications = state
        .classifier
        .classify_batch(&request.texts, language)
        .await;

    let results: Vec<AnalyzeResult> = classifications.iter().map(analyze_result).collect();
    let total_processed = results.len();

    (
        StatusCode::OK,
        Json(AnalyzeResponse {
            results,
            total_processed,
        }),
    )
        .into_response()
}

fn analyze_result(classification: &Classification) -> AnalyzeResult {
    AnalyzeResult {
        sentiment: classification.label,
        confidence: classification.confidence,
        scores: AnalyzeScores {
            positive: classification.scores.positive,
            negative: classification.scores.negative,
            neutral: classification.scores.neutral,
        },
        origin: match classification.origin {
            ClassificationOrigin::Model => "model",
            ClassificationOrigin::Fallback => "fallback",
        },
    }
}
