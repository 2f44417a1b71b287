use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mashaer::application::ports::{ClassificationOrigin, Language, SentimentClassifier};
use mashaer::domain::SentimentLabel;
use mashaer::infrastructure::classifier::{RemoteClassifier, RemoteClassifierConfig};

fn test_classifier(base_url: String) -> RemoteClassifier {
    RemoteClassifier::new(RemoteClassifierConfig {
        base_url,
        request_timeout: Duration::from_secs(2),
        max_concurrent_requests: 3,
        batch_chunk_size: 5,
        batch_pause: Duration::from_millis(10),
    })
}

#[tokio::test]
async fn given_named_label_when_classifying_then_returns_model_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predicted_class": "positive",
            "confidence": 0.98,
            "all_probabilities": { "0": 0.01, "1": 0.01, "2": 0.98 }
        })))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());
    let result = classifier.classify("الخدمة ممتازة", Language::Arabic).await;

    assert_eq!(result.label, SentimentLabel::Positive);
    assert_eq!(result.origin, ClassificationOrigin::Model);
    assert!((result.confidence - 0.98).abs() < 1e-9);
    assert!((result.scores.positive - 0.98).abs() < 1e-9);
}

#[tokio::test]
async fn given_positional_label_when_classifying_then_index_mapping_applies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predicted_class": "0",
            "confidence": 0.91,
            "all_probabilities": { "0": 0.91, "1": 0.05, "2": 0.04 }
        })))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());
    let result = classifier.classify("لم يصلني الطلب", Language::Arabic).await;

    assert_eq!(result.label, SentimentLabel::Negative);
    assert_eq!(result.origin, ClassificationOrigin::Model);
}

#[tokio::test]
async fn given_server_error_when_classifying_then_falls_back_to_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());

    let positive = classifier.classify("ممتاز جدا, شكرا", Language::Arabic).await;
    assert_eq!(positive.label, SentimentLabel::Positive);
    assert_eq!(positive.origin, ClassificationOrigin::Fallback);

    let negative = classifier.classify("مشكلة لا يعمل", Language::Arabic).await;
    assert_eq!(negative.label, SentimentLabel::Negative);

    let neutral = classifier.classify("عادي", Language::Arabic).await;
    assert_eq!(neutral.label, SentimentLabel::Neutral);
}

#[tokio::test]
async fn given_unreachable_endpoint_when_classifying_then_falls_back_to_keywords() {
    // Port 9 is discard; nothing is listening there.
    let classifier = test_classifier("http://127.0.0.1:9".to_string());

    let result = classifier.classify("ممتاز جدا, شكرا", Language::Arabic).await;

    assert_eq!(result.label, SentimentLabel::Positive);
    assert_eq!(result.origin, ClassificationOrigin::Fallback);
    assert_eq!(result.confidence, 0.8);
}

#[tokio::test]
async fn given_malformed_payload_when_classifying_then_falls_back_to_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());
    let result = classifier.classify("عادي", Language::Arabic).await;

    assert_eq!(result.label, SentimentLabel::Neutral);
    assert_eq!(result.origin, ClassificationOrigin::Fallback);
}

#[tokio::test]
async fn given_mixed_outcomes_when_batch_classifying_then_order_and_count_preserved() {
    let server = MockServer::start().await;

    // One specific text fails server-side; everything else succeeds.
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_partial_json(json!({ "text": "مشكلة في التطبيق" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predicted_class": "neutral",
            "confidence": 0.7,
            "all_probabilities": { "0": 0.1, "1": 0.7, "2": 0.2 }
        })))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());
    let texts: Vec<String> = vec![
        "النص الأول".to_string(),
        "مشكلة في التطبيق".to_string(),
        "النص الثالث".to_string(),
    ];

    let results = classifier.classify_batch(&texts, Language::Arabic).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].origin, ClassificationOrigin::Model);
    assert_eq!(results[1].origin, ClassificationOrigin::Fallback);
    assert_eq!(results[1].label, SentimentLabel::Negative);
    assert_eq!(results[2].origin, ClassificationOrigin::Model);
}

#[tokio::test]
async fn given_more_texts_than_chunk_size_when_batch_classifying_then_all_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predicted_class": "neutral",
            "confidence": 0.8,
            "all_probabilities": { "0": 0.1, "1": 0.8, "2": 0.1 }
        })))
        .mount(&server)
        .await;

    let classifier = test_classifier(server.uri());
    let texts: Vec<String> = (0..12).map(|i| format!("نص رقم {}", i)).collect();

    let results = classifier.classify_batch(&texts, Language::Arabic).await;

    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| r.label == SentimentLabel::Neutral));
}
