use mashaer::application::ports::ClassificationOrigin;
use mashaer::domain::SentimentLabel;
use mashaer::infrastructure::classifier::KeywordClassifier;

#[test]
fn given_positive_marker_when_classifying_then_returns_positive() {
    let classifier = KeywordClassifier;

    let result = classifier.classify("ممتاز جدا, شكرا");

    assert_eq!(result.label, SentimentLabel::Positive);
    assert_eq!(result.confidence, 0.8);
    assert_eq!(result.origin, ClassificationOrigin::Fallback);
}

#[test]
fn given_negative_marker_when_classifying_then_returns_negative() {
    let classifier = KeywordClassifier;

    let result = classifier.classify("مشكلة لا يعمل");

    assert_eq!(result.label, SentimentLabel::Negative);
    assert_eq!(result.confidence, 0.8);
}

#[test]
fn given_no_markers_when_classifying_then_returns_neutral() {
    let classifier = KeywordClassifier;

    let result = classifier.classify("عادي");

    assert_eq!(result.label, SentimentLabel::Neutral);
    assert_eq!(result.confidence, 0.6);
    assert_eq!(result.origin, ClassificationOrigin::Fallback);
}

#[test]
fn given_same_text_when_classifying_twice_then_results_are_identical() {
    let classifier = KeywordClassifier;

    let first = classifier.classify("الخدمة جيد");
    let second = classifier.classify("الخدمة جيد");

    assert_eq!(first.label, second.label);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.label, SentimentLabel::Positive);
}

#[test]
fn given_any_input_when_classifying_then_confidence_in_unit_interval() {
    let classifier = KeywordClassifier;

    for text in ["", "مرحبا", "مشكلة", "شكرا جزيلا"] {
        let result = classifier.classify(text);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}
