mod keyword_classifier;
mod remote_classifier;

pub use keyword_classifier::KeywordClassifier;
pub use remote_classifier::{RemoteClassifier, RemoteClassifierConfig};
