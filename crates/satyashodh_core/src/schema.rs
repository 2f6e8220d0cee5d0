//! crates/satyashodh_core/src/schema.rs
//!
//! Output shapes requested from the generative model. Each shape publishes the JSON
//! Schema sent with the prompt and re-checks the decoded value, so a response that
//! slips past the provider's schema mode is still caught at this boundary.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::domain::{AnalysisResult, ChatReply, NewsArticle, NewsFeed, SummaryResult};

/// Number of articles a news refresh produces.
pub const NEWS_FEED_SIZE: usize = 6;

pub trait StructuredOutput: DeserializeOwned + Sized {
    /// Name given to the schema in the provider request.
    const SCHEMA_NAME: &'static str;

    fn json_schema() -> Value;

    /// Checks bounds the type system cannot express. May drop surplus items, such as
    /// news articles past the feed size.
    fn validate(self) -> Result<Self, String>;
}

/// Decodes the model's JSON into `T` and validates it.
pub fn decode<T: StructuredOutput>(value: Value) -> Result<T, String> {
    let decoded: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
    decoded.validate()
}

impl StructuredOutput for AnalysisResult {
    const SCHEMA_NAME: &'static str = "fraud_analysis";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "verdict": {
                    "type": "string",
                    "enum": ["Real", "Fraudulent", "Unsure"],
                    "description": "Whether the content is real, fraudulent, or the model is unsure."
                },
                "fraudPercentage": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Likelihood of the content being fraudulent. Low for Real, high for Fraudulent."
                },
                "explanation": {
                    "type": "string",
                    "description": "Explanation for the verdict."
                }
            },
            "required": ["verdict", "fraudPercentage", "explanation"],
            "additionalProperties": false
        })
    }

    fn validate(self) -> Result<Self, String> {
        if !self.fraud_percentage.is_finite() || !(0.0..=100.0).contains(&self.fraud_percentage) {
            return Err(format!(
                "fraudPercentage {} is outside [0, 100]",
                self.fraud_percentage
            ));
        }
        if self.explanation.trim().is_empty() {
            return Err("explanation is empty".to_string());
        }
        Ok(self)
    }
}

impl StructuredOutput for SummaryResult {
    const SCHEMA_NAME: &'static str = "summary";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string", "description": "The summary of the content." }
            },
            "required": ["summary"],
            "additionalProperties": false
        })
    }

    fn validate(self) -> Result<Self, String> {
        if self.summary.trim().is_empty() {
            return Err("summary is empty".to_string());
        }
        Ok(self)
    }
}

impl StructuredOutput for ChatReply {
    const SCHEMA_NAME: &'static str = "chat_reply";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "response": {
                    "type": "string",
                    "description": "The chatbot response in the requested language."
                }
            },
            "required": ["response"],
            "additionalProperties": false
        })
    }

    fn validate(self) -> Result<Self, String> {
        if self.response.trim().is_empty() {
            return Err("response is empty".to_string());
        }
        Ok(self)
    }
}

impl StructuredOutput for NewsFeed {
    const SCHEMA_NAME: &'static str = "news_articles";

    fn json_schema() -> Value {
        let text = |description: &str| json!({ "type": "string", "description": description });
        json!({
            "type": "object",
            "properties": {
                "articles": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": text("A unique identifier for the news article."),
                            "title": text("The headline of the news article."),
                            "category": text("The category of the news (e.g., Technology, Health, Politics)."),
                            "imageUrl": text("A relevant image URL for the article."),
                            "imageHint": text("A one or two-word hint for the image content."),
                            "description": text("A brief, one-paragraph summary of the article."),
                            "author": text("The fictional author's name."),
                            "date": text("The publication date in a user-friendly format (e.g., 'June 28, 2024').")
                        },
                        "required": ["id", "title", "category", "imageUrl", "imageHint", "description", "author", "date"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["articles"],
            "additionalProperties": false
        })
    }

    fn validate(mut self) -> Result<Self, String> {
        if self.articles.is_empty() {
            return Err("no articles were generated".to_string());
        }
        self.articles.truncate(NEWS_FEED_SIZE);

        let mut seen = HashSet::new();
        for article in &self.articles {
            check_article(article)?;
            if !seen.insert(article.id.as_str()) {
                return Err(format!("duplicate article id '{}'", article.id));
            }
        }
        Ok(self)
    }
}

fn check_article(article: &NewsArticle) -> Result<(), String> {
    if article.title.trim().is_empty() {
        return Err(format!("article '{}' has no title", article.id));
    }
    let image_url = url::Url::parse(&article.image_url)
        .map_err(|e| format!("article '{}' has an invalid imageUrl: {}", article.id, e))?;
    if !matches!(image_url.scheme(), "http" | "https") {
        return Err(format!(
            "article '{}' has an imageUrl with scheme '{}', expected http or https",
            article.id,
            image_url.scheme()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;

    fn article(id: &str) -> Value {
        json!({
            "id": id,
            "title": format!("Headline {id}"),
            "category": "Technology",
            "imageUrl": format!("https://picsum.photos/seed/{id}/600/400"),
            "imageHint": "news desk",
            "description": "A short paragraph.",
            "author": "A. Writer",
            "date": "June 28, 2024"
        })
    }

    #[test]
    fn analysis_within_bounds_decodes_unchanged() {
        let result: AnalysisResult = decode(json!({
            "verdict": "Fraudulent",
            "fraudPercentage": 92,
            "explanation": "Unverifiable claims and sensational tone."
        }))
        .unwrap();
        assert_eq!(result.verdict, Verdict::Fraudulent);
        assert_eq!(result.fraud_percentage, 92.0);
    }

    #[test]
    fn analysis_out_of_range_is_rejected() {
        for pct in [-0.5, 100.5, 250.0] {
            let err = decode::<AnalysisResult>(json!({
                "verdict": "Real",
                "fraudPercentage": pct,
                "explanation": "x"
            }))
            .unwrap_err();
            assert!(err.contains("outside"), "{err}");
        }
    }

    #[test]
    fn analysis_with_unknown_verdict_fails_to_decode() {
        assert!(decode::<AnalysisResult>(json!({
            "verdict": "Probably",
            "fraudPercentage": 10,
            "explanation": "x"
        }))
        .is_err());
    }

    #[test]
    fn analysis_requires_explanation() {
        assert!(decode::<AnalysisResult>(json!({
            "verdict": "Unsure",
            "fraudPercentage": 50,
            "explanation": "   "
        }))
        .is_err());
    }

    #[test]
    fn news_feed_keeps_at_most_six_articles() {
        let articles: Vec<Value> = (1..=8).map(|i| article(&i.to_string())).collect();
        let feed: NewsFeed = decode(json!({ "articles": articles })).unwrap();
        assert_eq!(feed.articles.len(), NEWS_FEED_SIZE);
        assert_eq!(feed.articles[0].id, "1");
    }

    #[test]
    fn news_feed_rejects_bad_image_urls_and_duplicates() {
        let mut bad = article("1");
        bad["imageUrl"] = json!("not a url");
        assert!(decode::<NewsFeed>(json!({ "articles": [bad] })).is_err());
        assert!(decode::<NewsFeed>(json!({ "articles": [article("a"), article("a")] })).is_err());
        assert!(decode::<NewsFeed>(json!({ "articles": [] })).is_err());
    }

    #[test]
    fn news_image_urls_must_be_web_links() {
        for image_url in [
            "javascript:alert(1)",
            "data:image/png;base64,AAAA",
            "file:///etc/passwd",
        ] {
            let mut item = article("1");
            item["imageUrl"] = json!(image_url);
            let err = decode::<NewsFeed>(json!({ "articles": [item] })).unwrap_err();
            assert!(err.contains("http or https"), "{image_url}: {err}");
        }
        let mut plain = article("1");
        plain["imageUrl"] = json!("http://images.example.com/1.jpg");
        assert!(decode::<NewsFeed>(json!({ "articles": [plain] })).is_ok());
    }

    #[test]
    fn schemas_require_every_field() {
        let schema = AnalysisResult::json_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
        assert_eq!(schema["properties"]["fraudPercentage"]["maximum"], 100);
    }
}
