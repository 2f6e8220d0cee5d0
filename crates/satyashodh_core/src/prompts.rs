//! crates/satyashodh_core/src/prompts.rs
//!
//! Fixed prompt templates. Placeholders are written as `{name}` and filled by `render`.

pub const ANALYZE_NEWS_PROMPT: &str = r#"You are an AI assistant specializing in detecting fake news. Your task is to analyze the following news article content and determine if it is real or fraudulent.

You must provide a clear verdict: 'Real', 'Fraudulent', or 'Unsure'.
- If the news is legitimate and factual, set the verdict to 'Real' and provide a low fraud percentage.
- If the news is misleading, fabricated, or a form of misinformation, set the verdict to 'Fraudulent' and provide a high fraud percentage.
- If you cannot determine with high confidence, set the verdict to 'Unsure'.

Provide a detailed explanation for your verdict, citing specific elements from the text (or lack thereof) that support your conclusion. Consider factors like tone, sourcing, unverifiable claims, and emotional language.

News Content: {news_content}"#;

pub const ANALYZE_FILE_PROMPT: &str = r#"You are an AI assistant specializing in detecting fraudulent information in documents. Analyze the attached file content and determine if it contains misinformation.

You must provide a clear verdict: 'Real', 'Fraudulent', or 'Unsure'.
Provide a detailed explanation for your verdict."#;

pub const ANALYZE_VIDEO_PROMPT: &str = r#"You are an AI expert in detecting video manipulation and misinformation. Analyze the attached video to determine if it is authentic or fraudulent (e.g., a deepfake, manipulated content).

You must provide a clear verdict: 'Real', 'Fraudulent', or 'Unsure'.
Provide a detailed explanation for your verdict, pointing out any visual artifacts, audio inconsistencies, or contextual clues that support your analysis."#;

pub const SUMMARIZE_TEXT_PROMPT: &str = r#"Summarize the following text in {language}. Keep the key facts and claims, and do not add information that is not in the text.

Text: {text}"#;

pub const SUMMARIZE_LINK_PROMPT: &str = r#"Summarize the content at the following URL in the language specified. If no language is specified, use English.

URL: {url}
Language: {language}"#;

pub const SUMMARIZE_FILE_PROMPT: &str =
    "Summarize the content of the attached file in {language}. The summary must be between 500 and 600 words.";

pub const SUMMARIZE_VIDEO_PROMPT: &str =
    "Summarize the content of the attached video in {language}. The summary must be between 500 and 600 words.";

pub const CHAT_PROMPT: &str = r#"You are a multilingual AI chatbot providing support and guidance in the top 10 Indian languages.

The user will provide their query in the following language: {language}.

Respond to the user's query in the same language.

User Query: {query}"#;

pub const NEWS_TOPICS: [&str; 10] = [
    "the latest advancements in AI-powered fact-checking.",
    "how deepfake technology is impacting social media.",
    "a case study of a recent viral misinformation campaign.",
    "the role of media literacy in combating fake news.",
    "new browser extensions for detecting AI-generated content.",
    "political misinformation trends in India.",
    "health myths that are currently spreading online.",
    "the use of AI in creating and debunking conspiracy theories.",
    "financial scams being propagated through social media.",
    "an analysis of how algorithms contribute to filter bubbles.",
];

const GENERATE_NEWS_PROMPT: &str = r#"You are a news content generator for an educational platform about fake news. Your task is to generate a list of {count} unique, insightful, and realistic-sounding news articles.

The articles should cover various topics related to misinformation, fact-checking, and AI's role in information integrity.

For each article, provide a unique ID, a compelling title, a relevant category, a plausible author, a recent date, a short descriptive paragraph, and an image URL from https://picsum.photos. The image URL should be in the format 'https://picsum.photos/seed/<seedId>/600/400' where <seedId> is a unique random number for each article. Also provide a two-word imageHint for each image.

Here are some topics to inspire the articles. Ensure the generated articles are diverse and cover different angles of the misinformation problem.

Topics:
{topics}

Generate {count} articles."#;

/// Replaces each `{key}` in `template` with its value.
pub fn render(template: &str, fields: &[(&str, &str)]) -> String {
    fields.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

pub fn news_prompt(count: usize) -> String {
    let topics = NEWS_TOPICS
        .iter()
        .map(|topic| format!("- {}", topic))
        .collect::<Vec<_>>()
        .join("\n");
    render(
        GENERATE_NEWS_PROMPT,
        &[("count", &count.to_string()), ("topics", &topics)],
    )
}

/// Appended to analysis prompts when the caller asked for a specific language.
pub fn explanation_language_line(language: &str) -> String {
    format!("\n\nWrite the explanation in {}.", language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_every_occurrence() {
        let out = render("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x then y");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render("{missing}", &[("a", "x")]), "{missing}");
    }

    #[test]
    fn news_prompt_lists_all_topics() {
        let prompt = news_prompt(6);
        assert!(prompt.contains("Generate 6 articles."));
        for topic in NEWS_TOPICS {
            assert!(prompt.contains(topic));
        }
        assert!(!prompt.contains("{topics}"));
    }
}
