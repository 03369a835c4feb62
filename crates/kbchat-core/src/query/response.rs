//! Provider response normalization

use super::classifier::QueryType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Answer used when the provider returns no text
pub const NO_ANSWER_PLACEHOLDER: &str = "No answer found";

const DEFAULT_SOURCE_TYPE: &str = "text";

/// Location variants checked for a URI, in order
const LOCATION_URI_FIELDS: &[(&str, &str)] = &[
    ("s3Location", "uri"),
    ("webLocation", "url"),
    ("confluenceLocation", "url"),
    ("salesforceLocation", "url"),
    ("sharePointLocation", "url"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutput {
    #[serde(default)]
    pub text: Option<String>,
}

/// Wire body returned by a retrieve-and-generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateResponse {
    #[serde(default)]
    pub output: Option<ResponseOutput>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default)]
    pub retrieved_references: Vec<RetrievedReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedReference {
    #[serde(default)]
    pub content: Option<ReferenceContent>,
    #[serde(default)]
    pub location: Value,
    #[serde(default)]
    pub score: Option<f64>,
}

/// A retrieved passage backing the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    pub location_uri: String,
    /// Trailing path segment of the URI
    pub document_key: String,
    pub score: f64,
    pub source_type: String,
    /// Raw provider location
    pub location: Value,
}

impl Source {
    fn from_reference(reference: RetrievedReference) -> Self {
        let location_uri = location_uri(&reference.location);
        let document_key = location_uri
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let (content, source_type) = match reference.content {
            Some(c) => (
                c.text.unwrap_or_default(),
                c.content_type
                    .map(|t| t.to_lowercase())
                    .unwrap_or_else(|| DEFAULT_SOURCE_TYPE.to_string()),
            ),
            None => (String::new(), DEFAULT_SOURCE_TYPE.to_string()),
        };

        Self {
            content,
            location_uri,
            document_key,
            score: reference.score.unwrap_or(0.0),
            source_type,
            location: reference.location,
        }
    }
}

fn location_uri(location: &Value) -> String {
    LOCATION_URI_FIELDS
        .iter()
        .find_map(|(variant, field)| location.get(variant)?.get(field)?.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Normalized answer of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
    pub response_time_ms: u64,
    pub query_type: QueryType,
    /// Present only when enhancement changed the question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_question: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Flatten a provider response into a [`QueryResult`].
///
/// The session id prefers the provider's value and falls back to the one sent.
/// Timing and metadata are filled in by the caller.
pub fn normalize(
    response: RetrieveAndGenerateResponse,
    fallback_session_id: Option<&str>,
    query_type: QueryType,
    enhanced_question: &str,
    original_question: &str,
) -> QueryResult {
    let answer = response
        .output
        .and_then(|o| o.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string());

    let sources: Vec<Source> = response
        .citations
        .into_iter()
        .flat_map(|c| c.retrieved_references)
        .map(Source::from_reference)
        .collect();

    let session_id = response
        .session_id
        .filter(|s| !s.is_empty())
        .or_else(|| fallback_session_id.map(str::to_string))
        .unwrap_or_default();

    let enhanced_question =
        (enhanced_question != original_question).then(|| enhanced_question.to_string());

    QueryResult {
        answer,
        sources,
        session_id,
        response_time_ms: 0,
        query_type,
        enhanced_question,
        metadata: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> RetrieveAndGenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_scored_source() {
        let resp = response(json!({
            "output": {"text": "X is a thing."},
            "citations": [{
                "retrievedReferences": [{
                    "content": {"text": "X is described here"},
                    "location": {"type": "S3", "s3Location": {"uri": "s3://bucket/documents/x.pdf"}},
                    "score": 0.87
                }]
            }],
            "sessionId": "abc-123"
        }));

        let result = normalize(resp, None, QueryType::General, "What is X?", "What is X?");
        assert_eq!(result.answer, "X is a thing.");
        assert_eq!(result.sources.len(), 1);
        let source = &result.sources[0];
        assert_eq!(source.score, 0.87);
        assert!(source.location_uri.ends_with("x.pdf"));
        assert_eq!(source.document_key, "x.pdf");
        assert_eq!(source.source_type, "text");
        assert_eq!(result.session_id, "abc-123");
        assert!(result.enhanced_question.is_none());
    }

    #[test]
    fn test_citation_expands_to_many_sources() {
        let resp = response(json!({
            "output": {"text": "answer"},
            "citations": [
                {"retrievedReferences": [
                    {"content": {"text": "a"}, "location": {"s3Location": {"uri": "s3://b/documents/a.txt"}}},
                    {"content": {"text": "b", "type": "TEXT"}, "location": {"webLocation": {"url": "https://example.com/b"}}}
                ]},
                {"retrievedReferences": []}
            ]
        }));

        let result = normalize(resp, Some("sess"), QueryType::Technical, "q", "q");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].score, 0.0);
        assert_eq!(result.sources[1].location_uri, "https://example.com/b");
        assert_eq!(result.sources[1].source_type, "text");
        assert_eq!(result.session_id, "sess");
    }

    #[test]
    fn test_missing_answer_uses_placeholder() {
        let result = normalize(
            RetrieveAndGenerateResponse::default(),
            None,
            QueryType::General,
            "q",
            "q",
        );
        assert_eq!(result.answer, NO_ANSWER_PLACEHOLDER);
        assert!(result.sources.is_empty());
        assert!(result.session_id.is_empty());
    }

    #[test]
    fn test_enhanced_question_only_when_changed() {
        let result = normalize(
            RetrieveAndGenerateResponse::default(),
            None,
            QueryType::General,
            "Context from previous conversation:\n...\n\nCurrent question: q",
            "q",
        );
        assert!(result.enhanced_question.is_some());
    }

    #[test]
    fn test_unknown_location_has_empty_uri() {
        let resp = response(json!({
            "citations": [{"retrievedReferences": [{"location": {"kendraDocumentLocation": {}}}]}]
        }));
        let result = normalize(resp, None, QueryType::General, "q", "q");
        assert_eq!(result.sources[0].location_uri, "");
        assert_eq!(result.sources[0].document_key, "");
    }
}
