use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Retrieval depth; omitted from the body unless configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, k: Option<u32>) -> Self {
        Self {
            query: query.into(),
            k,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub text: String,
}

/// Backend reply. Only `answer` must be well typed; `error` accepts any
/// truthy JSON value and `chunks` keeps whatever entries parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "answer_field"
    )]
    pub answer: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "error_field"
    )]
    pub error: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "chunks_field"
    )]
    pub chunks: Vec<RetrievedChunk>,
}

/// `null`, `false`, `0` and `""` carry no text.
fn truthy_text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn answer_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        other => match truthy_text(other) {
            None => Ok(None),
            Some(_) => Err(de::Error::custom("answer must be a string")),
        },
    }
}

fn error_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(truthy_text(Value::deserialize(deserializer)?))
}

fn chunks_field<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<RetrievedChunk>, D::Error> {
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// The single interpretation taken for a successfully transported response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryReply<'a> {
    Answer(&'a str),
    Error(&'a str),
    Empty,
}

impl QueryResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Parses a success body. A JSON value other than an object or `null`
    /// carries neither field and reads as an empty reply.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<Value>(body)? {
            value @ (Value::Object(_) | Value::Null) => serde_json::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    /// Empty strings count as absent; `answer` wins over `error`.
    pub fn reply(&self) -> QueryReply<'_> {
        fn non_empty(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|v| !v.is_empty())
        }
        if let Some(answer) = non_empty(&self.answer) {
            QueryReply::Answer(answer)
        } else if let Some(error) = non_empty(&self.error) {
            QueryReply::Error(error)
        } else {
            QueryReply::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_omits_unset_retrieval_depth() {
        let body = serde_json::to_string(&QueryRequest::new("what is rust", None)).expect("json");
        assert_eq!(body, r#"{"query":"what is rust"}"#);

        let body = serde_json::to_string(&QueryRequest::new("q", Some(5))).expect("json");
        assert_eq!(body, r#"{"query":"q","k":5}"#);
    }

    #[test]
    fn response_ignores_unknown_fields_and_reads_chunks() {
        let raw = r#"{
            "answer": "42",
            "latency_ms": 12,
            "chunks": [{"id": "doc-1#3", "source": "doc-1.txt", "score": 0.81, "text": "forty two"}]
        }"#;
        let response: QueryResponse = serde_json::from_str(raw).expect("json");
        assert_eq!(response.reply(), QueryReply::Answer("42"));
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].source, "doc-1.txt");
    }

    #[test]
    fn reply_prefers_answer_and_treats_empty_strings_as_absent() {
        let both = QueryResponse {
            answer: Some("yes".to_string()),
            error: Some("ignored".to_string()),
            chunks: Vec::new(),
        };
        assert_eq!(both.reply(), QueryReply::Answer("yes"));

        let blank_answer = QueryResponse {
            answer: Some(String::new()),
            error: Some("Query cannot be empty".to_string()),
            chunks: Vec::new(),
        };
        assert_eq!(blank_answer.reply(), QueryReply::Error("Query cannot be empty"));

        let empty: QueryResponse = serde_json::from_str("{}").expect("json");
        assert_eq!(empty.reply(), QueryReply::Empty);
    }

    #[test]
    fn null_body_and_non_string_answer_fail_to_parse() {
        assert!(QueryResponse::from_json_slice(b"null").is_err());
        assert!(QueryResponse::from_json_slice(br#"{"answer": 42}"#).is_err());
        assert!(QueryResponse::from_json_slice(br#"{"answer": 42, "error": "x"}"#).is_err());
        assert!(QueryResponse::from_json_slice(b"not json").is_err());
    }

    #[test]
    fn non_object_bodies_read_as_empty_replies() {
        let bodies: [&[u8]; 4] = [b"[]", br#""x""#, b"7", b"true"];
        for body in bodies {
            let response = QueryResponse::from_json_slice(body).expect("json");
            assert_eq!(response.reply(), QueryReply::Empty);
        }
    }

    #[test]
    fn falsy_answers_yield_to_error_and_non_string_errors_render_as_text() {
        let response =
            QueryResponse::from_json_slice(br#"{"answer": null, "error": 42}"#).expect("json");
        assert_eq!(response.reply(), QueryReply::Error("42"));

        let response =
            QueryResponse::from_json_slice(br#"{"answer": false, "error": 0}"#).expect("json");
        assert_eq!(response.reply(), QueryReply::Empty);

        let response = QueryResponse::from_json_slice(br#"{"error": {"code": 3}}"#).expect("json");
        assert_eq!(response.reply(), QueryReply::Error(r#"{"code":3}"#));
    }

    #[test]
    fn null_or_malformed_chunks_do_not_hide_the_answer() {
        let response =
            QueryResponse::from_json_slice(br#"{"answer": "42", "chunks": null}"#).expect("json");
        assert_eq!(response.reply(), QueryReply::Answer("42"));
        assert!(response.chunks.is_empty());

        let response = QueryResponse::from_json_slice(
            br#"{"answer": "42", "chunks": [{"id": 7}, {"id": "ok#1", "score": 0.5}, "junk"]}"#,
        )
        .expect("json");
        assert_eq!(response.reply(), QueryReply::Answer("42"));
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].id, "ok#1");

        let response =
            QueryResponse::from_json_slice(br#"{"answer": "42", "chunks": "n/a"}"#).expect("json");
        assert!(response.chunks.is_empty());
    }
}
