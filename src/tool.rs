//! Agent function-calling surface for the search tool.

use serde::Serialize;
use serde_json::{json, Value};

use crate::search::NOTHING_TO_SEARCH_MESSAGE;
use crate::WebSearch;

/// Name the agent calls the tool by.
pub const TOOL_NAME: &str = "web-browsing";

/// Example prompt and the call it should produce.
#[derive(Debug, Clone, Serialize)]
pub struct ToolExample {
    pub prompt: String,
    /// JSON-encoded call arguments.
    pub call: String,
}

/// Function definition handed to the language model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub examples: Vec<ToolExample>,
    pub parameters: Value,
}

impl ToolDefinition {
    /// The web search function definition.
    pub fn web_search() -> Self {
        let example = |prompt: &str, query: &str| ToolExample {
            prompt: prompt.to_string(),
            call: json!({ "query": query }).to_string(),
        };
        Self {
            name: TOOL_NAME.to_string(),
            description: "Searches for a given query using a search engine to get better results for the user query.".to_string(),
            examples: vec![
                example("Who won the world series today?", "Winner of today's world series"),
                example("What is OneNew?", "OneNew"),
                example("Current AAPL stock price", "AAPL stock price today"),
            ],
            parameters: json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "A search query."
                    }
                },
                "additionalProperties": false
            }),
        }
    }
}

/// Extracts the query argument from a function call.
pub fn query_argument(args: &Value) -> Option<&str> {
    args.get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
}

/// Handles one function call from the agent.
pub async fn handle(search: &WebSearch, args: &Value) -> String {
    match query_argument(args) {
        Some(query) => search.search(query).await,
        None => NOTHING_TO_SEARCH_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_shape() {
        let def = ToolDefinition::web_search();
        assert_eq!(def.name, "web-browsing");
        assert_eq!(def.examples.len(), 3);
        assert_eq!(def.parameters["properties"]["query"]["type"], "string");
        assert_eq!(def.parameters["additionalProperties"], false);
    }

    #[test]
    fn test_examples_are_valid_calls() {
        for example in ToolDefinition::web_search().examples {
            let args: Value = serde_json::from_str(&example.call).unwrap();
            assert!(query_argument(&args).is_some(), "{}", example.prompt);
        }
    }

    #[test]
    fn test_query_argument() {
        assert_eq!(query_argument(&json!({"query": "rust"})), Some("rust"));
        assert_eq!(query_argument(&json!({"query": ""})), None);
        assert_eq!(query_argument(&json!({"query": 42})), None);
        assert_eq!(query_argument(&json!({})), None);
    }

    #[test]
    fn test_definition_serializes() {
        let json = serde_json::to_value(ToolDefinition::web_search()).unwrap();
        assert_eq!(json["name"], "web-browsing");
        assert!(json["examples"][0]["call"].as_str().unwrap().contains("world series"));
    }
}
