//! Wire types for the Gemini `generateContent` API.
//!
//! A conversation is a list of [`Content`] turns, each holding one or more
//! [`Part`]s. A part carries plain text, a function call proposed by the
//! model, or a function response supplied by the client. Tool-calling
//! follow-ups replay the model's part back verbatim, so these types
//! round-trip exactly what the API produced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The model.
    Model,
    /// A function result turn.
    Function,
}

/// A function call proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub args: Value,
}

/// A function result supplied back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the function that produced the result.
    pub name: String,
    /// The result payload.
    pub response: Value,
}

/// One part of a conversation turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Plain text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// A function call proposed by the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// A function result supplied by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create a function-response part.
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.into(),
                response,
            }),
            ..Self::default()
        }
    }

    /// The function call carried by this part, if any.
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        self.function_call.as_ref()
    }
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Who produced the turn.
    pub role: Role,
    /// Parts of the turn.
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a model turn from parts.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// Create a function turn carrying one tool's result.
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Role::Function,
            parts: vec![Part::function_response(name, response)],
        }
    }
}

/// A tool declaration the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the arguments.
    pub parameters: Value,
}

/// Tool configuration block of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Declared functions.
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Request body for `generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Conversation so far.
    pub contents: Vec<Content>,
    /// Declared tools, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,
}

impl GenerateRequest {
    /// Create a request with no tools.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            tools: Vec::new(),
        }
    }

    /// Attach function declarations.
    pub fn with_tools(mut self, declarations: Vec<FunctionDeclaration>) -> Self {
        if !declarations.is_empty() {
            self.tools = vec![ToolConfig {
                function_declarations: declarations,
            }];
        }
        self
    }
}

/// One candidate completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The generated turn, absent when the model produced nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Candidate completions; the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Parts of the first candidate, empty when there is none.
    pub fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// First text part of the first candidate.
    pub fn first_text(&self) -> Option<&str> {
        self.parts().iter().find_map(|p| p.text.as_deref())
    }

    /// Build a response from parts (test helper for mock backends).
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content::model(parts)),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_turn_wire_shape() {
        let turn = Content::user("fly to Haifa");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["text"], "fly to Haifa");
        assert!(json["parts"][0].get("functionCall").is_none());
    }

    #[test]
    fn test_function_call_part_round_trip() {
        let json = json!({
            "functionCall": { "name": "navigate_to", "args": { "location": "Haifa" } }
        });
        let part: Part = serde_json::from_value(json.clone()).unwrap();
        let call = part.as_function_call().unwrap();
        assert_eq!(call.name, "navigate_to");
        assert_eq!(call.args["location"], "Haifa");

        // The part must serialize back to exactly what arrived.
        assert_eq!(serde_json::to_value(&part).unwrap(), json);
    }

    #[test]
    fn test_function_call_args_default() {
        let part: Part =
            serde_json::from_value(json!({ "functionCall": { "name": "noop" } })).unwrap();
        assert_eq!(part.as_function_call().unwrap().args, Value::Null);
    }

    #[test]
    fn test_function_response_turn() {
        let turn = Content::function_response("change_speed", json!({ "result": "Success" }));
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "function");
        assert_eq!(json["parts"][0]["functionResponse"]["name"], "change_speed");
        assert_eq!(
            json["parts"][0]["functionResponse"]["response"]["result"],
            "Success"
        );
    }

    #[test]
    fn test_request_tools_block() {
        let request = GenerateRequest::new(vec![Content::user("hi")]).with_tools(vec![
            FunctionDeclaration {
                name: "navigate_to".to_string(),
                description: "Fly to a named location".to_string(),
                parameters: json!({ "type": "object" }),
            },
        ]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["tools"][0]["function_declarations"][0]["name"],
            "navigate_to"
        );

        let bare = GenerateRequest::new(vec![Content::user("hi")]);
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_response_part_helpers() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "functionCall": { "name": "change_altitude", "args": { "altitude_ft": 9000 } } },
                        { "text": "Climbing." }
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.parts().len(), 2);
        assert_eq!(response.first_text(), Some("Climbing."));
    }

    #[test]
    fn test_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.parts().is_empty());
        assert_eq!(response.first_text(), None);
    }
}
