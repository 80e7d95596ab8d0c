//! Declare-and-execute helper for function tools.
//!
//! [`ToolBuilder`] assembles the JSON-schema `parameters` object from
//! [`Param`] leaves, produces the [`Tool`] declaration sent with a request,
//! and optionally holds the async handler that answers the model's calls.
//!
//! ```
//! use hashi::tool::{Param, ToolBuilder};
//!
//! let weather = ToolBuilder::new("get_weather")
//!     .description("Look up the current weather")
//!     .param(Param::string("city").describe("City name").required())
//!     .param(Param::string("unit").one_of(["celsius", "fahrenheit"]))
//!     .handler(|args| async move {
//!         Ok(format!("22C in {}", args.str_value("city")))
//!     });
//!
//! let declaration = weather.build();
//! assert_eq!(declaration.name, "get_weather");
//! ```

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::types::Tool;

type Handler = Box<dyn Fn(Args) -> BoxFuture<'static, Result<String, Error>> + Send + Sync>;

/// Consuming builder for a function tool and its handler.
pub struct ToolBuilder {
    name: String,
    description: String,
    params: Vec<Param>,
    strict: bool,
    handler: Option<Handler>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            strict: false,
            handler: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds one parameter to the tool's input schema.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Requests strict schema adherence on vendors that support it.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Installs the async handler invoked by [`ToolBuilder::run`].
    #[must_use]
    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, Error>> + Send + 'static,
    {
        self.handler = Some(Box::new(move |args| Box::pin(handler(args))));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces the declaration carried in `ChatRequest.tools`.
    pub fn build(&self) -> Tool {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.clone(), param.schema());
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut parameters = Map::new();
        parameters.insert("type".to_string(), Value::String("object".to_string()));
        parameters.insert("properties".to_string(), Value::Object(properties));
        parameters.insert("required".to_string(), Value::Array(required));

        Tool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: Some(Value::Object(parameters)),
            strict: self.strict,
        }
    }

    /// Decodes the model-produced argument text and invokes the handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when no handler is installed or the
    /// argument text is not a JSON object, otherwise whatever the handler
    /// returns.
    pub async fn run(&self, arguments: &str) -> Result<String, Error> {
        let Some(handler) = &self.handler else {
            return Err(Error::invalid_request(format!(
                "no handler registered for tool '{}'",
                self.name
            )));
        };
        let decoded: Map<String, Value> = serde_json::from_str(arguments)
            .map_err(|err| Error::invalid_request(format!("failed to parse arguments: {err}")))?;
        handler(Args(decoded)).await
    }
}

/// One parameter of a tool's input schema.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: &'static str,
    description: String,
    required: bool,
    one_of: Vec<String>,
    item_type: Option<String>,
}

impl Param {
    fn new(name: impl Into<String>, kind: &'static str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: false,
            one_of: Vec::new(),
            item_type: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, "string")
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, "integer")
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, "number")
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, "boolean")
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, "array")
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, "object")
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the parameter to a closed set of values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Element type for array parameters.
    #[must_use]
    pub fn item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), Value::String(self.kind.to_string()));
        if !self.description.is_empty() {
            property.insert(
                "description".to_string(),
                Value::String(self.description.clone()),
            );
        }
        if !self.one_of.is_empty() {
            let values = self.one_of.iter().cloned().map(Value::String).collect();
            property.insert("enum".to_string(), Value::Array(values));
        }
        if let Some(item_type) = &self.item_type {
            let mut items = Map::new();
            items.insert("type".to_string(), Value::String(item_type.clone()));
            property.insert("items".to_string(), Value::Object(items));
        }
        Value::Object(property)
    }
}

/// Decoded tool-call arguments with forgiving typed accessors.
///
/// Missing keys and type mismatches yield zero values rather than errors;
/// handlers that need strictness can inspect [`Args::value`] directly.
#[derive(Debug, Clone, Default)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn str_value(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Integer accessor; JSON numbers with a fractional part truncate.
    pub fn i64_value(&self, key: &str) -> i64 {
        self.0
            .get(key)
            .and_then(|value| {
                value
                    .as_i64()
                    .or_else(|| value.as_f64().map(|number| number as i64))
            })
            .unwrap_or_default()
    }

    pub fn f64_value(&self, key: &str) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or_default()
    }

    pub fn bool_value(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw access for shapes the typed accessors do not cover.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
