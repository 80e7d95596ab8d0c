use thiserror::Error;

/// Aggregates every failure mode exposed by the unified chat client.
///
/// Variants split along the two delivery paths described in the crate docs:
/// errors raised before a stream exists come back synchronously, while
/// failures after streaming has begun arrive as one terminal event through
/// the [`StreamReader`](crate::stream::StreamReader).
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-layer or networking failure (connect, TLS, body read).
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The unified request could not be turned into a wire payload.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    /// Non-success HTTP status from a vendor endpoint.
    ///
    /// The body is kept verbatim rather than parsed into a structured shape:
    /// vendors disagree on error envelopes and the raw text is what operators
    /// need when filing tickets.
    #[error("api error (status {status}): {body}")]
    Api {
        /// HTTP status code returned by the vendor.
        status: u16,
        /// Raw response body, unmodified.
        body: String,
    },
    /// A vendor answered 2xx but the payload violated its own wire schema.
    #[error("provider {provider} error: {message}")]
    Provider {
        /// Short vendor identifier, such as `openai`.
        provider: &'static str,
        /// Human-readable description of the violation.
        message: String,
    },
    /// A pull on a stream reader whose event channel has already ended.
    ///
    /// Sticky: once returned, every later pull returns it again.
    #[error("stream closed")]
    StreamClosed,
}

impl Error {
    /// Creates an [`Error::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi::error::Error;
    ///
    /// let err = Error::transport("dns lookup failed");
    /// assert!(matches!(err, Error::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`Error::InvalidRequest`] from a textual description.
    pub fn invalid_request<T: Into<String>>(message: T) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates an [`Error::Api`] carrying the vendor status and raw body.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi::error::Error;
    ///
    /// let err = Error::api(429, "{\"error\":\"slow down\"}");
    /// assert!(matches!(err, Error::Api { status: 429, .. }));
    /// ```
    pub fn api<T: Into<String>>(status: u16, body: T) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Creates an [`Error::Provider`] with the given vendor name and message.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashi::error::Error;
    ///
    /// let err = Error::provider("openai", "bad JSON payload");
    /// assert!(matches!(err, Error::Provider { provider: "openai", .. }));
    /// ```
    pub fn provider<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}
