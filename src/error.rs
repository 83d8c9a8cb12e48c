pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no starting point: enable location or set a start point")]
    MissingOrigin,
    #[error("no walking route found to {destination}")]
    NoRouteFound { destination: String },
    #[error("navigation is not active")]
    NotNavigating,
    #[error("provider request failed: {context}")]
    Provider {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn no_route_found(destination: impl Into<String>) -> Self {
        Self::NoRouteFound {
            destination: destination.into(),
        }
    }

    pub fn provider(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Provider {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingOrigin => "Enable location or set a start point",
            Self::NoRouteFound { .. } => "Could not find a route",
            Self::NotNavigating => "Start navigation first",
            Self::Provider { .. } | Self::MalformedResponse(_) => {
                "Directions service is unavailable"
            }
            Self::Io { .. } | Self::InvalidArgument(_) | Self::Unsupported(_) => {
                "Something went wrong"
            }
        }
    }
}
