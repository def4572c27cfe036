//! Constants for the Responses API wire format
//!
//! This module defines string constants used throughout the application for
//! endpoint paths, headers, tool types and server-sent event framing.

/// Endpoint path constants
pub mod path {
    /// Marker separating a Foundry resource URL from its project path
    pub const PROJECTS_SEGMENT: &str = "/api/projects/";

    /// Resource-level v1 API suffix
    pub const OPENAI_V1: &str = "/openai/v1/";

    /// Responses endpoint relative to the v1 base URL
    pub const RESPONSES: &str = "responses";
}

/// HTTP header constants
pub mod header {
    /// Azure API key header
    pub const API_KEY: &str = "api-key";

    /// Client-generated request id, echoed back by Azure
    pub const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";
}

/// Tool type constants
pub mod tool {
    /// Function tool type
    pub const FUNCTION: &str = "function";
}

/// Server-sent event framing
pub mod sse {
    /// Prefix of a data line
    pub const DATA_PREFIX: &str = "data:";

    /// Terminal sentinel some gateways append
    pub const DONE: &str = "[DONE]";
}

/// Defaults applied when configuration omits a value
pub mod defaults {
    /// Deployment used when AZURE_OPENAI_DEPLOYMENT is unset
    pub const DEPLOYMENT: &str = "gpt-5.2-chat";

    /// Logging level
    pub const LOG_LEVEL: &str = "info";

    /// Request timeout in seconds
    pub const REQUEST_TIMEOUT: u64 = 120;
}
