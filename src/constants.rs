//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

use std::time::Duration;

/// Default GraphQL endpoint for a fresh install
pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://countries.trevorblades.com/graphql";

/// Default variables document
pub const DEFAULT_VARIABLES: &str = "{}\n";

/// Default URL for new HTTP requests
pub const DEFAULT_HTTP_URL: &str = "https://httpbin.org/get";

/// Default URL for WebSocket connections
pub const DEFAULT_WS_URL: &str = "wss://echo.websocket.events";

/// Timeout applied to every HTTP request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Keepalive ping period for an open WebSocket
pub const WS_PING_INTERVAL: Duration = Duration::from_secs(20);

/// Directory under the config root holding the state document
pub const APP_DIR_NAME: &str = "http_voyager";

/// State document file name
pub const STATE_FILE_NAME: &str = "state.json";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "HTTP_VOYAGER_CONFIG_DIR";

/// Log file written when `--debug` is given
pub const DEFAULT_LOG_FILENAME: &str = "http_voyager.log";

/// Number of type names listed in the schema summary
pub const SCHEMA_SUMMARY_LIMIT: usize = 50;

/// Application name
pub const APP_NAME: &str = "HTTP Voyager";

/// Introspection query sent by the Docs tab
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    types {
      kind
      name
      description
      fields(includeDeprecated: true) {
        name
        description
        args {
          name
          description
          type { kind name ofType { kind name ofType { kind name } } }
        }
        type { kind name ofType { kind name ofType { kind name } } }
      }
    }
  }
}
"#;
