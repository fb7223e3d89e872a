use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Read once at boot and shared behind an `Arc`. It holds the database
/// connection string, bind address, CORS origin, session cookie secret,
/// and the credentials for the identity and billing providers.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Public base URL of the frontend, used to build checkout and
    /// billing portal redirect targets.
    pub server_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Secret used to encrypt and sign the session cookie.
    pub session_secret: String,
    /// Fallback display currency for the pricing endpoint.
    pub default_currency: String,
    /// Base URL of the identity provider REST API.
    pub auth_api_url: String,
    /// Service-role key for the identity provider admin endpoints.
    pub auth_service_role_key: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: "development" or "production"
    /// - `DATABASE_URL`: Connection string for the database
    /// - `SESSION_SECRET`: Session cookie secret, at least 32 characters
    /// - `AUTH_API_URL`: Identity provider base URL
    /// - `AUTH_SERVICE_ROLE_KEY`: Identity provider service-role key
    ///
    /// Optional (with defaults):
    /// - `SERVER_URL`: Frontend base URL (default: "http://localhost:3000")
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `DEFAULT_CURRENCY`: Pricing fallback currency (default: "usd")
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`: empty when unset so
    ///   the server can boot without billing in local development
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are
    /// missing or if `SESSION_SECRET` is shorter than 32 characters.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let session_secret = env::var("SESSION_SECRET").expect("SESSION_SECRET must be set");
        assert!(
            session_secret.len() >= 32,
            "SESSION_SECRET must be at least 32 characters long"
        );

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_url: env::var("SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            session_secret,
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            auth_api_url: env::var("AUTH_API_URL").expect("AUTH_API_URL must be set"),
            auth_service_role_key: env::var("AUTH_SERVICE_ROLE_KEY")
                .expect("AUTH_SERVICE_ROLE_KEY must be set"),
            stripe_secret_key,
            stripe_webhook_secret,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
