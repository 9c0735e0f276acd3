use std::env;

#[derive(Clone)]
pub struct Config {
    /// Personal access token for GitHub requests without an OAuth token
    pub github_token: Option<String>,
    pub github_api_url: String,
    /// Personal access token for GitLab requests without an OAuth token
    pub gitlab_token: Option<String>,
    pub gitlab_api_url: String,
    /// Mailgun credentials for subscription lists and notification email
    pub mailgun_api_key: String,
    pub mailgun_api_url: String,
    /// Sending domain the mailing lists live under
    pub mailgun_domain: String,
    /// From address on notification email
    pub email_from_address: String,
    /// Shared secret for verifying inbound webhooks
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            github_token: env::var("GITHUB_TOKEN").ok(),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            gitlab_token: env::var("GITLAB_TOKEN").ok(),
            gitlab_api_url: env::var("GITLAB_API_URL")
                .unwrap_or_else(|_| "https://gitlab.com/api/v4".to_string()),
            mailgun_api_key: env::var("MAILGUN_API_KEY").unwrap_or_default(),
            mailgun_api_url: env::var("MAILGUN_API_URL")
                .unwrap_or_else(|_| "https://api.mailgun.net/v3".to_string()),
            mailgun_domain: env::var("MAILGUN_DOMAIN").unwrap_or_default(),
            email_from_address: env::var("EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@staticpost.local".to_string()),
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
        }
    }

    /// Baseline configuration for unit tests, no environment involved.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            github_token: None,
            github_api_url: "https://api.github.com".to_string(),
            gitlab_token: None,
            gitlab_api_url: "https://gitlab.com/api/v4".to_string(),
            mailgun_api_key: "test-key".to_string(),
            mailgun_api_url: "https://api.mailgun.net/v3".to_string(),
            mailgun_domain: "mg.example.com".to_string(),
            email_from_address: "noreply@staticpost.local".to_string(),
            webhook_secret: None,
        }
    }
}
