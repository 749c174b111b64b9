use serde::Deserialize;

/// Client-credentials grant material for one external API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCredentials {
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Origin of the configuration UI, allowed through CORS.
    pub ui_origin: String,
    /// Base URL of the management REST API (template catalog lives there).
    pub management_base_url: String,
    /// Data-extension key the template catalog is read from.
    pub template_de_key: String,
    /// Full URL of the push-delivery endpoint.
    pub push_api_url: String,
    /// Credentials for the management API. `None` until configured;
    /// catalog calls fail with a configuration error, not a panic.
    pub management_auth: Option<ApiCredentials>,
    /// Credentials for the push service.
    pub push_auth: Option<ApiCredentials>,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("PUSHACT_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .unwrap_or(3000),
        ui_origin: std::env::var("PUSHACT_UI_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
        management_base_url: std::env::var("MC_REST_BASE_URL").unwrap_or_default(),
        template_de_key: std::env::var("TEMPLATE_DE_KEY")
            .unwrap_or_else(|_| "PushTemplates".into()),
        push_api_url: std::env::var("PUSH_API_URL").unwrap_or_default(),
        management_auth: credentials_from_env("MC_AUTH_URL", "MC_CLIENT_ID", "MC_CLIENT_SECRET"),
        push_auth: credentials_from_env("PUSH_AUTH_URL", "PUSH_CLIENT_ID", "PUSH_CLIENT_SECRET"),
    })
}

/// Read one credential triple from the environment.
/// A partially-set triple is treated as absent so the failure surfaces as a
/// clear configuration error at call time instead of a confusing auth error.
fn credentials_from_env(auth_var: &str, id_var: &str, secret_var: &str) -> Option<ApiCredentials> {
    match (
        std::env::var(auth_var),
        std::env::var(id_var),
        std::env::var(secret_var),
    ) {
        (Ok(auth_url), Ok(client_id), Ok(client_secret)) => Some(ApiCredentials {
            auth_url,
            client_id,
            client_secret,
        }),
        (Err(_), Err(_), Err(_)) => None,
        _ => {
            eprintln!(
                "⚠️  {auth_var}/{id_var}/{secret_var} are only partially set — ignoring the triple"
            );
            None
        }
    }
}
