use planvault_api::app::{AppConfig, build_app};
use planvault_webhook::VerificationMode;

#[tokio::main]
async fn main() {
    planvault_observability::init();

    let webhook_secret = std::env::var("PLANVAULT_WEBHOOK_SECRET").unwrap_or_else(|_| {
        tracing::warn!("PLANVAULT_WEBHOOK_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let verification = match std::env::var("PLANVAULT_WEBHOOK_VERIFY").as_deref() {
        Ok("bypass") => VerificationMode::Bypass,
        _ => VerificationMode::Enforce,
    };

    let admin_token = std::env::var("PLANVAULT_API_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("PLANVAULT_API_TOKEN not set; download routes will reject all callers");
    }

    let app = build_app(AppConfig {
        webhook_secret,
        verification,
        admin_token,
    });

    let bind_addr =
        std::env::var("PLANVAULT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {bind_addr}: {err}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
