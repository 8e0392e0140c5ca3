//! Router construction and request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use planvault_assets::{AssetCatalog, AssetOwner, ObjectStore, UploadCoordinator};
use planvault_auth::{
    Caller, StaticTokenValidator, TokenClaims, TokenValidator, authorize_download,
};
use planvault_core::{Error, NotFoundError, OrderId, UserId};
use planvault_fulfillment::{FulfillmentOutcome, FulfillmentService, PlanPackageGenerator};
use planvault_infra::{
    InMemoryAssetCatalog, InMemoryObjectStore, InMemoryOrderStore, InMemoryPaymentStore,
};
use planvault_orders::OrderStore;
use planvault_webhook::{
    Disposition, SeenEvents, SignatureVerifier, VerificationMode, WebhookIngress,
};

use crate::error::error_to_response;
use crate::middleware::{AuthState, auth_middleware};

/// Signature header the payment provider sends.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// TTL for download URLs minted on the asset listing route.
const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Validity window for the statically configured admin token.
const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<WebhookIngress>,
    pub fulfillment: Arc<FulfillmentService>,
    pub orders: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn AssetCatalog>,
    pub store: Arc<dyn ObjectStore>,
}

/// Build the full application router.
///
/// The webhook route authenticates via signature, not bearer token; only
/// the download surface sits behind the auth middleware.
pub fn build_router(state: AppState, tokens: Arc<dyn TokenValidator>) -> Router {
    let authed = Router::new()
        .route("/orders/:order_id/assets", get(list_order_assets))
        .route_layer(axum::middleware::from_fn_with_state(
            AuthState { tokens },
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/payment", post(payment_webhook))
        .merge(authed)
        .with_state(state)
}

/// Runtime configuration for [`build_app`].
pub struct AppConfig {
    pub webhook_secret: String,
    pub verification: VerificationMode,
    /// Static admin token for the download surface; dev/test convenience
    /// until a real identity provider is wired in.
    pub admin_token: Option<String>,
}

/// Assemble the service on in-memory backends.
pub fn build_app(config: AppConfig) -> Router {
    let orders = Arc::new(InMemoryOrderStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let catalog: Arc<dyn AssetCatalog> = Arc::new(InMemoryAssetCatalog::new());
    let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());

    let generator = PlanPackageGenerator::new(
        store.clone(),
        catalog.clone(),
        UploadCoordinator::new(store.clone(), catalog.clone()),
    );
    let fulfillment = Arc::new(FulfillmentService::new(
        orders.clone(),
        payments,
        Arc::new(generator),
    ));
    let ingress = Arc::new(WebhookIngress::new(
        SignatureVerifier::new(&config.webhook_secret, config.verification),
        SeenEvents::default(),
    ));

    let mut tokens = StaticTokenValidator::new();
    if let Some(token) = config.admin_token {
        tokens = tokens.with_token(
            token,
            TokenClaims::valid_for(UserId::new(), true, ADMIN_TOKEN_TTL),
        );
    }

    build_router(
        AppState {
            ingress,
            fulfillment,
            orders,
            catalog,
            store,
        },
        Arc::new(tokens),
    )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Inbound provider delivery.
///
/// Always answers: 2xx for anything handled (including no-ops), 4xx for
/// deterministic rejections the provider must not retry, 5xx for transient
/// failures it should.
async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let disposition = match state.ingress.accept(signature, &body) {
        Ok(d) => d,
        Err(err) => {
            tracing::warn!(error = %err, "webhook rejected");
            return error_to_response(&err);
        }
    };

    match disposition {
        Disposition::Ignored { event_type } => Json(serde_json::json!({
            "received": true,
            "handled": false,
            "type": event_type,
        }))
        .into_response(),

        Disposition::Duplicate { order_id } => Json(serde_json::json!({
            "received": true,
            "duplicate": true,
            "order_id": order_id,
        }))
        .into_response(),

        Disposition::Fulfill {
            order_id,
            checkout_id,
            event_id,
        } => {
            match state
                .fulfillment
                .handle_payment_success(order_id, checkout_id, None)
                .await
            {
                Ok(FulfillmentOutcome::Fulfilled { assets_cataloged }) => {
                    Json(serde_json::json!({
                        "received": true,
                        "fulfilled": true,
                        "assets": assets_cataloged,
                    }))
                    .into_response()
                }
                Ok(FulfillmentOutcome::AlreadyFulfilled) => Json(serde_json::json!({
                    "received": true,
                    "fulfilled": true,
                    "duplicate": true,
                }))
                .into_response(),
                // Payment confirmed; asset generation is retryable and must
                // not turn the acknowledgement into a retryable failure.
                Ok(FulfillmentOutcome::AssetsPending { detail }) => Json(serde_json::json!({
                    "received": true,
                    "fulfilled": false,
                    "assets_pending": true,
                    "detail": detail,
                }))
                .into_response(),
                Err(err) => {
                    // Let the provider's retry re-run fulfillment instead of
                    // being swallowed by the dedup set.
                    if !err.is_terminal() {
                        if let Some(id) = &event_id {
                            state.ingress.retract(id);
                        }
                    }
                    tracing::error!(order_id = %order_id, error = %err, "fulfillment failed");
                    error_to_response(&err)
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct AssetDto {
    id: planvault_core::AssetId,
    name: String,
    category: &'static str,
    content_type: String,
    byte_size: u64,
    url: String,
}

/// List a paid order's assets with freshly minted download URLs.
///
/// The access gate runs on every request against the current order record;
/// nothing about the assets is revealed on denial.
async fn list_order_assets(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(order_id): Path<Uuid>,
) -> Response {
    let order_id = OrderId::from_uuid(order_id);

    let order = match state.orders.find(order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return error_to_response(&NotFoundError::Order(order_id.to_string()).into());
        }
        Err(err) => return error_to_response(&err),
    };

    if let Err(err) = authorize_download(&caller, &order) {
        return error_to_response(&err);
    }

    let records = match state.catalog.list_assets(AssetOwner::Order(order_id)).await {
        Ok(records) => records,
        Err(err) => return error_to_response(&Error::from(err)),
    };

    let mut assets = Vec::with_capacity(records.len());
    for record in records {
        let url = match state
            .store
            .signed_url(&record.storage_key, DOWNLOAD_URL_TTL)
            .await
        {
            Ok(url) => url,
            Err(err) => return error_to_response(&Error::from(err)),
        };
        assets.push(AssetDto {
            id: record.id,
            name: record.display_name,
            category: record.category.as_str(),
            content_type: record.content_type,
            byte_size: record.byte_size,
            url,
        });
    }

    (StatusCode::OK, Json(serde_json::json!({ "assets": assets }))).into_response()
}
