use actix_web::{route, HttpResponse};

/// /api/webhooks/payment - Désactivé tant que le fournisseur de paiement
/// n'est pas branché
#[route("/webhooks/payment", method = "GET", method = "POST")]
pub async fn payment_webhook() -> HttpResponse {
    tracing::warn!("Payment webhook called while disabled");
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "message": "Payment webhooks temporarily disabled"
    }))
}
