use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};
use vigil_core::TaskRecord;
use vigil_dispatch::CompletionNotifier;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Compute the signature header value for a payload:
/// `sha256={hex(HMAC-SHA256(secret, body))}`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Best-effort delivery of the final task record to a caller-supplied
/// URL. The body is the exact serialized bytes used to compute the
/// signature; nothing re-serializes it in between. Every failure is
/// logged and swallowed — the caller can always poll.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn deliver(&self, url: &str, secret: Option<&str>, record: &TaskRecord) {
        let body = match serde_json::to_vec(record) {
            Ok(body) => body,
            Err(e) => {
                warn!(task_id = %record.task_id, error = %e, "Webhook payload serialization failed");
                return;
            }
        };

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(secret) = secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body));
        }

        match request.body(body).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(task_id = %record.task_id, url = %url, "Webhook delivered");
            }
            Ok(resp) => {
                warn!(
                    task_id = %record.task_id,
                    url = %url,
                    status = %resp.status(),
                    "Webhook rejected"
                );
            }
            Err(e) => {
                warn!(task_id = %record.task_id, url = %url, error = %e, "Webhook delivery failed");
            }
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionNotifier for WebhookNotifier {
    async fn notify(&self, url: &str, secret: Option<&str>, record: &TaskRecord) {
        self.deliver(url, secret, record).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn signature_format() {
        let sig = sign("s", b"body");
        assert!(sig.starts_with("sha256="));
        // 32-byte digest, hex-encoded.
        assert_eq!(sig.len(), "sha256=".len() + 64);
    }

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(sign("secret", b"payload"), sign("secret", b"payload"));
    }

    #[test]
    fn signature_depends_on_secret_and_body() {
        assert_ne!(sign("a", b"payload"), sign("b", b"payload"));
        assert_ne!(sign("a", b"payload"), sign("a", b"other"));
    }

    #[test]
    fn signature_matches_reference_vector() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?"
        let sig = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_propagate() {
        let notifier = WebhookNotifier::new();
        let record = TaskRecord::new(Uuid::new_v4(), Uuid::new_v4());
        // Non-routable address: must log and return, never panic or error.
        notifier
            .notify("http://127.0.0.1:1/hook", Some("s"), &record)
            .await;
    }
}
