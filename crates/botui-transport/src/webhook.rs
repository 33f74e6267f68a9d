//! Webhook request/response contract (spec §6): "accepts POST on a
//! configurable route, verifies the platform's secret-token header; 403 on
//! mismatch, 404 on other paths, 200 on accepted ..., 500 on internal
//! failure." Only this contract is specified — the HTTP server itself is
//! an external collaborator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResponse {
    Forbidden,
    NotFound,
    Accepted,
    InternalError,
}

impl WebhookResponse {
    pub fn status_code(self) -> u16 {
        match self {
            WebhookResponse::Forbidden => 403,
            WebhookResponse::NotFound => 404,
            WebhookResponse::Accepted => 200,
            WebhookResponse::InternalError => 500,
        }
    }
}

/// Verifies `path`/`secret_header` against the configured route/secret and
/// parses `body` into an `Update` via `parse`. Enqueueing the update for
/// async processing (so the HTTP response returns promptly) is the caller's
/// job; this function only decides which response to send.
pub fn handle_webhook_request(
    configured_route: &str,
    configured_secret: &str,
    path: &str,
    secret_header: Option<&str>,
    body: &[u8],
    parse: impl FnOnce(&[u8]) -> Result<crate::update::Update, String>,
) -> (WebhookResponse, Option<crate::update::Update>) {
    if path != configured_route {
        return (WebhookResponse::NotFound, None);
    }
    if secret_header != Some(configured_secret) {
        return (WebhookResponse::Forbidden, None);
    }
    match parse(body) {
        Ok(update) => (WebhookResponse::Accepted, Some(update)),
        Err(_) => (WebhookResponse::InternalError, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{IncomingMessage, Update};

    fn msg() -> Update {
        Update::Message(IncomingMessage {
            chat_id: 1,
            message_id: 2,
            date: 0,
            text: Some("hi".into()),
            photo_file_id: None,
            document_file_id: None,
        })
    }

    #[test]
    fn wrong_path_is_not_found() {
        let (resp, _) = handle_webhook_request("/hook", "s3cr3t", "/other", Some("s3cr3t"), b"{}", |_| Ok(msg()));
        assert_eq!(resp, WebhookResponse::NotFound);
    }

    #[test]
    fn wrong_secret_is_forbidden() {
        let (resp, _) = handle_webhook_request("/hook", "s3cr3t", "/hook", Some("nope"), b"{}", |_| Ok(msg()));
        assert_eq!(resp, WebhookResponse::Forbidden);
    }

    #[test]
    fn missing_secret_header_is_forbidden() {
        let (resp, _) = handle_webhook_request("/hook", "s3cr3t", "/hook", None, b"{}", |_| Ok(msg()));
        assert_eq!(resp, WebhookResponse::Forbidden);
    }

    #[test]
    fn valid_request_is_accepted_and_returns_the_parsed_update() {
        let (resp, update) =
            handle_webhook_request("/hook", "s3cr3t", "/hook", Some("s3cr3t"), b"{}", |_| Ok(msg()));
        assert_eq!(resp, WebhookResponse::Accepted);
        assert_eq!(update, Some(msg()));
    }

    #[test]
    fn unparsable_body_is_an_internal_error() {
        let (resp, update) =
            handle_webhook_request("/hook", "s3cr3t", "/hook", Some("s3cr3t"), b"garbage", |_| {
                Err("bad json".into())
            });
        assert_eq!(resp, WebhookResponse::InternalError);
        assert_eq!(update, None);
    }
}
