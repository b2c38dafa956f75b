//! Send email handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::delivery::{
        errors::ValidationError, DeliveryStrategy, Email, EmailAddress, HtmlBody, Subject,
    },
    infrastructure::http::{
        errors::{ApiError, ErrorResponse},
        state::AppState,
    },
};

/// An address in a send request
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddressBody {
    /// The display name, may be omitted
    #[serde(default)]
    #[schema(example = "Jo Doe")]
    name: String,

    /// The mailbox address
    #[schema(example = "jo@example.com")]
    address: String,
}

/// Send email request body
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SendEmailBody {
    /// The sender
    #[serde(default)]
    from: AddressBody,

    /// Primary recipients; at least one must validate
    #[serde(default)]
    to: Vec<AddressBody>,

    /// Carbon-copy recipients
    #[serde(default)]
    cc: Vec<AddressBody>,

    /// Blind-carbon-copy recipients
    #[serde(default)]
    bcc: Vec<AddressBody>,

    /// The subject line
    #[serde(default)]
    #[schema(example = "Hello")]
    subject: String,

    /// The plain text body
    #[serde(default)]
    body: String,

    /// The HTML alternative; an empty string means none
    #[serde(default)]
    html: String,
}

/// Validates every field before any delivery is attempted, so the caller
/// sees all problems with the request at once.
impl TryFrom<SendEmailBody> for Email {
    type Error = ApiError;

    fn try_from(body: SendEmailBody) -> Result<Self, Self::Error> {
        let mut problems = Vec::new();

        let from = validated(
            EmailAddress::new(&body.from.name, &body.from.address),
            &mut problems,
        );
        let subject = validated(Subject::new(&body.subject), &mut problems);

        let to = addresses(&body.to, &mut problems);
        let cc = addresses(&body.cc, &mut problems);
        let bcc = addresses(&body.bcc, &mut problems);

        if to.is_empty() {
            problems.push("at least one valid \"to\" recipient is required".to_string());
        }

        match (from, subject) {
            (Some(from), Some(subject)) if problems.is_empty() => Ok(Email {
                from,
                to,
                cc,
                bcc,
                subject,
                body: body.body,
                html: (!body.html.is_empty()).then(|| HtmlBody::new(&body.html)),
            }),
            _ => Err(ApiError::new_422(&problems.join("\n"))),
        }
    }
}

fn validated<T>(result: Result<T, ValidationError>, problems: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            problems.push(err.to_string());
            None
        }
    }
}

fn addresses(bodies: &[AddressBody], problems: &mut Vec<String>) -> Vec<EmailAddress> {
    bodies
        .iter()
        .filter_map(|body| validated(EmailAddress::new(&body.name, &body.address), problems))
        .collect()
}

/// Send an email through the provider pool
#[utoipa::path(
    post,
    operation_id = "send_email",
    tag = "Delivery",
    path = "/api/v1/send",
    request_body = SendEmailBody,
    responses(
        (status = StatusCode::OK, description = "Email delivered"),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Unprocessable entity", body = ErrorResponse),
        (status = StatusCode::SERVICE_UNAVAILABLE, description = "No provider could deliver the email", body = ErrorResponse),
    )
)]
pub async fn handler<S: DeliveryStrategy>(
    State(state): State<AppState<S>>,
    request: Result<Json<SendEmailBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;

    let email: Email = request.try_into()?;

    state.strategy.send(&email).await?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;

    use crate::{
        domain::delivery::{errors::SendError, tests::MockDeliveryStrategy},
        infrastructure::http::{errors::ErrorResponse, router, state::test_state},
    };

    fn valid_body() -> serde_json::Value {
        serde_json::json!({
            "from": { "name": "Sender", "address": "sender@example.com" },
            "to": [{ "name": "Jo", "address": "jo@example.com" }],
            "subject": "greetings",
            "body": "hello",
            "html": "",
        })
    }

    #[tokio::test]
    async fn test_send_email_success() -> TestResult {
        let mut strategy = MockDeliveryStrategy::new();
        strategy.expect_send().times(1).returning(|_| Ok(()));

        let server = TestServer::new(router(test_state(Some(strategy))))?;

        let response = server.post("/api/v1/send").json(&valid_body()).await;

        response.assert_status_ok();

        Ok(())
    }

    #[tokio::test]
    async fn test_validation_failures_are_aggregated() -> TestResult {
        let mut strategy = MockDeliveryStrategy::new();
        strategy.expect_send().never();

        let server = TestServer::new(router(test_state(Some(strategy))))?;

        let response = server
            .post("/api/v1/send")
            .json(&serde_json::json!({
                "from": { "address": "not-an-address" },
                "to": [],
                "subject": "",
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let error = response.json::<ErrorResponse>().error;

        assert!(error.contains("\"not-an-address\" is not a valid email address"));
        assert!(error.contains("subject must not be empty"));
        assert!(error.contains("at least one valid \"to\" recipient is required"));

        Ok(())
    }

    #[tokio::test]
    async fn test_recipients_are_required() -> TestResult {
        let mut strategy = MockDeliveryStrategy::new();
        strategy.expect_send().never();

        let mut body = valid_body();
        body["to"] = serde_json::json!([]);

        let server = TestServer::new(router(test_state(Some(strategy))))?;

        let response = server.post("/api/v1/send").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_pool_maps_to_service_unavailable() -> TestResult {
        let mut strategy = MockDeliveryStrategy::new();
        strategy
            .expect_send()
            .times(1)
            .returning(|_| Err(SendError::AllProvidersFailed(3)));

        let server = TestServer::new(router(test_state(Some(strategy))))?;

        let response = server.post("/api/v1/send").json(&valid_body()).await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        Ok(())
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_delivery_attempt() -> TestResult {
        let mut strategy = MockDeliveryStrategy::new();
        strategy.expect_send().never();

        let mut body = valid_body();
        body["subject"] = serde_json::json!("a".repeat(79));

        let server = TestServer::new(router(test_state(Some(strategy))))?;

        let response = server.post("/api/v1/send").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let error = response.json::<ErrorResponse>().error;

        assert!(error.contains("subject must not be longer than 78 characters"));

        Ok(())
    }
}
