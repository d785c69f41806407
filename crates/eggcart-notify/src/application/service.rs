//! Email use cases behind the dispatcher endpoints.

use std::sync::Arc;

use eggcart_core::notification::OrderConfirmationRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use super::mailer::{MailError, Mailer, OutgoingEmail};
use crate::domain::template::{TemplateError, render_order_email, render_welcome_email};

/// The new profile carried by the welcome webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeRecord {
    /// Address to greet.
    pub email: String,
    /// Display name, if the profile has one.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Body of `POST /functions/welcome-email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeRequest {
    /// The inserted profile row.
    pub record: WelcomeRecord,
}

/// Why an email was not sent.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A required field was empty.
    #[error("missing required data: {0}")]
    MissingData(&'static str),

    /// The order figures could not be computed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The transport failed.
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Renders and sends transactional email.
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    from: String,
    operator_mailbox: String,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from", &self.from)
            .field("operator_mailbox", &self.operator_mailbox)
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Creates a service sending as `from`, copying order mail to
    /// `operator_mailbox`.
    #[must_use]
    pub fn new(
        mailer: Arc<dyn Mailer>,
        from: impl Into<String>,
        operator_mailbox: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            from: from.into(),
            operator_mailbox: operator_mailbox.into(),
        }
    }

    /// Sends the status email for an order to the customer and the
    /// operator mailbox.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::MissingData` for an empty email or order id,
    /// `NotifyError::Template` when the amounts overflow, and
    /// `NotifyError::Mail` if sending fails.
    #[instrument(skip_all, fields(order_id = %request.order.id, status = %request.order.status))]
    pub async fn send_order_confirmation(
        &self,
        request: &OrderConfirmationRequest,
    ) -> Result<(), NotifyError> {
        if request.email.trim().is_empty() {
            return Err(NotifyError::MissingData("email"));
        }
        if request.order.id.trim().is_empty() {
            return Err(NotifyError::MissingData("order.id"));
        }
        let rendered = render_order_email(request)?;
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: vec![request.email.clone(), self.operator_mailbox.clone()],
            subject: rendered.subject,
            html: rendered.html,
        };
        self.mailer.send(&email).await?;
        info!(items = request.items.len(), "order email sent");
        Ok(())
    }

    /// Sends the welcome email to a new profile.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::MissingData` for an empty email,
    /// `NotifyError::Mail` if sending fails.
    #[instrument(skip_all)]
    pub async fn send_welcome(&self, record: &WelcomeRecord) -> Result<(), NotifyError> {
        if record.email.trim().is_empty() {
            return Err(NotifyError::MissingData("record.email"));
        }
        let rendered = render_welcome_email(record.full_name.as_deref());
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: vec![record.email.clone()],
            subject: rendered.subject,
            html: rendered.html,
        };
        self.mailer.send(&email).await?;
        info!("welcome email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use eggcart_core::notification::{NotificationItem, NotificationOrder};
    use rust_decimal::Decimal;

    #[derive(Default)]
    struct CapturingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        reject: bool,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if self.reject {
                return Err(MailError::Rejected {
                    status: 500,
                    body: "down".into(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn request(email: &str) -> OrderConfirmationRequest {
        OrderConfirmationRequest {
            order: NotificationOrder {
                id: "0b6f4a3e-1c2d-4e5f-8a9b-0c1d2e3f4a5b".into(),
                user_full_name: None,
                created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
                status: "Delivered".into(),
                order_notes: Some("Your order was Delivered Successfully".into()),
                delivery_fee: None,
                final_total: None,
            },
            email: email.into(),
            items: vec![NotificationItem {
                product_name: "Brown eggs x6".into(),
                quantity: 1,
                price: Decimal::from(90),
            }],
        }
    }

    fn service(mailer: Arc<CapturingMailer>) -> EmailService {
        EmailService::new(
            mailer,
            "browneggs.shop <contact@browneggs.shop>",
            "contact@browneggs.shop",
        )
    }

    #[tokio::test]
    async fn test_order_email_goes_to_customer_and_operator() {
        let mailer = Arc::new(CapturingMailer::default());

        service(mailer.clone())
            .send_order_confirmation(&request("asha@example.com"))
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, vec!["asha@example.com", "contact@browneggs.shop"]);
        assert_eq!(sent[0].subject, "Order Delivered #0b6f4a3e - browneggs.shop");
        assert!(sent[0].html.contains("Your order was Delivered Successfully"));
    }

    #[tokio::test]
    async fn test_empty_email_is_missing_data() {
        let mailer = Arc::new(CapturingMailer::default());

        let result = service(mailer.clone())
            .send_order_confirmation(&request(" "))
            .await;

        assert!(matches!(result, Err(NotifyError::MissingData("email"))));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_amounts_are_refused_before_sending() {
        let mailer = Arc::new(CapturingMailer::default());
        let mut req = request("asha@example.com");
        req.items[0].quantity = 4_000_000_000;
        req.items[0].price = Decimal::MAX;

        let result = service(mailer.clone()).send_order_confirmation(&req).await;

        assert!(matches!(
            result,
            Err(NotifyError::Template(TemplateError::AmountOverflow))
        ));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let mailer = Arc::new(CapturingMailer {
            reject: true,
            ..CapturingMailer::default()
        });

        let result = service(mailer)
            .send_order_confirmation(&request("asha@example.com"))
            .await;

        assert!(matches!(result, Err(NotifyError::Mail(_))));
    }

    #[tokio::test]
    async fn test_welcome_goes_only_to_new_user() {
        let mailer = Arc::new(CapturingMailer::default());
        let record = WelcomeRecord {
            email: "ravi@example.com".into(),
            full_name: Some("Ravi".into()),
        };

        service(mailer.clone()).send_welcome(&record).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, vec!["ravi@example.com"]);
        assert_eq!(sent[0].subject, "Welcome to BrownEggs.shop! 🥚");
        assert!(sent[0].html.contains("Hi Ravi,"));
    }
}
