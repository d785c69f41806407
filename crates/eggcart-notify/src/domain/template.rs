//! Email templates.
//!
//! Subject lines and figures are fixed; the markup is plain and may change.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use eggcart_core::notification::{NotificationItem, OrderConfirmationRequest};
use rust_decimal::Decimal;
use thiserror::Error;

/// Shop name used in subjects and titles.
pub const SHOP_NAME: &str = "browneggs.shop";

/// Subject of the welcome email.
pub const WELCOME_SUBJECT: &str = "Welcome to BrownEggs.shop! 🥚";

/// Why an order email could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A line total or the order sum does not fit in a decimal.
    #[error("order amounts out of range")]
    AmountOverflow,
}

/// A rendered email body and subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Status-dependent wording of an order email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCopy {
    /// Subject and heading title.
    pub title: &'static str,
    /// First paragraph.
    pub message: &'static str,
    /// Heading icon.
    pub icon: &'static str,
}

/// Wording for a status string; unknown statuses get the generic update.
#[must_use]
pub fn status_copy(status: &str) -> StatusCopy {
    match status {
        "Processing" => StatusCopy {
            title: "Order Confirmation",
            message: "Thank you for your order!",
            icon: "⏳",
        },
        "Delivered" => StatusCopy {
            title: "Order Delivered",
            message: "Your order has been delivered!",
            icon: "✅",
        },
        "Cancelled" => StatusCopy {
            title: "Order Cancelled",
            message: "Your order has been cancelled.",
            icon: "❌",
        },
        _ => StatusCopy {
            title: "Order Update",
            message: "Your order status has been updated.",
            icon: "ℹ️",
        },
    }
}

/// Figures printed at the bottom of an order email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailTotals {
    /// Σ(price × quantity) over the items.
    pub subtotal: Decimal,
    /// Fee sent by the caller, zero when absent.
    pub delivery_fee: Decimal,
    /// Total sent by the caller, `subtotal + delivery_fee` when absent.
    pub final_total: Decimal,
}

impl EmailTotals {
    /// Computes the totals for a request.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::AmountOverflow` when a line total or a sum
    /// leaves the decimal range.
    pub fn for_request(request: &OrderConfirmationRequest) -> Result<Self, TemplateError> {
        let subtotal = request
            .items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(line_total(item)?))
            .ok_or(TemplateError::AmountOverflow)?;
        let delivery_fee = request.order.delivery_fee.unwrap_or_default();
        let final_total = match request.order.final_total {
            Some(total) => total,
            None => subtotal
                .checked_add(delivery_fee)
                .ok_or(TemplateError::AmountOverflow)?,
        };
        Ok(Self {
            subtotal,
            delivery_fee,
            final_total,
        })
    }
}

fn line_total(item: &NotificationItem) -> Option<Decimal> {
    item.price.checked_mul(Decimal::from(item.quantity))
}

/// First eight characters of an order id, as shown to customers.
#[must_use]
pub fn short_order_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(end, _)| &id[..end])
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%-d %B %Y, %I:%M %p").to_string()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the order email selected by the request's status.
///
/// # Errors
///
/// Returns `TemplateError::AmountOverflow` when the figures cannot be
/// computed.
pub fn render_order_email(
    request: &OrderConfirmationRequest,
) -> Result<RenderedEmail, TemplateError> {
    let order = &request.order;
    let copy = status_copy(&order.status);
    let short_id = short_order_id(&order.id);
    let totals = EmailTotals::for_request(request)?;
    let name = order.user_full_name.as_deref().unwrap_or("Customer");

    let mut rows = String::new();
    for item in &request.items {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>₹{}</td><td>₹{}</td></tr>",
            escape(&item.product_name),
            item.quantity,
            item.price,
            line_total(item).ok_or(TemplateError::AmountOverflow)?,
        );
    }
    let notes = order
        .order_notes
        .as_deref()
        .filter(|notes| !notes.is_empty())
        .map(|notes| format!("<p><em>{}</em></p>", escape(notes)))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title} - {SHOP_NAME}</title></head>
<body>
<h1>{icon} {title}</h1>
<p>Hi {name},</p>
<p>{message}</p>
<h2>Order Details</h2>
<p><strong>Order ID:</strong> #{short_id}</p>
<p><strong>Order Date:</strong> {date}</p>
<p><strong>Status:</strong> <span class="status-{status_class}">{status}</span></p>
{notes}
<table>
<thead><tr><th>Item</th><th>Quantity</th><th>Price</th><th>Total</th></tr></thead>
<tbody>
{rows}
<tr><td colspan="3"><strong>Subtotal:</strong></td><td>₹{subtotal}</td></tr>
<tr><td colspan="3"><strong>Delivery Fee:</strong></td><td>₹{fee}</td></tr>
<tr><td colspan="3"><strong>Total Amount:</strong></td><td>₹{total}</td></tr>
</tbody>
</table>
<p><a href="https://{SHOP_NAME}/#/orders">View Order Details</a></p>
<p>Need help? Email <a href="mailto:contact@{SHOP_NAME}">contact@{SHOP_NAME}</a></p>
</body>
</html>"#,
        title = copy.title,
        icon = copy.icon,
        message = copy.message,
        name = escape(name),
        short_id = escape(short_id),
        date = format_date(order.created_at),
        status_class = escape(&order.status.to_lowercase()),
        status = escape(&order.status),
        subtotal = totals.subtotal,
        fee = totals.delivery_fee,
        total = totals.final_total,
    );

    Ok(RenderedEmail {
        subject: format!("{} #{short_id} - {SHOP_NAME}", copy.title),
        html,
    })
}

/// Renders the welcome email for a new profile.
#[must_use]
pub fn render_welcome_email(full_name: Option<&str>) -> RenderedEmail {
    let name = full_name.filter(|n| !n.is_empty()).unwrap_or("Customer");
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Welcome to BrownEggs.shop!</title></head>
<body>
<h2>Welcome to BrownEggs.shop! 🥚</h2>
<p>Hi {name},</p>
<p>We are <strong>egg-cited</strong> to have you join us! Your account has been created, and fresh, high-quality eggs are now a click away.</p>
<p><a href="https://{SHOP_NAME}/products">Start Shopping</a></p>
<p>Questions? Reach us at <a href="mailto:contact@{SHOP_NAME}">contact@{SHOP_NAME}</a>.</p>
</body>
</html>"#,
        name = escape(name),
    );
    RenderedEmail {
        subject: WELCOME_SUBJECT.to_owned(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eggcart_core::notification::NotificationOrder;

    fn request(status: &str, fee: Option<i64>, total: Option<i64>) -> OrderConfirmationRequest {
        OrderConfirmationRequest {
            order: NotificationOrder {
                id: "0b6f4a3e-1c2d-4e5f-8a9b-0c1d2e3f4a5b".into(),
                user_full_name: Some("Asha Rao".into()),
                created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
                status: status.into(),
                order_notes: None,
                delivery_fee: fee.map(Decimal::from),
                final_total: total.map(Decimal::from),
            },
            email: "asha@example.com".into(),
            items: vec![
                NotificationItem {
                    product_name: "Brown eggs x6".into(),
                    quantity: 2,
                    price: Decimal::from(90),
                },
                NotificationItem {
                    product_name: "Two free-range eggs".into(),
                    quantity: 1,
                    price: Decimal::from(10),
                },
            ],
        }
    }

    #[test]
    fn test_subject_follows_status() {
        assert_eq!(
            render_order_email(&request("Processing", None, None)).unwrap().subject,
            "Order Confirmation #0b6f4a3e - browneggs.shop"
        );
        assert_eq!(
            render_order_email(&request("Delivered", None, None)).unwrap().subject,
            "Order Delivered #0b6f4a3e - browneggs.shop"
        );
        assert_eq!(
            render_order_email(&request("Cancelled", None, None)).unwrap().subject,
            "Order Cancelled #0b6f4a3e - browneggs.shop"
        );
        assert_eq!(
            render_order_email(&request("pending", None, None)).unwrap().subject,
            "Order Update #0b6f4a3e - browneggs.shop"
        );
    }

    #[test]
    fn test_totals_default_fee_to_zero_and_total_to_sum() {
        let totals = EmailTotals::for_request(&request("Processing", None, None)).unwrap();

        assert_eq!(totals.subtotal, Decimal::from(190));
        assert_eq!(totals.delivery_fee, Decimal::ZERO);
        assert_eq!(totals.final_total, Decimal::from(190));
    }

    #[test]
    fn test_totals_use_caller_figures_when_present() {
        let with_fee = EmailTotals::for_request(&request("Processing", Some(20), None)).unwrap();
        let explicit = EmailTotals::for_request(&request("Processing", Some(20), Some(205))).unwrap();

        assert_eq!(with_fee.final_total, Decimal::from(210));
        assert_eq!(explicit.final_total, Decimal::from(205));
    }

    #[test]
    fn test_body_lists_items_and_escapes_names() {
        let mut req = request("Processing", Some(20), None);
        req.order.user_full_name = Some("<script>".into());

        let html = render_order_email(&req).unwrap().html;

        assert!(html.contains("Hi &lt;script&gt;,"));
        assert!(html.contains("<td>Brown eggs x6</td><td>2</td><td>₹90</td><td>₹180</td>"));
        assert!(html.contains("₹210"));
        assert!(html.contains("15 January 2026, 10:00 AM"));
    }

    #[test]
    fn test_line_total_past_decimal_range_is_refused() {
        let mut req = request("Processing", None, None);
        req.items = vec![NotificationItem {
            product_name: "Brown eggs x6".into(),
            quantity: 4_000_000_000,
            price: "70000000000000000000000000000".parse().unwrap(),
        }];

        assert_eq!(
            EmailTotals::for_request(&req),
            Err(TemplateError::AmountOverflow)
        );
        assert_eq!(render_order_email(&req), Err(TemplateError::AmountOverflow));
    }

    #[test]
    fn test_subtotal_past_decimal_range_is_refused() {
        let mut req = request("Processing", None, None);
        let item = NotificationItem {
            product_name: "Brown eggs x6".into(),
            quantity: 1,
            price: Decimal::MAX,
        };
        req.items = vec![item.clone(), item];

        assert_eq!(
            EmailTotals::for_request(&req),
            Err(TemplateError::AmountOverflow)
        );
    }

    #[test]
    fn test_subtotal_plus_fee_past_decimal_range_is_refused() {
        let mut req = request("Processing", Some(20), None);
        req.items.truncate(1);
        req.items[0].price = Decimal::MAX;
        req.items[0].quantity = 1;

        assert_eq!(
            EmailTotals::for_request(&req),
            Err(TemplateError::AmountOverflow)
        );
    }

    #[test]
    fn test_escape_replaces_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape("plain eggs ₹90"), "plain eggs ₹90");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_notes_and_product_names_are_escaped() {
        let mut req = request("Processing", None, None);
        req.order.order_notes = Some("leave at <door> & ring".into());
        req.items[0].product_name = "Eggs \"large\"".into();

        let html = render_order_email(&req).unwrap().html;

        assert!(html.contains("<p><em>leave at &lt;door&gt; &amp; ring</em></p>"));
        assert!(html.contains("<td>Eggs &quot;large&quot;</td>"));
    }

    #[test]
    fn test_short_order_id_handles_short_ids() {
        assert_eq!(short_order_id("abc"), "abc");
        assert_eq!(short_order_id("0123456789"), "01234567");
    }

    #[test]
    fn test_welcome_email_defaults_name() {
        let email = render_welcome_email(None);

        assert_eq!(email.subject, "Welcome to BrownEggs.shop! 🥚");
        assert!(email.html.contains("Hi Customer,"));
    }
}
