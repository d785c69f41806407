//! The customer's order history.

use eggcart_core::error::DomainError;
use eggcart_core::model::{Order, OrderLineItem};
use eggcart_core::repository::OrderRepository;
use eggcart_core::session::Session;
use serde::Serialize;
use tracing::{debug, instrument};

/// One past order with its purchased lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderHistoryEntry {
    /// The order row.
    pub order: Order,
    /// Its line items.
    pub items: Vec<OrderLineItem>,
}

/// Orders placed by the signed-in identity, newest first, each with its
/// line items.
///
/// Without an identity the history is empty.
///
/// # Errors
///
/// Returns `DomainError` if the orders or any order's items cannot be
/// loaded.
#[instrument(skip_all, fields(user_id = ?session.map(|s| s.user_id)))]
pub async fn order_history(
    session: Option<&Session>,
    orders: &dyn OrderRepository,
) -> Result<Vec<OrderHistoryEntry>, DomainError> {
    let Some(session) = session else {
        return Ok(Vec::new());
    };
    let mut placed = orders.list_orders_for_user(session.user_id).await?;
    placed.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut history = Vec::with_capacity(placed.len());
    for order in placed {
        let items = orders.order_items(order.id).await?;
        history.push(OrderHistoryEntry { order, items });
    }
    debug!(count = history.len(), "loaded order history");
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use eggcart_core::model::OrderStatus;
    use eggcart_test_support::{InMemoryBackend, fixed_now};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn session(user_id: Uuid) -> Session {
        Session {
            user_id,
            email: Some("asha@example.com".into()),
            full_name: Some("Asha Rao".into()),
            expires_at: fixed_now() + Duration::hours(1),
        }
    }

    fn order(user_id: Uuid, minutes_ago: i64, status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id,
            total_amount: Decimal::from(200),
            status,
            created_at: fixed_now() - Duration::minutes(minutes_ago),
            notes: String::new(),
        }
    }

    fn line(order_id: Uuid, product_id: &str, quantity: u32, price: i64) -> OrderLineItem {
        OrderLineItem {
            order_id,
            product_id: product_id.to_owned(),
            product_name: format!("Brown eggs {product_id}"),
            quantity,
            unit_price: Decimal::from(price),
        }
    }

    #[tokio::test]
    async fn test_history_is_newest_first_with_items_for_own_orders_only() {
        // Arrange
        let user_id = Uuid::new_v4();
        let backend = InMemoryBackend::new();
        let older = order(user_id, 120, OrderStatus::Delivered);
        let newer = order(user_id, 5, OrderStatus::Processing);
        let foreign = order(Uuid::new_v4(), 1, OrderStatus::Processing);
        backend.seed_order(older.clone(), vec![line(older.id, "pack-6", 2, 90)]);
        backend.seed_order(
            newer.clone(),
            vec![line(newer.id, "pack-12", 1, 170), line(newer.id, "promo-2", 1, 10)],
        );
        backend.seed_order(foreign.clone(), vec![line(foreign.id, "pack-6", 1, 90)]);

        // Act
        let history = order_history(Some(&session(user_id)), &backend).await.unwrap();

        // Assert
        let ids: Vec<Uuid> = history.iter().map(|entry| entry.order.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(history[0].items.len(), 2);
        assert_eq!(history[1].items, vec![line(older.id, "pack-6", 2, 90)]);
    }

    #[tokio::test]
    async fn test_signed_out_history_is_empty() {
        let backend = InMemoryBackend::new();
        backend.seed_order(order(Uuid::new_v4(), 5, OrderStatus::Processing), Vec::new());

        let history = order_history(None, &backend).await.unwrap();

        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let user_id = Uuid::new_v4();
        let backend = InMemoryBackend::new();
        backend.seed_order(order(user_id, 5, OrderStatus::Processing), Vec::new());
        backend.fail_reads();

        let result = order_history(Some(&session(user_id)), &backend).await;

        match result {
            Err(DomainError::Infrastructure(_)) => {}
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }
}
