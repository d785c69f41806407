//! In-memory backend — implements every persistence port for tests, with
//! switchable failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eggcart_core::error::DomainError;
use eggcart_core::model::{NewOrder, Order, OrderLineItem, OrderStatus, Product, RemoteCartRow};
use eggcart_core::repository::{CartRepository, OrderRepository, ProductCatalog};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<String, Product>,
    orders: Vec<Order>,
    order_items: Vec<OrderLineItem>,
    cart_rows: Vec<RemoteCartRow>,
}

/// A backend that keeps every table in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
    order_create_failures: AtomicU32,
    order_create_attempts: AtomicU32,
    deny_order_creates: AtomicBool,
    fail_order_items: AtomicBool,
    fail_order_delete: AtomicBool,
    fail_order_updates: AtomicBool,
    fail_reads: AtomicBool,
    fail_cart_writes: AtomicBool,
    order_create_delay: Mutex<Option<Duration>>,
}

fn down() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.tables
            .lock()
            .unwrap()
            .products
            .insert(product.id.clone(), product);
        self
    }

    /// Seeds an existing order with its line items.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_order(&self, order: Order, items: Vec<OrderLineItem>) {
        let mut tables = self.tables.lock().unwrap();
        tables.orders.push(order);
        tables.order_items.extend(items);
    }

    /// Seeds a remote cart row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_cart_row(&self, row: RemoteCartRow) {
        self.tables.lock().unwrap().cart_rows.push(row);
    }

    /// Makes the next `n` `create_order` calls fail transiently.
    pub fn fail_next_order_creates(&self, n: u32) {
        self.order_create_failures.store(n, Ordering::SeqCst);
    }

    /// Makes every `create_order` call fail with a permission error.
    pub fn deny_order_creates(&self) {
        self.deny_order_creates.store(true, Ordering::SeqCst);
    }

    /// Makes every `create_order_items` call fail.
    pub fn fail_order_items(&self) {
        self.fail_order_items.store(true, Ordering::SeqCst);
    }

    /// Makes every `delete_order` call fail.
    pub fn fail_order_delete(&self) {
        self.fail_order_delete.store(true, Ordering::SeqCst);
    }

    /// Makes every `update_status_and_notes` call fail.
    pub fn fail_order_updates(&self) {
        self.fail_order_updates.store(true, Ordering::SeqCst);
    }

    /// Makes every read fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Makes every cart write fail.
    pub fn fail_cart_writes(&self) {
        self.fail_cart_writes.store(true, Ordering::SeqCst);
    }

    /// Delays every `create_order` call on the tokio timer.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delay_order_creates(&self, delay: Duration) {
        *self.order_create_delay.lock().unwrap() = Some(delay);
    }

    /// Number of `create_order` calls received, failed or not.
    pub fn order_create_attempts(&self) -> u32 {
        self.order_create_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of the `orders` table.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn orders(&self) -> Vec<Order> {
        self.tables.lock().unwrap().orders.clone()
    }

    /// Snapshot of the `order_items` table.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn all_order_items(&self) -> Vec<OrderLineItem> {
        self.tables.lock().unwrap().order_items.clone()
    }

    /// Snapshot of the `cart_items` table.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn cart_rows(&self) -> Vec<RemoteCartRow> {
        self.tables.lock().unwrap().cart_rows.clone()
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(down());
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryBackend {
    async fn product(&self, product_id: &str) -> Result<Option<Product>, DomainError> {
        self.check_reads()?;
        Ok(self.tables.lock().unwrap().products.get(product_id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryBackend {
    async fn create_order(&self, order: NewOrder) -> Result<Order, DomainError> {
        self.order_create_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.order_create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.deny_order_creates.load(Ordering::SeqCst) {
            return Err(DomainError::PermissionDenied(
                "new row violates row-level security policy".into(),
            ));
        }
        let remaining = self.order_create_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.order_create_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(down());
        }
        let stored = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            notes: String::new(),
        };
        self.tables.lock().unwrap().orders.push(stored.clone());
        Ok(stored)
    }

    async fn create_order_items(&self, items: &[OrderLineItem]) -> Result<(), DomainError> {
        if self.fail_order_items.load(Ordering::SeqCst) {
            return Err(down());
        }
        self.tables
            .lock()
            .unwrap()
            .order_items
            .extend_from_slice(items);
        Ok(())
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        if self.fail_order_delete.load(Ordering::SeqCst) {
            return Err(down());
        }
        self.tables
            .lock()
            .unwrap()
            .orders
            .retain(|order| order.id != order_id);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.check_reads()?;
        let mut orders = self.tables.lock().unwrap().orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let mut orders = self.list_orders().await?;
        orders.retain(|order| order.user_id == user_id);
        Ok(orders)
    }

    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, DomainError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_status_and_notes(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        notes: &str,
    ) -> Result<(), DomainError> {
        if self.fail_order_updates.load(Ordering::SeqCst) {
            return Err(down());
        }
        let mut tables = self.tables.lock().unwrap();
        let order = tables
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| DomainError::NotFound(format!("order {order_id}")))?;
        order.status = status;
        notes.clone_into(&mut order.notes);
        Ok(())
    }

    async fn purchased_promo_product_ids(
        &self,
        user_id: Uuid,
    ) -> Result<HashSet<String>, DomainError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let live_orders: HashSet<Uuid> = tables
            .orders
            .iter()
            .filter(|order| order.user_id == user_id && order.status != OrderStatus::Cancelled)
            .map(|order| order.id)
            .collect();
        Ok(tables
            .order_items
            .iter()
            .filter(|item| live_orders.contains(&item.order_id))
            .filter(|item| {
                tables
                    .products
                    .get(&item.product_id)
                    .is_some_and(|product| product.is_promotional)
            })
            .map(|item| item.product_id.clone())
            .collect())
    }
}

#[async_trait]
impl CartRepository for InMemoryBackend {
    async fn load_rows(&self, user_id: Uuid) -> Result<Vec<RemoteCartRow>, DomainError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .cart_rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_row(
        &self,
        user_id: Uuid,
        product_id: &str,
        quantity: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.fail_cart_writes.load(Ordering::SeqCst) {
            return Err(down());
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(row) = tables
            .cart_rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.product_id == product_id)
        {
            row.quantity = quantity;
            row.updated_at = updated_at;
        } else {
            tables.cart_rows.push(RemoteCartRow {
                user_id,
                product_id: product_id.to_owned(),
                quantity,
                updated_at,
            });
        }
        Ok(())
    }

    async fn delete_rows(&self, user_id: Uuid, product_ids: &[String]) -> Result<(), DomainError> {
        if self.fail_cart_writes.load(Ordering::SeqCst) {
            return Err(down());
        }
        self.tables
            .lock()
            .unwrap()
            .cart_rows
            .retain(|row| !(row.user_id == user_id && product_ids.contains(&row.product_id)));
        Ok(())
    }
}
