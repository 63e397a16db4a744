use async_trait::async_trait;
use common::{Address, LineItem, Money, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartLine, CartLineId, CartUpsert, Confirmation, ConfirmedOrder, Draft, DraftId,
    MAX_LINE_QUANTITY, NewOrder, OrderId, OrderUpdate, ProductId, Result, StoreError,
    UpsertOutcome, UserId,
    store::{CartStore, CheckoutStore, OrderStore},
};

const CART_COLUMNS: &str = "id, user_id, product_id, quantity, created_at, updated_at";

const DRAFT_COLUMNS: &str =
    "id, user_id, name, items, total, address, payment_method, payment_status, created_at";

const ORDER_COLUMNS: &str = "id, draft_id, user_id, name, items, total, address, payment_method, \
     payment_status, payment_proof, date, confirmed_at, status, courier, tracking_number";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_cart_line(row: PgRow) -> Result<CartLine> {
        Ok(CartLine {
            id: CartLineId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: quantity_from_db(row.try_get("quantity")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_draft(row: PgRow) -> Result<Draft> {
        let items: serde_json::Value = row.try_get("items")?;
        let address: serde_json::Value = row.try_get("address")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(Draft {
            id: DraftId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            name: row.try_get("name")?,
            items: serde_json::from_value::<Vec<LineItem>>(items)?,
            total: Money::from_minor(row.try_get("total")?),
            address: serde_json::from_value::<Address>(address)?,
            payment_method: row.try_get("payment_method")?,
            payment_status: payment_status.parse().map_err(StoreError::InvalidRow)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<ConfirmedOrder> {
        let items: serde_json::Value = row.try_get("items")?;
        let address: serde_json::Value = row.try_get("address")?;
        let payment_status: String = row.try_get("payment_status")?;
        let status: String = row.try_get("status")?;

        Ok(ConfirmedOrder {
            id: OrderId::new(row.try_get("id")?),
            draft_id: DraftId::from_uuid(row.try_get::<Uuid, _>("draft_id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            name: row.try_get("name")?,
            items: serde_json::from_value::<Vec<LineItem>>(items)?,
            total: Money::from_minor(row.try_get("total")?),
            address: serde_json::from_value::<Address>(address)?,
            payment_method: row.try_get("payment_method")?,
            payment_status: payment_status.parse().map_err(StoreError::InvalidRow)?,
            payment_proof: row.try_get("payment_proof")?,
            date: row.try_get("date")?,
            confirmed_at: row.try_get("confirmed_at")?,
            status: status.parse().map_err(StoreError::InvalidRow)?,
            courier: row.try_get("courier")?,
            tracking_number: row.try_get("tracking_number")?,
        })
    }
}

fn quantity_to_db(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::InvalidRow(format!("quantity {quantity} out of range")))
}

fn quantity_from_db(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .map_err(|_| StoreError::InvalidRow(format!("negative quantity {quantity}")))
}

/// Maps unique-constraint violations to `Conflict`.
fn map_unique_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(
            db_err
                .constraint()
                .map(|c| format!("unique constraint {c} violated"))
                .unwrap_or_else(|| db_err.message().to_string()),
        );
    }
    StoreError::Database(e)
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn upsert_cart_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartUpsert> {
        // xmax is zero only for a freshly inserted tuple
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            INSERT INTO cart (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = cart.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            WHERE cart.quantity + EXCLUDED.quantity <= $4
            RETURNING {CART_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(user_id.as_str())
        .bind(product_id.as_i64())
        .bind(quantity_to_db(quantity)?)
        .bind(quantity_to_db(MAX_LINE_QUANTITY)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        let Some(row) = row else {
            return Err(StoreError::QuantityLimitExceeded {
                user_id: user_id.clone(),
                product_id,
                limit: MAX_LINE_QUANTITY,
            });
        };

        let inserted: bool = row.try_get("inserted")?;
        Ok(CartUpsert {
            line: Self::row_to_cart_line(row)?,
            outcome: if inserted {
                UpsertOutcome::Created
            } else {
                UpsertOutcome::Merged
            },
        })
    }

    async fn get_cart_line(&self, id: CartLineId) -> Result<Option<CartLine>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {CART_COLUMNS} FROM cart WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn set_cart_line_quantity(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
        quantity: u32,
    ) -> Result<Option<CartLine>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            UPDATE cart SET quantity = $2, updated_at = NOW()
            WHERE id = $1 AND ($3::TEXT IS NULL OR user_id = $3)
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(quantity_to_db(quantity)?)
        .bind(owner.map(UserId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn delete_cart_line(
        &self,
        id: CartLineId,
        owner: Option<&UserId>,
    ) -> Result<Option<CartLine>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            DELETE FROM cart
            WHERE id = $1 AND ($2::TEXT IS NULL OR user_id = $2)
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(owner.map(UserId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM cart WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_line).collect()
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    async fn insert_draft(&self, draft: Draft) -> Result<Draft> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO draft_orders ({DRAFT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DRAFT_COLUMNS}
            "#
        ))
        .bind(draft.id.as_uuid())
        .bind(draft.user_id.as_str())
        .bind(&draft.name)
        .bind(serde_json::to_value(&draft.items)?)
        .bind(draft.total.minor())
        .bind(serde_json::to_value(&draft.address)?)
        .bind(&draft.payment_method)
        .bind(draft.payment_status.as_str())
        .bind(draft.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Self::row_to_draft(row)
    }

    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {DRAFT_COLUMNS} FROM draft_orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_draft).transpose()
    }

    async fn list_drafts(&self, user_id: Option<&UserId>) -> Result<Vec<Draft>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DRAFT_COLUMNS} FROM draft_orders
            WHERE $1::TEXT IS NULL OR user_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(user_id.map(UserId::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_draft).collect()
    }

    async fn delete_draft(&self, id: DraftId) -> Result<Option<Draft>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "DELETE FROM draft_orders WHERE id = $1 RETURNING {DRAFT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_draft).transpose()
    }

    async fn confirm_draft(
        &self,
        id: DraftId,
        confirmation: Confirmation,
    ) -> Result<Option<ConfirmedOrder>> {
        let mut tx = self.pool.begin().await?;

        // Deleting first takes the row lock: a concurrent confirmation waits
        // here and then finds no row.
        let row: Option<PgRow> = sqlx::query(&format!(
            "DELETE FROM draft_orders WHERE id = $1 RETURNING {DRAFT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let draft = Self::row_to_draft(row)?;
        let order = NewOrder::from_draft(&draft, &confirmation);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (draft_id, user_id, name, items, total, address, payment_method,
                                payment_status, payment_proof, date, confirmed_at, status,
                                courier, tracking_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.draft_id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(&order.name)
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.total.minor())
        .bind(serde_json::to_value(&order.address)?)
        .bind(&order.payment_method)
        .bind(order.payment_status.as_str())
        .bind(&order.payment_proof)
        .bind(order.date)
        .bind(order.confirmed_at)
        .bind(order.status.as_str())
        .bind(&order.courier)
        .bind(&order.tracking_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let order = Self::row_to_order(row)?;
        tx.commit().await?;
        tracing::debug!(draft_id = %id, order_id = %order.id, "draft moved to orders");

        Ok(Some(order))
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<ConfirmedOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order(
        &self,
        id: OrderId,
        expected_status: Option<OrderStatus>,
        update: &OrderUpdate,
    ) -> Result<Option<ConfirmedOrder>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            UPDATE orders SET
                status = COALESCE($2, status),
                courier = COALESCE($3, courier),
                tracking_number = COALESCE($4, tracking_number)
            WHERE id = $1 AND ($5::TEXT IS NULL OR status = $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.courier.as_deref())
        .bind(update.tracking_number.as_deref())
        .bind(expected_status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(row).map(Some);
        }

        // No row: either the order is gone or its status moved on
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        if exists {
            return Err(StoreError::Conflict(format!(
                "order {id} status changed concurrently"
            )));
        }
        Ok(None)
    }

    async fn delete_order(&self, id: OrderId) -> Result<Option<ConfirmedOrder>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "DELETE FROM orders WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }
}
