use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderRow, OrderStatusType, PaymentStatus},
    traits::{OrderQueryFilter, Pagination},
};

/// Inserts the order and its line items. This is not atomic on its own; embed it in a transaction and pass
/// `&mut tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, user_id, subtotal, total, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.user_id)
    .bind(order.subtotal())
    .bind(order.total())
    .bind(&order.currency)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for (position, item) in order.items().iter().enumerate() {
        #[allow(clippy::cast_possible_wrap)]
        let position = position as i64;
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, position, game_id, title, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&order.order_id)
        .bind(position)
        .bind(item.game_id)
        .bind(&item.title)
        .bind(item.unit_price)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ Order {} saved with {} line items", order.order_id, order.items().len());
    Ok(Order::from_row(row, order.items().to_vec()))
}

pub async fn fetch_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT game_id, title, unit_price, quantity FROM order_items WHERE order_id = $1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

async fn with_items(row: Option<OrderRow>, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    match row {
        Some(row) => {
            let items = fetch_items(&row.order_id, conn).await?;
            Ok(Some(Order::from_row(row, items)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(&mut *conn).await?;
    with_items(row, conn).await
}

pub async fn fetch_order_by_intent_id(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE payment_intent_id = $1")
        .bind(intent_id)
        .fetch_optional(&mut *conn)
        .await?;
    with_items(row, conn).await
}

pub async fn set_payment_intent(
    order_id: &OrderId,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> =
        sqlx::query_as("UPDATE orders SET payment_intent_id = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(intent_id)
            .bind(Utc::now())
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;
    with_items(row, conn).await
}

/// Moves a `PENDING` order to the given payment and order status. Returns `false` (and changes nothing) if the order
/// does not exist or its payment status is no longer `PENDING`.
pub async fn transition_pending(
    order_id: &OrderId,
    payment_status: PaymentStatus,
    order_status: Option<OrderStatusType>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET payment_status = ");
    builder.push_bind(payment_status);
    if let Some(status) = order_status {
        builder.push(", order_status = ");
        builder.push_bind(status);
    }
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id);
    builder.push(" AND payment_status = 'PENDING'");
    let result = builder.build().execute(conn).await?;
    trace!("🗃️ Pending transition of {order_id} to {payment_status} touched {} rows", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let row: Option<OrderRow> =
        sqlx::query_as("UPDATE orders SET order_status = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(status)
            .bind(Utc::now())
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;
    with_items(row, conn).await
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderQueryFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = &filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id.clone());
    }
    if let Some(status) = filter.payment_status {
        where_clause.push("payment_status = ");
        where_clause.push_bind_unseparated(status);
    }
}

/// Fetches one page of orders matching the filter, ordered by `created_at`, newest first. The second element of the
/// result is the number of matching orders across all pages.
pub async fn search_orders(
    filter: OrderQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count, &filter);
    let (total,) = count.build_query_as::<(i64,)>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filter(&mut builder, &filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = fetch_items(&row.order_id, &mut *conn).await?;
        orders.push(Order::from_row(row, items));
    }
    trace!("🗃️ search_orders returned {} of {total} orders", orders.len());
    Ok((orders, total))
}
