use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::payment;
use crate::entities::payment_available::{self, PaymentMethodType};
use crate::error::{AppError, AppResult};
use crate::handlers::lower_like;
use crate::response::{ApiResponse, ListQuery, PaginatedResponse, Pagination};
use crate::utils::validation::{Required, Truthy};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentAvailableRequest {
    pub name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<PaymentMethodType>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentAvailableRequest {
    pub name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<PaymentMethodType>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<i32>,
}

impl IdQuery {
    fn require(&self) -> AppResult<i32> {
        self.id
            .filter(Truthy::is_truthy)
            .ok_or_else(|| AppError::Validation("Missing id".to_string()))
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Active methods for the payment page, grouped by channel type
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<payment_available::Model>>>> {
    let methods = payment_available::Entity::find()
        .filter(payment_available::Column::Active.eq(true))
        .order_by_asc(payment_available::Column::MethodType)
        .order_by_asc(payment_available::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment methods retrieved",
        methods,
    )))
}

/// Paginated, searchable list (admin)
pub async fn list_payment_available(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<payment_available::Model>>> {
    let (page, limit) = (query.page(), query.limit());

    let mut select = payment_available::Entity::find()
        .order_by_asc(payment_available::Column::MethodType)
        .order_by_asc(payment_available::Column::Name)
        .order_by_asc(payment_available::Column::Id);

    if let Some(pattern) = query.search_pattern() {
        select = select.filter(
            Condition::any()
                .add(lower_like(payment_available::Column::Name, &pattern))
                .add(lower_like(payment_available::Column::AccountHolder, &pattern))
                .add(lower_like(payment_available::Column::Description, &pattern)),
        );
    }

    let paginator = select.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let methods = paginator.fetch_page(page - 1).await?;

    Ok(Json(PaginatedResponse::new(
        "Payment methods retrieved",
        methods,
        Pagination::new(page, limit, total),
    )))
}

/// Create a payment method (admin)
pub async fn create_payment_available(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePaymentAvailableRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<payment_available::Model>>)> {
    let mut required = Required::default();
    let name = required.take("name", payload.name);
    let account_number = required.take("accountNumber", payload.account_number);
    let account_holder = required.take("accountHolder", payload.account_holder);
    let method_type = required.take("type", payload.method_type);
    required.finish()?;

    let now = Utc::now();
    let method = payment_available::ActiveModel {
        name: Set(name.trim().to_string()),
        account_number: Set(account_number.trim().to_string()),
        account_holder: Set(account_holder.trim().to_string()),
        image: Set(optional_text(payload.image)),
        description: Set(optional_text(payload.description)),
        method_type: Set(method_type),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(payment_available_id = method.id, name = %method.name, "Payment method created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Payment method created", method)),
    ))
}

/// Partially update a payment method (admin)
pub async fn update_payment_available(
    State(state): State<AppState>,
    WithRejection(Query(id), _): WithRejection<Query<IdQuery>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdatePaymentAvailableRequest>, AppError>,
) -> AppResult<Json<ApiResponse<payment_available::Model>>> {
    let id = id.require()?;

    let method = payment_available::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    let mut active: payment_available::ActiveModel = method.into();

    // Required columns may be changed but not blanked
    let mut blanked = Vec::new();
    for (field, value, column) in [
        ("name", payload.name, &mut active.name),
        ("accountNumber", payload.account_number, &mut active.account_number),
        ("accountHolder", payload.account_holder, &mut active.account_holder),
    ] {
        match value {
            Some(v) if v.is_truthy() => *column = Set(v.trim().to_string()),
            Some(_) => blanked.push(field),
            None => {}
        }
    }
    if !blanked.is_empty() {
        return Err(AppError::Validation(format!(
            "Fields cannot be empty: {}",
            blanked.join(", ")
        )));
    }

    if payload.image.is_some() {
        active.image = Set(optional_text(payload.image));
    }
    if payload.description.is_some() {
        active.description = Set(optional_text(payload.description));
    }
    if let Some(method_type) = payload.method_type {
        active.method_type = Set(method_type);
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;

    tracing::info!(payment_available_id = updated.id, "Payment method updated");

    Ok(Json(ApiResponse::success("Payment method updated", updated)))
}

/// Delete a payment method that no payment references (admin)
pub async fn delete_payment_available(
    State(state): State<AppState>,
    WithRejection(Query(id), _): WithRejection<Query<IdQuery>, AppError>,
) -> AppResult<Json<ApiResponse<payment_available::Model>>> {
    let id = id.require()?;

    let method = payment_available::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    let in_use = payment::Entity::find()
        .filter(payment::Column::PaymentAvailableId.eq(id))
        .count(&state.db)
        .await?;

    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Payment method is used by {} payment(s)",
            in_use
        )));
    }

    payment_available::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;

    tracing::info!(payment_available_id = id, "Payment method deleted");

    Ok(Json(ApiResponse::success("Payment method deleted", method)))
}
