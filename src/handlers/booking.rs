use std::future::Future;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::entities::role::{self, RoleKey};
use crate::entities::{payment_available, tour, user, user_role};
use crate::error::{AppError, AppResult};
use crate::handlers::lower_like;
use crate::response::{ApiResponse, ListQuery, PaginatedResponse, Pagination};
use crate::utils::jwt::Claims;
use crate::utils::reference_code::generate_reference_code;
use crate::utils::trip_date::parse_trip_date;
use crate::utils::validation::Required;
use crate::AppState;

/// A pending payment insert can lose a race against a concurrent request
/// for the same booking and amount; the loser retries and supersedes it.
pub const MAX_PAYMENT_ATTEMPTS: u32 = 3;

// ============ Booking Creation ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub tour_id: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub birth_month: Option<i32>,
    pub birth_day: Option<i32>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub find_us: Option<String>,
    pub comments: Option<String>,
    pub terms_accepted: Option<bool>,
    pub total_price: Option<i64>,
}

/// A submission that passed validation, dates parsed
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub tour_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_year: i32,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub email: String,
    pub phone_code: String,
    pub phone_number: String,
    pub adults: i32,
    pub children: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub find_us: String,
    pub comments: Option<String>,
    pub terms_accepted: bool,
    pub total_price: i64,
}

impl CreateBookingRequest {
    pub fn validate(self) -> AppResult<NewBooking> {
        let mut required = Required::default();
        let tour_id = required.take("tourId", self.tour_id);
        let first_name = required.take("firstName", self.first_name);
        let last_name = required.take("lastName", self.last_name);
        let gender = required.take("gender", self.gender);
        let birth_year = required.take("birthYear", self.birth_year);
        let birth_month = required.take("birthMonth", self.birth_month);
        let birth_day = required.take("birthDay", self.birth_day);
        let nationality = required.take("nationality", self.nationality);
        let email = required.take("email", self.email);
        let phone_code = required.take("phoneCode", self.phone_code);
        let phone_number = required.take("phoneNumber", self.phone_number);
        let adults = required.take("adults", self.adults);
        let start_date = required.take("startDate", self.start_date);
        let end_date = required.take("endDate", self.end_date);
        let find_us = required.take("findUs", self.find_us);
        required.finish()?;

        let birth_date = rolled_date(birth_year, birth_month, birth_day).ok_or_else(|| {
            AppError::Validation("Birth date is out of range".to_string())
        })?;

        let start_date = parse_trip_date(&start_date)
            .map_err(|e| AppError::Validation(format!("Invalid startDate: {}", e)))?;
        let end_date = parse_trip_date(&end_date)
            .map_err(|e| AppError::Validation(format!("Invalid endDate: {}", e)))?;
        if end_date < start_date {
            return Err(AppError::Validation(
                "endDate must not be before startDate".to_string(),
            ));
        }

        let children = self.children.unwrap_or(0);
        if adults < 0 || children < 0 {
            return Err(AppError::Validation(
                "Party size cannot be negative".to_string(),
            ));
        }

        let total_price = self.total_price.unwrap_or(0);
        if total_price < 0 {
            return Err(AppError::Validation(
                "totalPrice cannot be negative".to_string(),
            ));
        }

        Ok(NewBooking {
            tour_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            gender: gender.trim().to_string(),
            birth_year,
            birth_date,
            nationality: nationality.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone_code: phone_code.trim().to_string(),
            phone_number: phone_number.trim().to_string(),
            adults,
            children,
            start_date,
            end_date,
            find_us: find_us.trim().to_string(),
            comments: self
                .comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            terms_accepted: self.terms_accepted.unwrap_or(false),
            total_price,
        })
    }
}

/// Calendar date with out-of-range months and days carried over, so
/// 30 February becomes 2 March and month 13 is January of the next year.
/// `None` only when the result falls outside chrono's range.
pub fn rolled_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let months = i64::from(year) * 12 + i64::from(month) - 1;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_signed(Duration::days(i64::from(day) - 1))
}

#[derive(Debug, Serialize)]
pub struct CreatedBooking {
    pub id: i32,
}

/// Create a booking and provision its customer account
pub async fn create_booking(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateBookingRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedBooking>>)> {
    let new_booking = payload.validate()?;

    tour::Entity::find_by_id(new_booking.tour_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;

    let txn = state.db.begin().await?;

    let now = Utc::now();
    let booking = booking::ActiveModel {
        tour_id: Set(new_booking.tour_id),
        first_name: Set(new_booking.first_name.clone()),
        last_name: Set(new_booking.last_name.clone()),
        gender: Set(new_booking.gender.clone()),
        birth_date: Set(new_booking.birth_date),
        nationality: Set(new_booking.nationality.clone()),
        email: Set(new_booking.email.clone()),
        phone_code: Set(new_booking.phone_code.clone()),
        phone_number: Set(new_booking.phone_number.clone()),
        adults: Set(new_booking.adults),
        children: Set(new_booking.children),
        start_date: Set(new_booking.start_date),
        end_date: Set(new_booking.end_date),
        find_us: Set(new_booking.find_us.clone()),
        comments: Set(new_booking.comments.clone()),
        terms_accepted: Set(new_booking.terms_accepted),
        total_price: Set(new_booking.total_price),
        // Always starts pending, whatever the client sent
        status: Set(BookingStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    provision_user(&txn, &new_booking, &state.config.default_avatar).await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = booking.id,
        tour_id = booking.tour_id,
        "Booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Booking created",
            CreatedBooking { id: booking.id },
        )),
    ))
}

/// Create the customer account for the booking's email unless one exists.
/// Returns whether a user was created. Concurrent calls for one email
/// resolve to a single row through the unique email constraint.
pub async fn provision_user<C: ConnectionTrait>(
    conn: &C,
    booking: &NewBooking,
    default_avatar: &str,
) -> Result<bool, DbErr> {
    let now = Utc::now();
    let new_user = user::ActiveModel {
        email: Set(booking.email.clone()),
        name: Set(format!("{} {}", booking.first_name, booking.last_name)),
        phone: Set(format!("{}{}", booking.phone_code, booking.phone_number)),
        // Year difference only; birthday not yet reached this year is ignored
        age: Set(now.year() - booking.birth_year),
        gender: Set(booking.gender.clone()),
        nationality: Set(booking.nationality.clone()),
        address: Set(None),
        avatar: Set(default_avatar.to_string()),
        created_at: Set(now.into()),
        ..Default::default()
    };

    let inserted = user::Entity::insert(new_user)
        .on_conflict(
            OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    if inserted == 0 {
        tracing::debug!(email = %booking.email, "User already exists, skipping provisioning");
        return Ok(false);
    }

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&booking.email))
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", booking.email)))?;

    let default_role = role::Entity::find()
        .filter(role::Column::Key.eq(RoleKey::Customer))
        .one(conn)
        .await?;

    match default_role {
        Some(role) => {
            user_role::ActiveModel {
                user_id: Set(user.id),
                role_id: Set(role.id),
            }
            .insert(conn)
            .await?;
        }
        None => {
            tracing::warn!(user_id = user.id, "Customer role missing, user created without a role");
        }
    }

    tracing::info!(user_id = user.id, "Customer account provisioned");
    Ok(true)
}

// ============ Payment Creation ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub booking_id: Option<i32>,
    pub payment_available_id: Option<i32>,
    pub amount: Option<i64>,
}

/// A payment together with the method it is paid through
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub payment_method: payment_available::Model,
}

/// Create a pending payment, superseding any pending one for the same
/// booking and amount
pub async fn create_payment(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePaymentRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentResponse>>)> {
    let mut required = Required::default();
    let booking_id = required.take("bookingId", payload.booking_id);
    let payment_available_id = required.take("paymentAvailableId", payload.payment_available_id);
    let amount = required.take("amount", payload.amount);
    required.finish()?;

    if amount < 0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }

    booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let method = payment_available::Entity::find_by_id(payment_available_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    if !method.active {
        return Err(AppError::Validation(
            "Payment method is not available".to_string(),
        ));
    }

    let payment = replace_pending_payment(&state.db, booking_id, method.id, amount).await?;

    tracing::info!(
        payment_id = payment.id,
        booking_id,
        amount,
        reference_code = %payment.reference_code,
        "Payment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Payment created",
            PaymentResponse {
                payment,
                payment_method: method,
            },
        )),
    ))
}

/// Delete pending payments for `(booking_id, amount)` and insert a fresh
/// one, atomically. Retried when a concurrent request wins the unique
/// pending slot or the reference code collides.
pub async fn replace_pending_payment(
    db: &DatabaseConnection,
    booking_id: i32,
    payment_available_id: i32,
    amount: i64,
) -> Result<payment::Model, DbErr> {
    retry_on_unique_violation(MAX_PAYMENT_ATTEMPTS, || {
        try_replace_pending_payment(db, booking_id, payment_available_id, amount)
    })
    .await
}

/// Run `operation` up to `max_attempts` times, retrying only while it fails
/// with a unique constraint violation. The last error is returned as is.
pub async fn retry_on_unique_violation<T, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if attempt < max_attempts && is_unique_violation(&err) => {
                tracing::warn!(attempt, error = %err, "Unique constraint conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn try_replace_pending_payment(
    db: &DatabaseConnection,
    booking_id: i32,
    payment_available_id: i32,
    amount: i64,
) -> Result<payment::Model, DbErr> {
    let txn = db.begin().await?;

    let superseded = payment::Entity::delete_many()
        .filter(payment::Column::BookingId.eq(booking_id))
        .filter(payment::Column::Amount.eq(amount))
        .filter(payment::Column::Status.eq(PaymentStatus::Pending))
        .exec(&txn)
        .await?;

    if superseded.rows_affected > 0 {
        tracing::debug!(
            booking_id,
            amount,
            superseded = superseded.rows_affected,
            "Superseded pending payments"
        );
    }

    let now = Utc::now();
    let payment = payment::ActiveModel {
        booking_id: Set(booking_id),
        payment_available_id: Set(payment_available_id),
        amount: Set(amount),
        status: Set(PaymentStatus::Pending),
        reference_code: Set(generate_reference_code()),
        proof_of_payment: Set(None),
        paid_at: Set(None),
        cancelled_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(payment)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ============ Payment Confirmation ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_id: Option<i32>,
    pub proof_of_payment: Option<String>,
}

/// Attach proof, mark the payment paid and confirm its booking.
///
/// The booking is confirmed whatever the paid amount; underpayment is only
/// logged.
pub async fn confirm_payment(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ConfirmPaymentRequest>, AppError>,
) -> AppResult<Json<ApiResponse<PaymentResponse>>> {
    let mut required = Required::default();
    let payment_id = required.take("paymentId", payload.payment_id);
    let proof_of_payment = required.take("proofOfPayment", payload.proof_of_payment);
    required.finish()?;

    let txn = state.db.begin().await?;

    let payment = payment::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    // Already settled: keep the original proof and paid_at
    if payment.status == PaymentStatus::Paid {
        let method = payment
            .find_related(payment_available::Entity)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;
        txn.commit().await?;

        tracing::info!(payment_id = payment.id, "Payment already confirmed");
        return Ok(Json(ApiResponse::success(
            "Payment already confirmed",
            PaymentResponse {
                payment,
                payment_method: method,
            },
        )));
    }

    let now = Utc::now();
    let mut active: payment::ActiveModel = payment.into();
    active.proof_of_payment = Set(Some(proof_of_payment.trim().to_string()));
    active.status = Set(PaymentStatus::Paid);
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let payment = active.update(&txn).await?;

    let booking = booking::Entity::find_by_id(payment.booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
    let total_price = booking.total_price;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Confirmed);
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    let method = payment
        .find_related(payment_available::Entity)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    txn.commit().await?;

    if payment.amount < total_price {
        tracing::warn!(
            payment_id = payment.id,
            booking_id = payment.booking_id,
            amount = payment.amount,
            total_price,
            "Booking confirmed by a payment below its total price"
        );
    }

    tracing::info!(
        payment_id = payment.id,
        booking_id = payment.booking_id,
        "Payment confirmed"
    );

    Ok(Json(ApiResponse::success(
        "Payment confirmed",
        PaymentResponse {
            payment,
            payment_method: method,
        },
    )))
}

// ============ Booking Lookup ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub tour: Option<tour::Model>,
    pub payments: Vec<PaymentResponse>,
}

/// Booking with its tour and every payment attempt, newest first.
/// Readable by admins and by the customer whose email it was booked under.
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let is_owner = claims.email.trim().eq_ignore_ascii_case(&booking.email);
    if claims.role != RoleKey::Admin && !is_owner {
        tracing::warn!(
            user_id = claims.sub,
            booking_id,
            "Booking read denied to non-owner"
        );
        return Err(AppError::Forbidden(
            "Booking belongs to another customer".to_string(),
        ));
    }

    let tour = booking.find_related(tour::Entity).one(&state.db).await?;

    let payments = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking.id))
        .order_by_desc(payment::Column::CreatedAt)
        .order_by_desc(payment::Column::Id)
        .find_also_related(payment_available::Entity)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(payment, method)| {
            method.map(|payment_method| PaymentResponse {
                payment,
                payment_method,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(
        "Booking retrieved",
        BookingDetail {
            booking,
            tour,
            payments,
        },
    )))
}

// ============ Bookings Management (Admin) ============

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<BookingStatus>,
}

/// Paginated booking list (admin)
pub async fn list_bookings(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<BookingListQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<booking::Model>>> {
    let list = ListQuery {
        page: query.page,
        limit: query.limit,
        search: query.search,
    };
    let (page, limit) = (list.page(), list.limit());

    let mut select = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .order_by_desc(booking::Column::Id);

    if let Some(status) = query.status {
        select = select.filter(booking::Column::Status.eq(status));
    }

    if let Some(pattern) = list.search_pattern() {
        select = select.filter(
            Condition::any()
                .add(lower_like(booking::Column::FirstName, &pattern))
                .add(lower_like(booking::Column::LastName, &pattern))
                .add(lower_like(booking::Column::Email, &pattern)),
        );
    }

    let paginator = select.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let bookings = paginator.fetch_page(page - 1).await?;

    Ok(Json(PaginatedResponse::new(
        "Bookings retrieved",
        bookings,
        Pagination::new(page, limit, total),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rolled_date_keeps_real_dates() {
        assert_eq!(rolled_date(1995, 6, 12), Some(ymd(1995, 6, 12)));
        assert_eq!(rolled_date(2000, 2, 29), Some(ymd(2000, 2, 29)));
    }

    #[test]
    fn test_rolled_date_carries_overflow() {
        assert_eq!(rolled_date(1995, 2, 30), Some(ymd(1995, 3, 2)));
        assert_eq!(rolled_date(1995, 4, 31), Some(ymd(1995, 5, 1)));
        assert_eq!(rolled_date(1995, 13, 1), Some(ymd(1996, 1, 1)));
        assert_eq!(rolled_date(1995, 1, -1), Some(ymd(1994, 12, 30)));
    }
}
