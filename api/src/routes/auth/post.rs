use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::format_validation_errors;
use db::models::{
    student::{self, Column as StudentColumn, Entity as StudentEntity, Status as StudentStatus},
    user,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(regex(
        path = *REG_NUMBER_REGEX,
        message = "Registration number may only contain letters, digits and dashes"
    ))]
    pub reg_number: String,

    #[validate(length(min = 1, message = "Full name must not be empty"))]
    pub full_name: String,

    pub college_name: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthUserResponse {
    pub id: i64,
    pub email: String,
    pub admin: bool,
    pub token: String,
    pub expires_at: String,
}

lazy_static::lazy_static! {
    static ref REG_NUMBER_REGEX: regex::Regex = regex::Regex::new("^[A-Za-z0-9-]{4,20}$").unwrap();
}

/// POST /auth/register
///
/// Registers a new user together with a student profile. The profile starts
/// in `pending` status and must be approved by an admin before the student
/// can register for events or submit on-duty requests.
///
/// ### Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "strongpassword",
///   "reg_number": "21BCE1234",
///   "full_name": "Asha Narayanan",
///   "college_name": "SVCE"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the user profile and a JWT.
/// - `400 Bad Request` on validation failure.
/// - `409 Conflict` when the email or registration number is already taken.
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthUserResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let db = app_state.db();

    match user::Model::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A user with this email already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "failed to check email uniqueness");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    }

    if let Ok(Some(_)) = StudentEntity::find()
        .filter(StudentColumn::RegNumber.eq(req.reg_number.as_str()))
        .one(db)
        .await
    {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "A student with this registration number already exists",
            )),
        );
    }

    let user = match user::Model::create(db, &req.email, &req.password, false).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "failed to create user");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    if let Err(e) = student::Model::create(
        db,
        user.id,
        &req.reg_number,
        &req.full_name,
        req.college_name.as_deref(),
        StudentStatus::Pending,
    )
    .await
    {
        tracing::error!(error = %e, user_id = user.id, "failed to create student profile");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("An internal error occurred")),
        );
    }

    let (token, expires_at) = generate_jwt(user.id, user.admin);
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AuthUserResponse {
                id: user.id,
                email: user.email,
                admin: user.admin,
                token,
                expires_at,
            },
            "User registered successfully",
        )),
    )
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// POST /auth/login
///
/// Verifies credentials and returns a JWT.
///
/// ### Responses
/// - `200 OK` with the user profile and token.
/// - `401 Unauthorized` on unknown email or wrong password; the two cases
///   are deliberately indistinguishable in the response.
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthUserResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let db = app_state.db();

    let user = match user::Model::find_by_email(db, &req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid email or password")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to look up user");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    if !user.verify_password(&req.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid email or password")),
        );
    }

    let (token, expires_at) = generate_jwt(user.id, user.admin);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AuthUserResponse {
                id: user.id,
                email: user.email,
                admin: user.admin,
                token,
                expires_at,
            },
            "Login successful",
        )),
    )
}
