use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, password::verify_password},
    config::Config,
    model::role::Role,
    models::LoginReqDto,
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LoginUser {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Maya Lind")]
    pub name: String,
    #[schema(example = "hr")]
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub user: LoginUser,
}

/// Admin dashboard login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = Object, example = json!({"username": "admin", "password": "secret"})),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = Object, example = json!({
            "error": "Username or password required"
        })),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Username or password required"
        }));
    }

    // 2️⃣ Fetch user
    let db_user = match state.accounts.find_user(user.username.trim()).await {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Internal Server Error"}));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
    }

    let Some(role) = Role::from_id(db_user.role_id) else {
        error!(role_id = db_user.role_id, "User has unknown role");
        return HttpResponse::Unauthorized().json(json!({"error": "Invalid role"}));
    };

    // 4️⃣ Generate access token
    let access_token =
        match generate_access_token(&db_user, &config.jwt_secret, config.access_token_ttl) {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to sign access token");
                return HttpResponse::InternalServerError()
                    .json(json!({"error": "Internal Server Error"}));
            }
        };

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        user: LoginUser {
            id: db_user.id,
            name: db_user.name,
            role: role.to_string(),
        },
    })
}

/// Identity of the current session
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = LoginUser),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    debug!(username = %auth.username, "Session lookup");
    HttpResponse::Ok().json(LoginUser {
        id: auth.user_id,
        name: auth.name,
        role: auth.role.to_string(),
    })
}
