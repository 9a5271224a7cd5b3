use crate::{
    model::{permission::PermissionAction, role::Role},
    store::AccountStore,
};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, HttpResponse, HttpResponseBuilder, dev::Payload,
    error::InternalError,
};
use futures::future::{Ready, ready};
use serde_json::json;

/// Caller identity, inserted into request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

pub(crate) fn json_error(mut builder: HttpResponseBuilder, message: &str) -> actix_web::Error {
    InternalError::from_response(message.to_string(), builder.json(json!({ "error": message })))
        .into()
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| json_error(HttpResponse::Unauthorized(), "Not authenticated")),
        )
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin passes every check; other roles need the module flag set.
    pub async fn require_permission(
        &self,
        accounts: &dyn AccountStore,
        module: &str,
        action: PermissionAction,
    ) -> actix_web::Result<()> {
        if self.is_admin() {
            return Ok(());
        }

        let permission = accounts
            .module_permission(self.role.id(), module)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, role = %self.role, module, "Permission lookup failed");
                json_error(HttpResponse::InternalServerError(), "Internal Server Error")
            })?;

        if permission.is_some_and(|p| p.allows(action)) {
            Ok(())
        } else {
            tracing::info!(user_id = self.user_id, role = %self.role, module, action = %action, "Permission denied");
            Err(json_error(HttpResponse::Forbidden(), "Permission denied"))
        }
    }
}
