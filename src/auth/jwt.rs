use crate::{model::user::User, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        user_id: user.id,
        sub: user.username.clone(),
        name: user.name.clone(),
        role: user.role_id,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 9,
            username: "hr.lead".into(),
            password: String::new(),
            name: "Maya Lind".into(),
            role_id: 2,
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = generate_access_token(&user(), "s3cret", 900).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();

        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.sub, "hr.lead");
        assert_eq!(claims.name, "Maya Lind");
        assert_eq!(claims.role, 2);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&user(), "s3cret", 900).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
