use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn issue(
    user_id: u64,
    username: String,
    display_name: String,
    roles: Vec<u8>,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    let claims = Claims {
        user_id,
        sub: username,
        display_name,
        roles,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    (token, claims)
}

pub fn generate_access_token(
    user_id: u64,
    username: String,
    display_name: String,
    roles: Vec<u8>,
    secret: &str,
    ttl: usize,
) -> String {
    issue(
        user_id,
        username,
        display_name,
        roles,
        TokenType::Access,
        secret,
        ttl,
    )
    .0
}

pub fn generate_refresh_token(
    user_id: u64,
    username: String,
    display_name: String,
    roles: Vec<u8>,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    issue(
        user_id,
        username,
        display_name,
        roles,
        TokenType::Refresh,
        secret,
        ttl,
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

    #[test]
    fn access_token_round_trips() {
        let token = generate_access_token(
            7,
            "20240101".into(),
            "Alice Zhang".into(),
            vec![1],
            "test-secret",
            60,
        );
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "20240101");
        assert_eq!(claims.display_name, "Alice Zhang");
        assert_eq!(claims.roles, vec![1]);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            generate_access_token(1, "u".into(), "U".into(), vec![1], "secret-a", 60);
        assert!(verify_token(&token, "secret-b").is_err());
    }

    #[test]
    fn refresh_claims_carry_a_jti() {
        let (_, claims) =
            generate_refresh_token(1, "u".into(), "U".into(), vec![1, 2], "s", 60);
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.token_type, TokenType::Refresh);
    }
}
