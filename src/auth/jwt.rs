use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decode and validate an access token. Refresh tokens are refused here;
/// they are only good for obtaining a new access token.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("Access token required".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn token(token_type: TokenType) -> String {
        let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as usize + 600;
        let claims = Claims {
            user_id: 3,
            sub: "finance.officer".into(),
            role: 6,
            exp,
            jti: "jti-1".into(),
            token_type,
            employee_id: Some(30),
            branch_id: Some(2),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_access_tokens() {
        let claims = verify_token(&token(TokenType::Access), SECRET).unwrap();
        assert_eq!(claims.user_id, 3);
        assert_eq!(claims.branch_id, Some(2));
    }

    #[test]
    fn refuses_refresh_tokens_and_bad_signatures() {
        assert!(verify_token(&token(TokenType::Refresh), SECRET).is_err());
        assert!(verify_token(&token(TokenType::Access), "other-secret").is_err());
    }
}
