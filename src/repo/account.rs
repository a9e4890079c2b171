use crate::api::{ApiClient, Method};
use crate::model::{ProfileUpdate, SignIn, SignUp, User};
use crate::repo::{decode, Invalidations, RepoError, RepoResult, Resource};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Deserialize)]
struct SignInBody {
    username: Option<String>,
    tokens: Option<Tokens>,
}

#[derive(Deserialize)]
struct Tokens {
    access: Option<String>,
}

/// Signing in and out, registration, and the user's profile. Signing in is the only operation
/// that writes the session token; signing out is the only one that clears it.
#[derive(Debug, Clone)]
pub struct AccountService {
    client: ApiClient,
    invalidations: Invalidations,
}

impl AccountService {
    pub fn new(client: ApiClient, invalidations: Invalidations) -> Self {
        Self {
            client,
            invalidations,
        }
    }

    /// Exchanges credentials for an access token and stores it in the session. Returns the
    /// username the server signed in.
    pub async fn sign_in(&self, credentials: &SignIn) -> RepoResult<String> {
        if credentials.username.trim().is_empty() {
            return Err(RepoError::MissingField("username"));
        }
        if credentials.password.is_empty() {
            return Err(RepoError::MissingField("password"));
        }
        let value = self
            .client
            .request(Method::Post, "sign-in/", Some(&json!(credentials)))
            .await?;
        let body: SignInBody = decode(value, "sign-in")?;
        let access = body
            .tokens
            .and_then(|t| t.access)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RepoError::Unexpected("the sign-in response has no access token".to_string())
            })?;

        self.client.session().set_token(access);
        let username = body
            .username
            .unwrap_or_else(|| credentials.username.clone());
        info!("Signed in as {username}");
        self.invalidations.emit(&[
            Resource::Profile,
            Resource::Balance,
            Resource::Categories,
            Resource::Outcomes,
            Resource::Statistics,
        ]);
        Ok(username)
    }

    /// Registers a new user. This does not sign in.
    pub async fn sign_up(&self, details: &SignUp) -> RepoResult<User> {
        if details.username.trim().is_empty() {
            return Err(RepoError::MissingField("username"));
        }
        if details.phone_number.trim().is_empty() {
            return Err(RepoError::MissingField("phone_number"));
        }
        if details.email.trim().is_empty() {
            return Err(RepoError::MissingField("email"));
        }
        if details.password.is_empty() {
            return Err(RepoError::MissingField("password"));
        }
        let value = self
            .client
            .request(Method::Post, "sign-up/", Some(&json!(details)))
            .await?;
        let user: User = decode(value, "sign-up")?;
        debug!("Registered {}", user.username);
        Ok(user)
    }

    /// Forgets the token. No request is sent; the server issues stateless tokens.
    pub fn sign_out(&self) {
        self.client.session().clear();
        debug!("Signed out");
    }

    pub fn is_signed_in(&self) -> bool {
        self.client.session().is_authenticated()
    }

    pub async fn profile(&self) -> RepoResult<User> {
        let value = self
            .client
            .request(Method::Get, "get-user-data/", None)
            .await?;
        decode(value, "profile")
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> RepoResult<User> {
        if update.is_empty() {
            return Err(RepoError::InvalidInput(
                "nothing to update, provide at least one field".to_string(),
            ));
        }
        let value = self
            .client
            .request(Method::Patch, "update_profile/", Some(&json!(update)))
            .await?;
        let user: User = decode(value, "profile")?;
        self.invalidations.emit(&[Resource::Profile]);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RawResponse, TestServer};
    use crate::test::TestEnv;

    fn demo() -> SignIn {
        SignIn {
            username: TestServer::DEMO_USERNAME.to_string(),
            password: TestServer::DEMO_PASSWORD.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_stores_token() {
        let env = TestEnv::signed_out().await;
        let account = env.budget().account();
        assert!(!account.is_signed_in());

        let username = account.sign_in(&demo()).await.unwrap();
        assert_eq!(username, "demo");
        assert_eq!(env.session().token().as_deref(), Some("test-access-demo"));

        // Later requests carry the new token.
        env.budget().balance().get().await.unwrap();
        let request = env.server().last_request().unwrap();
        assert_eq!(
            request.header("Authorization"),
            Some("Bearer test-access-demo")
        );
    }

    #[tokio::test]
    async fn test_bad_password_leaves_session_empty() {
        let env = TestEnv::signed_out().await;
        let err = env
            .budget()
            .account()
            .sign_in(&SignIn {
                username: "demo".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, RepoError::Unauthenticated);
        assert!(!env.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_requires_fields() {
        let env = TestEnv::signed_out().await;
        let err = env
            .budget()
            .account()
            .sign_in(&SignIn {
                username: " ".to_string(),
                password: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, RepoError::MissingField("username"));
        assert!(env.server().requests().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_without_token_is_unexpected() {
        let env = TestEnv::signed_out().await;
        env.server()
            .respond_next(RawResponse::new(200, r#"{"username": "demo"}"#));
        let err = env.budget().account().sign_in(&demo()).await.unwrap_err();
        assert!(matches!(err, RepoError::Unexpected(_)));
        assert!(!env.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let env = TestEnv::signed_out().await;
        let account = env.budget().account();
        let user = account
            .sign_up(&SignUp {
                username: "ann".to_string(),
                phone_number: "+15550199".to_string(),
                email: "ann@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.username, "ann");
        assert!(!account.is_signed_in());

        account
            .sign_in(&SignIn {
                username: "ann".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        let categories = env.budget().categories().list().await.unwrap();
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let env = TestEnv::signed_out().await;
        let err = env
            .budget()
            .account()
            .sign_up(&SignUp {
                username: "demo".to_string(),
                phone_number: "5550199".to_string(),
                email: "other@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.get("username").is_some());
        assert!(errors.get("phone_number").is_some());
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let env = TestEnv::new().await;
        let account = env.budget().account();
        assert!(account.is_signed_in());
        account.sign_out();
        assert!(!account.is_signed_in());
        let err = env.budget().balance().get().await.unwrap_err();
        assert_eq!(err, RepoError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let env = TestEnv::new().await;
        let account = env.budget().account();
        let profile = account.profile().await.unwrap();
        assert_eq!(profile.username, "demo");

        let updated = account
            .update_profile(&ProfileUpdate {
                first_name: Some("Dee".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Dee"));
        assert_eq!(updated.username, "demo");

        let err = account
            .update_profile(&ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidInput(_)));
    }
}
