//! Account command handlers.
//!
//! This module implements the CLI commands for:
//! - `budget sign-in` - Exchange credentials for a token and save it
//! - `budget sign-up` - Register a new account
//! - `budget sign-out` - Forget the saved token
//! - `budget profile show|update` - Read or change the profile

use crate::commands::{Out, ReportRepoError};
use crate::model::{ProfileUpdate, SignIn, SignUp, User};
use crate::repo::Budget;
use crate::{Config, Result};
use anyhow::Context;

/// Signs in and saves the access token to `$BUDGET_HOME/.secrets/token.json` so later commands
/// are authenticated.
pub async fn sign_in(
    config: &Config,
    budget: &Budget,
    username: &str,
    password: &str,
) -> Result<Out<String>> {
    let credentials = SignIn {
        username: username.to_string(),
        password: password.to_string(),
    };
    let username = budget
        .account()
        .sign_in(&credentials)
        .await
        .or_report("sign in")?;
    let token = budget
        .client()
        .session()
        .token()
        .context("The session has no token after signing in")?;
    config
        .save_token(&token)
        .await
        .context("Signed in, but unable to save the token")?;
    Ok(Out::new(format!("Signed in as {username}"), username))
}

pub async fn sign_up(budget: &Budget, details: &SignUp) -> Result<Out<User>> {
    let user = budget
        .account()
        .sign_up(details)
        .await
        .or_report("sign up")?;
    Ok(Out::new(
        format!(
            "Registered {}, run 'budget sign-in' to start using your account",
            user.username
        ),
        user,
    ))
}

/// Clears the session and deletes the saved token.
pub async fn sign_out(config: &Config, budget: &Budget) -> Result<Out<()>> {
    budget.account().sign_out();
    config.clear_token().await?;
    Ok("Signed out".into())
}

pub async fn profile(budget: &Budget) -> Result<Out<User>> {
    let user = budget
        .account()
        .profile()
        .await
        .or_report("load your profile")?;
    Ok(Out::new(format!("Profile of {}", user.username), user))
}

pub async fn update_profile(budget: &Budget, update: &ProfileUpdate) -> Result<Out<User>> {
    let user = budget
        .account()
        .update_profile(update)
        .await
        .or_report("update your profile")?;
    Ok(Out::new(format!("Updated the profile of {}", user.username), user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestServer;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_sign_in_saves_token_and_sign_out_removes_it() {
        let env = TestEnv::signed_out().await;
        let config = env.config();
        let out = sign_in(
            &config,
            env.budget(),
            TestServer::DEMO_USERNAME,
            TestServer::DEMO_PASSWORD,
        )
        .await
        .unwrap();
        assert_eq!(out.message(), "Signed in as demo");
        assert_eq!(
            config.load_token().await.unwrap().as_deref(),
            Some("test-access-demo")
        );

        sign_out(&config, env.budget()).await.unwrap();
        assert_eq!(config.load_token().await.unwrap(), None);
        assert!(!env.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_sign_in_saves_nothing() {
        let env = TestEnv::signed_out().await;
        let config = env.config();
        let err = sign_in(&config, env.budget(), "demo", "nope")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("budget sign-in"));
        assert_eq!(config.load_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_profile_requires_sign_in() {
        let env = TestEnv::signed_out().await;
        let err = profile(env.budget()).await.unwrap_err();
        assert!(err.to_string().contains("not signed in"));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let env = TestEnv::new().await;
        let update = ProfileUpdate {
            email: Some("demo@budget.test".to_string()),
            ..Default::default()
        };
        let out = update_profile(env.budget(), &update).await.unwrap();
        assert_eq!(
            out.structure().unwrap().email.as_deref(),
            Some("demo@budget.test")
        );
        let shown = profile(env.budget()).await.unwrap();
        assert_eq!(
            shown.structure().unwrap().email.as_deref(),
            Some("demo@budget.test")
        );
    }
}
