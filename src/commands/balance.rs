use crate::commands::{Out, ReportRepoError};
use crate::model::Amount;
use crate::repo::Budget;
use crate::view::BalanceField;
use crate::Result;

pub async fn balance_show(budget: &Budget) -> Result<Out<Amount>> {
    let balance = budget
        .balance()
        .get()
        .await
        .or_report("load your balance")?;
    Ok(Out::new(format!("Your balance is {balance}"), balance))
}

/// Replaces the balance with the amount typed in `text`, e.g. `1200`, `$1,200.00`.
pub async fn balance_set(budget: &Budget, text: &str) -> Result<Out<Amount>> {
    let mut field = BalanceField::new(budget.balance());
    let balance = field.submit(text).await.or_report("set your balance")?;
    Ok(Out::new(format!("Your balance is now {balance}"), balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_show() {
        let env = TestEnv::new().await;
        let out = balance_show(env.budget()).await.unwrap();
        assert_eq!(out.message(), "Your balance is $1,000.00");
    }

    #[tokio::test]
    async fn test_set() {
        let env = TestEnv::new().await;
        let out = balance_set(env.budget(), "$2,500").await.unwrap();
        assert_eq!(out.message(), "Your balance is now $2,500.00");
        let out = balance_show(env.budget()).await.unwrap();
        assert_eq!(out.message(), "Your balance is $2,500.00");
    }

    #[tokio::test]
    async fn test_set_negative_is_rejected() {
        let env = TestEnv::new().await;
        let err = balance_set(env.budget(), "-1").await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to set your balance");
        assert!(env.server().requests().is_empty());
    }
}
