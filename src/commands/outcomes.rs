//! Outcome command handlers. Mutations print the outcome list as reloaded from the server.

use crate::commands::{plural, Out, ReportRepoError};
use crate::model::{Amount, CreatedOutcome, Outcome, OutcomeFilters};
use crate::repo::Budget;
use crate::view::ListView;
use crate::Result;

/// Lists outcomes matching `filters`.
pub async fn outcomes_list(budget: &Budget, filters: OutcomeFilters) -> Result<Out<Vec<Outcome>>> {
    let mut view = ListView::outcomes(budget, filters);
    view.refresh().await.or_report("list outcomes")?;
    Ok(listing(&view))
}

/// Records an outcome. The response includes the balance after the server debited it.
pub async fn outcomes_add(
    budget: &Budget,
    amount: Amount,
    category_id: i64,
) -> Result<Out<CreatedOutcome>> {
    let created = budget
        .outcomes()
        .create(Some(amount), Some(category_id))
        .await
        .or_report("record the outcome")?;
    let mut message = format!(
        "Recorded outcome {} of {} in category {}",
        created.outcome.id, created.outcome.amount, created.outcome.category.id
    );
    if let Some(balance) = created.balance {
        message.push_str(&format!(", your balance is now {}", Amount::new(balance)));
    }
    Ok(Out::new(message, created))
}

pub async fn outcomes_show(budget: &Budget, id: i64) -> Result<Out<Outcome>> {
    let outcome = budget
        .outcomes()
        .get(id)
        .await
        .or_report(&format!("show outcome {id}"))?;
    Ok(Out::new(line(&outcome), outcome))
}

pub async fn outcomes_edit(
    budget: &Budget,
    id: i64,
    amount: Amount,
    category_id: i64,
) -> Result<Out<Vec<Outcome>>> {
    let mut view = ListView::outcomes(budget, OutcomeFilters::new());
    budget
        .outcomes()
        .update(id, Some(amount), Some(category_id))
        .await
        .or_report(&format!("edit outcome {id}"))?;
    view.sync().await.or_report("reload outcomes")?;
    Ok(listing(&view).prepend(format!("Updated outcome {id}")))
}

pub async fn outcomes_delete(budget: &Budget, id: i64) -> Result<Out<Vec<Outcome>>> {
    let mut view = ListView::outcomes(budget, OutcomeFilters::new());
    budget
        .outcomes()
        .delete(id)
        .await
        .or_report(&format!("delete outcome {id}"))?;
    view.sync().await.or_report("reload outcomes")?;
    Ok(listing(&view).prepend(format!("Deleted outcome {id}")))
}

fn line(outcome: &Outcome) -> String {
    let category = match &outcome.category.name {
        Some(name) => format!("{name} ({})", outcome.category.id),
        None => format!("category {}", outcome.category.id),
    };
    let date = outcome
        .created_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{:>6}  {:>12}  {:<10}  {}",
        outcome.id,
        outcome.amount.to_string(),
        date,
        category
    )
}

fn listing(view: &ListView<Outcome>) -> Out<Vec<Outcome>> {
    if view.is_empty() {
        return Out::new("No Data", Vec::new());
    }
    let lines: Vec<String> = view.items().iter().map(line).collect();
    let message = format!("{}\n{}", plural(view.items().len(), "outcome"), lines.join("\n"));
    Out::new(message, view.items().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestServer;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let env = TestEnv::new().await;
        let out = outcomes_list(env.budget(), OutcomeFilters::new().min_amount(amount("100")))
            .await
            .unwrap();
        let outcomes = out.structure().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].amount, amount("142.67"));
        assert!(out.message().contains("$142.67"));
    }

    #[tokio::test]
    async fn test_add_reports_balance() {
        let env = TestEnv::new().await;
        let category = env.budget().categories().list().await.unwrap()[1].id;
        let out = outcomes_add(env.budget(), amount("$25"), category)
            .await
            .unwrap();
        assert!(out.message().ends_with("your balance is now $975.00"));
        assert_eq!(
            env.server().balance_of(TestServer::DEMO_USERNAME),
            Some(rust_decimal::Decimal::new(97500, 2))
        );
    }

    #[tokio::test]
    async fn test_show_names_category() {
        let env = TestEnv::new().await;
        let id = env
            .budget()
            .outcomes()
            .list(&OutcomeFilters::new())
            .await
            .unwrap()[3]
            .id;
        let out = outcomes_show(env.budget(), id).await.unwrap();
        assert!(out.message().contains("Utilities"));
    }

    #[tokio::test]
    async fn test_edit_and_delete_print_reloaded_list() {
        let env = TestEnv::new().await;
        let outcomes = env
            .budget()
            .outcomes()
            .list(&OutcomeFilters::new())
            .await
            .unwrap();
        let (first, category) = (outcomes[0].id, outcomes[1].category.id);

        let out = outcomes_edit(env.budget(), first, amount("1"), category)
            .await
            .unwrap();
        let edited = out
            .structure()
            .unwrap()
            .iter()
            .find(|o| o.id == first)
            .unwrap();
        assert_eq!(edited.amount, amount("1"));
        assert_eq!(edited.category.id, category);

        let out = outcomes_delete(env.budget(), first).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 3);
        assert!(out.message().starts_with("Deleted outcome"));
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let env = TestEnv::new().await;
        let err = outcomes_add(env.budget(), Amount::ZERO, 2)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unable to record the outcome");
        assert!(env.server().requests().is_empty());
    }
}
