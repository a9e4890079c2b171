//! Category command handlers. Mutations print the category list as reloaded from the server.

use crate::commands::{plural, Out, ReportRepoError};
use crate::model::Category;
use crate::repo::Budget;
use crate::view::ListView;
use crate::Result;

pub async fn categories_list(budget: &Budget) -> Result<Out<Vec<Category>>> {
    let mut view = ListView::categories(budget);
    view.refresh().await.or_report("list categories")?;
    Ok(listing(&view))
}

pub async fn categories_add(budget: &Budget, name: &str) -> Result<Out<Vec<Category>>> {
    let mut view = ListView::categories(budget);
    let created = budget
        .categories()
        .create(name)
        .await
        .or_report("create the category")?;
    view.sync().await.or_report("reload categories")?;
    Ok(listing(&view).prepend(format!(
        "Created category {} '{}'",
        created.id, created.name
    )))
}

pub async fn categories_show(budget: &Budget, id: i64) -> Result<Out<Category>> {
    let category = budget
        .categories()
        .get(id)
        .await
        .or_report(&format!("show category {id}"))?;
    Ok(Out::new(format!("{}: {}", category.id, category.name), category))
}

pub async fn categories_rename(
    budget: &Budget,
    id: i64,
    name: &str,
) -> Result<Out<Vec<Category>>> {
    let mut view = ListView::categories(budget);
    let renamed = budget
        .categories()
        .update(id, name)
        .await
        .or_report(&format!("rename category {id}"))?;
    view.sync().await.or_report("reload categories")?;
    Ok(listing(&view).prepend(format!(
        "Renamed category {} to '{}'",
        renamed.id, renamed.name
    )))
}

/// Deletes a category and, on the server, its outcomes. The list is reloaded whether or not the
/// delete succeeded; on failure it is printed before the error is returned.
pub async fn categories_delete(budget: &Budget, id: i64) -> Result<Out<Vec<Category>>> {
    let mut view = ListView::categories(budget);
    let deleted = budget.categories().delete(id).await;
    let reloaded = view.sync().await;
    if deleted.is_err() && reloaded.is_ok() {
        listing(&view).print();
    }
    deleted.or_report(&format!("delete category {id}"))?;
    reloaded.or_report("reload categories")?;
    Ok(listing(&view).prepend(format!("Deleted category {id} and its outcomes")))
}

fn listing(view: &ListView<Category>) -> Out<Vec<Category>> {
    if view.is_empty() {
        return Out::new("No Data", Vec::new());
    }
    let lines: Vec<String> = view
        .items()
        .iter()
        .map(|c| format!("{:>6}  {}", c.id, c.name))
        .collect();
    let message = format!("{}\n{}", plural(view.items().len(), "category"), lines.join("\n"));
    Out::new(message, view.items().to_vec())
}
