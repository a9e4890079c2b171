use crate::api::{ApiClient, Method};
use crate::model::Category;
use crate::repo::{decode, Invalidations, RepoError, RepoResult, Resource};
use serde_json::json;
use tracing::debug;

/// Create, read, update and delete for the signed-in user's categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    client: ApiClient,
    invalidations: Invalidations,
}

impl CategoryRepository {
    pub fn new(client: ApiClient, invalidations: Invalidations) -> Self {
        Self {
            client,
            invalidations,
        }
    }

    /// All categories, in the order the server returns them.
    pub async fn list(&self) -> RepoResult<Vec<Category>> {
        let value = self
            .client
            .request(Method::Get, "list-categories/", None)
            .await?;
        decode(value, "category list")
    }

    pub async fn get(&self, id: i64) -> RepoResult<Category> {
        let value = self
            .client
            .request(Method::Get, &format!("get-category/{id}/"), None)
            .await?;
        decode(value, "category")
    }

    /// Creates a category. The name is trimmed; a blank name is rejected without contacting the
    /// server.
    pub async fn create(&self, name: &str) -> RepoResult<Category> {
        let name = required_name(name)?;
        let value = self
            .client
            .request(Method::Post, "create-category/", Some(&json!({ "name": name })))
            .await?;
        let category: Category = decode(value, "created category")?;
        debug!("Created category {} '{}'", category.id, category.name);
        self.invalidations
            .emit(&[Resource::Categories, Resource::Statistics]);
        Ok(category)
    }

    /// Renames a category.
    pub async fn update(&self, id: i64, name: &str) -> RepoResult<Category> {
        let name = required_name(name)?;
        let value = self
            .client
            .request(
                Method::Patch,
                &format!("edit-category/{id}/"),
                Some(&json!({ "name": name })),
            )
            .await?;
        let category: Category = decode(value, "updated category")?;
        self.invalidations
            .emit(&[Resource::Categories, Resource::Statistics]);
        Ok(category)
    }

    /// Deletes a category. The server deletes the category's outcomes with it.
    ///
    /// The category list is invalidated even when the deletion fails so that a view showing a
    /// category that no longer exists on the server reloads.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = self
            .client
            .request(Method::Delete, &format!("delete-category/{id}/"), None)
            .await;
        match result {
            Ok(_) => {
                self.invalidations.emit(&[
                    Resource::Categories,
                    Resource::Outcomes,
                    Resource::Statistics,
                ]);
                Ok(())
            }
            Err(e) => {
                self.invalidations.emit(&[Resource::Categories]);
                Err(e.into())
            }
        }
    }
}

fn required_name(name: &str) -> RepoResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RepoError::MissingField("name"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawResponse;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list_seeded_categories() {
        let env = TestEnv::new().await;
        let categories = env.budget().categories().list().await.unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Groceries", "Restaurants", "Utilities"]);
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let env = TestEnv::new().await;
        let repo = env.budget().categories();
        let created = repo.create("  Travel ").await.unwrap();
        assert_eq!(created.name, "Travel");
        let categories = repo.list().await.unwrap();
        assert!(categories.contains(&created));
        assert_eq!(repo.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_blank_name_sends_nothing() {
        let env = TestEnv::new().await;
        let err = env.budget().categories().create("   ").await.unwrap_err();
        assert_eq!(err, RepoError::MissingField("name"));
        assert!(env.server().requests().is_empty());
    }

    #[tokio::test]
    async fn test_rename() {
        let env = TestEnv::new().await;
        let repo = env.budget().categories();
        let first = repo.list().await.unwrap().remove(0);
        let renamed = repo.update(first.id, "Food").await.unwrap();
        assert_eq!(renamed.id, first.id);
        assert_eq!(renamed.name, "Food");
        let request = env.server().last_request().unwrap();
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.path, format!("edit-category/{}/", first.id));
    }

    #[tokio::test]
    async fn test_delete_removes_outcomes_and_invalidates() {
        let env = TestEnv::new().await;
        let mut rx = env.budget().invalidations().subscribe();
        let repo = env.budget().categories();
        let groceries = repo.list().await.unwrap().remove(0);
        repo.delete(groceries.id).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Resource::Categories);
        assert_eq!(rx.recv().await.unwrap(), Resource::Outcomes);
        assert_eq!(rx.recv().await.unwrap(), Resource::Statistics);

        let outcomes = env
            .budget()
            .outcomes()
            .list(&Default::default())
            .await
            .unwrap();
        assert!(outcomes.iter().all(|o| o.category.id != groceries.id));
        assert_eq!(repo.get(groceries.id).await.unwrap_err(), RepoError::NotFound);
    }

    #[tokio::test]
    async fn test_failed_delete_still_invalidates_list() {
        let env = TestEnv::new().await;
        let mut rx = env.budget().invalidations().subscribe();
        let err = env.budget().categories().delete(999).await.unwrap_err();
        assert_eq!(err, RepoError::NotFound);
        assert_eq!(rx.try_recv().unwrap(), Resource::Categories);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_server_validation_is_reported_by_field() {
        let env = TestEnv::new().await;
        env.server().respond_next(RawResponse::new(
            400,
            r#"{"name": ["category with this name already exists."]}"#,
        ));
        let err = env.budget().categories().create("Groceries").await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(
            errors.get("name").unwrap(),
            ["category with this name already exists."]
        );
    }

    #[tokio::test]
    async fn test_signed_out_is_unauthenticated() {
        let env = TestEnv::signed_out().await;
        let err = env.budget().categories().list().await.unwrap_err();
        assert_eq!(err, RepoError::Unauthenticated);
    }
}
