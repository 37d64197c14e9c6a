use std::marker::PhantomData;

use resume_domain::{Element, Record};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;

/// CRUD for one element kind under `/api/<kind>/`.
pub struct ResourceApi<'a, T> {
    client: &'a ApiClient,
    _kind: PhantomData<T>,
}

impl ApiClient {
    pub fn resource<T: Element>(&self) -> ResourceApi<'_, T> {
        ResourceApi {
            client: self,
            _kind: PhantomData,
        }
    }
}

impl<T: Element> ResourceApi<'_, T> {
    fn collection() -> String {
        format!("/api/{}/", T::KIND.as_str())
    }

    fn item(id: Uuid) -> String {
        format!("/api/{}/{id}", T::KIND.as_str())
    }

    pub async fn list(&self) -> Result<Vec<Record<T>>, ClientError> {
        super::empty_on_404(self.client.get(&Self::collection()).await)
    }

    pub async fn get(&self, id: Uuid) -> Result<Record<T>, ClientError> {
        self.client.get(&Self::item(id)).await
    }

    /// Validates locally first so obviously bad forms never hit the network.
    pub async fn create(&self, item: &T) -> Result<Record<T>, ClientError> {
        item.validate()?;
        self.client.post(&Self::collection(), item).await
    }

    pub async fn update(&self, id: Uuid, update: &T::Update) -> Result<Record<T>, ClientError> {
        self.client.put(&Self::item(id), update).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.client.delete(&Self::item(id)).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use resume_domain::Project;
    use serde_json::{json, Value};

    use super::*;
    use crate::http::testing::{client, ScriptedTransport};

    #[tokio::test]
    async fn test_list_404_is_empty() {
        let transport = ScriptedTransport::new(|req, _| {
            assert_eq!(req.path, "/api/project/");
            (StatusCode::NOT_FOUND, json!({"detail": "No projects found"}))
        });
        let client = client(transport);
        let items = client.resource::<Project>().list().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_surface() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "A database error occurred"}))
        });
        let client = client(transport);
        let err = client.resource::<Project>().list().await.unwrap_err();
        assert_eq!(err.to_string(), "A database error occurred");
    }

    #[tokio::test]
    async fn test_delete_targets_item_path() {
        let id = Uuid::new_v4();
        let transport = ScriptedTransport::new(|_, _| (StatusCode::NO_CONTENT, Value::Null));
        let client = client(transport.clone());
        client.resource::<Project>().delete(id).await.unwrap();
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::DELETE);
        assert_eq!(seen[0].path, format!("/api/project/{id}"));
    }
}
