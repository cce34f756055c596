//! Kitchen page: pending items and their forward-only actions.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, KitchenItem, KitchenItemStatus};

#[async_trait]
pub trait KitchenApi: Send + Sync {
    async fn pending_items(&self) -> DashboardResult<Vec<KitchenItem>>;
    async fn update_item_status(
        &self,
        order_id: Id,
        item_id: Id,
        status: KitchenItemStatus,
    ) -> DashboardResult<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KitchenAction {
    StartCooking,
    MarkDone,
}

impl KitchenAction {
    pub fn target(&self) -> KitchenItemStatus {
        match self {
            Self::StartCooking => KitchenItemStatus::Cooking,
            Self::MarkDone => KitchenItemStatus::Done,
        }
    }

    /// Whether the button is enabled for an item in `status`.
    pub fn enabled_for(&self, status: KitchenItemStatus) -> bool {
        matches!(
            (self, status),
            (Self::StartCooking, KitchenItemStatus::Pending)
                | (Self::MarkDone, KitchenItemStatus::Cooking)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KitchenRow {
    #[serde(flatten)]
    pub item: KitchenItem,
    pub can_start: bool,
    pub can_finish: bool,
}

pub fn rows(items: &[KitchenItem]) -> Vec<KitchenRow> {
    items
        .iter()
        .map(|i| KitchenRow {
            item: i.clone(),
            can_start: KitchenAction::StartCooking.enabled_for(i.status),
            can_finish: KitchenAction::MarkDone.enabled_for(i.status),
        })
        .collect()
}

pub struct KitchenPage {
    pub items: Vec<KitchenItem>,
    pub error: Option<String>,
}

impl Default for KitchenPage {
    fn default() -> Self {
        Self::new()
    }
}

impl KitchenPage {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            error: None,
        }
    }

    pub async fn load<A: KitchenApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        match api.pending_items().await {
            Ok(items) => {
                self.items = items;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Apply an action to a loaded item. Disabled actions are refused locally.
    pub async fn apply<A: KitchenApi + ?Sized>(
        &mut self,
        api: &A,
        order_id: Id,
        item_id: Id,
        action: KitchenAction,
    ) -> DashboardResult<()> {
        let item = self
            .items
            .iter()
            .find(|i| i.order_id == order_id && i.id == item_id)
            .ok_or_else(|| DashboardError::validation("kitchen item not found"))?;
        if !action.enabled_for(item.status) {
            return Err(DashboardError::validation(format!(
                "cannot {} an item that is {}",
                match action {
                    KitchenAction::StartCooking => "start cooking",
                    KitchenAction::MarkDone => "finish",
                },
                item.status.as_str()
            )));
        }
        if let Err(e) = api.update_item_status(order_id, item_id, action.target()).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(order_id, item_id, status = action.target().as_str(), "kitchen item updated");
        self.load(api).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeKitchen {
        items: Mutex<Vec<KitchenItem>>,
        updates: Mutex<Vec<(Id, Id, KitchenItemStatus)>>,
    }

    impl FakeKitchen {
        fn with(items: Vec<KitchenItem>) -> Self {
            Self {
                items: Mutex::new(items),
                updates: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KitchenApi for FakeKitchen {
        async fn pending_items(&self) -> DashboardResult<Vec<KitchenItem>> {
            Ok(self.items.lock().expect("items").clone())
        }
        async fn update_item_status(
            &self,
            order_id: Id,
            item_id: Id,
            status: KitchenItemStatus,
        ) -> DashboardResult<Value> {
            self.updates.lock().expect("updates").push((order_id, item_id, status));
            for i in self.items.lock().expect("items").iter_mut() {
                if i.order_id == order_id && i.id == item_id {
                    i.status = status;
                }
            }
            Ok(Value::Null)
        }
    }

    fn item(id: Id, status: KitchenItemStatus) -> KitchenItem {
        KitchenItem {
            id,
            order_id: 50,
            menu_item_name: Some("Bun cha".into()),
            quantity: 2,
            status,
        }
    }

    #[test]
    fn buttons_follow_the_forward_path() {
        let r = rows(&[
            item(1, KitchenItemStatus::Pending),
            item(2, KitchenItemStatus::Cooking),
            item(3, KitchenItemStatus::Done),
        ]);
        assert_eq!((r[0].can_start, r[0].can_finish), (true, false));
        assert_eq!((r[1].can_start, r[1].can_finish), (false, true));
        assert_eq!((r[2].can_start, r[2].can_finish), (false, false));
    }

    #[tokio::test]
    async fn forward_transitions_call_the_backend() {
        let api = FakeKitchen::with(vec![item(1, KitchenItemStatus::Pending)]);
        let mut page = KitchenPage::new();
        page.load(&api).await.expect("load");
        page.apply(&api, 50, 1, KitchenAction::StartCooking)
            .await
            .expect("start");
        page.apply(&api, 50, 1, KitchenAction::MarkDone)
            .await
            .expect("finish");
        assert_eq!(page.items[0].status, KitchenItemStatus::Done);
        assert_eq!(api.updates.lock().expect("updates").len(), 2);
    }

    #[tokio::test]
    async fn disabled_action_is_refused_locally() {
        let api = FakeKitchen::with(vec![item(1, KitchenItemStatus::Pending)]);
        let mut page = KitchenPage::new();
        page.load(&api).await.expect("load");
        let err = page
            .apply(&api, 50, 1, KitchenAction::MarkDone)
            .await
            .expect_err("skip ahead");
        assert!(err.is_validation());
        assert!(api.updates.lock().expect("updates").is_empty());
    }
}
