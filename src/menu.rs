//! Menu page: item form and its multipart encoding.
//!
//! Menu items are always submitted as multipart form data, with the image
//! attached only when a new file was picked. On edit, leaving the image out
//! keeps the one the backend already has.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{FilePart, MultipartForm};
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, MenuItem};
use crate::pagination::Page;

#[async_trait]
pub trait MenuApi: Send + Sync {
    async fn list_menu(&self) -> DashboardResult<Vec<MenuItem>>;
    async fn create_menu_item(&self, form: MultipartForm) -> DashboardResult<Value>;
    async fn update_menu_item(&self, id: Id, form: MultipartForm) -> DashboardResult<Value>;
    async fn delete_menu_item(&self, id: Id) -> DashboardResult<Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuForm {
    pub name: String,
    pub description: String,
    /// Raw input; parsed on validation.
    pub price: String,
    pub category: String,
    pub available: bool,
    pub image: Option<PathBuf>,
}

impl Default for MenuForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            category: String::new(),
            available: true,
            image: None,
        }
    }
}

impl MenuForm {
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item.price.to_string(),
            category: item.category.clone().unwrap_or_default(),
            available: item.available,
            image: None,
        }
    }

    fn parsed_price(&self) -> DashboardResult<f64> {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| DashboardError::validation("invalid price"))
    }

    /// Text fields of the multipart body, in submission order.
    pub fn text_fields(&self) -> DashboardResult<MultipartForm> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DashboardError::validation("menu item name required"));
        }
        let price = self.parsed_price()?;
        Ok(MultipartForm::new()
            .text("name", name)
            .text("description", self.description.trim())
            .text("price", price.to_string())
            .text("available", if self.available { "true" } else { "false" })
            .text("category", self.category.trim()))
    }

    /// Full multipart body, reading the picked image from disk.
    pub async fn to_multipart(&self) -> DashboardResult<MultipartForm> {
        let form = self.text_fields()?;
        match &self.image {
            Some(path) => Ok(form.file(read_image(path).await?)),
            None => Ok(form),
        }
    }
}

async fn read_image(path: &Path) -> DashboardResult<FilePart> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DashboardError::validation(format!("cannot read image {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    debug!(file = %file_name, mime = %mime, size = bytes.len(), "menu image attached");
    Ok(FilePart {
        field: "image".to_string(),
        file_name,
        mime: mime.essence_str().to_string(),
        bytes,
    })
}

pub struct MenuPage {
    pub items: Vec<MenuItem>,
    pub form: MenuForm,
    pub editing: Option<Id>,
    pub page: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

impl MenuPage {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            form: MenuForm::default(),
            editing: None,
            page: 1,
            page_size,
            error: None,
        }
    }

    pub async fn load<A: MenuApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        match api.list_menu().await {
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

    pub fn edit(&mut self, id: Id) -> DashboardResult<()> {
        let item = self
            .items
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| DashboardError::validation("menu item not found"))?;
        self.form = MenuForm::from_item(item);
        self.editing = Some(id);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.form = MenuForm::default();
        self.editing = None;
    }

    pub async fn save<A: MenuApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        let body = match self.form.to_multipart().await {
            Ok(b) => b,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };
        let result = match self.editing {
            Some(id) => api.update_menu_item(id, body).await,
            None => api.create_menu_item(body).await,
        };
        if let Err(e) = result {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(name = %self.form.name.trim(), editing = ?self.editing, "menu item saved");
        self.cancel();
        self.load(api).await
    }

    pub async fn remove<A: MenuApi + ?Sized>(&mut self, api: &A, id: Id) -> DashboardResult<()> {
        if let Err(e) = api.delete_menu_item(id).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(menu_item_id = id, "menu item deleted");
        self.load(api).await
    }

    pub fn current_page(&self) -> Page<MenuItem> {
        Page::of(&self.items, self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMenu {
        sent: Mutex<Vec<(Option<Id>, MultipartForm)>>,
    }

    #[async_trait]
    impl MenuApi for FakeMenu {
        async fn list_menu(&self) -> DashboardResult<Vec<MenuItem>> {
            Ok(vec![MenuItem {
                id: 4,
                name: "Pho bo".into(),
                description: Some("Beef noodle soup".into()),
                price: 55000.0,
                category: Some("Noodles".into()),
                available: false,
                image: Some("/uploads/pho.png".into()),
            }])
        }
        async fn create_menu_item(&self, form: MultipartForm) -> DashboardResult<Value> {
            self.sent.lock().expect("sent").push((None, form));
            Ok(Value::Null)
        }
        async fn update_menu_item(&self, id: Id, form: MultipartForm) -> DashboardResult<Value> {
            self.sent.lock().expect("sent").push((Some(id), form));
            Ok(Value::Null)
        }
        async fn delete_menu_item(&self, _id: Id) -> DashboardResult<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn text_fields_follow_backend_names() {
        let form = MenuForm {
            name: " Goi cuon ".into(),
            price: "35000".into(),
            available: false,
            ..Default::default()
        };
        let body = form.text_fields().expect("valid");
        assert_eq!(body.field("name"), Some("Goi cuon"));
        assert_eq!(body.field("price"), Some("35000"));
        assert_eq!(body.field("available"), Some("false"));
        assert_eq!(body.field("category"), Some(""));
        assert!(body.file.is_none());
    }

    #[test]
    fn bad_price_and_blank_name_are_rejected() {
        let mut form = MenuForm {
            price: "10".into(),
            ..Default::default()
        };
        assert!(form.text_fields().is_err());
        form.name = "Tea".into();
        form.price = "-1".into();
        assert_eq!(
            form.text_fields().expect_err("negative").user_message(),
            "invalid price"
        );
    }

    #[tokio::test]
    async fn picked_image_is_attached_with_guessed_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("banh-mi.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write image");
        let form = MenuForm {
            name: "Banh mi".into(),
            price: "25000".into(),
            image: Some(path),
            ..Default::default()
        };
        let body = form.to_multipart().await.expect("multipart");
        let file = body.file.expect("file part");
        assert_eq!(file.field, "image");
        assert_eq!(file.file_name, "banh-mi.png");
        assert_eq!(file.mime, "image/png");
    }

    #[tokio::test]
    async fn edit_without_new_image_keeps_existing() {
        let api = FakeMenu::default();
        let mut page = MenuPage::new(10);
        page.load(&api).await.expect("load");
        page.edit(4).expect("edit");
        assert_eq!(page.form.price, "55000");
        assert!(!page.form.available);
        page.save(&api).await.expect("save");

        let sent = api.sent.lock().expect("sent");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Some(4));
        assert!(sent[0].1.file.is_none());
        assert_eq!(sent[0].1.field("description"), Some("Beef noodle soup"));
    }
}
