//! Fixtures and an in-memory store for service tests.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::cache::CacheManager;
use crate::cache::testing::{RecordingStore, manager_over};
use crate::error::{AppError, AppResult};
use crate::models::{
    Company, Item, NewCompany, NewItem, NewUser, Role, UpdateCompany, UpdateItem, UpdateUser, User,
};
use crate::repositories::{CompanyStore, ItemStore, Repositories, UserStore};
use crate::services::Services;
use crate::services::access::Caller;
use crate::services::cache::ItemCacheService;

pub(crate) fn user(username: &str) -> User {
    let new = NewUser::new(username, format!("{username}@acme.test"), "$argon2id$hash");
    User {
        id: new.id,
        username: new.username,
        email: new.email,
        hashed_password: new.hashed_password,
        role: new.role,
        is_active: new.is_active,
        created_at: new.created_at,
        updated_at: new.updated_at,
    }
}

pub(crate) fn company(name: &str, owner: Uuid) -> Company {
    Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        user_id: owner,
    }
}

pub(crate) fn item(title: &str, company_id: Uuid) -> Item {
    Item {
        id: Uuid::new_v4(),
        title: title.to_string(),
        price: price("9.99"),
        company_id,
    }
}

pub(crate) fn price(raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw).unwrap()
}

pub(crate) fn caller_for(user: &User) -> Caller {
    Caller::from(user)
}

pub(crate) fn admin_caller() -> Caller {
    Caller {
        id: Uuid::new_v4(),
        username: "admin".to_string(),
        role: Role::Admin,
        is_active: true,
    }
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    companies: BTreeMap<Uuid, Company>,
    items: BTreeMap<Uuid, Item>,
}

/// All three stores over one lock, so a company delete and its item
/// cascade happen together. Constraint violations mirror the Postgres ones.
#[derive(Default)]
pub(crate) struct InMemoryDb {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
}

impl InMemoryDb {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn read(&self) -> MutexGuard<'_, Tables> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tables()
    }

    /// Number of read queries served so far.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn insert_user(&self, user: User) -> User {
        self.tables().users.insert(user.id, user.clone());
        user
    }

    pub(crate) fn user(&self, id: Uuid) -> Option<User> {
        self.tables().users.get(&id).cloned()
    }

    pub(crate) fn items_of(&self, company_id: Uuid) -> Vec<Item> {
        self.tables()
            .items
            .values()
            .filter(|item| item.company_id == company_id)
            .cloned()
            .collect()
    }
}

fn page<T: Clone>(rows: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserStore for InMemoryDb {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(AppError::duplicate("users", "username", &new.username));
        }
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(AppError::duplicate("users", "email", &new.email));
        }
        let user = User {
            id: new.id,
            username: new.username,
            email: new.email,
            hashed_password: new.hashed_password,
            role: new.role,
            is_active: new.is_active,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let tables = self.read();
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(page(users, offset, limit))
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<Option<User>> {
        let mut tables = self.tables();
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hashed_password) = changes.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = jiff::Timestamp::now().to_diesel();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables();
        if tables.companies.values().any(|c| c.user_id == id) {
            return Err(AppError::conflict("record is still referenced by companies"));
        }
        Ok(tables.users.remove(&id).is_some())
    }
}

#[async_trait]
impl CompanyStore for InMemoryDb {
    async fn create(&self, new: NewCompany) -> AppResult<Company> {
        let mut tables = self.tables();
        if tables.companies.values().any(|c| c.name == new.name) {
            return Err(AppError::duplicate("companies", "name", &new.name));
        }
        if !tables.users.contains_key(&new.user_id) {
            return Err(AppError::validation("user_id", "Invalid reference"));
        }
        let company = Company {
            id: new.id,
            name: new.name,
            user_id: new.user_id,
        };
        tables.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Company>> {
        Ok(self.read().companies.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Company>> {
        let mut companies: Vec<Company> = self.read().companies.values().cloned().collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page(companies, offset, limit))
    }

    async fn count_by_owner(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .read()
            .companies
            .values()
            .filter(|c| c.user_id == user_id)
            .count() as i64)
    }

    async fn update(&self, id: Uuid, changes: UpdateCompany) -> AppResult<Option<Company>> {
        let mut tables = self.tables();
        let Some(company) = tables.companies.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            company.name = name;
        }
        Ok(Some(company.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables();
        tables.items.retain(|_, item| item.company_id != id);
        Ok(tables.companies.remove(&id).is_some())
    }
}

#[async_trait]
impl ItemStore for InMemoryDb {
    async fn create(&self, new: NewItem) -> AppResult<Item> {
        let mut tables = self.tables();
        if !tables.companies.contains_key(&new.company_id) {
            return Err(AppError::validation("company_id", "Invalid reference"));
        }
        let item = Item {
            id: new.id,
            title: new.title,
            price: new.price,
            company_id: new.company_id,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.read().items.get(&id).cloned())
    }

    async fn find_by_ids(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        let tables = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.items.get(id))
            .filter(|item| item.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .read()
            .items
            .values()
            .filter(|item| item.company_id == company_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(items)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self.read().items.values().cloned().collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(page(items, offset, limit))
    }

    async fn update(&self, id: Uuid, changes: UpdateItem) -> AppResult<Option<Item>> {
        let mut tables = self.tables();
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            item.title = title;
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        Ok(Some(item.clone()))
    }

    async fn delete_many(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<u64> {
        let mut tables = self.tables();
        let before = tables.items.len();
        tables
            .items
            .retain(|id, item| !(item.company_id == company_id && ids.contains(id)));
        Ok((before - tables.items.len()) as u64)
    }
}

/// Services over an [`InMemoryDb`] and a recording memory cache.
pub(crate) struct Harness {
    pub(crate) services: Services,
    pub(crate) db: Arc<InMemoryDb>,
    pub(crate) store: Arc<RecordingStore>,
    pub(crate) cache: CacheManager,
    pub(crate) items_cache: ItemCacheService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let db = Arc::new(InMemoryDb::default());
        let (cache, store) = manager_over(RecordingStore::default());
        let repos = Repositories {
            users: db.clone(),
            companies: db.clone(),
            items: db.clone(),
        };
        Self {
            services: Services::new(repos, cache.clone()),
            db,
            store,
            items_cache: ItemCacheService::new(cache.clone()),
            cache,
        }
    }
}
