//! In-process store with the same scoping, uniqueness and deletion
//! semantics as the PostgreSQL schema. Used for local runs without a
//! database and by the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::{conflict_message, DatabaseError};
use crate::database::models::deal::clamp_probability;
use crate::database::models::{
    ContactHistory, ContactHistoryPatch, ContactType, Customer, CustomerListQuery, CustomerPatch, Deal, DealListQuery,
    DealPatch, NewContactHistory, NewCustomer, NewDeal, NewOrganization, NewPipeline, NewTask, NewUser, Organization,
    Pipeline, SubscriptionTier, Task, TaskListQuery, TaskPatch, TaskStatus, User,
};
use crate::database::patch::Patch;
use crate::database::repository::{
    ContactHistoryFilter, ContactHistoryRepository, CustomerRepository, DealRepository, OrganizationRepository,
    PipelineRepository, Store, TaskRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    organizations: Vec<Organization>,
    users: Vec<User>,
    customers: Vec<Customer>,
    pipelines: Vec<Pipeline>,
    deals: Vec<Deal>,
    tasks: Vec<Task>,
    contact_history: Vec<ContactHistory>,
}

impl Tables {
    fn user_org(&self, user_id: Uuid) -> Option<Uuid> {
        self.users.iter().find(|u| u.id == user_id).map(|u| u.organization_id)
    }

    fn pipeline_org(&self, pipeline_id: Uuid) -> Option<Uuid> {
        self.pipelines.iter().find(|p| p.id == pipeline_id).map(|p| p.organization_id)
    }

    fn customer_visible(&self, organization_id: Uuid, customer_id: Uuid) -> bool {
        self.customers
            .iter()
            .any(|c| c.id == customer_id && c.organization_id == organization_id && c.deleted_at.is_none())
    }

    fn deal_in_scope(&self, organization_id: Uuid, deal: &Deal) -> bool {
        self.pipeline_org(deal.pipeline_id) == Some(organization_id)
    }

    fn task_in_scope(&self, organization_id: Uuid, task: &Task) -> bool {
        self.user_org(task.assignee_id) == Some(organization_id)
    }

    fn entry_in_scope(&self, organization_id: Uuid, entry: &ContactHistory) -> bool {
        self.customer_visible(organization_id, entry.customer_id)
    }

    /// Per-organization email/phone uniqueness among non-deleted customers.
    fn check_customer_unique(
        &self,
        organization_id: Uuid,
        exclude: Option<Uuid>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let others = self
            .customers
            .iter()
            .filter(|c| c.organization_id == organization_id && c.deleted_at.is_none() && Some(c.id) != exclude);

        for other in others {
            let same_email = matches!((email, other.email.as_deref()), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b));
            if same_email {
                return Err(DatabaseError::Conflict(conflict_message(Some("customers_org_email_unique"))));
            }
            if phone.is_some() && other.phone.as_deref() == phone {
                return Err(DatabaseError::Conflict(conflict_message(Some("customers_org_phone_unique"))));
            }
        }
        Ok(())
    }
}

fn newest_first(a: &chrono::DateTime<Utc>, b: &chrono::DateTime<Utc>) -> Ordering {
    b.cmp(a)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map(|h| h.to_lowercase().contains(needle)).unwrap_or(false)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Fixture helpers. Users beyond the registering admin and extra
    // pipelines have no HTTP surface, so integration tests seed them here.

    pub async fn add_user(&self, organization_id: Uuid, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(DatabaseError::Conflict(conflict_message(Some("users_email_key"))));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            organization_id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    pub async fn set_user_active(&self, id: Uuid, active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn add_pipeline(&self, organization_id: Uuid, pipeline: NewPipeline) -> Pipeline {
        let now = Utc::now();
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            organization_id,
            name: pipeline.name,
            stages: Json(pipeline.stages),
            is_default: pipeline.is_default,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.pipelines.push(pipeline.clone());
        pipeline
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn register(
        &self,
        organization: NewOrganization,
        admin: NewUser,
        pipeline: NewPipeline,
    ) -> Result<(Organization, User), DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(&admin.email)) {
            return Err(DatabaseError::Conflict(conflict_message(Some("users_email_key"))));
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: organization.name,
            settings: Json(serde_json::json!({})),
            subscription_tier: SubscriptionTier::Free,
            max_users: NewOrganization::DEFAULT_MAX_USERS,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            email: admin.email,
            password_hash: admin.password_hash,
            first_name: admin.first_name,
            last_name: admin.last_name,
            role: admin.role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            name: pipeline.name,
            stages: Json(pipeline.stages),
            is_default: pipeline.is_default,
            created_at: now,
            updated_at: now,
        };

        tables.organizations.push(organization.clone());
        tables.users.push(user.clone());
        tables.pipelines.push(pipeline);
        Ok((organization, user))
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.id == id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_user_in_org(&self, organization_id: Uuid, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id && u.organization_id == organization_id)
            .cloned())
    }

    async fn record_login(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn list_customers(&self, organization_id: Uuid, query: &CustomerListQuery) -> Result<Vec<Customer>, DatabaseError> {
        let tables = self.tables.read().await;
        let term = query
            .search
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let mut customers: Vec<Customer> = tables
            .customers
            .iter()
            .filter(|c| c.organization_id == organization_id && c.deleted_at.is_none())
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .filter(|c| query.tag.as_ref().map_or(true, |t| c.tags.contains(t)))
            .filter(|c| {
                term.as_deref().map_or(true, |t| {
                    contains_ci(Some(&c.first_name), t)
                        || contains_ci(Some(&c.last_name), t)
                        || contains_ci(c.email.as_deref(), t)
                        || contains_ci(c.company.as_deref(), t)
                })
            })
            .cloned()
            .collect();

        customers.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));
        Ok(customers)
    }

    async fn find_customer(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .iter()
            .find(|c| c.id == id && c.organization_id == organization_id && c.deleted_at.is_none())
            .cloned())
    }

    async fn find_customer_including_deleted(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .iter()
            .find(|c| c.id == id && c.organization_id == organization_id)
            .cloned())
    }

    async fn create_customer(&self, organization_id: Uuid, created_by: Uuid, customer: &NewCustomer) -> Result<Customer, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_customer_unique(organization_id, None, customer.email.as_deref(), customer.phone.as_deref())?;

        let now = Utc::now();
        let created = Customer {
            id: Uuid::new_v4(),
            organization_id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            company: customer.company.clone(),
            position: customer.position.clone(),
            status: customer.status,
            source: customer.source.clone(),
            tags: customer.tags.clone(),
            notes: customer.notes.clone(),
            assigned_to: customer.assigned_to,
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.customers.push(created.clone());
        Ok(created)
    }

    async fn update_customer(&self, organization_id: Uuid, id: Uuid, patch: &CustomerPatch) -> Result<Option<Customer>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .customers
            .iter()
            .position(|c| c.id == id && c.organization_id == organization_id && c.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(tables.customers[index].clone()));
        }

        let mut updated = tables.customers[index].clone();
        patch.apply(&mut updated);
        tables.check_customer_unique(organization_id, Some(id), updated.email.as_deref(), updated.phone.as_deref())?;
        updated.updated_at = Utc::now();
        tables.customers[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_customer(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables
            .customers
            .iter_mut()
            .find(|c| c.id == id && c.organization_id == organization_id && c.deleted_at.is_none())
        {
            Some(customer) => {
                let now = Utc::now();
                customer.deleted_at = Some(now);
                customer.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PipelineRepository for MemoryStore {
    async fn list_pipelines(&self, organization_id: Uuid) -> Result<Vec<Pipeline>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut pipelines: Vec<Pipeline> = tables
            .pipelines
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect();
        pipelines.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(a.created_at.cmp(&b.created_at)));
        Ok(pipelines)
    }

    async fn find_pipeline(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Pipeline>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .pipelines
            .iter()
            .find(|p| p.id == id && p.organization_id == organization_id)
            .cloned())
    }

    async fn find_default_pipeline(&self, organization_id: Uuid) -> Result<Option<Pipeline>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .pipelines
            .iter()
            .filter(|p| p.organization_id == organization_id && p.is_default)
            .max_by_key(|p| p.created_at)
            .cloned())
    }
}

#[async_trait]
impl DealRepository for MemoryStore {
    async fn list_deals(&self, organization_id: Uuid, query: &DealListQuery) -> Result<Vec<Deal>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut deals: Vec<Deal> = tables
            .deals
            .iter()
            .filter(|d| tables.deal_in_scope(organization_id, d))
            .filter(|d| query.pipeline_id.map_or(true, |p| d.pipeline_id == p))
            .filter(|d| query.stage_id.as_ref().map_or(true, |s| &d.stage_id == s))
            .filter(|d| query.customer_id.map_or(true, |c| d.customer_id == c))
            .cloned()
            .collect();
        deals.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));
        Ok(deals)
    }

    async fn find_deal(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Deal>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .deals
            .iter()
            .find(|d| d.id == id && tables.deal_in_scope(organization_id, d))
            .cloned())
    }

    async fn create_deal(&self, organization_id: Uuid, created_by: Uuid, deal: &NewDeal) -> Result<Deal, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.pipeline_org(deal.pipeline_id) != Some(organization_id) {
            return Err(DatabaseError::NotFound("Pipeline not found".to_string()));
        }

        let now = Utc::now();
        let created = Deal {
            id: Uuid::new_v4(),
            customer_id: deal.customer_id,
            pipeline_id: deal.pipeline_id,
            stage_id: deal.stage_id.clone(),
            title: deal.title.clone(),
            value: deal.value,
            currency: deal.currency.to_uppercase(),
            probability: clamp_probability(deal.probability.unwrap_or(0)),
            expected_close_date: deal.expected_close_date,
            actual_close_date: None,
            products: Json(deal.products.clone()),
            notes: deal.notes.clone(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        tables.deals.push(created.clone());
        Ok(created)
    }

    async fn update_deal(&self, organization_id: Uuid, id: Uuid, patch: &DealPatch) -> Result<Option<Deal>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .deals
            .iter()
            .position(|d| d.id == id && tables.deal_in_scope(organization_id, d))
        else {
            return Ok(None);
        };

        let deal = &mut tables.deals[index];
        if !patch.is_empty() {
            patch.apply(deal);
            deal.updated_at = Utc::now();
        }
        Ok(Some(deal.clone()))
    }

    async fn delete_deal(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .deals
            .iter()
            .position(|d| d.id == id && tables.deal_in_scope(organization_id, d));
        Ok(position.map(|i| tables.deals.remove(i)).is_some())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn list_tasks(&self, organization_id: Uuid, query: &TaskListQuery) -> Result<Vec<Task>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| tables.task_in_scope(organization_id, t))
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| query.assignee_id.map_or(true, |a| t.assignee_id == a))
            .filter(|t| query.customer_id.map_or(true, |c| t.customer_id == Some(c)))
            .filter(|t| query.due_date_from.map_or(true, |from| t.due_date.map_or(false, |d| d >= from)))
            .filter(|t| query.due_date_to.map_or(true, |to| t.due_date.map_or(false, |d| d <= to)))
            .cloned()
            .collect();

        // Due date ascending with undated tasks last, then newest first.
        tasks.sort_by(|a, b| {
            let by_due = match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_due.then_with(|| newest_first(&a.created_at, &b.created_at))
        });
        Ok(tasks)
    }

    async fn find_task(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Task>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && tables.task_in_scope(organization_id, t))
            .cloned())
    }

    async fn create_task(&self, organization_id: Uuid, created_by: Uuid, task: &NewTask) -> Result<Task, DatabaseError> {
        let mut tables = self.tables.write().await;
        let assignee_id = task.assignee_id.unwrap_or(created_by);
        if tables.user_org(assignee_id) != Some(organization_id) {
            return Err(DatabaseError::NotFound("Assignee not found".to_string()));
        }

        let now = Utc::now();
        let created = Task {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            description: task.description.clone(),
            assignee_id,
            customer_id: task.customer_id,
            deal_id: task.deal_id,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            is_recurring: task.is_recurring,
            recurrence_rule: task.recurrence_rule.clone(),
            completed_at: (task.status == TaskStatus::Complete).then_some(now),
            created_by,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, organization_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .tasks
            .iter()
            .position(|t| t.id == id && tables.task_in_scope(organization_id, t))
        else {
            return Ok(None);
        };

        let task = &mut tables.tasks[index];
        if !patch.is_empty() {
            patch.apply(task);
            task.updated_at = Utc::now();
        }
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .tasks
            .iter()
            .position(|t| t.id == id && tables.task_in_scope(organization_id, t));
        Ok(position.map(|i| tables.tasks.remove(i)).is_some())
    }
}

#[async_trait]
impl ContactHistoryRepository for MemoryStore {
    async fn list_contact_history(
        &self,
        organization_id: Uuid,
        filter: &ContactHistoryFilter,
    ) -> Result<(Vec<ContactHistory>, i64), DatabaseError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<ContactHistory> = tables
            .contact_history
            .iter()
            .filter(|e| tables.entry_in_scope(organization_id, e))
            .filter(|e| filter.customer_id.map_or(true, |c| e.customer_id == c))
            .filter(|e| filter.contact_type.map_or(true, |t| e.contact_type == t))
            .cloned()
            .collect();
        entries.sort_by(|a, b| newest_first(&a.created_at, &b.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = entries.len() as i64;
        let page = entries
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<Option<ContactHistory>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contact_history
            .iter()
            .find(|e| e.id == id && tables.entry_in_scope(organization_id, e))
            .cloned())
    }

    async fn create_contact_history(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        contact_type: ContactType,
        entry: &NewContactHistory,
    ) -> Result<ContactHistory, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.customer_visible(organization_id, entry.customer_id) {
            return Err(DatabaseError::NotFound("Customer not found".to_string()));
        }

        let now = Utc::now();
        let created = ContactHistory {
            id: Uuid::new_v4(),
            customer_id: entry.customer_id,
            user_id,
            contact_type,
            subject: entry.subject.clone(),
            content: entry.content.clone(),
            duration_minutes: entry.duration_minutes,
            attachments: entry.attachments.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.contact_history.push(created.clone());
        Ok(created)
    }

    async fn update_contact_history(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: &ContactHistoryPatch,
    ) -> Result<Option<ContactHistory>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .contact_history
            .iter()
            .position(|e| e.id == id && tables.entry_in_scope(organization_id, e))
        else {
            return Ok(None);
        };

        let entry = &mut tables.contact_history[index];
        if !patch.is_empty() {
            patch.apply(entry);
            entry.updated_at = Utc::now();
        }
        Ok(Some(entry.clone()))
    }

    async fn delete_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .contact_history
            .iter()
            .position(|e| e.id == id && tables.entry_in_scope(organization_id, e));
        Ok(position.map(|i| tables.contact_history.remove(i)).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CustomerStatus, UserRole};

    async fn registered(store: &MemoryStore, email: &str) -> (Organization, User) {
        store
            .register(
                NewOrganization { name: "Acme".into() },
                NewUser {
                    email: email.into(),
                    password_hash: "hash".into(),
                    first_name: "Ada".into(),
                    last_name: "Admin".into(),
                    role: UserRole::Admin,
                },
                NewPipeline::default_for_organization(),
            )
            .await
            .unwrap()
    }

    fn new_customer(email: &str) -> NewCustomer {
        NewCustomer {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: Some(email.into()),
            phone: None,
            company: None,
            position: None,
            status: CustomerStatus::Lead,
            source: None,
            tags: vec![],
            notes: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn duplicate_user_email_conflicts() {
        let store = MemoryStore::new();
        registered(&store, "owner@acme.test").await;
        let err = store
            .register(
                NewOrganization { name: "Other".into() },
                NewUser {
                    email: "OWNER@acme.test".into(),
                    password_hash: "hash".into(),
                    first_name: "B".into(),
                    last_name: "C".into(),
                    role: UserRole::Admin,
                },
                NewPipeline::default_for_organization(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn customer_email_is_unique_per_organization_only() {
        let store = MemoryStore::new();
        let (acme, acme_admin) = registered(&store, "a@acme.test").await;
        let (globex, globex_admin) = registered(&store, "a@globex.test").await;

        store.create_customer(acme.id, acme_admin.id, &new_customer("john@x.com")).await.unwrap();
        store.create_customer(globex.id, globex_admin.id, &new_customer("john@x.com")).await.unwrap();

        let dup = store.create_customer(acme.id, acme_admin.id, &new_customer("john@x.com")).await;
        assert!(matches!(dup, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn soft_deleted_customer_frees_its_email_and_stays_stored() {
        let store = MemoryStore::new();
        let (org, admin) = registered(&store, "a@acme.test").await;
        let customer = store.create_customer(org.id, admin.id, &new_customer("john@x.com")).await.unwrap();

        assert!(store.delete_customer(org.id, customer.id).await.unwrap());
        assert!(store.find_customer(org.id, customer.id).await.unwrap().is_none());
        let stored = store.find_customer_including_deleted(org.id, customer.id).await.unwrap().unwrap();
        assert!(stored.deleted_at.is_some());

        store.create_customer(org.id, admin.id, &new_customer("john@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn empty_patch_does_not_touch_updated_at() {
        let store = MemoryStore::new();
        let (org, admin) = registered(&store, "a@acme.test").await;
        let customer = store.create_customer(org.id, admin.id, &new_customer("john@x.com")).await.unwrap();

        let unchanged = store
            .update_customer(org.id, customer.id, &CustomerPatch::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.updated_at, customer.updated_at);
    }
}
