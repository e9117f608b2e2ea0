//! Virtual user behavior: four weighted PetClinic tasks
//!
//! | Task              | Weight | Request                           |
//! |-------------------|--------|-----------------------------------|
//! | `list_owners`     | 40     | `GET /api/customer/owners`        |
//! | `get_owner_by_id` | 30     | `GET /api/customer/owners/{id}`   |
//! | `list_vets`       | 20     | `GET /api/vet/vets`               |
//! | `create_owner`    | 10     | `POST /api/customer/owners`       |

use std::sync::Arc;

use async_trait::async_trait;
use petclinic_core::{owner_path, HarnessError, Result, OWNERS, OWNER_BY_ID_NAME, VETS};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::registry::OwnerRegistry;
use crate::session::HttpSession;

/// What a task can touch while it runs
#[derive(Debug, Clone)]
pub struct UserContext {
    pub session: HttpSession,
    pub registry: Arc<OwnerRegistry>,
}

/// One action of the virtual user profile
#[async_trait]
pub trait UserTask: Send + Sync {
    /// Task name
    fn name(&self) -> &str;

    /// Relative selection weight
    fn weight(&self) -> u32;

    /// Execute the task once
    async fn execute(&self, ctx: &UserContext);
}

// ============================================================================
// PETCLINIC TASKS
// ============================================================================

/// Owners listing
pub struct ListOwners;

#[async_trait]
impl UserTask for ListOwners {
    fn name(&self) -> &str {
        "list_owners"
    }

    fn weight(&self) -> u32 {
        40
    }

    async fn execute(&self, ctx: &UserContext) {
        ctx.session.get(OWNERS, None).await;
    }
}

/// Single owner, id drawn from the shared registry
pub struct GetOwnerById;

#[async_trait]
impl UserTask for GetOwnerById {
    fn name(&self) -> &str {
        "get_owner_by_id"
    }

    fn weight(&self) -> u32 {
        30
    }

    async fn execute(&self, ctx: &UserContext) {
        let Some(id) = ctx.registry.random_pick() else {
            debug!("Owner registry is empty, skipping lookup");
            return;
        };
        ctx.session
            .get(&owner_path(id), Some(OWNER_BY_ID_NAME))
            .await;
    }
}

/// Vets listing
pub struct ListVets;

#[async_trait]
impl UserTask for ListVets {
    fn name(&self) -> &str {
        "list_vets"
    }

    fn weight(&self) -> u32 {
        20
    }

    async fn execute(&self, ctx: &UserContext) {
        ctx.session.get(VETS, None).await;
    }
}

/// Payload of the owner creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub telephone: String,
}

impl Default for NewOwner {
    fn default() -> Self {
        Self {
            first_name: "Usuario".to_string(),
            last_name: "TesteLocust".to_string(),
            address: "Rua do Teste, 123".to_string(),
            city: "Goiania".to_string(),
            telephone: "6299999999".to_string(),
        }
    }
}

/// Owner id from a creation response body. Zero and non-integer ids are ignored.
pub fn created_owner_id(body: &[u8]) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("id")?.as_u64().filter(|id| *id != 0)
}

/// Owner creation; registers the new id for later lookups
pub struct CreateOwner {
    payload: NewOwner,
}

impl CreateOwner {
    pub fn new(payload: NewOwner) -> Self {
        Self { payload }
    }
}

impl Default for CreateOwner {
    fn default() -> Self {
        Self::new(NewOwner::default())
    }
}

#[async_trait]
impl UserTask for CreateOwner {
    fn name(&self) -> &str {
        "create_owner"
    }

    fn weight(&self) -> u32 {
        10
    }

    async fn execute(&self, ctx: &UserContext) {
        let Some(reply) = ctx.session.post_json(OWNERS, None, &self.payload).await else {
            return;
        };
        if !reply.ok() {
            return;
        }
        // Unparseable bodies still count as successful creations
        if let Some(id) = created_owner_id(&reply.body) {
            if ctx.registry.add_if_absent(id) {
                trace!("Registered owner {}", id);
            }
        }
    }
}

// ============================================================================
// TASK SET
// ============================================================================

/// Tasks with their weighted selector
pub struct TaskSet {
    tasks: Vec<Arc<dyn UserTask>>,
    index: WeightedIndex<u32>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Arc<dyn UserTask>>) -> Result<Self> {
        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight()))
            .map_err(|e| HarnessError::Config(format!("invalid task weights: {}", e)))?;
        Ok(Self { tasks, index })
    }

    /// The PetClinic user profile
    pub fn petclinic() -> Result<Self> {
        Self::new(vec![
            Arc::new(ListOwners),
            Arc::new(GetOwnerById),
            Arc::new(ListVets),
            Arc::new(CreateOwner::default()),
        ])
    }

    /// Weighted random task
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Arc<dyn UserTask> {
        self.tasks[self.index.sample(rng)].clone()
    }

    pub fn tasks(&self) -> &[Arc<dyn UserTask>] {
        &self.tasks
    }

    pub fn total_weight(&self) -> u32 {
        self.tasks.iter().map(|t| t.weight()).sum()
    }
}
