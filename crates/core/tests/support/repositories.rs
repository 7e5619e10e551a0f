//! In-memory `TaskRepository` double

use std::collections::HashMap;

use async_trait::async_trait;
use gardenwise_core::TaskRepository;
use gardenwise_domain::{GardenwiseError, MaintenanceTask, Result as DomainResult};
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MockTaskRepository {
    tasks: Mutex<HashMap<Uuid, MaintenanceTask>>,
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self, id: Uuid) -> Option<MaintenanceTask> {
        self.tasks.lock().get(&id).cloned()
    }

    /// Overwrite a stored task directly, bypassing the scheduler.
    pub fn put(&self, task: MaintenanceTask) {
        self.tasks.lock().insert(task.id, task);
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<MaintenanceTask>> {
        Ok(self.stored(id))
    }

    async fn create(&self, task: &MaintenanceTask) -> DomainResult<()> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&task.id) {
            return Err(GardenwiseError::Database(format!("task {} already exists", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn save(&self, task: &MaintenanceTask) -> DomainResult<()> {
        let mut tasks = self.tasks.lock();
        if !tasks.contains_key(&task.id) {
            return Err(GardenwiseError::ScheduleNotFound(task.id.to_string()));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }
}
