use super::manager::TaskManager;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Реестр менеджеров задач по типу задачи
#[derive(Default)]
pub struct TaskManagerRegistry {
    managers: BTreeMap<&'static str, Arc<dyn TaskManager>>,
}

impl TaskManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: TaskManager + 'static>(&mut self, manager: T) {
        self.managers.insert(manager.task_type(), Arc::new(manager));
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskManager>> {
        self.managers.get(task_type).cloned()
    }

    /// Зарегистрированные типы, для проверки заданий при создании
    pub fn task_types(&self) -> Vec<&'static str> {
        self.managers.keys().copied().collect()
    }
}
