//! Регламентные задания: расписание в таблице `sys_tasks`, воркер и
//! менеджеры по типам задач.

pub mod initialization;
pub mod logger;
pub mod manager;
pub mod managers;
pub mod registry;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod worker;
