pub mod cache_service;
pub mod menu_preview_service;
pub mod menu_repository;
pub mod permission_registry;
