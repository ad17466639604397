pub mod menu_drag;
pub mod menu_import;
pub mod menu_manager;
pub mod menu_mutation;
pub mod menu_query;
pub mod menu_store;
pub mod menu_tree;
pub mod menu_ui_state;
pub mod permission_evaluator;
