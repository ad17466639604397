pub mod menu_permission_entity;
pub mod menu_request_dto;
pub mod menu_result_dto;
