mod batch_dto;

pub use batch_dto::*;
