pub mod assessment_dto;
pub mod evaluation_dto;
