// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

use crate::application::use_cases::probe_cycle::CycleError;
use crate::domain::repositories::target_repository::RepositoryError;
use crate::domain::services::publisher::PublishError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<ValidationErrors>().is_some() {
            return StatusCode::UNPROCESSABLE_ENTITY;
        }

        match self.0.downcast_ref::<PublishError>() {
            Some(PublishError::Serialization(_)) => return StatusCode::INTERNAL_SERVER_ERROR,
            Some(_) => return StatusCode::SERVICE_UNAVAILABLE,
            None => {}
        }

        match self.0.downcast_ref::<CycleError>() {
            Some(CycleError::Publish(PublishError::Serialization(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Some(CycleError::Publish(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Some(CycleError::Resolve(RepositoryError::NotConfigured)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Some(CycleError::Resolve(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            None => match self.0.downcast_ref::<RepositoryError>() {
                Some(RepositoryError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    use crate::application::dto::probe_request::ProbeRequestDto;

    #[test]
    fn test_validation_error_is_unprocessable() {
        let dto = ProbeRequestDto {
            urls: vec![],
            max_concurrent: None,
            timeout: None,
        };
        let err = AppError::from(dto.validate().unwrap_err());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_publisher_unavailable() {
        let err = AppError::from(PublishError::Transport("connection refused".into()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = AppError::from(CycleError::Resolve(RepositoryError::NotConfigured));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
