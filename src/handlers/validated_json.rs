//! JSON body extractor that enforces the wire contract before a handler
//! runs. Malformed JSON, missing or mistyped fields and rule violations all
//! become a `400` with per-field detail, so nothing invalid reaches the store.

use crate::{
    errors::AppError,
    models::upload::{Validate, ValidationError},
};
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let field = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "content-type",
        _ => "body",
    };
    AppError::validation(ValidationError::single(field, rejection.body_text()))
}
