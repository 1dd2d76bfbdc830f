use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::error::AppError;
use crate::modules::storage::SignedMethod;
use crate::shared::constants::TRANSFER_BASIC;

/// Transfer direction requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    /// HTTP method the presigned URL must authorize
    pub fn method(self) -> SignedMethod {
        match self {
            Operation::Upload => SignedMethod::Put,
            Operation::Download => SignedMethod::Get,
        }
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(operation: &str) -> Result<Self, Self::Err> {
        match operation {
            "upload" => Ok(Operation::Upload),
            "download" => Ok(Operation::Download),
            other => Err(AppError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Batch request body.
///
/// `operation` stays a string here so an unknown value surfaces as an
/// unsupported operation rather than a JSON error. Other protocol fields
/// (`transfers`, `ref`, `hash_algo`) are accepted and ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchRequestDto {
    pub operation: String,
    #[validate(nested)]
    pub objects: Vec<ObjectRefDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ObjectRefDto {
    #[validate(length(min = 1, message = "oid must not be empty"))]
    pub oid: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedActionDto {
    pub href: String,
    pub expires_in: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponseObjectDto {
    pub oid: String,
    pub size: u64,
    pub authenticated: bool,
    pub actions: BTreeMap<Operation, SignedActionDto>,
}

impl BatchResponseObjectDto {
    /// Presigned URLs carry their own auth, so every object is `authenticated`
    pub fn signed(object: ObjectRefDto, operation: Operation, action: SignedActionDto) -> Self {
        Self {
            oid: object.oid,
            size: object.size,
            authenticated: true,
            actions: BTreeMap::from([(operation, action)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponseDto {
    pub transfer: String,
    pub objects: Vec<BatchResponseObjectDto>,
}

impl BatchResponseDto {
    pub fn basic(objects: Vec<BatchResponseObjectDto>) -> Self {
        Self {
            transfer: TRANSFER_BASIC.to_string(),
            objects,
        }
    }
}
