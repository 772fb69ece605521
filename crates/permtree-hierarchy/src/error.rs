//! Hierarchy service error types.
//!
//! Every variant maps to a stable error code. Client errors describe what
//! was wrong with the request; store failures collapse into
//! [`HierarchyError::Internal`] so no storage detail reaches callers.

use permtree_core::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("invalid request format")]
    InvalidRequestFormat,

    #[error("id is required")]
    MissingId,

    #[error("resource server not found")]
    ResourceServerNotFound,

    #[error("resource server name already exists")]
    NameConflict,

    #[error("parent resource not found")]
    ParentResourceNotFound,

    #[error("cannot delete an entity that has dependencies")]
    CannotDelete,

    #[error("circular dependency detected")]
    CircularDependency,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("action not found")]
    ActionNotFound,

    #[error("organization unit not found")]
    OrganizationUnitNotFound,

    #[error("invalid limit parameter")]
    InvalidLimit,

    #[error("invalid offset parameter")]
    InvalidOffset,

    #[error("resource server identifier already exists")]
    IdentifierConflict,

    #[error("handle already exists in this scope")]
    HandleConflict,

    #[error("invalid delimiter")]
    InvalidDelimiter,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("handle contains the delimiter character")]
    DelimiterInHandle,

    #[error("internal server error")]
    Internal,

    /// The service was constructed with an unusable configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

impl HierarchyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequestFormat => "RES-1001",
            Self::MissingId => "RES-1002",
            Self::ResourceServerNotFound => "RES-1003",
            Self::NameConflict => "RES-1004",
            Self::ParentResourceNotFound => "RES-1005",
            Self::CannotDelete => "RES-1006",
            Self::CircularDependency => "RES-1007",
            Self::ResourceNotFound => "RES-1008",
            Self::ActionNotFound => "RES-1009",
            Self::OrganizationUnitNotFound => "RES-1010",
            Self::InvalidLimit => "RES-1011",
            Self::InvalidOffset => "RES-1012",
            Self::IdentifierConflict => "RES-1013",
            Self::HandleConflict => "RES-1014",
            Self::InvalidDelimiter => "RES-1015",
            Self::InvalidHandle => "RES-1016",
            Self::DelimiterInHandle => "RES-1017",
            Self::Internal | Self::Configuration(_) => "SSE-5000",
        }
    }

    /// Short, human-readable error title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidRequestFormat | Self::MissingId => "Invalid request format",
            Self::ResourceServerNotFound => "Resource server not found",
            Self::NameConflict => "Name conflict",
            Self::ParentResourceNotFound => "Parent resource not found",
            Self::CannotDelete => "Cannot delete",
            Self::CircularDependency => "Circular dependency detected",
            Self::ResourceNotFound => "Resource not found",
            Self::ActionNotFound => "Action not found",
            Self::OrganizationUnitNotFound => "Organization unit not found",
            Self::InvalidLimit => "Invalid limit parameter",
            Self::InvalidOffset => "Invalid offset parameter",
            Self::IdentifierConflict => "Identifier conflict",
            Self::HandleConflict => "Handle conflict",
            Self::InvalidDelimiter => "Invalid delimiter",
            Self::InvalidHandle => "Invalid handle",
            Self::DelimiterInHandle => "Delimiter conflict in handle",
            Self::Internal | Self::Configuration(_) => "Internal server error",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidRequestFormat => "The request body is malformed or contains invalid data",
            Self::MissingId => "ID is required",
            Self::ResourceServerNotFound => "The resource server with the specified id does not exist",
            Self::NameConflict => "A resource server with the same name already exists",
            Self::ParentResourceNotFound => "The specified parent resource does not exist",
            Self::CannotDelete => "Cannot delete resource server/resource that has dependencies",
            Self::CircularDependency => "Setting this parent would create a circular dependency",
            Self::ResourceNotFound => "The resource with the specified id does not exist",
            Self::ActionNotFound => "The action with the specified id does not exist",
            Self::OrganizationUnitNotFound => "The specified organization unit does not exist",
            Self::InvalidLimit => "The limit parameter must be a positive integer",
            Self::InvalidOffset => "The offset parameter must be a non-negative integer",
            Self::IdentifierConflict => "A resource server with the same identifier already exists",
            Self::HandleConflict => "The same handle already exists within the specified resource",
            Self::InvalidDelimiter => "Delimiter must be a single character from . _ : - /",
            Self::InvalidHandle => {
                "Handle must be at most 100 characters and contain only a-z A-Z 0-9 . _ : - /"
            }
            Self::DelimiterInHandle => "Handle cannot contain the delimiter character",
            Self::Internal | Self::Configuration(_) => {
                "An unexpected error occurred while processing the request"
            }
        }
    }

    /// True for errors caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal | Self::Configuration(_))
    }
}

impl From<ValidationError> for HierarchyError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidDelimiter => Self::InvalidDelimiter,
            ValidationError::InvalidHandle => Self::InvalidHandle,
            ValidationError::DelimiterInHandle => Self::DelimiterInHandle,
            ValidationError::InvalidLimit => Self::InvalidLimit,
            ValidationError::InvalidOffset => Self::InvalidOffset,
        }
    }
}
