pub mod assignment_service;
pub mod chat_service;
pub mod checkpoint_service;
pub mod project_service;
pub mod request_service;
pub mod task_service;

pub use assignment_service::*;
pub use chat_service::*;
pub use checkpoint_service::*;
pub use project_service::*;
pub use request_service::*;
pub use task_service::*;

use atelier_types::{Principal, Role};

use crate::error::{AtelierError, Result};

/// Role precondition check. The dispatcher gates commands too, but the
/// engine never assumes the caller was pre-validated.
pub(crate) fn require_role(principal: &Principal, role: Role) -> Result<()> {
    if principal.role == role {
        Ok(())
    } else {
        Err(AtelierError::Forbidden(format!(
            "{} role required",
            role.as_str()
        )))
    }
}
