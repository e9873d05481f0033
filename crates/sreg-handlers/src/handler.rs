use async_trait::async_trait;

use sreg_types::{Entity, Specification};

use crate::error::HandlerResult;

/// A pluggable hook around entity mutations.
///
/// Insert and update hooks return the specification to persist, which may
/// differ from the candidate's (a transforming handler) or be refused with
/// an error (a veto). Delete hooks are best effort: the caller logs their
/// failures and deletes anyway.
///
/// Every hook has a pass-through default, so a handler only overrides the
/// operations it cares about.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    async fn handle_insert(&self, candidate: &Entity) -> HandlerResult<Specification> {
        Ok(candidate.specification.clone())
    }

    async fn handle_update(
        &self,
        candidate: &Entity,
        _existing: &Entity,
    ) -> HandlerResult<Specification> {
        Ok(candidate.specification.clone())
    }

    async fn handle_delete(&self, _entity: &Entity) -> HandlerResult<()> {
        Ok(())
    }
}
