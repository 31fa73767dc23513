//! Compensating actions for multi-step writes

use crate::error::EntityKind;
use crate::Result;

/// Apply `desired`; on failure re-apply `snapshot` once and return the
/// original error. A failed compensation is logged as degraded, never returned.
pub(crate) fn update_with_rollback<E>(
    kind: EntityKind,
    identity: &str,
    snapshot: &E,
    desired: &E,
    apply: impl Fn(&E) -> Result<()>,
) -> Result<()> {
    let Err(err) = apply(desired) else {
        return Ok(());
    };

    tracing::warn!(kind = %kind, identity = %identity, error = %err, "Update failed, restoring previous state");
    match apply(snapshot) {
        Ok(()) => {
            tracing::warn!(kind = %kind, identity = %identity, "Previous state restored");
        }
        Err(rollback_err) => {
            tracing::error!(
                kind = %kind,
                identity = %identity,
                degraded = true,
                error = %err,
                rollback_error = %rollback_err,
                "Rollback failed, host state may have diverged"
            );
        }
    }

    Err(err)
}

/// Run `configure` on a freshly created entity; on failure `remove` it and
/// return the configuration error.
pub(crate) fn configure_or_remove(
    kind: EntityKind,
    identity: &str,
    configure: impl FnOnce() -> Result<()>,
    remove: impl FnOnce() -> Result<()>,
) -> Result<()> {
    let Err(err) = configure() else {
        return Ok(());
    };

    tracing::warn!(kind = %kind, identity = %identity, error = %err, "Configuration failed after create, removing");
    if let Err(remove_err) = remove() {
        tracing::error!(
            kind = %kind,
            identity = %identity,
            degraded = true,
            error = %err,
            remove_error = %remove_err,
            "Could not remove partially configured entity"
        );
    }

    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;

    #[test]
    fn test_update_success_skips_rollback() {
        let applied = RefCell::new(Vec::new());
        let result = update_with_rollback(EntityKind::ApplicationPool, "p", &1, &2, |v| {
            applied.borrow_mut().push(*v);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(*applied.borrow(), vec![2]);
    }

    #[test]
    fn test_update_failure_restores_snapshot() {
        let applied = RefCell::new(Vec::new());
        let result = update_with_rollback(EntityKind::ApplicationPool, "p", &1, &2, |v| {
            applied.borrow_mut().push(*v);
            if *v == 2 {
                Err(Error::Execution("rejected".into()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(Error::Execution(ref m)) if m == "rejected"));
        assert_eq!(*applied.borrow(), vec![2, 1]);
    }

    #[test]
    fn test_update_returns_original_when_rollback_fails() {
        let result = update_with_rollback(EntityKind::WebSite, "s", &1, &2, |v| {
            Err(Error::Execution(format!("failed {}", v)))
        });
        assert!(matches!(result, Err(Error::Execution(ref m)) if m == "failed 2"));
    }

    #[test]
    fn test_configure_or_remove() {
        let removed = RefCell::new(false);
        let result = configure_or_remove(
            EntityKind::WebSite,
            "s",
            || Err(Error::Execution("bad binding".into())),
            || {
                *removed.borrow_mut() = true;
                Err(Error::Execution("remove failed".into()))
            },
        );
        assert!(matches!(result, Err(Error::Execution(ref m)) if m == "bad binding"));
        assert!(*removed.borrow());

        let result = configure_or_remove(EntityKind::WebSite, "s", || Ok(()), || unreachable!());
        assert!(result.is_ok());
    }
}
