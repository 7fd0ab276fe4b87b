use crate::{HeadState, Vcs, VcsError};

/// Scoped acquisition of HEAD — the "temporary HEAD" guard of SPEC_FULL.md
/// §5/§9. Records where HEAD points on construction; callers restore it by
/// calling `release` with the same `Vcs` before the guard goes out of scope.
///
/// Restoration needs a `&mut dyn Vcs` to issue the checkout/reset, which
/// `Drop::drop` has no way to obtain, so this is not true RAII: `Drop` only
/// catches the case where `release` was skipped (an early return, a `?`, a
/// panic) and reports it rather than silently leaving HEAD detached.
/// Every call site that acquires a guard must call `release` on every exit
/// path, including error paths.
pub struct HeadGuard {
    saved: Option<HeadState>,
    restored: bool,
}

impl HeadGuard {
    /// Record the current HEAD state for later restoration.
    pub fn acquire(vcs: &dyn Vcs) -> Result<Self, VcsError> {
        Ok(Self {
            saved: Some(vcs.head_state()?),
            restored: false,
        })
    }

    /// Restore HEAD now, consuming the guard's responsibility to do so later.
    pub fn release(mut self, vcs: &mut dyn Vcs) -> Result<(), VcsError> {
        self.restore(vcs)
    }

    fn restore(&mut self, vcs: &mut dyn Vcs) -> Result<(), VcsError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        match self.saved.take() {
            Some(HeadState::Symbolic(branch)) => vcs.checkout(&branch, true),
            Some(HeadState::Detached(oid)) => vcs.reset_hard(&oid),
            Some(HeadState::Unborn) | None => Ok(()),
        }
    }
}

impl Drop for HeadGuard {
    fn drop(&mut self) {
        if !self.restored {
            eprintln!("imerge: internal error: HeadGuard dropped without release, HEAD may be left detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent_after_drop() {
        // release() marks restored; a subsequent Drop must not attempt a
        // second restoration. Exercised via the `restored` flag directly
        // since HeadGuard needs a live Vcs to restore against.
        let mut guard = HeadGuard {
            saved: Some(HeadState::Unborn),
            restored: false,
        };
        guard.restored = true;
        drop(guard);
    }
}
