use imerge_vcs::Oid;

/// Which side produced a cell's commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Auto,
    Manual,
}

/// A cell value (§3's `MergeRecord`): an optional commit plus the bitset of
/// provenance/blocked flags that govern how it is persisted.
///
/// Kept as an explicit flag struct rather than a `Cell = Unknown | Known`
/// sum type (as §9 suggests) because the save protocol needs to distinguish
/// "believed correct right now" from "currently written to a ref" — a cell
/// can carry `SAVED_AUTO` and `NEW_MANUAL` at once, mid-transition, and the
/// persistence layer needs both bits to know which ref to delete and which
/// to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeRecord {
    pub sha1: Option<Oid>,
    pub saved_auto: bool,
    pub new_auto: bool,
    pub saved_manual: bool,
    pub new_manual: bool,
    pub blocked: bool,
}

impl MergeRecord {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        self.sha1.is_some()
    }

    pub fn is_manual(&self) -> bool {
        self.saved_manual || self.new_manual
    }

    pub fn is_auto(&self) -> bool {
        self.saved_auto || self.new_auto
    }

    /// Record a commit produced automatically. Per §3, MANUAL always
    /// supersedes AUTO — recording an auto value over a manual one is a
    /// no-op for provenance (though the caller should not normally do this).
    pub fn record_auto(&mut self, oid: Oid) {
        if self.is_manual() {
            return;
        }
        self.sha1 = Some(oid);
        self.new_auto = true;
        self.blocked = false;
    }

    /// Record a commit resolved by the user. NEW_MANUAL clears NEW_AUTO
    /// (§3); the SAVED_AUTO bit, if any, survives until `persist::save`
    /// deletes the stale ref.
    pub fn record_manual(&mut self, oid: Oid) {
        self.sha1 = Some(oid);
        self.new_manual = true;
        self.new_auto = false;
        self.blocked = false;
    }

    pub fn mark_blocked(&mut self) {
        self.blocked = true;
    }

    pub fn clear_blocked(&mut self) {
        self.blocked = false;
    }

    /// Construct a cell as it is read back from a `SAVED_AUTO`/`SAVED_MANUAL`
    /// ref, before blockers from the state blob are applied.
    pub fn from_saved(source: Source, oid: Oid) -> Self {
        let mut record = Self::unknown();
        record.sha1 = Some(oid);
        match source {
            Source::Auto => record.saved_auto = true,
            Source::Manual => record.saved_manual = true,
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_hash::ObjectId;

    fn oid(b: u8) -> Oid {
        ObjectId::from_bytes(&[b; 20], git_hash::HashAlgorithm::Sha1).unwrap()
    }

    #[test]
    fn manual_supersedes_auto() {
        let mut cell = MergeRecord::unknown();
        cell.record_auto(oid(1));
        assert!(cell.new_auto);
        cell.record_manual(oid(2));
        assert_eq!(cell.sha1, Some(oid(2)));
        assert!(cell.new_manual);
        assert!(!cell.new_auto, "NEW_MANUAL must clear NEW_AUTO");
    }

    #[test]
    fn auto_does_not_override_manual() {
        let mut cell = MergeRecord::unknown();
        cell.record_manual(oid(1));
        cell.record_auto(oid(2));
        assert_eq!(cell.sha1, Some(oid(1)), "manual always supersedes auto");
    }

    #[test]
    fn blocked_is_orthogonal_to_unknown() {
        let mut cell = MergeRecord::unknown();
        cell.mark_blocked();
        assert!(!cell.is_known());
        assert!(cell.blocked);
    }

    #[test]
    fn recording_clears_blocked() {
        let mut cell = MergeRecord::unknown();
        cell.mark_blocked();
        cell.record_auto(oid(1));
        assert!(!cell.blocked);
    }
}
