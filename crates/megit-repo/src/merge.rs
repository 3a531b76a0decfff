//! Merging another commit into `HEAD`.

use megit_dag::merge_base;
use megit_merge::{merge_trees, MergeConflict};
use megit_store::write_tree;
use megit_types::ObjectId;
use tracing::{info, warn};

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

/// What [`Repository::merge`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// `other` is already part of `HEAD`'s history. Nothing changed.
    UpToDate,
    /// `HEAD` was an ancestor of `other` and now points at it. No commit is
    /// needed.
    FastForward { from: ObjectId, to: ObjectId },
    /// The merged tree is in the working directory and the index, and
    /// `MERGE_HEAD` is set. A following commit records the merge.
    Merged {
        base: ObjectId,
        conflicts: Vec<MergeConflict>,
    },
}

impl Repository {
    /// Merge the commit `other` into `HEAD`.
    ///
    /// Conflicting hunks are written into the files between conflict
    /// markers; they do not fail the merge. Fails with
    /// [`RepoError::NoCommonHistory`] when the two commits share no ancestor.
    pub fn merge(&self, other: ObjectId) -> RepoResult<MergeOutcome> {
        let head = self.head()?.ok_or(RepoError::NoHead)?;
        let base = merge_base(self.objects(), other, head)?.ok_or(RepoError::NoCommonHistory {
            ours: head,
            theirs: other,
        })?;

        if base == other {
            info!(%head, %other, "already up to date");
            return Ok(MergeOutcome::UpToDate);
        }

        if base == head {
            let tree = self.get_commit(&other)?.tree;
            self.read_tree(&tree)?;
            self.reset(other)?;
            info!(from = %head, to = %other, "fast-forward");
            return Ok(MergeOutcome::FastForward {
                from: head,
                to: other,
            });
        }

        let base_tree = self.get_commit(&base)?.tree;
        let head_tree = self.get_commit(&head)?.tree;
        let other_tree = self.get_commit(&other)?.tree;
        let merged = merge_trees(
            self.objects(),
            Some(&base_tree),
            &head_tree,
            &other_tree,
            &self.config().conflict_labels(),
        )?;

        // Nothing on disk changes unless the result forms a valid tree.
        write_tree(self.objects(), &merged.files)?;
        self.workdir().empty()?;
        self.workdir().write_files(self.objects(), &merged.files)?;
        self.replace_index(merged.files)?;
        self.set_merge_head(Some(other))?;

        if merged.conflicts.is_empty() {
            info!(%head, %other, %base, "merged, commit to conclude");
        } else {
            warn!(conflicts = merged.conflicts.len(), "merged with conflicts");
        }
        Ok(MergeOutcome::Merged {
            base,
            conflicts: merged.conflicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::tests::{commit_all, read, repo, write};
    use megit_merge::ConflictKind;

    /// `main`: A -> B, `feature`: A -> C. Returns (A, B, C) with `main`
    /// checked out.
    fn diverged(
        repo: &Repository,
        main_edit: (&str, &str),
        feature_edit: (&str, &str),
    ) -> (ObjectId, ObjectId, ObjectId) {
        write(repo, "a.txt", "1\n2\n3\n4\n5\n");
        write(repo, "b.txt", "b\n");
        let a = commit_all(repo, "A");
        repo.create_branch("feature", a).unwrap();

        write(repo, main_edit.0, main_edit.1);
        let b = commit_all(repo, "B");

        repo.checkout("feature").unwrap();
        write(repo, feature_edit.0, feature_edit.1);
        let c = commit_all(repo, "C");

        repo.checkout("main").unwrap();
        (a, b, c)
    }

    #[test]
    fn fast_forward_moves_branch_without_commit() {
        let (_dir, repo) = repo();
        write(&repo, "f", "1");
        let a = commit_all(&repo, "A");
        write(&repo, "f", "2");
        let b = commit_all(&repo, "B");
        repo.reset(a).unwrap();
        repo.read_tree(&repo.get_commit(&a).unwrap().tree).unwrap();

        let outcome = repo.merge(b).unwrap();
        assert_eq!(outcome, MergeOutcome::FastForward { from: a, to: b });
        assert_eq!(repo.get_oid("main").unwrap(), b);
        assert_eq!(repo.get_branch_name().unwrap().as_deref(), Some("main"));
        assert_eq!(read(&repo, "f"), "2");
        assert!(!repo.status().unwrap().merge_in_progress());
    }

    #[test]
    fn merging_an_ancestor_is_a_noop() {
        let (_dir, repo) = repo();
        write(&repo, "f", "1");
        let a = commit_all(&repo, "A");
        write(&repo, "f", "2");
        let b = commit_all(&repo, "B");
        assert_eq!(repo.merge(a).unwrap(), MergeOutcome::UpToDate);
        assert_eq!(repo.head().unwrap(), Some(b));
    }

    #[test]
    fn diverged_merge_then_commit_has_two_parents() {
        let (_dir, repo) = repo();
        let (a, b, c) = diverged(&repo, ("a.txt", "one\n2\n3\n4\n5\n"), ("b.txt", "B\n"));

        let outcome = repo.merge(c).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                base: a,
                conflicts: vec![]
            }
        );
        assert_eq!(read(&repo, "a.txt"), "one\n2\n3\n4\n5\n");
        assert_eq!(read(&repo, "b.txt"), "B\n");
        assert_eq!(repo.status().unwrap().merge_head, Some(c));

        let m = repo.commit("merge").unwrap();
        let commit = repo.get_commit(&m).unwrap();
        assert_eq!(commit.parents, [b, c]);
        assert!(!repo.status().unwrap().merge_in_progress());
        assert_eq!(repo.get_oid("main").unwrap(), m);

        let files = repo.get_tree(&commit.tree, "").unwrap();
        assert_eq!(files, repo.get_working_tree().unwrap());
    }

    #[test]
    fn same_file_disjoint_lines_merge_cleanly() {
        let (_dir, repo) = repo();
        let (_, _, c) = diverged(
            &repo,
            ("a.txt", "one\n2\n3\n4\n5\n"),
            ("a.txt", "1\n2\n3\n4\nfive\n"),
        );
        let outcome = repo.merge(c).unwrap();
        assert!(matches!(outcome, MergeOutcome::Merged { ref conflicts, .. } if conflicts.is_empty()));
        assert_eq!(read(&repo, "a.txt"), "one\n2\n3\n4\nfive\n");
    }

    #[test]
    fn conflicting_merge_embeds_markers_and_still_commits() {
        let (_dir, repo) = repo();
        let (_, b, c) = diverged(
            &repo,
            ("a.txt", "1\nours\n3\n4\n5\n"),
            ("a.txt", "1\ntheirs\n3\n4\n5\n"),
        );

        let MergeOutcome::Merged { conflicts, .. } = repo.merge(c).unwrap() else {
            panic!("expected a three-way merge");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "a.txt");
        assert_eq!(conflicts[0].kind, ConflictKind::Content);
        assert_eq!(
            read(&repo, "a.txt"),
            "1\n<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> MERGE_HEAD\n3\n4\n5\n"
        );

        let m = repo.commit("merge with conflicts").unwrap();
        assert_eq!(repo.get_commit(&m).unwrap().parents, [b, c]);
    }

    #[test]
    fn file_directory_clash_materializes_ours_consistently() {
        let (_dir, repo) = repo();
        let (_, b, c) = diverged(&repo, ("x", "file\n"), ("x/y", "nested\n"));

        let MergeOutcome::Merged { conflicts, .. } = repo.merge(c).unwrap() else {
            panic!("expected a three-way merge");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "x/y");
        assert_eq!(conflicts[0].kind, ConflictKind::FileDirectory);
        assert_eq!(read(&repo, "x"), "file\n");
        assert_eq!(repo.status().unwrap().merge_head, Some(c));

        let m = repo.commit("merge").unwrap();
        let commit = repo.get_commit(&m).unwrap();
        assert_eq!(commit.parents, [b, c]);
        let files = repo.get_tree(&commit.tree, "").unwrap();
        assert_eq!(files, repo.get_working_tree().unwrap());
        assert!(files.contains_key("x") && files.contains_key("b.txt"));
        assert!(!files.contains_key("x/y"));
    }

    #[test]
    fn unrelated_histories_are_refused() {
        let (_dir, repo) = repo();
        write(&repo, "f", "1");
        let a = commit_all(&repo, "A");

        let (_dir2, other) = crate::repository::tests::repo();
        write(&other, "g", "1");
        let z = commit_all(&other, "Z");
        for id in megit_dag::iter_objects_in_commits(other.objects(), [z]) {
            megit_store::copy_object(&id.unwrap(), other.objects(), repo.objects()).unwrap();
        }

        let err = repo.merge(z).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCommonHistory);
        assert_eq!(repo.head().unwrap(), Some(a));
    }

    #[test]
    fn merge_requires_head() {
        let (_dir, repo) = repo();
        let err = repo.merge(ObjectId::from_bytes(b"x")).unwrap_err();
        assert!(matches!(err, RepoError::NoHead));
    }
}
