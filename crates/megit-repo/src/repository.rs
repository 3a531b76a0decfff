use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use megit_diff::{diff_blobs, diff_path_maps, diff_trees, BlobDiff, TreeChange, TreeDiff};
use megit_index::{compute_status, with_index, Index, IndexError, Workdir, WorkdirStatus, METADATA_DIR};
use megit_refs::{
    branch_ref, delete_ref, get_oid, get_ref, iter_refs, tag_ref, update_ref, validate_branch_name,
    validate_tag_name, FileRefStore, RefIter, RefValue, HEAD, HEADS_PREFIX, MERGE_HEAD,
};
use megit_store::{get_tree, Commit, FileObjectStore, ObjectKind, ObjectStore};
use megit_sync::Endpoint;
use megit_types::ObjectId;
use tracing::{debug, info};

use crate::config::{RepoConfig, CONFIG_FILE};
use crate::error::{RepoError, RepoResult};

const INDEX_FILE: &str = "index";

/// A working directory together with its `.megit` metadata directory.
pub struct Repository {
    workdir: Workdir,
    metadata_dir: PathBuf,
    objects: FileObjectStore,
    refs: FileRefStore,
    config: RepoConfig,
}

/// Snapshot of where the repository stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoStatus {
    /// Branch `HEAD` points at, `None` when detached.
    pub branch: Option<String>,
    pub head: Option<ObjectId>,
    /// Set while a three-way merge waits to be committed.
    pub merge_head: Option<ObjectId>,
    pub changes: WorkdirStatus,
}

impl RepoStatus {
    pub fn merge_in_progress(&self) -> bool {
        self.merge_head.is_some()
    }
}

impl Repository {
    /// Create (or reinitialize) a repository rooted at `root`.
    ///
    /// Existing objects, refs and config are kept. A fresh repository gets a
    /// default config and `HEAD` pointing at the default branch.
    pub fn init(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref();
        let metadata_dir = root.join(METADATA_DIR);
        fs::create_dir_all(&metadata_dir)?;
        let objects = FileObjectStore::init(&metadata_dir)?;
        let refs = FileRefStore::init(&metadata_dir)?;

        let config = RepoConfig::load(&metadata_dir)?;
        if !metadata_dir.join(CONFIG_FILE).exists() {
            config.save(&metadata_dir)?;
        }
        if get_ref(&refs, HEAD, false)?.is_none() {
            let head = RefValue::Symbolic(branch_ref(&config.core.default_branch));
            update_ref(&refs, HEAD, &head, false)?;
        }

        info!(path = %metadata_dir.display(), "initialized repository");
        Ok(Self {
            workdir: Workdir::new(root),
            metadata_dir,
            objects,
            refs,
            config,
        })
    }

    /// Open the repository whose working directory is exactly `root`.
    pub fn open(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref();
        let metadata_dir = root.join(METADATA_DIR);
        if !metadata_dir.is_dir() {
            return Err(RepoError::NotARepository(root.to_path_buf()));
        }
        let config = RepoConfig::load(&metadata_dir)?;
        Ok(Self {
            workdir: Workdir::new(root),
            objects: FileObjectStore::open(&metadata_dir),
            refs: FileRefStore::open(&metadata_dir),
            metadata_dir,
            config,
        })
    }

    /// Open the nearest repository at or above `start`.
    pub fn discover(start: impl AsRef<Path>) -> RepoResult<Self> {
        let start = start.as_ref();
        match start.ancestors().find(|dir| dir.join(METADATA_DIR).is_dir()) {
            Some(root) => Self::open(root),
            None => Err(RepoError::NotARepository(start.to_path_buf())),
        }
    }

    // ---- Accessors ----

    pub fn root(&self) -> &Path {
        self.workdir.root()
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn objects(&self) -> &FileObjectStore {
        &self.objects
    }

    pub fn refs(&self) -> &FileRefStore {
        &self.refs
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub(crate) fn workdir(&self) -> &Workdir {
        &self.workdir
    }

    pub(crate) fn endpoint(&self) -> Endpoint<'_> {
        Endpoint::new(&self.objects, &self.refs)
    }

    // ---- Objects ----

    pub fn hash_object(&self, data: &[u8], kind: ObjectKind) -> RepoResult<ObjectId> {
        Ok(self.objects.hash_object(data, kind)?)
    }

    /// Payload of `id`. With `expected`, fails unless the object has that kind.
    pub fn get_object(&self, id: &ObjectId, expected: Option<ObjectKind>) -> RepoResult<Vec<u8>> {
        Ok(self.objects.get_object(id, expected)?)
    }

    pub fn object_kind(&self, id: &ObjectId) -> RepoResult<ObjectKind> {
        Ok(self.objects.require(id)?.kind)
    }

    // ---- Index and snapshots ----

    pub(crate) fn index_path(&self) -> PathBuf {
        self.metadata_dir.join(INDEX_FILE)
    }

    /// The index as currently persisted.
    pub fn index(&self) -> RepoResult<Index> {
        Ok(Index::load(&self.index_path())?)
    }

    /// Stage files and directories. Returns the number of files staged.
    pub fn add(&self, paths: &[PathBuf]) -> RepoResult<usize> {
        let staged = with_index(&self.index_path(), |index| {
            self.workdir.add(&self.objects, index, paths)
        })?;
        debug!(staged, "added paths");
        Ok(staged)
    }

    /// Store the index as a tree and return its id.
    pub fn write_tree(&self) -> RepoResult<ObjectId> {
        Ok(self.index()?.write_tree(&self.objects)?)
    }

    /// Replace the working tree and the index with the snapshot `tree`.
    ///
    /// Local modifications are discarded without warning.
    pub fn read_tree(&self, tree: &ObjectId) -> RepoResult<()> {
        let files = self.workdir.read_tree(&self.objects, tree)?;
        self.replace_index(files)
    }

    pub(crate) fn replace_index(&self, files: BTreeMap<String, ObjectId>) -> RepoResult<()> {
        with_index(&self.index_path(), |index| {
            index.replace(files);
            Ok::<_, IndexError>(())
        })?;
        Ok(())
    }

    /// Flatten a stored tree into `path -> blob id`, paths under `base`.
    pub fn get_tree(&self, tree: &ObjectId, base: &str) -> RepoResult<BTreeMap<String, ObjectId>> {
        Ok(get_tree(&self.objects, tree, base)?)
    }

    /// Hash the files on disk without storing them.
    pub fn get_working_tree(&self) -> RepoResult<BTreeMap<String, ObjectId>> {
        Ok(self.workdir.working_tree()?)
    }

    // ---- Commits ----

    /// Record the index as a new commit on top of `HEAD`.
    ///
    /// A pending `MERGE_HEAD` becomes the second parent and is cleared.
    pub fn commit(&self, message: &str) -> RepoResult<ObjectId> {
        let tree = self.write_tree()?;
        let head = self.head()?;
        let merge_head = self.ref_oid(MERGE_HEAD)?;
        let parents: Vec<ObjectId> = head.into_iter().chain(merge_head).collect();

        let id = self.objects.write_commit(&Commit::new(tree, parents, message))?;
        update_ref(&self.refs, HEAD, &RefValue::Direct(id), true)?;
        if merge_head.is_some() {
            delete_ref(&self.refs, MERGE_HEAD, false)?;
        }
        info!(%id, %tree, merge = merge_head.is_some(), "committed");
        Ok(id)
    }

    pub fn get_commit(&self, id: &ObjectId) -> RepoResult<Commit> {
        Ok(self.objects.read_commit(id)?)
    }

    /// Materialize the commit `name` resolves to and move `HEAD` there.
    ///
    /// A local branch name leaves `HEAD` attached to that branch; anything
    /// else detaches it at the commit.
    pub fn checkout(&self, name: &str) -> RepoResult<ObjectId> {
        let id = self.get_oid(name)?;
        let commit = self.get_commit(&id)?;
        self.read_tree(&commit.tree)?;

        let head = if self.is_branch(name)? {
            RefValue::Symbolic(branch_ref(name))
        } else {
            RefValue::Direct(id)
        };
        update_ref(&self.refs, HEAD, &head, false)?;
        info!(name, %id, detached = !head.is_symbolic(), "checked out");
        Ok(id)
    }

    /// Move whatever `HEAD` points at to `id`. The working tree and index
    /// are left alone.
    pub fn reset(&self, id: ObjectId) -> RepoResult<()> {
        update_ref(&self.refs, HEAD, &RefValue::Direct(id), true)?;
        info!(%id, "reset");
        Ok(())
    }

    // ---- Refs ----

    fn ref_oid(&self, name: &str) -> RepoResult<Option<ObjectId>> {
        Ok(get_ref(&self.refs, name, true)?.and_then(|v| v.oid()))
    }

    /// The commit `HEAD` resolves to, `None` before the first commit.
    pub fn head(&self) -> RepoResult<Option<ObjectId>> {
        self.ref_oid(HEAD)
    }

    pub(crate) fn merge_head(&self) -> RepoResult<Option<ObjectId>> {
        self.ref_oid(MERGE_HEAD)
    }

    pub(crate) fn set_merge_head(&self, id: Option<ObjectId>) -> RepoResult<()> {
        match id {
            Some(id) => update_ref(&self.refs, MERGE_HEAD, &RefValue::Direct(id), false)?,
            None => {
                delete_ref(&self.refs, MERGE_HEAD, false)?;
            }
        }
        Ok(())
    }

    pub fn create_branch(&self, name: &str, id: ObjectId) -> RepoResult<()> {
        validate_branch_name(name)?;
        update_ref(&self.refs, &branch_ref(name), &RefValue::Direct(id), true)?;
        info!(name, %id, "created branch");
        Ok(())
    }

    pub fn create_tag(&self, name: &str, id: ObjectId) -> RepoResult<()> {
        validate_tag_name(name)?;
        update_ref(&self.refs, &tag_ref(name), &RefValue::Direct(id), true)?;
        info!(name, %id, "created tag");
        Ok(())
    }

    pub fn is_branch(&self, name: &str) -> RepoResult<bool> {
        Ok(get_ref(&self.refs, &branch_ref(name), true)?.is_some())
    }

    /// Short names of all local branches, sorted.
    pub fn iter_branch_names(&self) -> RepoResult<Vec<String>> {
        let mut names = Vec::new();
        for item in iter_refs(&self.refs, HEADS_PREFIX, false)? {
            let (name, _) = item?;
            if let Some(short) = name.strip_prefix(HEADS_PREFIX) {
                names.push(short.to_string());
            }
        }
        Ok(names)
    }

    /// The branch `HEAD` is attached to, `None` when detached.
    pub fn get_branch_name(&self) -> RepoResult<Option<String>> {
        Ok(match get_ref(&self.refs, HEAD, false)? {
            Some(RefValue::Symbolic(target)) => target.strip_prefix(HEADS_PREFIX).map(str::to_string),
            _ => None,
        })
    }

    /// Resolve a ref name, tag, branch, `@` or raw hex id.
    pub fn get_oid(&self, name: &str) -> RepoResult<ObjectId> {
        Ok(get_oid(&self.refs, name)?)
    }

    pub fn iter_refs(&self, prefix: &str, deref: bool) -> RepoResult<RefIter<'_>> {
        Ok(iter_refs(&self.refs, prefix, deref)?)
    }

    /// Commits reachable from `seeds`, first parents first.
    pub fn iter_commits_and_parents<I>(&self, seeds: I) -> impl Iterator<Item = RepoResult<ObjectId>> + '_
    where
        I: IntoIterator,
        I::Item: Into<Option<ObjectId>>,
    {
        megit_dag::iter_commits_and_parents(&self.objects, seeds).map(|step| step.map_err(RepoError::from))
    }

    // ---- Status and diff ----

    fn commit_files(&self, id: Option<ObjectId>) -> RepoResult<BTreeMap<String, ObjectId>> {
        match id {
            Some(id) => self.get_tree(&self.get_commit(&id)?.tree, ""),
            None => Ok(BTreeMap::new()),
        }
    }

    pub fn status(&self) -> RepoResult<RepoStatus> {
        let head = self.head()?;
        let head_files = self.commit_files(head)?;
        let index = self.index()?;
        let working = self.get_working_tree()?;
        Ok(RepoStatus {
            branch: self.get_branch_name()?,
            head,
            merge_head: self.merge_head()?,
            changes: compute_status(&head_files, index.entries(), &working),
        })
    }

    /// Changes from the `HEAD` snapshot to the files on disk.
    pub fn diff_working(&self) -> RepoResult<TreeDiff> {
        let head_files = self.commit_files(self.head()?)?;
        Ok(diff_path_maps(&head_files, &self.get_working_tree()?))
    }

    /// Changes between the snapshots of two commits.
    pub fn diff_commits(&self, old: &ObjectId, new: &ObjectId) -> RepoResult<TreeDiff> {
        let old_tree = self.get_commit(old)?.tree;
        let new_tree = self.get_commit(new)?.tree;
        Ok(diff_trees(&self.objects, Some(&old_tree), Some(&new_tree))?)
    }

    /// Line diff for one change. Content that was never stored is read from
    /// the working tree.
    pub fn diff_change(&self, change: &TreeChange) -> RepoResult<BlobDiff> {
        let old = match change.old_id() {
            Some(id) => self.blob_or_file(&id, change.path())?,
            None => Vec::new(),
        };
        let new = match change.new_id() {
            Some(id) => self.blob_or_file(&id, change.path())?,
            None => Vec::new(),
        };
        Ok(diff_blobs(&old, &new))
    }

    fn blob_or_file(&self, id: &ObjectId, path: &str) -> RepoResult<Vec<u8>> {
        if self.objects.object_exists(id) {
            return self.get_object(id, Some(ObjectKind::Blob));
        }
        Ok(fs::read(self.root().join(path))?)
    }
}
