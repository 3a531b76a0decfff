use std::collections::HashSet;

use megit_dag::iter_objects_in_commits;
use megit_refs::iter_refs;
use megit_types::ObjectId;
use tracing::debug;

use crate::error::SyncResult;
use crate::types::Endpoint;

/// Objects the `remote` side already has, as far as `local` can tell.
///
/// Every commit a remote ref points at that also exists locally is walked in
/// the local store; everything reachable from it is assumed present on the
/// remote. Remote tips the local store has never seen contribute nothing.
pub fn known_objects(local: Endpoint<'_>, remote: Endpoint<'_>) -> SyncResult<HashSet<ObjectId>> {
    let mut tips = Vec::new();
    for item in iter_refs(remote.refs, "", true)? {
        let (name, value) = item?;
        if let Some(id) = value.oid().filter(|id| local.objects.object_exists(id)) {
            debug!(%name, %id, "remote tip known locally");
            tips.push(id);
        }
    }
    let known = iter_objects_in_commits(local.objects, tips).collect::<Result<_, _>>()?;
    Ok(known)
}
