use megit_dag::{is_ancestor_of, iter_objects_in_commits};
use megit_refs::{get_ref, iter_refs, remote_ref, update_ref, validate_remote_name, RefValue, HEADS_PREFIX};
use megit_store::copy_object;
use megit_types::ObjectId;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::negotiation::known_objects;
use crate::types::{Endpoint, FetchResult, PushResult, RefUpdate};

fn current_oid(endpoint: Endpoint<'_>, name: &str) -> SyncResult<Option<ObjectId>> {
    Ok(get_ref(endpoint.refs, name, true)?.and_then(|v| v.oid()))
}

/// Copy every branch of `remote` into `local`.
///
/// For each `refs/heads/<branch>` on the remote, all objects reachable from
/// it are copied into the local store if missing, then the tracking ref
/// `refs/remote/<remote_name>/<branch>` is set to the remote tip. Local
/// branches are never touched.
pub fn fetch(local: Endpoint<'_>, remote: Endpoint<'_>, remote_name: &str) -> SyncResult<FetchResult> {
    validate_remote_name(remote_name)?;
    let mut result = FetchResult::default();

    for item in iter_refs(remote.refs, HEADS_PREFIX, true)? {
        let (name, value) = item?;
        let Some(tip) = value.oid() else {
            continue;
        };
        for id in iter_objects_in_commits(remote.objects, [tip]) {
            if copy_object(&id?, remote.objects, local.objects)? {
                result.objects_received += 1;
            }
        }

        let branch = name.strip_prefix(HEADS_PREFIX).unwrap_or(&name);
        let tracking = remote_ref(remote_name, branch);
        let old = current_oid(local, &tracking)?;
        update_ref(local.refs, &tracking, &RefValue::Direct(tip), true)?;
        debug!(%tracking, %tip, "tracking ref updated");
        result.refs_updated.push(RefUpdate {
            name: tracking,
            old,
            new: tip,
        });
    }

    info!(
        remote = remote_name,
        objects = result.objects_received,
        refs = result.refs_updated.len(),
        "fetch complete"
    );
    Ok(result)
}

/// Publish the local ref `refname` to `remote`.
///
/// The remote ref must be absent or an ancestor of the local tip. Only
/// objects not already reachable from the remote's refs are copied, then the
/// remote ref is moved to the local tip.
pub fn push(local: Endpoint<'_>, remote: Endpoint<'_>, refname: &str) -> SyncResult<PushResult> {
    let tip = current_oid(local, refname)?.ok_or_else(|| SyncError::MissingRef(refname.to_string()))?;
    let old = current_oid(remote, refname)?;
    if let Some(old) = old {
        if !is_ancestor_of(local.objects, tip, old)? {
            return Err(SyncError::NotFastForward(refname.to_string()));
        }
    }

    let known = known_objects(local, remote)?;
    let mut objects_sent = 0;
    for id in iter_objects_in_commits(local.objects, [tip]) {
        let id = id?;
        if known.contains(&id) {
            continue;
        }
        if copy_object(&id, local.objects, remote.objects)? {
            objects_sent += 1;
        }
    }

    update_ref(remote.refs, refname, &RefValue::Direct(tip), true)?;
    info!(refname, %tip, objects = objects_sent, "push complete");
    Ok(PushResult {
        objects_sent,
        ref_update: RefUpdate {
            name: refname.to_string(),
            old,
            new: tip,
        },
    })
}
