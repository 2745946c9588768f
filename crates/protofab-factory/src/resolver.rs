//! # Dependency Resolver
//!
//! Inserts a batch of raw files into a registry so that every file arrives
//! after the in-batch files it depends on, whatever order the batch was
//! supplied in.
//!
//! ## Algorithm
//!
//! Pending files are held in a map keyed by name. To add a file, each of
//! its dependencies that is still pending is removed from the map and added
//! first (recursively), then the file itself is inserted. Removing before
//! recursing means a file is visited at most once, so a dependency cycle
//! terminates: the file reached a second time through the cycle is no longer
//! pending and is left for the registry to judge. Top-level entry points are
//! taken in name order, which keeps runs deterministic.
//!
//! Dependencies that are neither pending nor registered are not an error
//! here; the registry rejects the dependent file with
//! [`PoolError::MissingDependency`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use protofab_core::FileDescriptorProto;
use protofab_pool::{DescriptorPool, PoolError, PoolResult};

/// Add `protos` to `pool` in dependency order.
///
/// Returns the names of the files in the order they were inserted. A name
/// supplied twice describing the same schema is inserted once; otherwise
/// the batch is rejected with [`PoolError::FileConflict`] before anything
/// is inserted.
pub fn add_files(
    pool: &mut DescriptorPool,
    protos: impl IntoIterator<Item = FileDescriptorProto>,
) -> PoolResult<Vec<String>> {
    let mut pending = BTreeMap::new();
    for proto in protos {
        match pending.entry(proto.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(proto);
            }
            Entry::Occupied(existing) => {
                if !existing.get().same_schema(&proto) {
                    return Err(PoolError::FileConflict { file: proto.name });
                }
            }
        }
    }

    let mut order = Vec::with_capacity(pending.len());
    while let Some((_, proto)) = pending.pop_first() {
        add_file(pool, &mut pending, proto, &mut order)?;
    }
    Ok(order)
}

fn add_file(
    pool: &mut DescriptorPool,
    pending: &mut BTreeMap<String, FileDescriptorProto>,
    proto: FileDescriptorProto,
    order: &mut Vec<String>,
) -> PoolResult<()> {
    for dependency in &proto.dependency {
        if let Some(dep) = pending.remove(dependency) {
            tracing::trace!(file = %proto.name, dependency = %dependency, "adding dependency first");
            add_file(pool, pending, dep, order)?;
        }
    }
    let name = proto.name.clone();
    pool.add(proto)?;
    order.push(name);
    Ok(())
}
