//! Re-homing topology between shells.

use tracing::{debug, instrument};

use super::{debug_check, expect_live};
use crate::error::{TopoError, TopoResult};
use crate::topo::*;

/// Move a faceuse and its mate (with all their loops) from their shell
/// into `dest`.
///
/// Edges keep their radial cycles, so a moved face may still share edges
/// and vertices with faces left behind.
#[instrument(skip(model))]
pub fn move_faceuse(model: &mut Model, fu: FaceuseId, dest: ShellId) -> TopoResult<()> {
    expect_live(model, Entity::Faceuse(fu));
    expect_live(model, Entity::Shell(dest));
    let src = model.faceuse(fu).shell;
    if src == dest {
        return Ok(());
    }
    if model.shell(dest).vertexuse.is_some() {
        return Err(TopoError::ShellNotEmpty(dest));
    }

    let mate = model.faceuse(fu).mate;
    model.shells[src].faceuses.retain(|&u| u != fu && u != mate);
    model.shells[dest].faceuses.extend([fu, mate]);
    model.faceuses[fu].shell = dest;
    model.faceuses[mate].shell = dest;

    debug!(?fu, ?src, ?dest, "move_faceuse");
    debug_check(model, Entity::Shell(src));
    debug_check(model, Entity::Shell(dest));
    Ok(())
}
