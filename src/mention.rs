//! @-mentions written into a work item's discussion.
//!
//! The server turns a `data-vss-mention` anchor in `System.History` into a
//! notification for the referenced identity.

use tracing::debug;

use crate::api::WorkItemClient;
use crate::error::{Result, TfsError};
use crate::models::{CommitResult, FIELD_HISTORY, IdentityRef, WorkItem};

/// Outcome of [`send_mention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionResult {
    /// The mention was committed.
    Sent,
    /// The commit did not succeed; see the logs for the cause.
    Failed,
}

fn mention_anchor(id: &str, display_name: &str) -> String {
    format!(r##"<a href="#" data-vss-mention="version:2.0,{id}">@{display_name}</a>"##)
}

/// Mentions `to` in the history of `work_item`, optionally copying `cc`.
///
/// Any other pending edits on `work_item` are committed along with the mention.
/// The CC line is left out when `cc` is the recipient. When the commit does not
/// succeed the mention is taken back out of the pending edits, so a later commit
/// won't post it; other pending edits stay.
///
/// # Errors
///
/// Returns [`TfsError::Validation`] when `message` is empty or either identity
/// lacks an id. Commit failures are reported as [`MentionResult::Failed`].
pub async fn send_mention(
    client: &WorkItemClient,
    work_item: &mut WorkItem,
    to: &IdentityRef,
    message: &str,
    cc: Option<&IdentityRef>,
) -> Result<MentionResult> {
    if message.is_empty() {
        return Err(TfsError::validation("mention message can't be empty"));
    }
    let to_id = to
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TfsError::validation("mentioned identity has no id"))?;

    let mut mention = format!("{}: {message}", mention_anchor(to_id, &to.display_name));

    if let Some(cc) = cc {
        let cc_id = cc
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TfsError::validation("copied identity has no id"))?;
        if cc_id != to_id {
            mention.push_str("<br>CC: ");
            mention.push_str(&mention_anchor(cc_id, &cc.display_name));
        }
    }

    work_item.set(FIELD_HISTORY, mention)?;
    debug!(work_item = work_item.id(), to = to_id, "sending mention");

    match work_item.commit(client).await {
        CommitResult::Success => Ok(MentionResult::Sent),
        _ => {
            work_item.discard_change(FIELD_HISTORY);
            Ok(MentionResult::Failed)
        }
    }
}
