//! Pure decision rules for friend requests and removals.
//!
//! The rules only look at relationship state, so the service can evaluate
//! them inside a transaction and bail out before anything is written.

use parley_core::error::AppError;
use parley_core::model::RelationStatus;
use parley_core::result::AppResult;

/// What an add-friend call will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddFriendPlan {
    /// The receiver already asked the sender; both become friends.
    Accept,
    /// Open a new request from sender to receiver.
    Request,
}

impl AddFriendPlan {
    pub fn message(self) -> &'static str {
        match self {
            Self::Accept => "Friend request accepted.",
            Self::Request => "Friend request sent.",
        }
    }
}

/// Decide an add-friend call from the receiver's view of the sender.
pub fn plan_add_friend(receiver_view: Option<RelationStatus>) -> AppResult<AddFriendPlan> {
    match receiver_view {
        Some(RelationStatus::Friend) => Err(AppError::conflict("You are already friends with this user.")),
        Some(RelationStatus::Incoming) => Err(AppError::conflict(
            "You already sent a friend request to this user.",
        )),
        Some(RelationStatus::Blocked) => Err(AppError::conflict("This user blocked you.")),
        Some(RelationStatus::BlockedByOther) => Err(AppError::conflict("You blocked this user.")),
        Some(RelationStatus::Outgoing) => Ok(AddFriendPlan::Accept),
        Some(RelationStatus::None) | None => Ok(AddFriendPlan::Request),
    }
}

/// What a remove-friend call will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveFriendPlan {
    /// State the sender held before removal.
    pub prior: RelationStatus,
    pub message: &'static str,
}

/// Decide a remove-friend call from the sender's view of the receiver.
pub fn plan_remove_friend(sender_view: Option<RelationStatus>) -> AppResult<RemoveFriendPlan> {
    let message = match sender_view {
        None | Some(RelationStatus::None) => return Err(AppError::not_found("User not found.")),
        Some(RelationStatus::BlockedByOther) => return Err(AppError::conflict("This user blocked you.")),
        Some(RelationStatus::Blocked) => return Err(AppError::conflict("You blocked this user.")),
        Some(RelationStatus::Friend) => "Friend removed.",
        Some(RelationStatus::Outgoing) => "Friend request canceled.",
        Some(RelationStatus::Incoming) => "Friend request declined.",
    };
    Ok(RemoveFriendPlan {
        prior: sender_view.unwrap_or(RelationStatus::None),
        message,
    })
}
