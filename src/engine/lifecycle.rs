use crate::error::AppError;
use crate::models::bid::BidStatus;

/// Operations that move a bid out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidAction {
    Accept,
    Withdraw,
    Reject,
    /// A sibling bid on the same load was accepted.
    Supersede,
}

impl BidAction {
    pub fn target(self) -> BidStatus {
        match self {
            BidAction::Accept => BidStatus::Confirmed,
            BidAction::Withdraw => BidStatus::Cancelled,
            BidAction::Reject | BidAction::Supersede => BidStatus::Rejected,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            BidAction::Accept => "accepted",
            BidAction::Withdraw => "withdrawn",
            BidAction::Reject | BidAction::Supersede => "rejected",
        }
    }
}

/// Every transition starts from `pending`; terminal statuses never reopen.
pub fn transition(current: BidStatus, action: BidAction) -> Result<BidStatus, AppError> {
    if current != BidStatus::Pending {
        return Err(AppError::Conflict(format!(
            "bid is {}; only pending bids can be {}",
            current.as_str(),
            action.verb()
        )));
    }

    Ok(action.target())
}
