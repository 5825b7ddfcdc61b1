use uuid::Uuid;

use crate::database::models::{RequestStatus, ReviewDecision, SwapRequest, TimeOffRequest};
use crate::error::AppError;

/// A request that moves through pending → approved | denied | cancelled.
pub trait Reviewable {
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn status(&self) -> RequestStatus;
    fn requester(&self) -> Uuid;
}

impl Reviewable for SwapRequest {
    const KIND: &'static str = "Swap request";

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> RequestStatus {
        self.status
    }

    fn requester(&self) -> Uuid {
        self.requesting_user_id
    }
}

impl Reviewable for TimeOffRequest {
    const KIND: &'static str = "Time-off request";

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> RequestStatus {
        self.status
    }

    fn requester(&self) -> Uuid {
        self.user_id
    }
}

/// Proof that a request was pending when read. Decisions can only be made
/// through this type, so a terminal request has no way to be decided again.
#[derive(Debug)]
pub struct Pending<T>(T);

/// A decision taken on a pending request, waiting to be written.
#[derive(Debug)]
pub struct Decided<T> {
    pub request: T,
    pub status: RequestStatus,
}

impl<T: Reviewable> Pending<T> {
    pub fn from_record(request: T) -> Result<Self, AppError> {
        match request.status() {
            RequestStatus::Pending => Ok(Pending(request)),
            status => Err(AppError::State(format!(
                "{} {} is already {}",
                T::KIND,
                request.id(),
                status
            ))),
        }
    }

    pub fn request(&self) -> &T {
        &self.0
    }

    pub fn decide(self, decision: ReviewDecision) -> Decided<T> {
        Decided {
            request: self.0,
            status: decision.into(),
        }
    }

    pub fn approve(self) -> Decided<T> {
        self.decide(ReviewDecision::Approved)
    }

    pub fn deny(self) -> Decided<T> {
        self.decide(ReviewDecision::Denied)
    }

    /// Withdraw the request. Only its author may do so.
    pub fn cancel(self, actor: Uuid) -> Result<Decided<T>, AppError> {
        if self.0.requester() != actor {
            return Err(AppError::Forbidden(format!(
                "Only the requester can cancel {} {}",
                T::KIND.to_lowercase(),
                self.0.id()
            )));
        }
        Ok(Decided {
            request: self.0,
            status: RequestStatus::Cancelled,
        })
    }
}

/// A conditional update matched no pending row: someone decided it first.
pub fn decided_concurrently<T: Reviewable>(id: Uuid) -> AppError {
    AppError::State(format!("{} {} was decided concurrently", T::KIND, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn time_off(status: RequestStatus) -> TimeOffRequest {
        let day = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
        TimeOffRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_date: day,
            end_date: day,
            status,
            reason: None,
            reviewer_notes: None,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_pending_requests_can_be_decided() {
        for status in [
            RequestStatus::Approved,
            RequestStatus::Denied,
            RequestStatus::Cancelled,
        ] {
            let err = Pending::from_record(time_off(status)).unwrap_err();
            assert!(matches!(err, AppError::State(_)));
        }
        let decided = Pending::from_record(time_off(RequestStatus::Pending))
            .unwrap()
            .approve();
        assert_eq!(decided.status, RequestStatus::Approved);
    }

    #[test]
    fn cancel_is_limited_to_requester() {
        let request = time_off(RequestStatus::Pending);
        let owner = request.user_id;

        let pending = Pending::from_record(request.clone()).unwrap();
        assert!(matches!(
            pending.cancel(Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));

        let decided = Pending::from_record(request).unwrap().cancel(owner).unwrap();
        assert_eq!(decided.status, RequestStatus::Cancelled);
    }
}
