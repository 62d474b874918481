//! Item lifecycle state machine
//!
//! Pure decision logic - NO IO, only state transitions.
//!
//! ```text
//!   Available ──reserve──▶ Reserved ──pickup──▶ Completed
//!       ▲                     │
//!       └─────unreserve───────┘
//!
//!   Available | Reserved ──expire──▶ Withdrawn (terminal)
//! ```
//!
//! Stores call [`decide`] while holding the item's row lock, so the guards always see
//! the state the resulting write will replace.

use chrono::{DateTime, Utc};

use crate::common::{AppError, AppResult, StateConflict};
use crate::domains::identity::Caller;
use crate::domains::items::models::{Item, ItemState};

/// A requested change to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Reserve(Caller),
    Unreserve(Caller),
    PickUp(Caller),
    Expire,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Reserve(_) => "reserve",
            Transition::Unreserve(_) => "unreserve",
            Transition::PickUp(_) => "pickup",
            Transition::Expire => "expire",
        }
    }
}

/// Decide the next state for `item`.
///
/// - `Ok(Some(state))`: write `state`
/// - `Ok(None)`: leave the item untouched (only `Expire` on a settled item)
/// - `Err(_)`: a guard failed; nothing is written
pub fn decide(
    item: &Item,
    transition: &Transition,
    now: DateTime<Utc>,
) -> AppResult<Option<ItemState>> {
    match *transition {
        Transition::Reserve(caller) => reserve(item, caller, now).map(Some),
        Transition::Unreserve(caller) => unreserve(item, caller).map(Some),
        Transition::PickUp(caller) => pick_up(item, caller).map(Some),
        Transition::Expire => Ok(expire(item)),
    }
}

fn reserve(item: &Item, caller: Caller, now: DateTime<Utc>) -> AppResult<ItemState> {
    let Caller::Organization(organization) = caller else {
        return Err(AppError::forbidden("Only organizations can reserve items"));
    };

    match item.state {
        ItemState::Withdrawn { .. } => Err(StateConflict::NotActive.into()),
        ItemState::Completed { .. } => Err(StateConflict::AlreadyPickedUp.into()),
        ItemState::Reserved { .. } => Err(StateConflict::AlreadyReserved.into()),
        ItemState::Available if item.is_past_deadline(now) => Err(StateConflict::Expired.into()),
        ItemState::Available => Ok(ItemState::Reserved { by: organization }),
    }
}

fn unreserve(item: &Item, caller: Caller) -> AppResult<ItemState> {
    let Caller::Organization(organization) = caller else {
        return Err(AppError::forbidden("Only organizations can unreserve items"));
    };

    match item.state {
        ItemState::Withdrawn { .. } => Err(StateConflict::NotActive.into()),
        ItemState::Completed { .. } => Err(StateConflict::AlreadyPickedUp.into()),
        ItemState::Available => Err(StateConflict::NotReserved.into()),
        ItemState::Reserved { by } if by != organization => Err(AppError::forbidden(
            "Only the reserving organization can unreserve this item",
        )),
        ItemState::Reserved { .. } => Ok(ItemState::Available),
    }
}

fn pick_up(item: &Item, caller: Caller) -> AppResult<ItemState> {
    let reserved_by = match item.state {
        ItemState::Withdrawn { .. } => return Err(StateConflict::NotActive.into()),
        ItemState::Completed { .. } => return Err(StateConflict::AlreadyPickedUp.into()),
        ItemState::Available => return Err(StateConflict::NotReserved.into()),
        ItemState::Reserved { by } => by,
    };

    let permitted = match caller {
        Caller::Organization(id) => id == reserved_by,
        Caller::Samaritan(id) => id == item.posted_by,
    };
    if !permitted {
        return Err(AppError::forbidden(
            "Only the reserving organization or the donor can mark this item as picked up",
        ));
    }

    Ok(ItemState::Completed { by: reserved_by })
}

fn expire(item: &Item) -> Option<ItemState> {
    match item.state {
        ItemState::Available => Some(ItemState::Withdrawn { reserved_by: None }),
        ItemState::Reserved { by } => Some(ItemState::Withdrawn {
            reserved_by: Some(by),
        }),
        ItemState::Completed { .. } | ItemState::Withdrawn { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::common::{GeoPoint, ItemId, UserId};
    use crate::domains::items::models::{Category, PickupWindow};

    fn item(state: ItemState, posted_by: UserId, now: DateTime<Utc>) -> Item {
        Item {
            id: ItemId::new(),
            category: Category::Food,
            description: "Canned soup".into(),
            weight: None,
            volume: None,
            best_before: None,
            pickup_location: GeoPoint::new(43.65, -79.38),
            pickup_window: PickupWindow::default(),
            available_till: Some(now + Duration::days(14)),
            image: None,
            posted_by,
            state,
            created_at: now,
            updated_at: now,
        }
    }

    fn conflict(result: AppResult<Option<ItemState>>) -> StateConflict {
        result
            .unwrap_err()
            .conflict()
            .expect("expected a state conflict")
    }

    #[test]
    fn test_reserve_available_item() {
        let now = Utc::now();
        let org = UserId::new();
        let item = item(ItemState::Available, UserId::new(), now);

        let next = decide(&item, &Transition::Reserve(Caller::Organization(org)), now).unwrap();
        assert_eq!(next, Some(ItemState::Reserved { by: org }));
    }

    #[test]
    fn test_reserve_guard_order() {
        let now = Utc::now();
        let org = UserId::new();
        let reserve = Transition::Reserve(Caller::Organization(org));

        // Withdrawn beats every other guard
        let withdrawn = item(ItemState::Withdrawn { reserved_by: Some(org) }, UserId::new(), now);
        assert_eq!(conflict(decide(&withdrawn, &reserve, now)), StateConflict::NotActive);

        // Picked up is reported before "already reserved"
        let completed = item(ItemState::Completed { by: org }, UserId::new(), now);
        assert_eq!(conflict(decide(&completed, &reserve, now)), StateConflict::AlreadyPickedUp);

        let reserved = item(ItemState::Reserved { by: UserId::new() }, UserId::new(), now);
        assert_eq!(conflict(decide(&reserved, &reserve, now)), StateConflict::AlreadyReserved);

        let mut lapsed = item(ItemState::Available, UserId::new(), now);
        lapsed.available_till = Some(now - Duration::seconds(1));
        assert_eq!(conflict(decide(&lapsed, &reserve, now)), StateConflict::Expired);
    }

    #[test]
    fn test_samaritan_cannot_reserve() {
        let now = Utc::now();
        let samaritan = UserId::new();
        let item = item(ItemState::Available, samaritan, now);

        let err = decide(&item, &Transition::Reserve(Caller::Samaritan(samaritan)), now)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_item_without_deadline_never_lapses() {
        let now = Utc::now();
        let mut item = item(ItemState::Available, UserId::new(), now);
        item.available_till = None;

        let next = decide(
            &item,
            &Transition::Reserve(Caller::Organization(UserId::new())),
            now + Duration::days(3650),
        )
        .unwrap();
        assert!(matches!(next, Some(ItemState::Reserved { .. })));
    }

    #[test]
    fn test_unreserve_only_by_reserving_org() {
        let now = Utc::now();
        let holder = UserId::new();
        let other = UserId::new();
        let item = item(ItemState::Reserved { by: holder }, UserId::new(), now);

        let err = decide(&item, &Transition::Unreserve(Caller::Organization(other)), now)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let next = decide(&item, &Transition::Unreserve(Caller::Organization(holder)), now)
            .unwrap();
        assert_eq!(next, Some(ItemState::Available));
    }

    #[test]
    fn test_unreserve_requires_reservation() {
        let now = Utc::now();
        let item = item(ItemState::Available, UserId::new(), now);
        let result = decide(
            &item,
            &Transition::Unreserve(Caller::Organization(UserId::new())),
            now,
        );
        assert_eq!(conflict(result), StateConflict::NotReserved);
    }

    #[test]
    fn test_pickup_credits_reserving_org() {
        let now = Utc::now();
        let holder = UserId::new();
        let donor = UserId::new();
        let item = item(ItemState::Reserved { by: holder }, donor, now);

        // Donor confirming the handoff still credits the organization
        let next = decide(&item, &Transition::PickUp(Caller::Samaritan(donor)), now).unwrap();
        assert_eq!(next, Some(ItemState::Completed { by: holder }));

        let next = decide(&item, &Transition::PickUp(Caller::Organization(holder)), now).unwrap();
        assert_eq!(next, Some(ItemState::Completed { by: holder }));
    }

    #[test]
    fn test_pickup_rejects_strangers() {
        let now = Utc::now();
        let item = item(ItemState::Reserved { by: UserId::new() }, UserId::new(), now);

        for caller in [
            Caller::Organization(UserId::new()),
            Caller::Samaritan(UserId::new()),
        ] {
            let err = decide(&item, &Transition::PickUp(caller), now).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[test]
    fn test_pickup_requires_reservation() {
        let now = Utc::now();
        let donor = UserId::new();
        let item = item(ItemState::Available, donor, now);
        let result = decide(&item, &Transition::PickUp(Caller::Samaritan(donor)), now);
        assert_eq!(conflict(result), StateConflict::NotReserved);
    }

    #[test]
    fn test_expire_is_idempotent() {
        let now = Utc::now();
        let org = UserId::new();

        let reserved = item(ItemState::Reserved { by: org }, UserId::new(), now);
        let next = decide(&reserved, &Transition::Expire, now).unwrap();
        assert_eq!(next, Some(ItemState::Withdrawn { reserved_by: Some(org) }));

        let withdrawn = item(next.unwrap(), UserId::new(), now);
        assert_eq!(decide(&withdrawn, &Transition::Expire, now).unwrap(), None);

        let completed = item(ItemState::Completed { by: org }, UserId::new(), now);
        assert_eq!(decide(&completed, &Transition::Expire, now).unwrap(), None);
    }

    #[test]
    fn test_withdrawn_is_terminal() {
        let now = Utc::now();
        let org = UserId::new();
        let donor = UserId::new();
        let item = item(ItemState::Withdrawn { reserved_by: Some(org) }, donor, now);

        for transition in [
            Transition::Reserve(Caller::Organization(org)),
            Transition::Unreserve(Caller::Organization(org)),
            Transition::PickUp(Caller::Organization(org)),
            Transition::PickUp(Caller::Samaritan(donor)),
        ] {
            assert_eq!(
                conflict(decide(&item, &transition, now)),
                StateConflict::NotActive,
                "{} should be refused",
                transition.name()
            );
        }
    }
}
