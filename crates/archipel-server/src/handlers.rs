//! Endpoint handlers.
//!
//! Queries answer with plain JSON. Commands answer with the command's
//! outcome fields plus `"success": true`; a refused command answers with
//! `{"success": false, "message"}` through [`ApiError`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/state` | Full world snapshot |
//! | `GET` | `/api/players/{id}/notifications` | Notifications, newest first |
//! | `GET` | `/api/players/{id}/notifications/unread` | Unread count (`?kind=`) |
//! | `GET` | `/api/players/{id}/transports` | Transports sent or received |
//! | `GET` | `/api/islands/{id}/sites/{resource}` | Site level, costs, donations |
//! | `POST` | `/api/join` | Log in or create an account |
//! | `POST` | `/api/cities/*` | Claim, rename, tax, windmill, cure |
//! | `POST` | `/api/buildings/*` | Build, destroy, complete instantly |
//! | `POST` | `/api/workers` | Assign workers |
//! | `POST` | `/api/sites/donate` | Donate toward a site upgrade |
//! | `POST` | `/api/transports` | Create a transport |
//! | `POST` | `/api/transports/cancel` | Cancel a transport |
//! | `POST` | `/api/research` | Unlock a research |
//! | `POST` | `/api/ships` | Buy a ship |
//! | `POST` | `/api/diamonds` | Credit diamonds |
//! | `POST` | `/api/notifications` | Send a notification |
//! | `POST` | `/api/notifications/read` | Mark notifications read |

use std::sync::Arc;

use archipel_core::Command;
use archipel_core::transport::TransportRequest;
use archipel_types::{
    BuildingKind, CityId, IslandId, NotificationKind, PlayerId, Research, Resource, TaxRate,
    TransportId, Workplace,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(s).map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}

/// Merge `"success": true` into an outcome.
fn success(outcome: Value) -> Value {
    match outcome {
        Value::Object(mut map) => {
            map.insert(String::from("success"), Value::Bool(true));
            Value::Object(map)
        }
        Value::Null => serde_json::json!({ "success": true }),
        other => serde_json::json!({ "success": true, "result": other }),
    }
}

async fn execute(state: &AppState, command: Command) -> Result<Json<Value>, ApiError> {
    let outcome = state.world.execute(command).await?;
    Ok(Json(success(serde_json::to_value(outcome)?)))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Query parameters for the unread count endpoint.
#[derive(Debug, Deserialize)]
pub struct UnreadQuery {
    /// Only count notifications of this kind.
    pub kind: Option<NotificationKind>,
}

/// Return the full world snapshot.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let snapshot = state.world.snapshot().await?;
    Ok(Json(serde_json::to_value(snapshot)?))
}

/// List a player's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let player = PlayerId::from(parse_uuid(&id)?);
    let notifications = state.world.notifications(player).await?;
    let unread = notifications.iter().filter(|n| !n.read).count();
    Ok(Json(serde_json::json!({
        "count": notifications.len(),
        "unread": unread,
        "notifications": notifications,
    })))
}

/// Count a player's unread notifications.
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<UnreadQuery>,
) -> Result<Json<Value>, ApiError> {
    let player = PlayerId::from(parse_uuid(&id)?);
    let unread = state.world.unread_count(player, params.kind).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}

/// List the transports a player sent or receives.
pub async fn list_transports(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let player = PlayerId::from(parse_uuid(&id)?);
    let transports = state.world.transports(player).await?;
    Ok(Json(serde_json::json!({
        "count": transports.len(),
        "transports": transports,
    })))
}

/// Describe a resource site.
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path((id, resource)): Path<(String, Resource)>,
) -> Result<Json<Value>, ApiError> {
    let island = IslandId::from(parse_uuid(&id)?);
    let info = state.world.site_info(island, resource).await?;
    Ok(Json(serde_json::to_value(info)?))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Declares a request body and the handler turning it into one command.
/// Body field names match the command's field names.
macro_rules! command_endpoint {
    (
        $(#[$meta:meta])*
        $handler:ident($request:ident) => $variant:ident {
            $( $(#[$field_meta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        #[doc = concat!("Body of [`", stringify!($handler), "`].")]
        #[derive(Debug, Deserialize)]
        pub struct $request {
            $( $(#[$field_meta])* pub $field: $ty, )*
        }

        $(#[$meta])*
        pub async fn $handler(
            State(state): State<Arc<AppState>>,
            Json(body): Json<$request>,
        ) -> Result<Json<Value>, ApiError> {
            let $request { $($field),* } = body;
            execute(&state, Command::$variant { $($field),* }).await
        }
    };
}

command_endpoint! {
    /// Log in, creating the account on first use.
    join(JoinRequest) => Join {
        /// Login name.
        username: String,
        /// Plaintext credential.
        credential: String,
    }
}

command_endpoint! {
    /// Take an unowned city.
    claim_city(ClaimCityRequest) => ClaimCity {
        /// Acting player.
        player: PlayerId,
        /// City to claim.
        city: CityId,
    }
}

command_endpoint! {
    /// Rename a city.
    rename_city(RenameCityRequest) => RenameCity {
        /// Acting player.
        player: PlayerId,
        /// City to rename.
        city: CityId,
        /// New name.
        name: String,
    }
}

command_endpoint! {
    /// Select a tax band (1, 2 or 3).
    set_tax_rate(TaxRateRequest) => SetTaxRate {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// New band.
        rate: TaxRate,
    }
}

command_endpoint! {
    /// Select the windmill cereal multiplier.
    set_windmill_multiplier(WindmillRequest) => SetWindmillMultiplier {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Chosen multiplier.
        multiplier: u32,
    }
}

command_endpoint! {
    /// Try to cure a city's plague.
    cure_plague(CurePlagueRequest) => CurePlague {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
    }
}

command_endpoint! {
    /// Build a new building or upgrade the one in the slot.
    build(BuildRequest) => BuildOrUpgrade {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
        /// Building kind.
        kind: BuildingKind,
    }
}

command_endpoint! {
    /// Lower or remove the building in a slot.
    destroy(DestroyRequest) => Destroy {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
    }
}

command_endpoint! {
    /// Finish a nearly complete construction.
    complete_instantly(CompleteRequest) => CompleteInstantly {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
    }
}

command_endpoint! {
    /// Set the workers of a site or the academy.
    assign_workers(WorkersRequest) => AssignWorkers {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Site or academy.
        workplace: Workplace,
        /// Requested worker count.
        count: u32,
    }
}

command_endpoint! {
    /// Donate toward a site upgrade.
    donate(DonateRequest) => Donate {
        /// Acting player.
        player: PlayerId,
        /// Donor city.
        city: CityId,
        /// Island of the site.
        island: IslandId,
        /// Resource the site yields.
        site: Resource,
        /// Resource donated.
        resource: Resource,
        /// Amount offered.
        amount: u32,
    }
}

command_endpoint! {
    /// Ship goods to another city.
    create_transport(CreateTransportRequest) => CreateTransport {
        /// Acting player.
        player: PlayerId,
        /// Shipment details, inline in the body.
        #[serde(flatten)]
        request: TransportRequest,
    }
}

command_endpoint! {
    /// Cancel a transport.
    cancel_transport(CancelTransportRequest) => CancelTransport {
        /// Acting player.
        player: PlayerId,
        /// Transport to cancel.
        id: TransportId,
    }
}

command_endpoint! {
    /// Unlock a research.
    unlock_research(ResearchRequest) => UnlockResearch {
        /// Acting player.
        player: PlayerId,
        /// Research to unlock.
        research: Research,
    }
}

command_endpoint! {
    /// Buy a ship with gold from a city.
    buy_ship(BuyShipRequest) => BuyShip {
        /// Acting player.
        player: PlayerId,
        /// City paying.
        city: CityId,
    }
}

command_endpoint! {
    /// Credit diamonds to a player.
    add_diamonds(DiamondsRequest) => AddDiamonds {
        /// Player credited.
        player: PlayerId,
        /// Diamonds added.
        amount: u64,
    }
}

command_endpoint! {
    /// Deliver a message to a player.
    notify(NotifyRequest) => Notify {
        /// Recipient.
        player: PlayerId,
        /// Category.
        kind: NotificationKind,
        /// Text.
        message: String,
    }
}

command_endpoint! {
    /// Mark every notification of a player as read.
    mark_notifications_read(MarkReadRequest) => MarkNotificationsRead {
        /// Player whose inbox is cleared.
        player: PlayerId,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_merges_into_objects() {
        let value = success(serde_json::json!({ "assigned": 4 }));
        assert_eq!(value, serde_json::json!({ "assigned": 4, "success": true }));
    }

    #[test]
    fn success_wraps_unit_outcomes() {
        assert_eq!(success(Value::Null), serde_json::json!({ "success": true }));
    }

    #[test]
    fn transport_body_is_flat() {
        let body = serde_json::json!({
            "player": Uuid::nil(),
            "source": Uuid::nil(),
            "destination": Uuid::nil(),
            "cargo": { "wood": 100 },
            "ships": 1,
            "loading_secs": 5,
            "travel_secs": 3,
        });
        let request: Result<CreateTransportRequest, _> = serde_json::from_value(body);
        assert!(request.is_ok_and(|r| r.request.ships == 1));
    }
}
